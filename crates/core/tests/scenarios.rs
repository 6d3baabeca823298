//! End-to-end panel runs against an in-memory viewer.

use std::sync::Arc;
use std::time::Duration;

use ndarray::{Array2, ArrayD};
use sdpanel_core::control::Axis;
use sdpanel_core::prelude::*;

const WAIT: Duration = Duration::from_secs(10);

fn cells() -> ArrayD<f32> {
    Array2::from_shape_fn((64, 64), |(r, c)| ((r * 64 + c) % 7) as f32).into_dyn()
}

fn blur_schema(fail: bool) -> ParameterSchema {
    ParameterSchema::builder("blur")
        .input("image", InputDef::new(ParamType::Image, "Image"))
        .input("sigma", InputDef::new(ParamType::Float, "Sigma").with_default(1.5))
        .output("blurred", OutputDef::image("Blurred"))
        .function(move |args| {
            if fail {
                return Err(Error::Algorithm("sigma too large for image".into()));
            }
            let sigma = args.float("sigma")? as f32;
            Ok(AlgorithmOutput::Single(args.image("image")? * sigma))
        })
        .build()
        .unwrap()
}

fn viewer_with_cells() -> Viewer {
    let viewer = Viewer::new();
    viewer.add_image(cells(), vec![1.0, 1.0], "cells");
    viewer
}

#[test]
fn scenario_single_output_routed_by_label() {
    let viewer = viewer_with_cells();
    let mut panel = PluginController::new(blur_schema(false), Arc::new(viewer.clone())).unwrap();

    assert!(matches!(panel.run_clicked().unwrap(), RunRequest::Started(_)));
    let outcome = panel.wait_for_completion(WAIT).unwrap();
    assert!(matches!(outcome, RunOutcome::Succeeded { .. }));

    assert_eq!(viewer.len(), 2);
    let out = viewer.get("Blurred").unwrap();
    assert_eq!(out.data.shape(), &[64, 64]);
    let expected = cells() * 1.5_f32;
    assert_eq!(*out.data, expected);
    assert_eq!(panel.progress(), 100);
    assert_eq!(panel.panel_state(), PanelState::Idle);
}

#[test]
fn scenario_algorithm_error_leaves_panel_idle() {
    let viewer = viewer_with_cells();
    let mut panel = PluginController::new(blur_schema(true), Arc::new(viewer.clone())).unwrap();

    panel.run_clicked().unwrap();
    let outcome = panel.wait_for_completion(WAIT).unwrap();
    match outcome {
        RunOutcome::Failed { message, .. } => assert!(message.contains("sigma too large")),
        other => panic!("unexpected outcome {other:?}"),
    }

    assert_eq!(panel.panel_state(), PanelState::Idle);
    assert_eq!(panel.progress(), 0);
    assert_eq!(viewer.image_names(), vec!["cells"]);
    assert!(panel.logs().iter().any(|e| e.level == LogLevel::Error));
}

#[test]
fn scenario_two_outputs_in_declared_order() {
    let viewer = viewer_with_cells();
    let schema = ParameterSchema::builder("split")
        .input("image", InputDef::new(ParamType::Image, "Image"))
        .output("low", OutputDef::image("Low part"))
        .output("high", OutputDef::image("High part"))
        .function(|args| {
            let image = args.image("image")?;
            Ok(AlgorithmOutput::Sequence(vec![
                image.mapv(|_| 1.0_f32),
                image.mapv(|_| 2.0_f32),
            ]))
        })
        .build()
        .unwrap();
    let mut panel = PluginController::new(schema, Arc::new(viewer.clone())).unwrap();

    panel.run_clicked().unwrap();
    match panel.wait_for_completion(WAIT).unwrap() {
        RunOutcome::Succeeded { layers, .. } => assert_eq!(layers, vec!["Low part", "High part"]),
        other => panic!("unexpected outcome {other:?}"),
    }

    assert!(viewer.get("Low part").unwrap().data.iter().all(|&v| v == 1.0));
    assert!(viewer.get("High part").unwrap().data.iter().all(|&v| v == 2.0));
    assert_eq!(viewer.image_names(), vec!["cells", "Low part", "High part"]);
}

#[test]
fn scenario_removed_layer_clears_selection() {
    let viewer = viewer_with_cells();
    let mut panel = PluginController::new(blur_schema(false), Arc::new(viewer.clone())).unwrap();
    assert_eq!(
        panel.widget().state().unwrap().input("image"),
        Some(&ParamValue::Layer("cells".into()))
    );

    viewer.remove("cells").unwrap();
    panel.process_messages();

    match panel.widget().control("image").unwrap().kind() {
        ControlKind::LayerSelect { choices, selected } => {
            assert!(choices.is_empty());
            assert!(selected.is_none());
        }
        other => panic!("unexpected control {other:?}"),
    }
    assert!(matches!(panel.run_clicked().unwrap(), RunRequest::Rejected(_)));
}

#[test]
fn layer_removed_before_worker_resolves_it() {
    let viewer = viewer_with_cells();
    let mut panel = PluginController::new(blur_schema(false), Arc::new(viewer.clone())).unwrap();

    // The layer event is still queued, so the selector keeps the stale name.
    viewer.remove("cells").unwrap();
    assert!(matches!(panel.run_clicked().unwrap(), RunRequest::Started(_)));

    match panel.wait_for_completion(WAIT).unwrap() {
        RunOutcome::Failed { message, .. } => assert!(message.contains("Layer not found: cells")),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(panel.progress(), 0);
    assert!(viewer.is_empty());
}

#[test]
fn controls_edited_during_run_do_not_leak_into_it() {
    let viewer = viewer_with_cells();
    let mut panel = PluginController::new(blur_schema(false), Arc::new(viewer.clone())).unwrap();
    panel.run_clicked().unwrap();
    panel.widget_mut().set_text("sigma", "3.0").unwrap();
    panel.wait_for_completion(WAIT).unwrap();

    let out = viewer.get("Blurred").unwrap();
    assert_eq!(*out.data, cells() * 1.5_f32);
}

#[test]
fn repeated_runs_reuse_the_panel() {
    let viewer = viewer_with_cells();
    let mut panel = PluginController::new(blur_schema(false), Arc::new(viewer.clone())).unwrap();
    for _ in 0..3 {
        panel.run_clicked().unwrap();
        assert!(matches!(
            panel.wait_for_completion(WAIT),
            Some(RunOutcome::Succeeded { .. })
        ));
    }
    assert_eq!(
        viewer.image_names(),
        vec!["cells", "Blurred", "Blurred [1]", "Blurred [2]"]
    );
}

#[test]
fn defaults_round_trip_through_state() {
    let schema = ParameterSchema::builder("defaults")
        .input("i", InputDef::new(ParamType::Int, "I").with_default(-4))
        .input("f", InputDef::new(ParamType::Float, "F").with_default(0.25))
        .input("b", InputDef::new(ParamType::Bool, "B").with_default(false))
        .input("zi", InputDef::new(ParamType::ZyxInt, "ZI").with_default([1_i64, 2, 3]))
        .input("zf", InputDef::new(ParamType::ZyxFloat, "ZF").with_default([0.5, 0.25, 2.0]))
        .input("s", InputDef::new(ParamType::Select, "S").with_values(["a", "b"]).with_default("b"))
        .input("t", InputDef::new(ParamType::String, "T").with_default("hello"))
        .function(|_| Ok(AlgorithmOutput::Sequence(Vec::new())))
        .build()
        .unwrap();

    let state = StateWidget::new(&schema, &[]).state().unwrap();
    assert_eq!(state.input("i"), Some(&ParamValue::Int(-4)));
    assert_eq!(state.input("f"), Some(&ParamValue::Float(0.25)));
    assert_eq!(state.input("b"), Some(&ParamValue::Bool(false)));
    assert_eq!(state.input("zi"), Some(&ParamValue::ZyxInt([1, 2, 3])));
    assert_eq!(state.input("zf"), Some(&ParamValue::ZyxFloat([0.5, 0.25, 2.0])));
    assert_eq!(state.input("s"), Some(&ParamValue::Choice("b".into())));
    assert_eq!(state.input("t"), Some(&ParamValue::Text("hello".into())));
    assert!(state.outputs.is_empty());
}

#[test]
fn coordinate_edits_validate_each_axis() {
    let schema = ParameterSchema::builder("coords")
        .input("shape", InputDef::new(ParamType::ZyxInt, "Shape").with_default([1_i64, 11, 11]))
        .function(|_| Ok(AlgorithmOutput::Sequence(Vec::new())))
        .build()
        .unwrap();
    let mut widget = StateWidget::new(&schema, &[]);
    widget.set_coordinate("shape", Axis::X, "eleven").unwrap();
    let errors = widget.validate();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Coordinate x for Shape must be an integer");

    widget.set_coordinate("shape", Axis::X, "13").unwrap();
    assert_eq!(
        widget.state().unwrap().input("shape"),
        Some(&ParamValue::ZyxInt([1, 11, 13]))
    );
}
