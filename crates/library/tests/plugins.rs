//! Every catalog entry runs with its defaults against the sample image.

use std::sync::Arc;
use std::time::Duration;

use sdpanel_library::prelude::*;

const WAIT: Duration = Duration::from_secs(30);

fn viewer_with_sample() -> Viewer {
    let viewer = Viewer::new();
    for sample in make_sample_data() {
        viewer.add_image(sample.data, sample.scale, &sample.name);
    }
    viewer
}

#[test]
fn all_plugins_run_with_defaults() {
    for entry in provide_plugins() {
        let viewer = viewer_with_sample();
        let mut panel = entry.instantiate(Arc::new(viewer.clone())).unwrap();
        assert!(panel.widget().check_inputs(), "{} has invalid defaults", entry.id);

        assert!(matches!(panel.run_clicked().unwrap(), RunRequest::Started(_)));
        match panel.wait_for_completion(WAIT) {
            Some(RunOutcome::Succeeded { layers, .. }) => {
                let schema = entry.schema().unwrap();
                let labels: Vec<&str> = schema.outputs().iter().map(|(_, o)| o.label.as_str()).collect();
                assert_eq!(layers, labels, "{}", entry.id);
                for name in &layers {
                    assert!(viewer.contains(name), "{} missing {name}", entry.id);
                }
            }
            other => panic!("{} did not succeed: {other:?}", entry.id),
        }
        assert_eq!(panel.progress(), 100);
    }
}

#[test]
fn blur_output_keeps_sample_shape_and_scale() {
    let viewer = viewer_with_sample();
    let entries = provide_plugins();
    let entry = sdpanel_core::registry::find(&entries, "gaussian_blur").unwrap();
    let mut panel = entry.instantiate(Arc::new(viewer.clone())).unwrap();
    panel.widget_mut().set_text("sigma", "2.5").unwrap();

    panel.run_clicked().unwrap();
    panel.wait_for_completion(WAIT).unwrap();

    let out = viewer.get("Blurred").unwrap();
    assert_eq!(out.data.shape(), &[128, 128]);
    assert_eq!(out.scale, vec![1.0, 1.0]);
}

#[test]
fn normalize_reports_progress_and_range() {
    let viewer = viewer_with_sample();
    let entries = provide_plugins();
    let entry = sdpanel_core::registry::find(&entries, "normalize_intensity").unwrap();
    let mut panel = entry.instantiate(Arc::new(viewer.clone())).unwrap();

    panel.run_clicked().unwrap();
    assert!(matches!(
        panel.wait_for_completion(WAIT),
        Some(RunOutcome::Succeeded { .. })
    ));
    assert!(panel.logs().iter().any(|e| e.message.contains("Intensity range")));

    let out = viewer.get("Normalized").unwrap();
    assert!(out.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
}

#[test]
fn invalid_sigma_fails_the_run() {
    let viewer = viewer_with_sample();
    let entries = provide_plugins();
    let entry = sdpanel_core::registry::find(&entries, "gaussian_blur").unwrap();
    let mut panel = entry.instantiate(Arc::new(viewer.clone())).unwrap();
    panel.widget_mut().set_text("sigma", "-1").unwrap();

    panel.run_clicked().unwrap();
    match panel.wait_for_completion(WAIT) {
        Some(RunOutcome::Failed { message, .. }) => assert!(message.contains("Sigma must be > 0")),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(viewer.len(), 1);
}
