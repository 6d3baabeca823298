//! Plugin panel: controls generated from the schema, Run button, progress bar
//! and, in advanced mode, the panel's own console.

use egui::{Color32, RichText, Ui};
use sdpanel_core::control::{Axis, Control, ControlKind};
use sdpanel_core::controller::PluginController;

use crate::panels::console::show_panel_log;

/// Result of showing a plugin panel.
pub enum PluginPanelAction {
    /// User clicked Run.
    Run,
    None,
}

const INVALID: Color32 = Color32::from_rgb(220, 60, 60);

/// Show one plugin panel.
pub fn show_plugin_panel(ui: &mut Ui, title: &str, panel: &mut PluginController) -> PluginPanelAction {
    let mut action = PluginPanelAction::None;

    ui.heading(title);
    ui.separator();

    let id = ui.id().with(panel.name());
    let advanced = panel.widget().advanced_mode();

    egui::Grid::new(id.with("controls"))
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            for control in panel.widget_mut().controls_mut() {
                if !control.is_visible(advanced) {
                    continue;
                }
                show_control(ui, id, control);
                ui.end_row();
            }
        });

    ui.separator();

    let mut enabled = advanced;
    if ui.checkbox(&mut enabled, "Advanced").changed() {
        panel.toggle_advanced(enabled);
    }

    ui.horizontal(|ui| {
        let running = panel.is_running();
        if ui.add_enabled(!running, egui::Button::new("Run")).clicked() {
            action = PluginPanelAction::Run;
        }
        if running {
            ui.spinner();
        }
        ui.add(
            egui::ProgressBar::new(f32::from(panel.progress()) / 100.0)
                .show_percentage()
                .desired_width(ui.available_width()),
        );
    });

    if panel.log_visible() {
        ui.separator();
        show_panel_log(ui, id.with("log"), panel.logs());
    }

    action
}

fn show_control(ui: &mut Ui, id: egui::Id, control: &mut Control) {
    let label_color = if control.check() {
        ui.visuals().text_color()
    } else {
        INVALID
    };
    let label = ui.label(RichText::new(control.label()).color(label_color));
    if !control.help().is_empty() {
        label.on_hover_text(control.help());
    }

    let key = control.key().to_string();
    match control.kind_mut() {
        ControlKind::LayerSelect { choices, selected } => {
            let current = selected.clone().unwrap_or_else(|| "(select)".to_string());
            egui::ComboBox::from_id_salt(id.with(&key))
                .selected_text(current)
                .show_ui(ui, |ui| {
                    for name in choices.iter() {
                        ui.selectable_value(selected, Some(name.clone()), name);
                    }
                });
        }
        ControlKind::Coordinates { fields, .. } => {
            ui.horizontal(|ui| {
                for axis in Axis::ALL {
                    ui.label(axis.name());
                    ui.add(egui::TextEdit::singleline(&mut fields[axis.index()]).desired_width(48.0));
                }
            });
        }
        ControlKind::Number { text, .. } | ControlKind::Text { text } => {
            ui.add(egui::TextEdit::singleline(text).desired_width(120.0));
        }
        ControlKind::Toggle { value } => {
            let text = if *value { "True" } else { "False" };
            ui.checkbox(value, text);
        }
        ControlKind::Select { values, selected } => {
            let current = values.get(*selected).cloned().unwrap_or_default();
            egui::ComboBox::from_id_salt(id.with(&key))
                .selected_text(current)
                .show_ui(ui, |ui| {
                    for (i, value) in values.iter().enumerate() {
                        ui.selectable_value(selected, i, value);
                    }
                });
        }
    }
}
