//! Layer list panel: visibility, selection, removal.

use egui::Ui;
use sdpanel_core::viewer::Viewer;

/// Actions returned from the layers panel.
pub enum LayerAction {
    SetVisible(String, bool),
    Select(String),
    Remove(String),
    None,
}

/// Show the layer list, top layer first.
pub fn show_layers(ui: &mut Ui, viewer: &Viewer) -> LayerAction {
    let mut action = LayerAction::None;

    ui.heading("Layers");
    ui.separator();

    let layers = viewer.layers_ordered();
    if layers.is_empty() {
        ui.label("No layers.");
        return action;
    }

    let active = viewer.active();

    egui::ScrollArea::vertical()
        .id_salt("layer_list")
        .auto_shrink([false, false])
        .max_height(ui.available_height() - 32.0)
        .show(ui, |ui| {
            for layer in layers.iter().rev() {
                ui.horizontal(|ui| {
                    let mut visible = layer.visible;
                    if ui.checkbox(&mut visible, "").changed() {
                        action = LayerAction::SetVisible(layer.name.clone(), visible);
                    }

                    let is_active = active.as_deref() == Some(layer.name.as_str());
                    let response = ui.selectable_label(is_active, &layer.name);
                    if response.clicked() {
                        action = LayerAction::Select(layer.name.clone());
                    }

                    let shape = layer
                        .data
                        .shape()
                        .iter()
                        .map(|n| n.to_string())
                        .collect::<Vec<_>>()
                        .join("x");
                    let hover = match &layer.provenance {
                        Some(plugin) => format!("{shape}, from {plugin}"),
                        None => shape,
                    };
                    response.on_hover_text(hover);
                });
            }
        });

    if let Some(name) = active {
        ui.separator();
        if ui.button("Remove Selected").clicked() {
            action = LayerAction::Remove(name);
        }
    }

    action
}
