//! Plugin list panel: browse plugins by category.

use egui::Ui;
use sdpanel_core::registry::{categories, entries_by_category, PluginEntry};

/// Show the plugin list. Returns the id of a plugin to open.
pub fn show_plugin_list(ui: &mut Ui, plugins: &[PluginEntry], selected: &mut Option<String>) -> Option<String> {
    let mut open = None;

    ui.heading("Plugins");
    ui.label("Double-click to open a panel");
    ui.separator();

    egui::ScrollArea::vertical()
        .id_salt("plugin_list")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for category in categories(plugins) {
                egui::CollapsingHeader::new(category)
                    .default_open(true)
                    .show(ui, |ui| {
                        for entry in entries_by_category(plugins, category) {
                            let is_selected = selected.as_deref() == Some(entry.id);
                            let response = ui.selectable_label(is_selected, entry.name);

                            if response.clicked() {
                                *selected = Some(entry.id.to_string());
                            }
                            if response.double_clicked() {
                                open = Some(entry.id.to_string());
                            }

                            response.on_hover_text(entry.description);
                        }
                    });
            }
        });

    if let Some(id) = selected.clone() {
        ui.separator();
        if ui.button("Open Panel").clicked() {
            open = Some(id);
        }
    }

    open
}
