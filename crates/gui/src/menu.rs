//! Menu bar: File, View, Plugins, Help.

use egui::Ui;
use sdpanel_core::registry::{categories, entries_by_category, PluginEntry};

/// Actions triggered by menu items.
pub enum MenuAction {
    LoadSample,
    Exit,
    ResetView,
    /// Open a plugin panel by id.
    OpenPlugin(String),
    About,
    None,
}

/// Show the main menu bar. Returns the action triggered (if any).
pub fn show_menu_bar(ui: &mut Ui, plugins: &[PluginEntry]) -> MenuAction {
    let mut action = MenuAction::None;

    egui::menu::bar(ui, |ui| {
        ui.menu_button("File", |ui| {
            if ui.button("Load Sample").clicked() {
                action = MenuAction::LoadSample;
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Exit").clicked() {
                action = MenuAction::Exit;
                ui.close_menu();
            }
        });

        ui.menu_button("View", |ui| {
            if ui.button("Reset Zoom").clicked() {
                action = MenuAction::ResetView;
                ui.close_menu();
            }
        });

        // Plugins menu generated from the catalog categories
        ui.menu_button("Plugins", |ui| {
            for category in categories(plugins) {
                ui.menu_button(category, |ui| {
                    for entry in entries_by_category(plugins, category) {
                        if ui.button(entry.name).on_hover_text(entry.description).clicked() {
                            action = MenuAction::OpenPlugin(entry.id.to_string());
                            ui.close_menu();
                        }
                    }
                });
            }
        });

        ui.menu_button("Help", |ui| {
            if ui.button("About sdpanel").clicked() {
                action = MenuAction::About;
                ui.close_menu();
            }
        });
    });

    action
}
