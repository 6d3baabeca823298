//! Console panel: log messages with colored levels.

use egui::{Color32, RichText, ScrollArea, Ui};
use sdpanel_core::messages::{LogEntry, LogLevel};

/// Show the application console with a heading.
pub fn show_console(ui: &mut Ui, logs: &[LogEntry]) {
    ui.horizontal(|ui| {
        ui.heading("Console");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(format!("{} messages", logs.len()));
        });
    });
    ui.separator();

    ScrollArea::vertical()
        .id_salt("app_console")
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| show_entries(ui, logs));
}

/// Show a compact log view embedded in a plugin panel.
pub fn show_panel_log(ui: &mut Ui, id_salt: impl std::hash::Hash, logs: &[LogEntry]) {
    ScrollArea::vertical()
        .id_salt(id_salt)
        .max_height(140.0)
        .auto_shrink([false, true])
        .stick_to_bottom(true)
        .show(ui, |ui| show_entries(ui, logs));
}

fn show_entries(ui: &mut Ui, logs: &[LogEntry]) {
    for entry in logs {
        let (prefix, color) = level_style(entry.level);

        let secs = entry
            .timestamp
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            % 86400;

        ui.horizontal(|ui| {
            ui.label(
                RichText::new(format!(
                    "{:02}:{:02}:{:02}",
                    secs / 3600,
                    (secs % 3600) / 60,
                    secs % 60
                ))
                .color(Color32::GRAY)
                .monospace()
                .size(11.0),
            );
            ui.label(RichText::new(prefix).color(color).monospace().size(11.0));
            ui.label(RichText::new(&entry.message).monospace().size(11.0));
        });
    }
}

fn level_style(level: LogLevel) -> (&'static str, Color32) {
    match level {
        LogLevel::Info => ("[INFO]", Color32::from_rgb(150, 180, 220)),
        LogLevel::Warning => ("[WARN]", Color32::from_rgb(230, 180, 50)),
        LogLevel::Error => ("[ERROR]", Color32::from_rgb(220, 60, 60)),
        LogLevel::Success => ("[OK]", Color32::from_rgb(60, 200, 80)),
    }
}
