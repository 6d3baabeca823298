//! Main application: SdPanelApp implements eframe::App.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use egui_dock::{DockArea, DockState, Style, TabViewer};
use tracing::{info, warn};

use sdpanel_core::controller::{ErrorDialog, PluginController, RunOutcome, RunRequest};
use sdpanel_core::messages::LogEntry;
use sdpanel_core::registry::{find, PluginEntry};
use sdpanel_core::viewer::Viewer;
use sdpanel_library::provide_plugins;
use sdpanel_library::sample::make_sample_data;

use crate::canvas::{show_canvas, CanvasState};
use crate::dock::{create_dock_state, open_panel_tab, PanelKey, Tab};
use crate::menu::{show_menu_bar, MenuAction};
use crate::panels::console::show_console;
use crate::panels::layers::{show_layers, LayerAction};
use crate::panels::plugin_list::show_plugin_list;
use crate::panels::plugin_panel::{show_plugin_panel, PluginPanelAction};

/// Start-up choices taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub load_sample: bool,
    /// Plugin ids to open immediately.
    pub open: Vec<String>,
}

/// A plugin panel opened by the user.
struct OpenPanel {
    key: PanelKey,
    title: String,
    controller: PluginController,
}

/// The main application state.
pub struct SdPanelApp {
    dock_state: DockState<Tab>,

    /// Layers shared with every plugin panel.
    viewer: Viewer,

    /// Plugins offered by the library.
    plugins: Vec<PluginEntry>,

    panels: Vec<OpenPanel>,
    next_key: u64,

    /// Application console entries.
    logs: Vec<LogEntry>,

    /// Currently highlighted entry in the plugin list.
    selected_plugin: Option<String>,

    canvas: CanvasState,

    /// Error dialogs waiting to be acknowledged, oldest first.
    dialogs: VecDeque<ErrorDialog>,

    show_about: bool,
}

impl SdPanelApp {
    pub fn new(cc: &eframe::CreationContext<'_>, options: StartupOptions) -> Self {
        let mut visuals = egui::Visuals::dark();
        visuals.window_shadow = egui::epaint::Shadow::NONE;
        cc.egui_ctx.set_visuals(visuals);

        Self::with_options(options)
    }

    fn with_options(options: StartupOptions) -> Self {
        let mut app = Self {
            dock_state: create_dock_state(),
            viewer: Viewer::new(),
            plugins: provide_plugins(),
            panels: Vec::new(),
            next_key: 0,
            logs: Vec::new(),
            selected_plugin: None,
            canvas: CanvasState::default(),
            dialogs: VecDeque::new(),
            show_about: false,
        };

        app.logs.push(LogEntry::info("sdpanel started"));
        app.logs.push(LogEntry::info(format!(
            "{} plugins available",
            app.plugins.len()
        )));

        if options.load_sample {
            app.load_sample();
        }
        for id in &options.open {
            app.open_plugin(id);
        }

        app
    }

    fn load_sample(&mut self) {
        for sample in make_sample_data() {
            let name = self
                .viewer
                .add_layer(sample.data, sample.scale, &sample.name, None);
            self.logs.push(LogEntry::info(format!("Loaded sample: {name}")));
        }
    }

    /// Open a panel for a plugin, or log why it cannot be opened.
    fn open_plugin(&mut self, id: &str) {
        let Some(entry) = find(&self.plugins, id) else {
            warn!(plugin = id, "unknown plugin");
            self.logs.push(LogEntry::warning(format!("Unknown plugin: {id}")));
            return;
        };

        match entry.instantiate(Arc::new(self.viewer.clone())) {
            Ok(controller) => {
                self.next_key += 1;
                let key = PanelKey(self.next_key);
                self.panels.push(OpenPanel {
                    key,
                    title: entry.name.to_string(),
                    controller,
                });
                open_panel_tab(&mut self.dock_state, key);
                info!(plugin = id, "panel opened");
                self.logs.push(LogEntry::info(format!("Opened {}", entry.name)));
            }
            Err(e) => {
                self.logs
                    .push(LogEntry::error(format!("Cannot open {}: {e}", entry.name)));
            }
        }
    }

    fn close_panel(&mut self, key: PanelKey) {
        if let Some(pos) = self.panels.iter().position(|p| p.key == key) {
            let panel = self.panels.remove(pos);
            if panel.controller.is_running() {
                self.logs.push(LogEntry::warning(format!(
                    "{} closed while running; its result will be discarded",
                    panel.title
                )));
            }
            info!(panel = %panel.title, "panel closed");
        }
    }

    fn run_panel(&mut self, key: PanelKey) {
        let Some(panel) = self.panels.iter_mut().find(|p| p.key == key) else {
            return;
        };
        match panel.controller.run_clicked() {
            Ok(RunRequest::Started(_)) => {
                self.logs
                    .push(LogEntry::info(format!("Running {}...", panel.title)));
            }
            Ok(RunRequest::Rejected(errors)) => {
                self.logs.push(LogEntry::warning(format!(
                    "{}: {} invalid input(s)",
                    panel.title,
                    errors.len()
                )));
            }
            Ok(RunRequest::Busy) => {}
            Err(e) => {
                self.logs
                    .push(LogEntry::error(format!("{}: {e}", panel.title)));
            }
        }
    }

    /// Drain every panel's events. Finished runs are echoed to the app console.
    fn process_panels(&mut self) {
        for panel in &mut self.panels {
            for outcome in panel.controller.process_messages() {
                let entry = match outcome {
                    RunOutcome::Succeeded { layers, .. } => {
                        LogEntry::success(format!("{}: added {}", panel.title, layers.join(", ")))
                    }
                    RunOutcome::Failed { message, .. } => {
                        LogEntry::error(format!("{}: {message}", panel.title))
                    }
                };
                self.logs.push(entry);
            }
            self.dialogs.extend(panel.controller.take_dialogs());
        }
    }

    fn any_running(&self) -> bool {
        self.panels.iter().any(|p| p.controller.is_running())
    }

    fn apply_layer_action(&mut self, action: LayerAction) {
        let result = match action {
            LayerAction::SetVisible(name, visible) => self.viewer.set_visible(&name, visible),
            LayerAction::Select(name) => self.viewer.set_active(&name),
            LayerAction::Remove(name) => self.viewer.remove(&name).map(|layer| {
                self.logs
                    .push(LogEntry::info(format!("Removed layer: {}", layer.name)));
            }),
            LayerAction::None => Ok(()),
        };
        if let Err(e) = result {
            self.logs.push(LogEntry::error(e.to_string()));
        }
    }

    fn show_error_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = self.dialogs.front() else {
            return;
        };
        let mut acknowledged = false;
        egui::Window::new(&dialog.title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&dialog.message);
                ui.separator();
                if ui.button("OK").clicked() {
                    acknowledged = true;
                }
            });
        if acknowledged {
            self.dialogs.pop_front();
        }
    }
}

impl eframe::App for SdPanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_panels();

        // Keep polling while a background run is in flight
        if self.any_running() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            match show_menu_bar(ui, &self.plugins) {
                MenuAction::LoadSample => self.load_sample(),
                MenuAction::Exit => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
                MenuAction::ResetView => self.canvas.reset_view(),
                MenuAction::OpenPlugin(id) => self.open_plugin(&id),
                MenuAction::About => self.show_about = true,
                MenuAction::None => {}
            }
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("{} layers", self.viewer.len()));
                ui.separator();
                ui.label(format!("{} panels open", self.panels.len()));
                let running = self
                    .panels
                    .iter()
                    .filter(|p| p.controller.is_running())
                    .count();
                if running > 0 {
                    ui.separator();
                    ui.spinner();
                    ui.label(format!("{running} running"));
                }
            });
        });

        self.show_error_dialog(ctx);

        if self.show_about {
            egui::Window::new("About sdpanel")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.heading("sdpanel");
                    ui.label("Schema-driven plugin panels for image layers");
                    ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                    ui.separator();
                    ui.label(format!("{} plugins available", self.plugins.len()));
                    ui.separator();
                    if ui.button("Close").clicked() {
                        self.show_about = false;
                    }
                });
        }

        let mut tab_viewer = AppTabViewer {
            viewer: &self.viewer,
            plugins: &self.plugins,
            panels: &mut self.panels,
            logs: &self.logs,
            selected_plugin: &mut self.selected_plugin,
            canvas: &mut self.canvas,
            open_requested: None,
            run_requested: None,
            closed: Vec::new(),
            layer_action: LayerAction::None,
        };

        DockArea::new(&mut self.dock_state)
            .style(Style::from_egui(ctx.style().as_ref()))
            .show(ctx, &mut tab_viewer);

        // Extract results before dropping the borrow
        let open_requested = tab_viewer.open_requested.take();
        let run_requested = tab_viewer.run_requested.take();
        let closed = std::mem::take(&mut tab_viewer.closed);
        let layer_action = std::mem::replace(&mut tab_viewer.layer_action, LayerAction::None);
        drop(tab_viewer);

        if let Some(id) = open_requested {
            self.open_plugin(&id);
        }
        if let Some(key) = run_requested {
            self.run_panel(key);
        }
        for key in closed {
            self.close_panel(key);
        }
        self.apply_layer_action(layer_action);
    }
}

/// TabViewer implementation for egui_dock.
struct AppTabViewer<'a> {
    viewer: &'a Viewer,
    plugins: &'a [PluginEntry],
    panels: &'a mut Vec<OpenPanel>,
    logs: &'a [LogEntry],
    selected_plugin: &'a mut Option<String>,
    canvas: &'a mut CanvasState,
    open_requested: Option<String>,
    run_requested: Option<PanelKey>,
    closed: Vec<PanelKey>,
    layer_action: LayerAction,
}

impl TabViewer for AppTabViewer<'_> {
    type Tab = Tab;

    fn title(&mut self, tab: &mut Self::Tab) -> egui::WidgetText {
        match tab {
            Tab::Canvas => "Canvas".into(),
            Tab::Plugins => "Plugins".into(),
            Tab::Layers => "Layers".into(),
            Tab::Console => "Console".into(),
            Tab::Plugin(key) => self
                .panels
                .iter()
                .find(|p| p.key == *key)
                .map(|p| p.title.clone())
                .unwrap_or_else(|| "Closed".to_string())
                .into(),
        }
    }

    fn id(&mut self, tab: &mut Self::Tab) -> egui::Id {
        egui::Id::new(*tab)
    }

    fn ui(&mut self, ui: &mut egui::Ui, tab: &mut Self::Tab) {
        match tab {
            Tab::Canvas => {
                let active = self.viewer.active().and_then(|name| self.viewer.get(&name));
                show_canvas(ui, active.as_ref(), self.canvas);
            }
            Tab::Plugins => {
                if let Some(id) = show_plugin_list(ui, self.plugins, self.selected_plugin) {
                    self.open_requested = Some(id);
                }
            }
            Tab::Layers => {
                self.layer_action = show_layers(ui, self.viewer);
            }
            Tab::Console => {
                show_console(ui, self.logs);
            }
            Tab::Plugin(key) => {
                let Some(panel) = self.panels.iter_mut().find(|p| p.key == *key) else {
                    ui.label("Panel closed.");
                    return;
                };
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        if let PluginPanelAction::Run =
                            show_plugin_panel(ui, &panel.title, &mut panel.controller)
                        {
                            self.run_requested = Some(panel.key);
                        }
                    });
            }
        }
    }

    fn closeable(&mut self, tab: &mut Self::Tab) -> bool {
        tab.is_closeable()
    }

    fn on_close(&mut self, tab: &mut Self::Tab) -> bool {
        if let Tab::Plugin(key) = tab {
            self.closed.push(*key);
        }
        true
    }
}
