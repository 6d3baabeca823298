//! Plugin controller: one runnable panel.
//!
//! Composes a [`StateWidget`], a worker on its own [`BackgroundContext`] and
//! the panel's progress/console state. All methods run on the interactive
//! side; the algorithm never touches anything here directly.
//!
//! ```text
//! Idle ──run──▶ Validating ──ok──▶ Running ──Completed──▶ Idle
//!                   │                                    ▲
//!                   └──────── rejected ──────────────────┘
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, error, info, warn};

use crate::background::BackgroundContext;
use crate::control::ValidationError;
use crate::error::Result;
use crate::messages::{LogEntry, PanelMessage, RunId};
use crate::observer::{Observers, ProgressObserver};
use crate::schema::ParameterSchema;
use crate::state::State;
use crate::viewer::{HostViewer, LayerEvent, LayerSource};
use crate::widget::{StateProvider, StateWidget};
use crate::worker::{Runnable, SchemaWorker};

/// Panel configuration.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Oldest console entries are dropped beyond this count.
    pub max_log_entries: usize,
    /// Title of the validation error dialog.
    pub error_title: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            max_log_entries: 500,
            error_title: "sdpanel error".to_string(),
        }
    }
}

/// Where the panel is in its run cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Idle,
    Running { run: RunId, started: Instant },
}

/// Result of pressing Run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunRequest {
    /// The run was dispatched to the background thread.
    Started(RunId),
    /// Validation failed; nothing was dispatched.
    Rejected(Vec<ValidationError>),
    /// A run is already in flight; the click was ignored.
    Busy,
}

/// How a finished run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Names of the layers added to the viewer.
    Succeeded { run: RunId, layers: Vec<String> },
    Failed { run: RunId, message: String },
}

/// Pending error dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDialog {
    pub title: String,
    pub message: String,
}

/// A runnable plugin panel bound to one host viewer.
pub struct PluginController {
    schema: Arc<ParameterSchema>,
    widget: StateWidget,
    viewer: Arc<dyn HostViewer>,
    layer_events: Receiver<LayerEvent>,
    rx: Receiver<PanelMessage>,
    background: BackgroundContext,
    state: PanelState,
    progress: u8,
    next_run: RunId,
    logs: Vec<LogEntry>,
    dialogs: Vec<ErrorDialog>,
    config: PanelConfig,
}

impl PluginController {
    pub fn new(schema: ParameterSchema, viewer: Arc<dyn HostViewer>) -> Result<Self> {
        Self::with_config(schema, viewer, PanelConfig::default())
    }

    pub fn with_config(
        schema: ParameterSchema,
        viewer: Arc<dyn HostViewer>,
        config: PanelConfig,
    ) -> Result<Self> {
        let schema = Arc::new(schema);
        let (tx, rx) = crossbeam_channel::unbounded();

        let observer = Arc::new(ProgressObserver::new(tx.clone()));
        let mut observers = Observers::new();
        observers.add(observer.clone());

        let layers: Arc<dyn LayerSource> = viewer.clone();
        let worker: Box<dyn Runnable> =
            Box::new(SchemaWorker::new(Arc::clone(&schema), layers).with_observers(observers));
        let background = BackgroundContext::spawn(
            format!("sdpanel-{}", schema.name()),
            worker,
            observer,
            tx,
        )?;

        let widget = StateWidget::new(&schema, &viewer.image_names());
        let layer_events = viewer.subscribe();

        let mut controller = Self {
            schema,
            widget,
            viewer,
            layer_events,
            rx,
            background,
            state: PanelState::Idle,
            progress: 0,
            next_run: 0,
            logs: Vec::new(),
            dialogs: Vec::new(),
            config,
        };
        controller.log(LogEntry::info(format!("{} ready", controller.schema.name())));
        Ok(controller)
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    pub fn widget(&self) -> &StateWidget {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut StateWidget {
        &mut self.widget
    }

    pub fn panel_state(&self) -> PanelState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, PanelState::Running { .. })
    }

    /// Progress bar value in percent.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// The console is shown together with the advanced controls.
    pub fn log_visible(&self) -> bool {
        self.widget.advanced_mode()
    }

    pub fn toggle_advanced(&mut self, enabled: bool) {
        self.widget.toggle_advanced(enabled);
    }

    /// Error dialogs raised since the last call.
    pub fn take_dialogs(&mut self) -> Vec<ErrorDialog> {
        std::mem::take(&mut self.dialogs)
    }

    fn log(&mut self, entry: LogEntry) {
        self.logs.push(entry);
        if self.logs.len() > self.config.max_log_entries {
            let excess = self.logs.len() - self.config.max_log_entries;
            self.logs.drain(..excess);
        }
    }

    /// Handle a click on Run.
    pub fn run_clicked(&mut self) -> Result<RunRequest> {
        if let PanelState::Running { run, .. } = self.state {
            warn!(plugin = self.name(), run, "run requested while busy");
            self.log(LogEntry::warning(format!(
                "{} is already running",
                self.schema.name()
            )));
            return Ok(RunRequest::Busy);
        }

        self.progress = 0;

        let errors = self.widget.validate();
        if !errors.is_empty() {
            info!(plugin = self.name(), count = errors.len(), "inputs rejected");
            for e in &errors {
                self.dialogs.push(ErrorDialog {
                    title: self.config.error_title.clone(),
                    message: e.message.clone(),
                });
                self.log(LogEntry::error(e.message.clone()));
            }
            return Ok(RunRequest::Rejected(errors));
        }

        let snapshot = self.widget.snapshot()?;
        self.next_run += 1;
        let run = self.next_run;
        self.background.submit(run, snapshot)?;
        self.state = PanelState::Running {
            run,
            started: Instant::now(),
        };

        info!(plugin = self.name(), run, "run dispatched");
        self.log(LogEntry::info(format!("Running {}...", self.schema.name())));
        Ok(RunRequest::Started(run))
    }

    /// Refresh the layer selectors from the viewer.
    pub fn on_layer_change(&mut self) {
        let names = self.viewer.image_names();
        debug!(plugin = self.name(), layers = names.len(), "refreshing layer selectors");
        self.widget.on_layer_change(&names);
    }

    /// Drain pending layer events and worker messages without blocking.
    /// Returns the outcomes of runs that finished.
    pub fn process_messages(&mut self) -> Vec<RunOutcome> {
        if self.layer_events.try_iter().count() > 0 {
            self.on_layer_change();
        }

        let mut finished = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            if let Some(outcome) = self.handle(msg) {
                finished.push(outcome);
            }
        }
        finished
    }

    /// Block until the in-flight run finishes or `timeout` elapses.
    /// Returns the outcome, or `None` when nothing finished in time.
    pub fn wait_for_completion(&mut self, timeout: Duration) -> Option<RunOutcome> {
        let deadline = Instant::now() + timeout;
        while self.is_running() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(msg) => {
                    if let Some(outcome) = self.handle(msg) {
                        return Some(outcome);
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
        None
    }

    fn handle(&mut self, msg: PanelMessage) -> Option<RunOutcome> {
        let current = match self.state {
            PanelState::Running { run, started } if run == msg.run() => Some((run, started)),
            _ => None,
        };
        let Some((run, started)) = current else {
            debug!(plugin = self.name(), run = msg.run(), "discarding stale message");
            return None;
        };

        match msg {
            PanelMessage::Progress { percent, .. } => {
                self.progress = self.progress.max(percent);
                None
            }
            PanelMessage::Log { entry, .. } => {
                self.log(entry);
                None
            }
            PanelMessage::Completed { outcome, .. } => {
                self.state = PanelState::Idle;
                let outcome = match outcome {
                    Ok(state) => {
                        let layers = self.set_outputs(state);
                        self.progress = 100;
                        info!(plugin = self.name(), run, outputs = layers.len(), "run finished");
                        self.log(LogEntry::success(format!(
                            "{} completed in {:.2?}",
                            self.schema.name(),
                            started.elapsed()
                        )));
                        RunOutcome::Succeeded { run, layers }
                    }
                    Err(e) => {
                        self.progress = 0;
                        error!(plugin = self.name(), run, "run failed: {e}");
                        self.log(LogEntry::error(format!("{}: {e}", self.schema.name())));
                        RunOutcome::Failed {
                            run,
                            message: e.to_string(),
                        }
                    }
                };
                Some(outcome)
            }
        }
    }

    /// Add every image output of a finished run to the viewer under its
    /// label. Layers take the scale of the first image input when the
    /// ranks match.
    fn set_outputs(&mut self, state: State) -> Vec<String> {
        let input_scale = state
            .layer_refs()
            .next()
            .and_then(|name| self.viewer.scale(name));

        let mut added = Vec::new();
        for (_, slot) in state.outputs {
            if !slot.kind.is_image() {
                continue;
            }
            let Some(data) = slot.data else { continue };
            let scale = input_scale
                .clone()
                .filter(|s| s.len() == data.ndim())
                .unwrap_or_else(|| vec![1.0; data.ndim()]);
            added.push(
                self.viewer
                    .add_output(data, scale, &slot.label, self.schema.name()),
            );
        }
        added
    }
}
