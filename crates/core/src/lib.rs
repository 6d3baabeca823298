//! # sdpanel core
//!
//! Schema-driven plugin panels for an image viewer.
//!
//! This crate provides:
//! - `ParameterSchema`: declarative description of an operation
//! - `Control` / `StateWidget`: input controls built from a schema
//! - `State`: the typed per-run snapshot
//! - `SchemaWorker` and `BackgroundContext`: off-thread execution
//! - `ProgressObserver`: progress and log events from algorithm code
//! - `PluginController`: the run/progress panel tying it together
//! - `Viewer`: an in-memory host layer registry
//! - `PluginEntry`: the registration hook used by algorithm libraries

pub mod background;
pub mod call;
pub mod control;
pub mod controller;
pub mod error;
pub mod messages;
pub mod observer;
pub mod registry;
pub mod schema;
pub mod state;
pub mod value;
pub mod viewer;
pub mod widget;
pub mod worker;

pub use call::{AlgorithmOutput, Argument, Arguments};
pub use controller::{PanelConfig, PanelState, PluginController, RunOutcome, RunRequest};
pub use error::{Error, Result};
pub use registry::PluginEntry;
pub use schema::{InputDef, OutputDef, ParamType, ParameterSchema};
pub use state::{ImageArray, State};
pub use value::ParamValue;
pub use viewer::{HostViewer, LayerSource, Viewer};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::call::{AlgorithmOutput, Arguments};
    pub use crate::control::{Axis, Control, ControlKind, ValidationError};
    pub use crate::controller::{PanelConfig, PanelState, PluginController, RunOutcome, RunRequest};
    pub use crate::error::{Error, Result};
    pub use crate::messages::{LogEntry, LogLevel};
    pub use crate::observer::{Observer, Observers};
    pub use crate::registry::PluginEntry;
    pub use crate::schema::{DefaultValue, InputDef, OutputDef, ParamType, ParameterSchema};
    pub use crate::state::{ImageArray, OutputSlot, State};
    pub use crate::value::ParamValue;
    pub use crate::viewer::{HostViewer, LayerSource, Viewer};
    pub use crate::widget::{StateProvider, StateWidget};
}
