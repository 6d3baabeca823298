//! Workers run an algorithm against a state snapshot.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::call::Arguments;
use crate::error::{Error, Result};
use crate::observer::Observers;
use crate::schema::ParameterSchema;
use crate::state::State;
use crate::viewer::LayerSource;

/// Executes one run. Called only from the background context.
pub trait Runnable: Send {
    /// Hand over the snapshot for the next [`run`](Self::run).
    fn set_state(&mut self, state: State);

    /// Run the algorithm and return the state with its output slots filled.
    fn run(&mut self) -> Result<State>;
}

/// Worker driven entirely by a [`ParameterSchema`].
pub struct SchemaWorker {
    schema: Arc<ParameterSchema>,
    layers: Arc<dyn LayerSource>,
    observers: Observers,
    state: Option<State>,
}

impl SchemaWorker {
    pub fn new(schema: Arc<ParameterSchema>, layers: Arc<dyn LayerSource>) -> Self {
        Self {
            schema,
            layers,
            observers: Observers::new(),
            state: None,
        }
    }

    /// Observers passed to schemas that accept them.
    pub fn with_observers(mut self, observers: Observers) -> Self {
        self.observers = observers;
        self
    }
}

impl Runnable for SchemaWorker {
    fn set_state(&mut self, state: State) {
        self.state = Some(state);
    }

    fn run(&mut self) -> Result<State> {
        let mut state = self.state.take().ok_or(Error::MissingState)?;
        let start = Instant::now();

        let observers = self
            .schema
            .accepts_observers()
            .then(|| self.observers.clone());
        let args = Arguments::resolve(&state, self.layers.as_ref(), observers)?;

        let results = self.schema.call(&args)?.into_results(state.outputs.len())?;
        for ((_, slot), data) in state.outputs.iter_mut().zip(results) {
            slot.data = Some(data);
        }

        debug!(
            schema = self.schema.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "worker finished"
        );
        Ok(state)
    }
}
