//! The dedicated background thread of a plugin panel.
//!
//! One thread per panel, created with the panel and reused for every run.
//! Jobs arrive over a channel and are executed one at a time; each job ends
//! with exactly one [`PanelMessage::Completed`], even when the algorithm
//! panics.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::messages::{PanelMessage, RunId};
use crate::observer::ProgressObserver;
use crate::state::State;
use crate::worker::Runnable;

struct Job {
    run: RunId,
    state: State,
}

/// Owns the worker thread. Dropping it closes the job queue and detaches the
/// thread: an idle thread exits at once, a busy one exits when its
/// completion can no longer be delivered.
pub struct BackgroundContext {
    jobs: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundContext {
    pub fn spawn(
        name: impl Into<String>,
        mut worker: Box<dyn Runnable>,
        observer: Arc<ProgressObserver>,
        tx: Sender<PanelMessage>,
    ) -> Result<Self> {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<Job>();
        let name = name.into();

        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                while let Ok(Job { run, state }) = job_rx.recv() {
                    debug!(thread = %name, run, "job started");
                    observer.begin_run(run);
                    worker.set_state(state);

                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| worker.run()))
                        .unwrap_or_else(|payload| Err(Error::Panicked(panic_message(payload.as_ref()))));

                    if tx.send(PanelMessage::Completed { run, outcome }).is_err() {
                        warn!(thread = %name, run, "panel closed before the run finished");
                        break;
                    }
                }
                debug!(thread = %name, "worker thread exiting");
            })?;

        Ok(Self {
            jobs: Some(job_tx),
            handle: Some(handle),
        })
    }

    /// Queue a run on the worker thread.
    pub fn submit(&self, run: RunId, state: State) -> Result<()> {
        self.jobs
            .as_ref()
            .ok_or(Error::WorkerGone)?
            .send(Job { run, state })
            .map_err(|_| Error::WorkerGone)
    }

    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for BackgroundContext {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take()
            && !handle.is_finished()
        {
            debug!(thread = ?handle.thread().name(), "detaching busy worker thread");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::state::OutputSlot;

    struct Echo;

    impl Runnable for Echo {
        fn set_state(&mut self, _state: State) {}
        fn run(&mut self) -> Result<State> {
            Ok(empty_state())
        }
    }

    struct Explodes;

    impl Runnable for Explodes {
        fn set_state(&mut self, _state: State) {}
        fn run(&mut self) -> Result<State> {
            panic!("kaboom");
        }
    }

    fn empty_state() -> State {
        State {
            name: "echo".into(),
            inputs: Vec::new(),
            outputs: Vec::<(String, OutputSlot)>::new(),
        }
    }

    fn spawn(worker: Box<dyn Runnable>) -> (BackgroundContext, crossbeam_channel::Receiver<PanelMessage>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let observer = Arc::new(ProgressObserver::new(tx.clone()));
        let ctx = BackgroundContext::spawn("test-worker", worker, observer, tx).unwrap();
        (ctx, rx)
    }

    #[test]
    fn test_thread_reused_across_runs() {
        let (ctx, rx) = spawn(Box::new(Echo));
        for run in 1..=3 {
            ctx.submit(run, empty_state()).unwrap();
        }
        let runs: Vec<RunId> = (0..3)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap().run())
            .collect();
        assert_eq!(runs, vec![1, 2, 3]);
        assert!(ctx.is_alive());
    }

    #[test]
    fn test_panic_becomes_completion() {
        let (ctx, rx) = spawn(Box::new(Explodes));
        ctx.submit(9, empty_state()).unwrap();
        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            PanelMessage::Completed { run, outcome } => {
                assert_eq!(run, 9);
                assert!(matches!(outcome, Err(Error::Panicked(msg)) if msg == "kaboom"));
            }
            other => panic!("unexpected message {other:?}"),
        }
        assert!(ctx.is_alive());
    }

    struct Gated(crossbeam_channel::Receiver<()>);

    impl Runnable for Gated {
        fn set_state(&mut self, _state: State) {}
        fn run(&mut self) -> Result<State> {
            let _ = self.0.recv();
            Ok(empty_state())
        }
    }

    #[test]
    fn test_drop_does_not_wait_for_busy_thread() {
        let (release, gate) = crossbeam_channel::bounded::<()>(0);
        let (ctx, rx) = spawn(Box::new(Gated(gate)));
        ctx.submit(1, empty_state()).unwrap();

        let started = std::time::Instant::now();
        drop(ctx);
        drop(rx);
        assert!(started.elapsed() < Duration::from_millis(500));

        // Unblocks the detached run; its completion has nowhere to go.
        drop(release);
    }
}
