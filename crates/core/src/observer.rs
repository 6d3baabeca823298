//! Progress observers.
//!
//! Algorithms report progress through [`Observers`]. The panel attaches a
//! [`ProgressObserver`] that forwards every event over the panel channel, so
//! algorithm code never touches panel state directly.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use crossbeam_channel::Sender;

use crate::messages::{LogEntry, PanelMessage, RunId};

/// Receives progress and log events from a running algorithm.
///
/// Implementations are called from the background context.
pub trait Observer: Send + Sync {
    fn progress(&self, percent: i32);
    fn notify(&self, message: &str);
}

/// The observer list handed to algorithms that accept it.
#[derive(Clone, Default)]
pub struct Observers(Vec<Arc<dyn Observer>>);

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observer: Arc<dyn Observer>) {
        self.0.push(observer);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn progress(&self, percent: i32) {
        for o in &self.0 {
            o.progress(percent);
        }
    }

    pub fn notify(&self, message: &str) {
        for o in &self.0 {
            o.notify(message);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Observers").field(&self.0.len()).finish()
    }
}

/// Forwards events to a panel, tagged with the current run.
///
/// Reported percentages are clamped to `0..=100` and never decrease within a
/// run; call [`begin_run`](Self::begin_run) before each run.
pub struct ProgressObserver {
    tx: Sender<PanelMessage>,
    run: AtomicU64,
    last: AtomicU8,
}

impl ProgressObserver {
    pub fn new(tx: Sender<PanelMessage>) -> Self {
        Self {
            tx,
            run: AtomicU64::new(0),
            last: AtomicU8::new(0),
        }
    }

    pub fn begin_run(&self, run: RunId) {
        self.last.store(0, Ordering::SeqCst);
        self.run.store(run, Ordering::SeqCst);
    }

    pub fn current_run(&self) -> RunId {
        self.run.load(Ordering::SeqCst)
    }
}

impl Observer for ProgressObserver {
    fn progress(&self, percent: i32) {
        let clamped = percent.clamp(0, 100) as u8;
        let previous = self.last.fetch_max(clamped, Ordering::SeqCst);
        let _ = self.tx.send(PanelMessage::Progress {
            run: self.current_run(),
            percent: previous.max(clamped),
        });
    }

    fn notify(&self, message: &str) {
        let _ = self.tx.send(PanelMessage::Log {
            run: self.current_run(),
            entry: LogEntry::info(message),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percents(rx: &crossbeam_channel::Receiver<PanelMessage>) -> Vec<u8> {
        rx.try_iter()
            .filter_map(|m| match m {
                PanelMessage::Progress { percent, .. } => Some(percent),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_progress_clamped_and_monotonic() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let obs = ProgressObserver::new(tx);
        obs.begin_run(1);
        for p in [-5, 10, 40, 20, 150] {
            obs.progress(p);
        }
        assert_eq!(percents(&rx), vec![0, 10, 40, 40, 100]);
    }

    #[test]
    fn test_begin_run_resets() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let obs = ProgressObserver::new(tx);
        obs.begin_run(1);
        obs.progress(90);
        obs.begin_run(2);
        obs.progress(5);

        let msgs: Vec<PanelMessage> = rx.try_iter().collect();
        assert_eq!(msgs.len(), 2);
        assert!(matches!(msgs[1], PanelMessage::Progress { run: 2, percent: 5 }));
    }

    #[test]
    fn test_notify_is_tagged_log() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let obs = ProgressObserver::new(tx);
        obs.begin_run(7);
        obs.notify("iteration 3");
        match rx.try_recv().unwrap() {
            PanelMessage::Log { run, entry } => {
                assert_eq!(run, 7);
                assert_eq!(entry.message, "iteration 3");
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_observer_list_broadcasts() {
        let (tx_a, rx_a) = crossbeam_channel::unbounded();
        let (tx_b, rx_b) = crossbeam_channel::unbounded();
        let mut list = Observers::new();
        list.add(Arc::new(ProgressObserver::new(tx_a)));
        list.add(Arc::new(ProgressObserver::new(tx_b)));
        list.progress(50);
        assert_eq!(percents(&rx_a), vec![50]);
        assert_eq!(percents(&rx_b), vec![50]);
    }

    #[test]
    fn test_send_after_receiver_dropped_is_silent() {
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);
        let obs = ProgressObserver::new(tx);
        obs.progress(10);
        obs.notify("nobody listening");
    }
}
