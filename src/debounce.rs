//! Trailing-edge debouncing with an optional max-wait ceiling.
//!
//! Each [`Debouncer`] owns its own worker thread and timer state, so
//! independent pipeline stages never share hidden timers and tests can
//! construct fresh instances. `poke()` records an input change; the
//! callback fires on the worker once input has been quiet for `wait`,
//! or unconditionally once `max_wait` has elapsed since the first
//! unflushed poke.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// When a debounced action fires relative to its input signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncePolicy {
    /// Trailing quiet window: the action fires this long after the last poke.
    pub wait: Duration,
    /// Hard staleness ceiling: with continuous pokes, the action still
    /// fires this long after the first unflushed poke.
    pub max_wait: Option<Duration>,
}

impl DebouncePolicy {
    pub fn trailing(wait_ms: u64) -> Self {
        Self {
            wait: Duration::from_millis(wait_ms),
            max_wait: None,
        }
    }

    pub fn with_max_wait(wait_ms: u64, max_wait_ms: u64) -> Self {
        Self {
            wait: Duration::from_millis(wait_ms),
            max_wait: Some(Duration::from_millis(max_wait_ms)),
        }
    }
}

enum Signal {
    Poke,
    Flush(Sender<()>),
    Dispose,
}

#[derive(Clone, Copy)]
struct Pending {
    first: Instant,
    last: Instant,
}

/// Cheap cloneable handle for signalling input changes from subscribers.
#[derive(Clone)]
pub struct DebounceHandle {
    tx: Sender<Signal>,
}

impl DebounceHandle {
    pub fn poke(&self) {
        let _ = self.tx.send(Signal::Poke);
    }
}

/// A debounced action with an `init`/`dispose` lifecycle.
///
/// The callback runs on the worker thread; it must not call back into
/// this debouncer.
pub struct Debouncer {
    tx: Sender<Signal>,
    worker: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new<F>(policy: DebouncePolicy, mut callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Signal>();

        let worker = thread::spawn(move || {
            let mut pending: Option<Pending> = None;
            loop {
                let signal = if let Some(p) = pending {
                    let now = Instant::now();
                    let mut deadline = p.last + policy.wait;
                    if let Some(max_wait) = policy.max_wait {
                        deadline = deadline.min(p.first + max_wait);
                    }
                    if deadline <= now {
                        pending = None;
                        callback();
                        continue;
                    }
                    match rx.recv_timeout(deadline - now) {
                        Ok(signal) => signal,
                        Err(RecvTimeoutError::Timeout) => {
                            pending = None;
                            callback();
                            continue;
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                } else {
                    match rx.recv() {
                        Ok(signal) => signal,
                        Err(_) => break,
                    }
                };

                match signal {
                    Signal::Poke => {
                        let now = Instant::now();
                        match pending.as_mut() {
                            Some(p) => p.last = now,
                            None => {
                                pending = Some(Pending { first: now, last: now });
                            }
                        }
                    }
                    Signal::Flush(ack) => {
                        if pending.take().is_some() {
                            callback();
                        }
                        let _ = ack.send(());
                    }
                    Signal::Dispose => break,
                }
            }
        });

        Self {
            tx,
            worker: Some(worker),
        }
    }

    /// Handle for signalling input changes; safe to hold in subscriber
    /// closures after the debouncer itself moves elsewhere.
    pub fn handle(&self) -> DebounceHandle {
        DebounceHandle {
            tx: self.tx.clone(),
        }
    }

    /// Record an input change.
    pub fn poke(&self) {
        let _ = self.tx.send(Signal::Poke);
    }

    /// Force any pending action to run now, and wait for it to finish.
    /// A no-op when nothing is pending.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.tx.send(Signal::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    /// Stop the worker, discarding any pending action.
    pub fn dispose(&mut self) {
        let _ = self.tx.send(Signal::Dispose);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(policy: DebouncePolicy) -> (Debouncer, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let debouncer = Debouncer::new(policy, move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        (debouncer, count)
    }

    #[test]
    fn burst_of_pokes_coalesces_to_one_fire() {
        let (debouncer, count) = counting(DebouncePolicy::trailing(80));

        // Ten edits, all well inside the quiet window of the previous one.
        for _ in 0..10 {
            debouncer.poke();
            thread::sleep(Duration::from_millis(15));
        }
        assert_eq!(count.load(Ordering::SeqCst), 0, "fired during the burst");

        thread::sleep(Duration::from_millis(250));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn continuous_pokes_hit_the_max_wait_ceiling() {
        let (debouncer, count) = counting(DebouncePolicy::with_max_wait(80, 200));

        // Poke every 15ms for ~600ms: the quiet window never elapses, so
        // every fire in this span is a forced max-wait flush.
        for _ in 0..40 {
            debouncer.poke();
            thread::sleep(Duration::from_millis(15));
        }
        assert!(
            count.load(Ordering::SeqCst) >= 2,
            "max-wait never forced a fire: {}",
            count.load(Ordering::SeqCst)
        );
    }

    #[test]
    fn quiet_input_never_fires() {
        let (_debouncer, count) = counting(DebouncePolicy::trailing(20));
        thread::sleep(Duration::from_millis(100));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn flush_runs_pending_action_synchronously() {
        let (debouncer, count) = counting(DebouncePolicy::trailing(10_000));
        debouncer.poke();
        debouncer.flush();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn flush_without_pending_is_a_noop() {
        let (debouncer, count) = counting(DebouncePolicy::trailing(10));
        debouncer.flush();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dispose_discards_pending_action() {
        let (mut debouncer, count) = counting(DebouncePolicy::trailing(30));
        debouncer.poke();
        debouncer.dispose();
        thread::sleep(Duration::from_millis(80));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handle_pokes_after_move() {
        let (debouncer, count) = counting(DebouncePolicy::trailing(20));
        let handle = debouncer.handle();
        thread::spawn(move || handle.poke()).join().unwrap();
        thread::sleep(Duration::from_millis(100));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
