// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client

//! Debounce with lockout for mutating actions.
//!
//! A dragged slider can produce dozens of commands per second. The gate
//! delays each action by `delay`, lets a newer invocation replace one that
//! has not fired yet, and drops invocations arriving within `lock_duration`
//! of the end of the last execution.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

#[derive(Debug, Default)]
struct GateState {
    /// Bumped on every accepted invocation; a woken task that no longer
    /// matches was replaced.
    generation: u64,
    pending: Option<JoinHandle<()>>,
    last_execution: Option<Instant>,
}

/// Trailing-edge debounce with a lockout window.
#[derive(Debug, Clone)]
pub struct ActionGate {
    delay: Duration,
    state: Arc<Mutex<GateState>>,
}

impl ActionGate {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: Arc::new(Mutex::new(GateState::default())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `action` to run after the gate's delay.
    ///
    /// Returns `false` when the invocation was dropped because the lockout
    /// from the previous execution is still running. Must be called from
    /// within a tokio runtime.
    pub fn invoke<F, Fut>(&self, lock_duration: Duration, action: F) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut state = lock(&self.state);
        if let Some(last) = state.last_execution
            && last.elapsed() < lock_duration
        {
            debug!("Action dropped, locked for {:?} after last run", lock_duration);
            return false;
        }

        if let Some(pending) = state.pending.take() {
            debug!("Replacing pending action");
            pending.abort();
        }

        state.generation += 1;
        let generation = state.generation;
        let shared = Arc::clone(&self.state);
        let delay = self.delay;
        state.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            {
                let mut state = lock(&shared);
                if state.generation != generation {
                    return;
                }
                // past this point the action can no longer be cancelled
                state.pending = None;
            }
            action().await;
            lock(&shared).last_execution = Some(Instant::now());
        }));
        true
    }

    /// Whether an action is waiting for its delay to pass.
    pub fn is_pending(&self) -> bool {
        lock(&self.state).pending.is_some()
    }

    /// Drop the pending action, if any.
    pub fn cancel(&self) {
        if let Some(pending) = lock(&self.state).pending.take() {
            pending.abort();
        }
    }
}

fn lock(state: &Mutex<GateState>) -> MutexGuard<'_, GateState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: &Arc<AtomicUsize>, amount: usize) -> impl FnOnce() -> std::future::Ready<()> + Send + 'static {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(amount, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_action_runs_after_delay() {
        let gate = ActionGate::new(Duration::from_millis(100));
        let runs = Arc::new(AtomicUsize::new(0));

        assert!(gate.invoke(Duration::from_secs(1), counting(&runs, 1)));
        assert!(gate.is_pending());
        sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        sleep(Duration::from_millis(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!gate.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_call_wins() {
        let gate = ActionGate::new(Duration::from_millis(100));
        let total = Arc::new(AtomicUsize::new(0));

        gate.invoke(Duration::from_secs(1), counting(&total, 1));
        sleep(Duration::from_millis(40)).await;
        gate.invoke(Duration::from_secs(1), counting(&total, 10));
        sleep(Duration::from_millis(40)).await;
        gate.invoke(Duration::from_secs(1), counting(&total, 100));
        sleep(Duration::from_millis(200)).await;

        assert_eq!(total.load(Ordering::SeqCst), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lockout_drops_then_reopens() {
        let gate = ActionGate::new(Duration::from_millis(100));
        let runs = Arc::new(AtomicUsize::new(0));
        let lock_duration = Duration::from_secs(2);

        assert!(gate.invoke(lock_duration, counting(&runs, 1)));
        sleep(Duration::from_millis(150)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // within the lockout: dropped, nothing scheduled
        assert!(!gate.invoke(lock_duration, counting(&runs, 1)));
        assert!(!gate.is_pending());
        sleep(Duration::from_millis(500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // lockout over
        sleep(Duration::from_secs(2)).await;
        assert!(gate.invoke(lock_duration, counting(&runs, 1)));
        sleep(Duration::from_millis(150)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lockout_measured_from_execution_end() {
        let gate = ActionGate::new(Duration::from_millis(10));
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        gate.invoke(Duration::from_millis(100), move || async move {
            sleep(Duration::from_millis(500)).await;
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sleep(Duration::from_millis(560)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // 550ms since invocation but only ~50ms since the action finished
        assert!(!gate.invoke(Duration::from_millis(100), counting(&runs, 1)));
        sleep(Duration::from_millis(100)).await;
        assert!(gate.invoke(Duration::from_millis(100), counting(&runs, 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let gate = ActionGate::new(Duration::from_millis(100));
        let runs = Arc::new(AtomicUsize::new(0));
        gate.invoke(Duration::ZERO, counting(&runs, 1));
        gate.cancel();
        sleep(Duration::from_millis(200)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
