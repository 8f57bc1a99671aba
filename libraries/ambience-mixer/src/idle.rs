//! Inactivity timeout
//!
//! A restartable one-shot timer. Every interaction re-arms it with a full
//! timeout; if no interaction arrives before the deadline, the idle callback
//! runs exactly once. The timer does not re-arm itself after firing: the next
//! interaction starts a new window.
//!
//! Superseded timers can never fire. Each arm bumps a generation and the
//! sleeping task re-checks it under the lock before invoking the callback, so
//! a task that wakes concurrently with a `touch` is discarded.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Observable timer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleState {
    /// Not armed (never touched, or cancelled)
    Disarmed,
    /// Waiting for the deadline
    Armed {
        /// When the idle callback will run
        deadline: Instant,
    },
    /// The callback ran; waiting for the next interaction
    Fired,
}

type IdleCallback = Arc<dyn Fn() + Send + Sync>;

struct Shared {
    generation: u64,
    state: IdleState,
    task: Option<JoinHandle<()>>,
}

/// Restartable inactivity timer
pub struct IdleTimer {
    timeout: Duration,
    on_idle: IdleCallback,
    shared: Arc<Mutex<Shared>>,
}

impl IdleTimer {
    /// Create a disarmed timer
    pub fn new<F>(timeout: Duration, on_idle: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            timeout,
            on_idle: Arc::new(on_idle),
            shared: Arc::new(Mutex::new(Shared {
                generation: 0,
                state: IdleState::Disarmed,
                task: None,
            })),
        }
    }

    /// Record an interaction: (re)arm with a full timeout from now
    ///
    /// Must be called from within a Tokio runtime.
    pub fn touch(&self) {
        let mut shared = lock(&self.shared);

        shared.generation = shared.generation.wrapping_add(1);
        if let Some(task) = shared.task.take() {
            task.abort();
        }

        let generation = shared.generation;
        let deadline = Instant::now() + self.timeout;
        shared.state = IdleState::Armed { deadline };

        let weak = Arc::downgrade(&self.shared);
        let on_idle = Arc::clone(&self.on_idle);

        shared.task = Some(tokio::spawn(async move {
            sleep_until(deadline).await;

            let Some(shared) = weak.upgrade() else {
                return;
            };

            {
                let mut shared = lock(&shared);
                if shared.generation != generation {
                    return;
                }
                shared.state = IdleState::Fired;
                shared.task = None;
            }

            debug!("Idle timeout elapsed");
            on_idle();
        }));
    }

    /// Disarm without firing
    pub fn cancel(&self) {
        let mut shared = lock(&self.shared);

        shared.generation = shared.generation.wrapping_add(1);
        if let Some(task) = shared.task.take() {
            task.abort();
        }
        shared.state = IdleState::Disarmed;
    }

    /// Current timer state
    pub fn state(&self) -> IdleState {
        lock(&self.shared).state
    }

    /// Configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Drop for IdleTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for IdleTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleTimer")
            .field("timeout", &self.timeout)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::advance;

    fn counting_timer(timeout_ms: u64) -> (IdleTimer, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let timer = IdleTimer::new(Duration::from_millis(timeout_ms), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (timer, fired)
    }

    // Let spawned timer tasks observe the advanced clock
    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_timeout() {
        let (timer, fired) = counting_timer(1_000);
        timer.touch();

        advance(Duration::from_millis(999)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(timer.state(), IdleState::Fired);

        // Not re-armed automatically
        advance(Duration::from_millis(5_000)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn touch_restarts_full_window() {
        let (timer, fired) = counting_timer(1_000);
        timer.touch();

        advance(Duration::from_millis(800)).await;
        settle().await;
        timer.touch();

        advance(Duration::from_millis(800)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        advance(Duration::from_millis(200)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let (timer, fired) = counting_timer(1_000);
        timer.touch();
        timer.cancel();
        assert_eq!(timer.state(), IdleState::Disarmed);

        advance(Duration::from_millis(2_000)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn armed_state_reports_deadline() {
        let (timer, _fired) = counting_timer(1_000);
        assert_eq!(timer.state(), IdleState::Disarmed);

        let before = Instant::now();
        timer.touch();

        match timer.state() {
            IdleState::Armed { deadline } => {
                assert_eq!(deadline, before + Duration::from_millis(1_000));
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn drop_disarms() {
        let (timer, fired) = counting_timer(1_000);
        timer.touch();
        drop(timer);

        advance(Duration::from_millis(2_000)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
