//! Bounded background polling for results the backend computes lazily
//! (channel insights, outlier lists).

use std::{fmt::Display, future::Future, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::{client::ApiError, config::Config};

/// An error from one poll attempt. Terminal errors end the poll at once;
/// anything else counts as a failed attempt.
pub trait PollError: Display {
    fn is_terminal(&self) -> bool {
        false
    }
}

impl PollError for ApiError {
    /// Once renewal has failed the user is sent to log in, so polling on
    /// would only start another renewal.
    fn is_terminal(&self) -> bool {
        self.is_session_expired()
    }
}

impl PollError for String {}

impl PollError for &str {}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    Ready(T),
    /// Every attempt came back pending or failed.
    Exhausted { attempts: u32 },
    /// A terminal error ended the poll.
    Failed(String),
    Stopped,
}

impl<T> PollOutcome<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            PollOutcome::Ready(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for Poller {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Poller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.poll_interval, config.poll_attempts)
    }

    /// Calls `fetch` right away and then once per interval until it yields
    /// `Some`, the attempts run out, a terminal error comes back, or the
    /// handle is stopped or dropped.
    pub fn start<T, E, F, Fut>(&self, mut fetch: F) -> PollHandle<T>
    where
        T: Send + 'static,
        E: PollError + Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Option<T>, E>> + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let Poller {
            interval,
            max_attempts,
        } = *self;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            for attempt in 1..=max_attempts {
                tokio::select! {
                    _ = cancelled.cancelled() => return PollOutcome::Stopped,
                    _ = ticker.tick() => {}
                }

                let result = tokio::select! {
                    _ = cancelled.cancelled() => return PollOutcome::Stopped,
                    result = fetch() => result,
                };

                match result {
                    Ok(Some(value)) => {
                        debug!("poll ready after {} attempt(s)", attempt);
                        return PollOutcome::Ready(value);
                    }
                    Ok(None) => debug!("poll attempt {}/{} still pending", attempt, max_attempts),
                    Err(e) if e.is_terminal() => {
                        warn!("poll attempt {}/{} failed, giving up: {}", attempt, max_attempts, e);
                        return PollOutcome::Failed(e.to_string());
                    }
                    Err(e) => warn!("poll attempt {}/{} failed: {}", attempt, max_attempts, e),
                }
            }

            info!("poll gave up after {} attempts", max_attempts);
            PollOutcome::Exhausted {
                attempts: max_attempts,
            }
        });

        PollHandle {
            guard: token.clone().drop_guard(),
            token,
            task,
        }
    }
}

/// A running poll. Dropping the handle stops it.
pub struct PollHandle<T> {
    token: CancellationToken,
    guard: DropGuard,
    task: JoinHandle<PollOutcome<T>>,
}

impl<T> PollHandle<T> {
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) -> PollOutcome<T> {
        let PollHandle { guard, task, .. } = self;
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("poll task ended abnormally: {}", e);
                PollOutcome::Stopped
            }
        };
        drop(guard);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    use super::*;

    fn counter() -> Arc<AtomicU32> {
        Arc::new(AtomicU32::new(0))
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_first_ready_value() {
        let calls = counter();
        let seen = calls.clone();
        let handle = Poller::new(Duration::from_secs(5), 12).start(move || {
            let n = seen.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok::<_, String>(if n == 3 { Some(n) } else { None }) }
        });

        assert_eq!(handle.join().await, PollOutcome::Ready(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = counter();
        let seen = calls.clone();
        let started = tokio::time::Instant::now();
        let handle = Poller::new(Duration::from_secs(5), 4).start(move || {
            seen.fetch_add(1, Ordering::SeqCst);
            async { Ok::<Option<()>, String>(None) }
        });

        assert_eq!(handle.join().await, PollOutcome::Exhausted { attempts: 4 });
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // first call is immediate, the other three are one interval apart
        assert_eq!(started.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn errors_count_as_attempts() {
        let calls = counter();
        let seen = calls.clone();
        let handle = Poller::new(Duration::from_secs(1), 3).start(move || {
            seen.fetch_add(1, Ordering::SeqCst);
            async { Err::<Option<()>, _>("backend unavailable") }
        });

        assert_eq!(handle.join().await, PollOutcome::Exhausted { attempts: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    struct Fatal;

    impl Display for Fatal {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("signed out")
        }
    }

    impl PollError for Fatal {
        fn is_terminal(&self) -> bool {
            true
        }
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_error_ends_polling() {
        let calls = counter();
        let seen = calls.clone();
        let handle = Poller::new(Duration::from_secs(1), 12).start(move || {
            let n = seen.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 2 {
                    Err(Fatal)
                } else {
                    Ok::<Option<()>, _>(None)
                }
            }
        });

        assert_eq!(handle.join().await, PollOutcome::Failed("signed out".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_pending_poll() {
        let calls = counter();
        let seen = calls.clone();
        let handle = Poller::new(Duration::from_secs(5), 12).start(move || {
            seen.fetch_add(1, Ordering::SeqCst);
            async { Ok::<Option<()>, String>(None) }
        });

        tokio::time::sleep(Duration::from_secs(6)).await;
        handle.stop();
        assert_eq!(handle.join().await, PollOutcome::Stopped);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_polling() {
        let calls = counter();
        let seen = calls.clone();
        let handle = Poller::new(Duration::from_secs(5), 12).start(move || {
            seen.fetch_add(1, Ordering::SeqCst);
            async { Ok::<Option<()>, String>(None) }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
