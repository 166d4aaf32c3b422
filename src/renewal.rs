//! Single-flight session renewal.
//!
//! At most one refresh call is in flight at any time. Requests that hit an
//! expired session while a refresh is running park on a FIFO wait list and
//! are released, in order, with the outcome of that refresh.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::oneshot;

use crate::client::ApiError;

pub type RenewalOutcome = Result<(), Arc<ApiError>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenewalStatus {
    #[default]
    Idle,
    Refreshing,
}

#[derive(Default)]
struct Inner {
    status: RenewalStatus,
    waiters: VecDeque<oneshot::Sender<RenewalOutcome>>,
}

#[derive(Default)]
pub struct RenewalState {
    inner: Mutex<Inner>,
}

/// What a caller should do after asking to renew the session.
pub enum Ticket<'a> {
    /// No renewal was running; the caller now owns it and must settle it.
    Lead(RenewalGuard<'a>),
    /// A renewal is already running; await its outcome.
    Wait(oneshot::Receiver<RenewalOutcome>),
}

impl RenewalState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn begin(&self) -> Ticket<'_> {
        let mut inner = self.lock();
        match inner.status {
            RenewalStatus::Idle => {
                inner.status = RenewalStatus::Refreshing;
                Ticket::Lead(RenewalGuard {
                    state: self,
                    settled: false,
                })
            }
            RenewalStatus::Refreshing => {
                let (tx, rx) = oneshot::channel();
                inner.waiters.push_back(tx);
                Ticket::Wait(rx)
            }
        }
    }

    pub fn status(&self) -> RenewalStatus {
        self.lock().status
    }

    pub fn is_refreshing(&self) -> bool {
        self.status() == RenewalStatus::Refreshing
    }

    /// Number of callers parked behind the running renewal.
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    fn reset(&self) -> VecDeque<oneshot::Sender<RenewalOutcome>> {
        let mut inner = self.lock();
        inner.status = RenewalStatus::Idle;
        std::mem::take(&mut inner.waiters)
    }
}

/// Ownership of the running renewal.
///
/// Dropping the guard without calling [`RenewalGuard::settle`] (for example
/// because the leading request was cancelled) returns the state to idle and
/// drops every parked waiter, which then observes a closed channel.
pub struct RenewalGuard<'a> {
    state: &'a RenewalState,
    settled: bool,
}

impl RenewalGuard<'_> {
    pub fn settle(mut self, outcome: RenewalOutcome) {
        self.settled = true;
        let waiters = self.state.reset();
        debug!("Releasing {} request(s) parked behind renewal", waiters.len());
        for waiter in waiters {
            // A waiter whose request was dropped meanwhile is simply skipped
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl Drop for RenewalGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let waiters = self.state.reset();
            warn!(
                "Session renewal abandoned, dropping {} waiter(s)",
                waiters.len()
            );
        }
    }
}
