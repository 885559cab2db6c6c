//! Periodic cleanup of expired sessions and idle rate-limit buckets.
//!
//! Both stores clean up lazily on access; the sweep bounds the memory held
//! by clients that never come back.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::events::{dispatch, LedgerEvent};
use crate::rate_limit::RateGovernor;
use crate::session::SessionStore;
use crate::ChoreError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepResult {
    pub sessions: u64,
    pub buckets: u64,
}

impl SweepResult {
    pub fn total(&self) -> u64 {
        self.sessions + self.buckets
    }
}

pub struct SweepExpiredAction<S: SessionStore> {
    sessions: S,
    governor: RateGovernor,
}

impl<S: SessionStore> SweepExpiredAction<S> {
    pub fn new(sessions: S, governor: RateGovernor) -> Self {
        Self { sessions, governor }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self), name = "sweep_expired", err)
    )]
    pub async fn execute(&self) -> Result<SweepResult, ChoreError> {
        let sessions = self.sessions.sweep_expired().await?;
        let buckets = self.governor.sweep_idle().await?;

        log::info!(
            target: "chorepool",
            "msg=\"expired state swept\", sessions={sessions}, buckets={buckets}, live_sessions={}, tracked_clients={}",
            self.sessions.len(),
            self.governor.tracked_clients()
        );

        if sessions + buckets > 0 {
            dispatch(LedgerEvent::ExpiredStateSwept {
                sessions,
                buckets,
                at: Utc::now(),
            })
            .await;
        }

        Ok(SweepResult { sessions, buckets })
    }
}

impl<S: SessionStore + 'static> SweepExpiredAction<S> {
    /// Runs the sweep every `period` on a background task. The first sweep
    /// happens one full period after the call. Failures are logged and the
    /// loop continues.
    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) = self.execute().await {
                    log::error!(target: "chorepool", "msg=\"sweep failed\", error=\"{e}\"");
                }
            }
        })
    }
}
