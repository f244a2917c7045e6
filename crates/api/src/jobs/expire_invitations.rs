//! Invitation expiry sweep.
//!
//! Persists `EXPIRED` for stored-pending invitations whose TTL has lapsed.
//! Reads already treat such invitations as expired; the sweep makes the
//! state durable and stamps the system actor.

use chrono::Utc;
use domain::services::InvitationLifecycle;
use std::time::Duration;
use tracing::info;

use super::scheduler::Job;
use crate::middleware::metrics::record_sweep;

/// Upper bound on batches per run so one run cannot monopolise the store.
const MAX_BATCHES_PER_RUN: usize = 20;

pub struct ExpireInvitationsJob {
    lifecycle: InvitationLifecycle,
    interval: Duration,
    batch_size: i64,
}

impl ExpireInvitationsJob {
    pub fn new(lifecycle: InvitationLifecycle, interval: Duration, batch_size: i64) -> Self {
        Self {
            lifecycle,
            interval,
            batch_size,
        }
    }

    /// Run batches until the backlog is drained. Returns `(expired, skipped)`.
    pub async fn sweep(&self) -> Result<(usize, usize), String> {
        let mut expired = 0;
        let mut skipped = 0;

        for _ in 0..MAX_BATCHES_PER_RUN {
            let outcome = self
                .lifecycle
                .expire_lapsed(Utc::now(), self.batch_size)
                .await
                .map_err(|e| e.to_string())?;

            expired += outcome.expired;
            skipped += outcome.skipped;

            if ((outcome.expired + outcome.skipped) as i64) < self.batch_size {
                break;
            }
        }

        Ok((expired, skipped))
    }
}

#[async_trait::async_trait]
impl Job for ExpireInvitationsJob {
    fn name(&self) -> &'static str {
        "expire_invitations"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn execute(&self) -> Result<(), String> {
        let (expired, skipped) = self.sweep().await?;
        record_sweep(expired, skipped);

        if expired > 0 || skipped > 0 {
            info!(expired, skipped, "Expired lapsed invitations");
        }
        Ok(())
    }
}
