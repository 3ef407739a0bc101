//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! ```text
//! Scheduler
//!     ├─► every minute      prune_stale_entries()   orphaned waiting entries
//!     └─► every 10 minutes  sessions.cleanup_expired() + stream_hub.cleanup()
//! ```
//!
//! A waiting entry outlives its owner only if the owning process died before
//! its drop guard ran; the pruner removes those.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info};

use crate::domains::matching::models::Withdrawal;
use crate::domains::matching::PoolError;
use crate::kernel::{BaseWaitingPool, ServerDeps};

/// Start all scheduled tasks
pub async fn start_scheduler(deps: ServerDeps) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    // Entries older than twice the wait limit have no live owner
    let stale_after = chrono::Duration::from_std(deps.coordinator.config().match_timeout * 2)?
        + chrono::Duration::minutes(1);

    let prune_deps = deps.clone();
    let prune_job = Job::new_async("0 * * * * *", move |_uuid, _lock| {
        let deps = prune_deps.clone();
        Box::pin(async move {
            let cutoff = Utc::now() - stale_after;
            match prune_stale_entries(deps.coordinator.pool().as_ref(), cutoff).await {
                Ok(0) => {}
                Ok(pruned) => info!(pruned, "pruned stale waiting entries"),
                Err(e) => error!(error = %e, "waiting pool prune failed"),
            }
        })
    })?;
    scheduler.add(prune_job).await?;

    let cleanup_deps = deps.clone();
    let cleanup_job = Job::new_async("0 */10 * * * *", move |_uuid, _lock| {
        let deps = cleanup_deps.clone();
        Box::pin(async move {
            let sessions = deps.sessions.cleanup_expired().await;
            let topics = deps.stream_hub.cleanup().await;
            debug!(sessions, topics, "expired sessions and idle topics cleaned up");
        })
    })?;
    scheduler.add(cleanup_job).await?;

    scheduler.start().await?;

    info!("Scheduled tasks started (waiting pool prune every minute, session cleanup every 10 minutes)");
    Ok(scheduler)
}

/// Remove waiting entries created before `cutoff`. Returns how many went.
pub async fn prune_stale_entries(
    pool: &dyn BaseWaitingPool,
    cutoff: DateTime<Utc>,
) -> Result<usize, PoolError> {
    let mut pruned = 0;

    for entry in pool.list().await? {
        if entry.created_at >= cutoff {
            continue;
        }

        match pool.withdraw(entry.entry_key).await? {
            Withdrawal::Removed => pruned += 1,
            Withdrawal::AlreadyMatched(_) => {
                // Claimed but never collected
                pool.remove(entry.entry_key).await?;
                pruned += 1;
            }
            Withdrawal::Absent => {}
        }
    }

    Ok(pruned)
}
