//! Stale-job watchdog.
//!
//! A job whose process died mid-run would otherwise stay `running`
//! forever. [`StaleJobWatchdog`] periodically fails `running` jobs that have
//! not been updated within the configured timeout, which makes them
//! eligible for re-enqueue as new jobs.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use voxdub_core::error::CoreError;
use voxdub_core::failure::{FailureKind, JobFailure};
use voxdub_db::PipelineStore;

use crate::error::PipelineResult;
use crate::ledger::JobLedger;

/// Reason recorded on jobs failed by the watchdog.
pub const STALE_JOB_MESSAGE: &str = "job exceeded running timeout";

pub struct StaleJobWatchdog {
    ledger: JobLedger,
    store: Arc<dyn PipelineStore>,
    timeout: Duration,
    interval: Duration,
}

impl StaleJobWatchdog {
    pub fn new(
        ledger: JobLedger,
        store: Arc<dyn PipelineStore>,
        timeout: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            ledger,
            store,
            timeout,
            interval,
        }
    }

    /// Sweep on every interval tick until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Stale job watchdog cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.sweep().await {
                        tracing::error!(error = %e, "Stale job sweep failed");
                    }
                }
            }
        }
    }

    /// Fail every stale `running` job. Returns how many were failed.
    pub async fn sweep(&self) -> PipelineResult<usize> {
        let timeout = chrono::Duration::from_std(self.timeout)
            .map_err(|e| CoreError::Internal(format!("Watchdog timeout out of range: {e}")))?;
        let stale = self
            .store
            .list_running_updated_before(Utc::now() - timeout)
            .await?;

        let mut failed = 0;
        for job in &stale {
            let failure = JobFailure::new(FailureKind::TransportError, STALE_JOB_MESSAGE);
            match self.ledger.fail_job(job.id, failure).await {
                Ok(_) => {
                    tracing::warn!(job_id = job.id, job_type = %job.job_type, last_update = %job.updated_at, "Failed stale job");
                    failed += 1;
                }
                // The job may have finished between the listing and the write.
                Err(e) => tracing::debug!(job_id = job.id, error = %e, "Skipped stale job"),
            }
        }

        if failed > 0 {
            tracing::info!(count = failed, "Stale job sweep complete");
        }
        Ok(failed)
    }
}
