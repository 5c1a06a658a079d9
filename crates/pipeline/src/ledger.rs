//! Job ledger service.
//!
//! Every job status change in the system goes through [`JobLedger`]. It
//! asks [`JobStatus::plan_transition`] whether the change is legal, persists
//! it with a compare-and-set on the previous status, and publishes one
//! [`PipelineEvent`] per applied transition (and per creation).

use std::sync::Arc;

use serde_json::Value;
use voxdub_core::error::CoreError;
use voxdub_core::failure::JobFailure;
use voxdub_core::job::{JobStatus, JobType, Transition};
use voxdub_core::job_events::{event_for_status, ENTITY_JOB};
use voxdub_core::types::DbId;
use voxdub_db::models::job::{CreateJob, Job, JobStatusUpdate};
use voxdub_db::PipelineStore;
use voxdub_events::{EventBus, PipelineEvent};

use crate::error::{PipelineError, PipelineResult};

#[derive(Clone)]
pub struct JobLedger {
    store: Arc<dyn PipelineStore>,
    events: Arc<EventBus>,
}

impl JobLedger {
    pub fn new(store: Arc<dyn PipelineStore>, events: Arc<EventBus>) -> Self {
        Self { store, events }
    }

    /// Insert a `queued` job and announce it.
    pub async fn create_job(&self, job_type: JobType, payload: Value) -> PipelineResult<Job> {
        let job = self
            .store
            .insert_job(&CreateJob { job_type, payload })
            .await?;
        tracing::debug!(job_id = job.id, job_type = %job_type, "Job queued");
        self.publish(&job, JobStatus::Queued);
        Ok(job)
    }

    pub async fn get_job(&self, id: DbId) -> PipelineResult<Job> {
        self.store
            .find_job(id)
            .await?
            .ok_or(PipelineError::not_found("Job", id))
    }

    /// Move a job to `status`.
    ///
    /// Re-requesting the current status returns the job unchanged without
    /// an event. `failure`, when given, is recorded under `payload.error`.
    pub async fn advance_job(
        &self,
        id: DbId,
        status: JobStatus,
        failure: Option<JobFailure>,
    ) -> PipelineResult<Job> {
        let job = self.get_job(id).await?;
        let payload = match failure {
            Some(failure) => with_field(job.payload.clone(), "error", to_value(&failure)?),
            None => job.payload.clone(),
        };
        self.transition(job, status, payload).await
    }

    /// Mark a job `completed`, recording `result` under `payload.result`.
    pub async fn complete_job(&self, id: DbId, result: Value) -> PipelineResult<Job> {
        let job = self.get_job(id).await?;
        let payload = with_field(job.payload.clone(), "result", result);
        self.transition(job, JobStatus::Completed, payload).await
    }

    /// Mark a job `failed` with a classified reason.
    pub async fn fail_job(&self, id: DbId, failure: JobFailure) -> PipelineResult<Job> {
        self.advance_job(id, JobStatus::Failed, Some(failure)).await
    }

    async fn transition(&self, job: Job, to: JobStatus, payload: Value) -> PipelineResult<Job> {
        let current = job.status()?;
        let from = match current.plan_transition(to)? {
            Transition::Unchanged => return Ok(job),
            Transition::Apply { from, .. } => from,
        };

        let update = JobStatusUpdate {
            status: to,
            payload,
            mark_completed: to == JobStatus::Completed,
        };
        let updated = self
            .store
            .update_job_status(job.id, from, &update)
            .await?
            .ok_or_else(|| {
                CoreError::Conflict(format!(
                    "Job {} changed status while moving {from} -> {to}",
                    job.id
                ))
            })?;

        tracing::info!(job_id = updated.id, %from, %to, "Job transitioned");
        self.publish(&updated, to);
        Ok(updated)
    }

    fn publish(&self, job: &Job, status: JobStatus) {
        let mut payload = serde_json::json!({
            "job_type": job.job_type,
            "status": status.as_str(),
        });
        if let Some(error) = job.payload.get("error").filter(|_| status == JobStatus::Failed) {
            payload["error"] = error.clone();
        }
        self.events.publish(
            PipelineEvent::new(event_for_status(status))
                .with_source(ENTITY_JOB, job.id)
                .with_payload(payload),
        );
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> PipelineResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize job payload: {e}")).into())
}

/// Set `key` on an object payload; a non-object payload is replaced.
fn with_field(mut payload: Value, key: &str, value: Value) -> Value {
    match payload.as_object_mut() {
        Some(map) => {
            map.insert(key.to_string(), value);
            payload
        }
        None => serde_json::json!({ key: value }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use tokio::sync::broadcast::error::TryRecvError;
    use voxdub_core::failure::FailureKind;
    use voxdub_db::InMemoryStore;

    use super::*;

    fn ledger() -> (JobLedger, Arc<EventBus>) {
        let events = Arc::new(EventBus::default());
        (
            JobLedger::new(Arc::new(InMemoryStore::new()), Arc::clone(&events)),
            events,
        )
    }

    #[tokio::test]
    async fn create_publishes_queued_event() {
        let (ledger, events) = ledger();
        let mut rx = events.subscribe();

        let job = ledger
            .create_job(JobType::Transcription, serde_json::json!({ "recording_id": 3 }))
            .await
            .unwrap();

        assert_eq!(job.status().unwrap(), JobStatus::Queued);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.event_type, "job.queued");
        assert_eq!(event.job_id(), Some(job.id));
        assert_eq!(event.payload["job_type"], "transcription");
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() {
        let (ledger, _) = ledger();
        assert_matches!(
            ledger.advance_job(77, JobStatus::Running, None).await,
            Err(PipelineError::Core(CoreError::NotFound { entity: "Job", id: 77 }))
        );
    }

    #[tokio::test]
    async fn same_state_advance_is_a_silent_no_op() {
        let (ledger, events) = ledger();
        let job = ledger
            .create_job(JobType::Dubbing, serde_json::json!({}))
            .await
            .unwrap();
        let running = ledger.advance_job(job.id, JobStatus::Running, None).await.unwrap();

        let mut rx = events.subscribe();
        let again = ledger.advance_job(job.id, JobStatus::Running, None).await.unwrap();

        assert_eq!(again.updated_at, running.updated_at);
        assert_matches!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn terminal_jobs_reject_other_states() {
        let (ledger, _) = ledger();
        let job = ledger
            .create_job(JobType::Dubbing, serde_json::json!({}))
            .await
            .unwrap();
        ledger.advance_job(job.id, JobStatus::Running, None).await.unwrap();
        ledger
            .complete_job(job.id, serde_json::json!({ "dub_id": 1 }))
            .await
            .unwrap();

        assert_matches!(
            ledger
                .fail_job(job.id, JobFailure::new(FailureKind::TransportError, "late"))
                .await,
            Err(PipelineError::Core(CoreError::InvalidTransition {
                from: JobStatus::Completed,
                to: JobStatus::Failed
            }))
        );
        assert_matches!(
            ledger.advance_job(job.id, JobStatus::Running, None).await,
            Err(PipelineError::Core(CoreError::InvalidTransition { .. }))
        );
    }

    #[tokio::test]
    async fn queued_cannot_complete_directly() {
        let (ledger, _) = ledger();
        let job = ledger
            .create_job(JobType::Transcription, serde_json::json!({}))
            .await
            .unwrap();
        assert_matches!(
            ledger.complete_job(job.id, serde_json::json!({})).await,
            Err(PipelineError::Core(CoreError::InvalidTransition { .. }))
        );
    }

    #[tokio::test]
    async fn completed_at_is_set_only_on_completion() {
        let (ledger, _) = ledger();
        let ok = ledger
            .create_job(JobType::Dubbing, serde_json::json!({ "segment_id": 1 }))
            .await
            .unwrap();
        let running = ledger.advance_job(ok.id, JobStatus::Running, None).await.unwrap();
        assert!(running.completed_at.is_none());
        let done = ledger
            .complete_job(ok.id, serde_json::json!({ "dub_id": 9 }))
            .await
            .unwrap();
        assert!(done.completed_at.is_some());
        assert_eq!(done.payload["result"]["dub_id"], 9);
        assert_eq!(done.payload["segment_id"], 1);

        let bad = ledger
            .create_job(JobType::Dubbing, serde_json::json!({}))
            .await
            .unwrap();
        let failed = ledger
            .fail_job(bad.id, JobFailure::new(FailureKind::ValidationError, "malformed"))
            .await
            .unwrap();
        assert!(failed.completed_at.is_none());
        assert_eq!(failed.failure().unwrap().kind, FailureKind::ValidationError);
    }

    #[tokio::test]
    async fn every_transition_publishes_one_event() {
        let (ledger, events) = ledger();
        let mut rx = events.subscribe();

        let job = ledger
            .create_job(JobType::Transcription, serde_json::json!({}))
            .await
            .unwrap();
        ledger.advance_job(job.id, JobStatus::Running, None).await.unwrap();
        ledger
            .fail_job(job.id, JobFailure::empty_transcription())
            .await
            .unwrap();

        let names: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.event_type)
            .collect();
        assert_eq!(names, ["job.queued", "job.running", "job.failed"]);
    }

    #[tokio::test]
    async fn failed_event_carries_the_error() {
        let (ledger, events) = ledger();
        let job = ledger
            .create_job(JobType::Transcription, serde_json::json!({}))
            .await
            .unwrap();
        let mut rx = events.subscribe();
        ledger
            .fail_job(job.id, JobFailure::new(FailureKind::QuotaError, "credits"))
            .await
            .unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.payload["status"], "failed");
        assert_eq!(event.payload["error"]["kind"], "QuotaError");
        assert_eq!(event.payload["error"]["retryable"], true);
    }

    #[test]
    fn with_field_replaces_non_object_payloads() {
        let value = with_field(serde_json::json!("raw"), "result", serde_json::json!(1));
        assert_eq!(value, serde_json::json!({ "result": 1 }));
    }
}
