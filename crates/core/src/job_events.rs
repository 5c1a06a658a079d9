//! Event names published on the event bus for job lifecycle transitions.
//!
//! Emitted by the job ledger; consumed by the server-sent-event stream and
//! any future push channel.

/// A job row was created in `queued`.
pub const EVENT_JOB_QUEUED: &str = "job.queued";

/// A worker picked the job up.
pub const EVENT_JOB_RUNNING: &str = "job.running";

/// Job completed successfully.
pub const EVENT_JOB_COMPLETED: &str = "job.completed";

/// Job failed; the payload carries the classified reason.
pub const EVENT_JOB_FAILED: &str = "job.failed";

/// Source entity type attached to job events.
pub const ENTITY_JOB: &str = "job";

/// Event name for a job entering `status`.
pub fn event_for_status(status: crate::job::JobStatus) -> &'static str {
    use crate::job::JobStatus;
    match status {
        JobStatus::Queued => EVENT_JOB_QUEUED,
        JobStatus::Running => EVENT_JOB_RUNNING,
        JobStatus::Completed => EVENT_JOB_COMPLETED,
        JobStatus::Failed => EVENT_JOB_FAILED,
    }
}
