//! Job types and the job lifecycle state machine.
//!
//! Every status change of a job goes through [`JobStatus::plan_transition`].
//! Repositories only persist what this function decided; no caller writes a
//! status value directly.
//!
//! ```text
//! queued ──> running ──> completed
//!    │          │
//!    └──────────┴──────> failed
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::StatusId;

// ---------------------------------------------------------------------------
// Job type
// ---------------------------------------------------------------------------

/// Kind of background work a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Transcription,
    Dubbing,
}

impl JobType {
    /// Value stored in the `jobs.job_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transcription => "transcription",
            Self::Dubbing => "dubbing",
        }
    }

    /// Parse from the `jobs.job_type` column.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "transcription" => Ok(Self::Transcription),
            "dubbing" => Ok(Self::Dubbing),
            other => Err(CoreError::Validation(format!("Unknown job type '{other}'"))),
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job status
// ---------------------------------------------------------------------------

/// Job execution status.
///
/// Discriminants match the seed order of the `job_statuses` lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum JobStatus {
    Queued = 1,
    Running = 2,
    Completed = 3,
    Failed = 4,
}

/// Outcome of planning a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Target equals the current status; nothing to write.
    Unchanged,
    /// The change is legal and must be persisted.
    Apply { from: JobStatus, to: JobStatus },
}

impl JobStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Map a `job_statuses.id` back to the enum.
    pub fn from_id(id: StatusId) -> Result<Self, CoreError> {
        match id {
            1 => Ok(Self::Queued),
            2 => Ok(Self::Running),
            3 => Ok(Self::Completed),
            4 => Ok(Self::Failed),
            other => Err(CoreError::Internal(format!("Unknown job status id {other}"))),
        }
    }

    /// Lower-case name, matching `job_statuses.name`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Completed and failed jobs are immutable.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `self -> to` is an edge of the state machine.
    pub fn can_transition_to(self, to: JobStatus) -> bool {
        matches!(
            (self, to),
            (Self::Queued, Self::Running)
                | (Self::Queued, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }

    /// Decide whether moving from `self` to `to` is a no-op, a legal
    /// transition, or an error.
    ///
    /// Repeating the current status is always a no-op so retried writes of
    /// the same transition are safe, including on terminal jobs.
    pub fn plan_transition(self, to: JobStatus) -> Result<Transition, CoreError> {
        if self == to {
            return Ok(Transition::Unchanged);
        }
        if self.can_transition_to(to) {
            Ok(Transition::Apply { from: self, to })
        } else {
            Err(CoreError::InvalidTransition { from: self, to })
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
