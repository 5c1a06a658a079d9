//! Failure taxonomy for jobs.
//!
//! Adapter and storage errors never escape a job; they are classified into a
//! [`FailureKind`] and stored on the job under `payload.error` so pollers can
//! tell "no speech in the recording" apart from "speech service down".

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a job failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Adapter or network unreachable, auth failure, timeout.
    TransportError,
    /// Rate or credit limit reached on an external service.
    QuotaError,
    /// Malformed payload or rejected input.
    ValidationError,
    /// Transcription finished but produced no segments.
    EmptyResultError,
    /// Artifact or row write failed.
    StorageError,
}

impl FailureKind {
    /// Whether re-enqueueing the same request can succeed without the
    /// caller changing anything.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::TransportError | Self::QuotaError | Self::StorageError)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TransportError => "TransportError",
            Self::QuotaError => "QuotaError",
            Self::ValidationError => "ValidationError",
            Self::EmptyResultError => "EmptyResultError",
            Self::StorageError => "StorageError",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified, human-readable failure reason recorded on a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
    pub retryable: bool,
}

impl JobFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.is_retryable(),
        }
    }

    /// The "no speech" failure of a transcription job.
    pub fn empty_transcription() -> Self {
        Self::new(
            FailureKind::EmptyResultError,
            "empty transcription: the recognizer returned no segments",
        )
    }

    /// Read the failure recorded under `payload.error`, if any.
    pub fn from_payload(payload: &serde_json::Value) -> Option<Self> {
        payload
            .get("error")
            .and_then(|e| serde_json::from_value(e.clone()).ok())
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
