//! Review status of transcript segments and translations.
//!
//! Discriminants match the seed order of the `qc_statuses` lookup table.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::StatusId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum QcStatus {
    Pending = 1,
    Approved = 2,
    Rejected = 3,
    NeedsReview = 4,
}

impl QcStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    pub fn from_id(id: StatusId) -> Result<Self, CoreError> {
        match id {
            1 => Ok(Self::Pending),
            2 => Ok(Self::Approved),
            3 => Ok(Self::Rejected),
            4 => Ok(Self::NeedsReview),
            other => Err(CoreError::Internal(format!("Unknown qc status id {other}"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::NeedsReview => "needs_review",
        }
    }
}
