use voxdub_core::failure::FailureKind;

/// Errors from a speech service adapter.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// Network, DNS, TLS or a 5xx from the service.
    #[error("Speech service unreachable: {0}")]
    Transport(String),

    /// Credentials missing or rejected.
    #[error("Speech service rejected credentials ({status}): {body}")]
    Auth { status: u16, body: String },

    /// Rate or credit limit reached.
    #[error("Speech service quota exceeded ({status}): {body}")]
    Quota { status: u16, body: String },

    /// The operation did not finish before the deadline.
    #[error("Speech service timed out after {0} s")]
    Timeout(u64),

    /// The service refused the input (bad voice, unsupported language, ...).
    #[error("Speech service rejected the request ({status}): {body}")]
    InvalidRequest { status: u16, body: String },

    /// The service answered with something we could not interpret.
    #[error("Unexpected speech service response: {0}")]
    InvalidResponse(String),
}

impl SpeechError {
    /// Job failure category for this error.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) | Self::Auth { .. } | Self::Timeout(_) | Self::InvalidResponse(_) => {
                FailureKind::TransportError
            }
            Self::Quota { .. } => FailureKind::QuotaError,
            Self::InvalidRequest { .. } => FailureKind::ValidationError,
        }
    }
}

impl From<reqwest::Error> for SpeechError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
