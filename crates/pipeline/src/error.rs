use voxdub_core::error::CoreError;
use voxdub_db::StoreError;

/// Errors a producer or query returns to its caller.
///
/// Adapter and artifact failures never appear here; they end up on the job
/// as a classified failure.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Core(CoreError::Validation(message.into()))
    }

    pub fn not_found(entity: &'static str, id: voxdub_core::types::DbId) -> Self {
        Self::Core(CoreError::NotFound { entity, id })
    }
}
