//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod dub_repo;
pub mod job_repo;
pub mod recording_repo;
pub mod transcript_segment_repo;
pub mod translation_repo;

pub use dub_repo::DubRepo;
pub use job_repo::JobRepo;
pub use recording_repo::RecordingRepo;
pub use transcript_segment_repo::TranscriptSegmentRepo;
pub use translation_repo::TranslationRepo;
