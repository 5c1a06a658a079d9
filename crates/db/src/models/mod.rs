//! Row models and DTOs, one module per table.

pub mod dub;
pub mod job;
pub mod recording;
pub mod transcript_segment;
pub mod translation;
