//! Voxdub domain core.
//!
//! Pure types and algorithms shared by every other crate: identifiers,
//! the job state machine, the failure taxonomy, segment timeline
//! algorithms, dub cache hashing and the voice catalog. Nothing in this
//! crate performs I/O.

pub mod env;
pub mod error;
pub mod estimation;
pub mod failure;
pub mod hashing;
pub mod job;
pub mod job_events;
pub mod language;
pub mod qc_status;
pub mod timeline;
pub mod types;
pub mod voices;
