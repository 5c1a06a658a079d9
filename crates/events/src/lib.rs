//! Voxdub event bus.
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PipelineEvent`] — the event envelope published on every job
//!   lifecycle transition.

pub mod bus;

pub use bus::{EventBus, PipelineEvent};
