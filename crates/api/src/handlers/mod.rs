pub mod events;
pub mod jobs;
pub mod recordings;
pub mod voices;
