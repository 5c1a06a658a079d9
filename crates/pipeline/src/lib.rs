//! Voxdub job pipeline.
//!
//! - [`ledger::JobLedger`] — the only writer of job status.
//! - [`transcription::TranscriptionProducer`] — recording to transcript.
//! - [`dubbing::DubbingProducer`] — segments to synthesized audio, cached by
//!   parameter hash.
//! - [`status::StatusQuery`] — read-only views for pollers.
//! - [`watchdog::StaleJobWatchdog`] — fails jobs stuck in `running`.
//!
//! [`Pipeline`] wires all of them from one set of dependencies.

pub mod config;
pub mod dubbing;
pub mod error;
pub mod ledger;
pub mod status;
pub mod transcription;
pub mod watchdog;

use std::sync::Arc;

use voxdub_core::voices::VoiceCatalog;
use voxdub_db::PipelineStore;
use voxdub_events::EventBus;
use voxdub_speech::{SpeechToText, TextToSpeech};
use voxdub_storage::ArtifactStore;

pub use config::PipelineConfig;
pub use dubbing::{BatchSummary, DubRecordingHandle, DubbingProducer};
pub use error::{PipelineError, PipelineResult};
pub use ledger::JobLedger;
pub use status::{SegmentListing, StatusQuery};
pub use transcription::{TranscriptionHandle, TranscriptionProducer};
pub use watchdog::StaleJobWatchdog;

/// Collaborators the pipeline runs against.
pub struct PipelineDeps {
    pub store: Arc<dyn PipelineStore>,
    pub events: Arc<EventBus>,
    pub stt: Arc<dyn SpeechToText>,
    pub tts: Arc<dyn TextToSpeech>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub voices: Arc<VoiceCatalog>,
    pub config: Arc<PipelineConfig>,
}

/// The pipeline services sharing one ledger.
#[derive(Clone)]
pub struct Pipeline {
    pub ledger: JobLedger,
    pub transcription: TranscriptionProducer,
    pub dubbing: DubbingProducer,
    pub status: StatusQuery,
}

impl Pipeline {
    pub fn new(deps: PipelineDeps) -> Self {
        let ledger = JobLedger::new(Arc::clone(&deps.store), deps.events);
        Self {
            transcription: TranscriptionProducer::new(
                ledger.clone(),
                Arc::clone(&deps.store),
                deps.stt,
                Arc::clone(&deps.config),
            ),
            dubbing: DubbingProducer::new(
                ledger.clone(),
                Arc::clone(&deps.store),
                deps.tts,
                deps.artifacts,
                Arc::clone(&deps.voices),
                Arc::clone(&deps.config),
            ),
            status: StatusQuery::new(deps.store, deps.voices, deps.config),
            ledger,
        }
    }
}
