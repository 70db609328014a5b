pub mod catalog;
pub mod config;
pub mod counterbalance;
pub mod error;
pub mod export;
pub mod identity;
pub mod pool;
pub mod presenter;
pub mod rng;
pub mod state;
pub mod summary;
pub mod transport;
pub mod training;
pub mod trial;

pub use catalog::load_catalog;
pub use config::ExperimentConfig;
pub use counterbalance::{CounterbalanceGroup, assign_group, build_block_sequence};
pub use error::{ExperimentError, TransportError};
pub use export::{export_file_name, write_records_csv, write_records_json, write_summary_csv};
pub use identity::{IdentityService, LocalIdentity, assign_participant_id_or_fallback};
pub use pool::{PreparedBlock, StimulusPool, UsageTracker, practice_entries};
pub use presenter::{Feedback, Interstitial, NullPresenter, Presenter, TrainingPrompt};
pub use rng::SessionRng;
pub use state::{SessionEvent, SessionState, SessionStateMachine, Stage};
pub use summary::SessionSummary;
pub use transport::{JsonLinesTransport, MemoryTransport, NullTransport, Transport};
pub use training::{ButtonTraining, TRAINING_TARGETS, TrainingPress};
pub use trial::{Trial, TrialDurations, TrialMachine, TrialOutcome, TrialTimestamps};
