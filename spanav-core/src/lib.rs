pub mod direction;
pub mod participant;
pub mod phase;
pub mod stimulus;
pub mod trial;

pub use direction::{Direction, Response};
pub use participant::{Gender, Handedness, ParticipantGroup, ParticipantInfo};
pub use phase::SessionPhase;
pub use stimulus::{
    BlockSpec, CATCH_STIMULI, CatchStimulus, Difficulty, NavType, Stimulus, StimulusCatalog,
    TrialEntry,
};
pub use trial::{BlockLabel, TrialRecord, TrialState, TrialType};
