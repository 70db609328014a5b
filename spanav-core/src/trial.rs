use crate::direction::{Direction, Response};
use crate::participant::{Gender, Handedness, ParticipantGroup};
use crate::stimulus::{Difficulty, NavType};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Trial lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrialState {
    #[default]
    Idle,
    Fixation,
    AwaitingResponse,
    Scoring,
    Feedback,
    InterTrialInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialType {
    Regular,
    Catch,
}

impl TrialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrialType::Regular => "regular",
            TrialType::Catch => "catch",
        }
    }
}

/// `practice`, or the 1-based number of a main block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockLabel {
    Practice,
    Block(usize),
}

impl BlockLabel {
    pub fn is_practice(&self) -> bool {
        matches!(self, BlockLabel::Practice)
    }
}

impl fmt::Display for BlockLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockLabel::Practice => f.write_str("practice"),
            BlockLabel::Block(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for BlockLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BlockLabel::Practice => serializer.serialize_str("practice"),
            BlockLabel::Block(n) => serializer.serialize_u64(*n as u64),
        }
    }
}

/// Recorded result per trial. Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRecord {
    pub participant_id: String,
    pub participant_group: ParticipantGroup,
    pub age: u8,
    pub gender: Gender,
    pub handedness: Handedness,
    pub device_type: Option<String>,
    pub block: BlockLabel,
    pub trial: usize,
    pub trial_type: TrialType,
    pub navigation_type: NavType,
    pub difficulty: Difficulty,
    pub stimulus_id: String,
    pub response: Response,
    pub correct_response: Option<Direction>,
    pub accuracy: u8,
    pub rt: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

impl TrialRecord {
    pub const COLUMNS: [&'static str; 17] = [
        "participant_id",
        "participant_group",
        "age",
        "gender",
        "handedness",
        "device_type",
        "block",
        "trial",
        "trial_type",
        "navigation_type",
        "difficulty",
        "stimulus_id",
        "response",
        "correct_response",
        "accuracy",
        "rt",
        "timestamp",
    ];

    /// Unquoted cell values in `COLUMNS` order; nulls are empty strings.
    pub fn fields(&self) -> [String; 17] {
        [
            self.participant_id.clone(),
            self.participant_group.code().to_string(),
            self.age.to_string(),
            self.gender.as_str().to_string(),
            self.handedness.as_str().to_string(),
            self.device_type.clone().unwrap_or_default(),
            self.block.to_string(),
            self.trial.to_string(),
            self.trial_type.as_str().to_string(),
            self.navigation_type.as_str().to_string(),
            self.difficulty.as_str().to_string(),
            self.stimulus_id.clone(),
            self.response.as_str().to_string(),
            self.correct_response
                .map(|d| d.as_str().to_string())
                .unwrap_or_default(),
            self.accuracy.to_string(),
            self.rt.map(|rt| rt.to_string()).unwrap_or_default(),
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        ]
    }

    pub fn is_practice(&self) -> bool {
        self.block.is_practice()
    }

    pub fn is_catch(&self) -> bool {
        self.trial_type == TrialType::Catch
    }

    pub fn is_correct(&self) -> bool {
        self.accuracy == 1
    }
}
