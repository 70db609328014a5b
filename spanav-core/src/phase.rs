use serde::{Deserialize, Serialize};

/// Top-level phases of a session, in the order they are visited.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    #[default]
    Welcome,
    Practice,
    Experiment,
    Debrief,
}

impl SessionPhase {
    pub fn allows_input(&self) -> bool {
        matches!(self, Self::Practice | Self::Experiment)
    }

    pub fn next(&self) -> Option<Self> {
        use SessionPhase::*;
        Some(match self {
            Welcome => Practice,
            Practice => Experiment,
            Experiment => Debrief,
            Debrief => return None,
        })
    }
}
