use crate::direction::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Frame of reference a block asks the participant to respond in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavType {
    Egocentric,
    Allocentric,
    Control,
}

impl NavType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavType::Egocentric => "egocentric",
            NavType::Allocentric => "allocentric",
            NavType::Control => "control",
        }
    }

    /// Short label shown to participants.
    pub fn title(&self) -> &'static str {
        match self {
            NavType::Egocentric => "PLAYER VIEW",
            NavType::Allocentric => "MAP VIEW",
            NavType::Control => "ARROW FOLLOWING",
        }
    }
}

impl fmt::Display for NavType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Hard,
    Control,
    /// Practice trials; served from the easy pool.
    Practice,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Hard => "hard",
            Difficulty::Control => "control",
            Difficulty::Practice => "practice",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One block of the session: a navigation frame paired with a stimulus pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockSpec {
    pub nav_type: NavType,
    pub difficulty: Difficulty,
}

impl BlockSpec {
    pub const CONTROL: BlockSpec = BlockSpec {
        nav_type: NavType::Control,
        difficulty: Difficulty::Control,
    };

    pub fn new(nav_type: NavType, difficulty: Difficulty) -> Self {
        Self {
            nav_type,
            difficulty,
        }
    }

    pub fn is_control(&self) -> bool {
        self.nav_type == NavType::Control
    }
}

/// A navigation image with its correct first step in each frame.
///
/// Control stimuli carry the arrow path instead of a correct-answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stimulus {
    pub id: String,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egocentric_correct: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocentric_correct: Option<Direction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arrows: Vec<Direction>,
}

impl Stimulus {
    /// Expected response when this stimulus is shown under `nav_type`.
    pub fn correct_for(&self, nav_type: NavType) -> Option<Direction> {
        match nav_type {
            NavType::Egocentric => self.egocentric_correct,
            NavType::Allocentric => self.allocentric_correct,
            NavType::Control => self
                .egocentric_correct
                .or(self.allocentric_correct)
                .or_else(|| self.arrows.first().copied()),
        }
    }
}

/// Attention-check item with an unambiguous answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatchStimulus {
    pub id: &'static str,
    pub instruction: &'static str,
    pub correct: Direction,
}

pub const CATCH_STIMULI: [CatchStimulus; 4] = [
    CatchStimulus {
        id: "catch_01",
        instruction: "Press UP ↑",
        correct: Direction::Up,
    },
    CatchStimulus {
        id: "catch_02",
        instruction: "Press DOWN ↓",
        correct: Direction::Down,
    },
    CatchStimulus {
        id: "catch_03",
        instruction: "Press LEFT ←",
        correct: Direction::Left,
    },
    CatchStimulus {
        id: "catch_04",
        instruction: "Press RIGHT →",
        correct: Direction::Right,
    },
];

/// A single slot in a prepared block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialEntry {
    Regular(Stimulus),
    Catch(CatchStimulus),
}

impl TrialEntry {
    pub fn id(&self) -> &str {
        match self {
            TrialEntry::Regular(s) => &s.id,
            TrialEntry::Catch(c) => c.id,
        }
    }

    pub fn is_catch(&self) -> bool {
        matches!(self, TrialEntry::Catch(_))
    }

    /// Media to pre-fetch before the block starts.
    pub fn media(&self) -> Option<&str> {
        match self {
            TrialEntry::Regular(s) => Some(&s.file),
            TrialEntry::Catch(_) => None,
        }
    }

    pub fn correct_for(&self, nav_type: NavType) -> Option<Direction> {
        match self {
            TrialEntry::Regular(s) => s.correct_for(nav_type),
            TrialEntry::Catch(c) => Some(c.correct),
        }
    }
}

/// Static stimulus catalog keyed by difficulty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StimulusCatalog {
    #[serde(default)]
    pub easy: Vec<Stimulus>,
    #[serde(default)]
    pub hard: Vec<Stimulus>,
    #[serde(default)]
    pub control: Vec<Stimulus>,
}

impl StimulusCatalog {
    pub fn pool(&self, difficulty: Difficulty) -> &[Stimulus] {
        match difficulty {
            Difficulty::Easy | Difficulty::Practice => &self.easy,
            Difficulty::Hard => &self.hard,
            Difficulty::Control => &self.control,
        }
    }

    pub fn len(&self) -> usize {
        self.easy.len() + self.hard.len() + self.control.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Difficulties referenced by `blocks` that have no stimuli, in first-use order.
    pub fn missing_pools(&self, blocks: &[BlockSpec]) -> Vec<Difficulty> {
        let mut missing = Vec::new();
        for block in blocks {
            if self.pool(block.difficulty).is_empty() && !missing.contains(&block.difficulty) {
                missing.push(block.difficulty);
            }
        }
        missing
    }
}
