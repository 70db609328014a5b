//! Button familiarization ahead of practice. The participant works through a
//! shuffled list of target directions; only a press matching the current
//! target moves on.

use rand::Rng;
use rand::seq::SliceRandom;
use spanav_core::Direction;

/// Every direction twice.
pub const TRAINING_TARGETS: [Direction; 8] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
    Direction::Up,
    Direction::Left,
    Direction::Down,
    Direction::Right,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingPress {
    Hit,
    /// Wrong button; the target stays the same.
    Miss { expected: Direction },
    /// The last target was hit.
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonTraining {
    targets: Vec<Direction>,
    index: usize,
}

impl ButtonTraining {
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut targets = TRAINING_TARGETS.to_vec();
        targets.shuffle(rng);
        Self { targets, index: 0 }
    }

    pub fn current(&self) -> Option<Direction> {
        self.targets.get(self.index).copied()
    }

    pub fn completed(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.targets.len()
    }

    pub fn is_complete(&self) -> bool {
        self.index >= self.targets.len()
    }

    /// `None` once every target has been hit.
    pub fn press(&mut self, direction: Direction) -> Option<TrainingPress> {
        let expected = self.current()?;
        if direction != expected {
            return Some(TrainingPress::Miss { expected });
        }
        self.index += 1;
        Some(if self.is_complete() {
            TrainingPress::Complete
        } else {
            TrainingPress::Hit
        })
    }
}
