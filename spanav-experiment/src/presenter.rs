//! Rendering and input boundary.
//!
//! The engine never draws anything itself; it tells a `Presenter` what should
//! be on screen and whether directional input should currently be captured.
//! Responses come back through `SessionStateMachine::respond`.

use crate::summary::SessionSummary;
use spanav_core::{Direction, NavType, Stimulus};

/// Screens that wait for the participant to press Continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interstitial {
    PracticeIntro { trials: usize },
    /// Shown before the first practice trial of each navigation type.
    PracticeNavType(NavType),
    PracticeComplete,
    BlockIntro {
        index: usize,
        total: usize,
        nav_type: NavType,
    },
}

impl Interstitial {
    pub fn title(&self) -> String {
        match self {
            Interstitial::PracticeIntro { trials } => format!("Practice Phase ({trials} trials)"),
            Interstitial::PracticeNavType(nav) => format!("Practice: {}", nav.title()),
            Interstitial::PracticeComplete => "Practice Complete".to_string(),
            Interstitial::BlockIntro {
                index,
                total,
                nav_type,
            } => format!("Block {} of {} - {}", index + 1, total, nav_type.title()),
        }
    }
}

/// Current target of the button familiarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingPrompt {
    pub target: Direction,
    pub completed: usize,
    pub total: usize,
    /// The wrong button just pressed, if any.
    pub missed: Option<Direction>,
}

/// Practice-only correctness feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect {
        given: Direction,
        expected: Option<Direction>,
    },
    TooSlow {
        expected: Option<Direction>,
    },
}

pub trait Presenter {
    fn show_fixation(&mut self);
    fn show_stimulus(&mut self, stimulus: &Stimulus);
    fn show_catch_instruction(&mut self, text: &str);
    fn set_response_capture(&mut self, enabled: bool);

    fn show_training(&mut self, _prompt: &TrainingPrompt) {}
    fn show_feedback(&mut self, _feedback: &Feedback) {}
    fn show_interstitial(&mut self, _screen: &Interstitial) {}
    fn show_summary(&mut self, _summary: &SessionSummary) {}

    /// Fetch media ahead of a block. Must return once every reference has
    /// been attempted; individual failures are tolerated.
    fn preload(&mut self, _files: &[String]) {}
}

/// Discards everything; useful for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn show_fixation(&mut self) {}
    fn show_stimulus(&mut self, _stimulus: &Stimulus) {}
    fn show_catch_instruction(&mut self, _text: &str) {}
    fn set_response_capture(&mut self, _enabled: bool) {}
}
