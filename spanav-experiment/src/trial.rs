//! Per-trial lifecycle: fixation, stimulus with response window, scoring,
//! then practice feedback or the inter-trial gap.
//!
//! The machine is driven by timestamps rather than callbacks. `update` fires
//! whichever deadline has passed; `respond` is the only other way out of
//! `AwaitingResponse`. Both leave that state before scoring, so a response and
//! a timeout can never both be scored for the same trial.

use crate::config::ExperimentConfig;
use crate::presenter::{Feedback, Presenter};
use spanav_core::{
    BlockLabel, Difficulty, Direction, NavType, Response, TrialEntry, TrialState, TrialType,
};
use spanav_timing::millis_between;

const NS_PER_MS: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    /// 0-based position within the block (or within practice).
    pub index: usize,
    pub block: BlockLabel,
    pub entry: TrialEntry,
    pub nav_type: NavType,
    pub difficulty: Difficulty,
    pub durations: TrialDurations,
    pub timestamps: TrialTimestamps,
    pub response: Option<Response>,
}

impl Trial {
    pub fn new(
        index: usize,
        block: BlockLabel,
        entry: TrialEntry,
        nav_type: NavType,
        difficulty: Difficulty,
        config: &ExperimentConfig,
    ) -> Self {
        Self {
            index,
            block,
            entry,
            nav_type,
            difficulty,
            durations: TrialDurations::from_config(config),
            timestamps: TrialTimestamps::default(),
            response: None,
        }
    }

    pub fn trial_type(&self) -> TrialType {
        if self.entry.is_catch() {
            TrialType::Catch
        } else {
            TrialType::Regular
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialDurations {
    pub fixation_ms: u64,
    pub response_window_ms: u64,
    pub feedback_ms: u64,
    /// `max(iti, response lockout)`, main blocks only.
    pub post_response_ms: u64,
}

impl TrialDurations {
    pub fn from_config(config: &ExperimentConfig) -> Self {
        Self {
            fixation_ms: config.fixation_duration_ms,
            response_window_ms: config.max_response_time_ms,
            feedback_ms: config.feedback_duration_ms,
            post_response_ms: config.post_response_gap_ms(),
        }
    }
}

/// Nanosecond timestamps from the session timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrialTimestamps {
    pub fixation_start: u64,
    pub stimulus_onset: Option<u64>,
    pub response: Option<u64>,
    pub scored: Option<u64>,
}

/// A finished trial together with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    pub trial: Trial,
    pub response: Response,
    pub correct_response: Option<Direction>,
    pub accuracy: u8,
    pub rt_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Score {
    response: Response,
    correct_response: Option<Direction>,
    accuracy: u8,
    rt_ms: Option<u64>,
}

#[derive(Debug, Default)]
pub struct TrialMachine {
    state: TrialState,
    current: Option<Trial>,
    deadline: Option<u64>,
    score: Option<Score>,
}

impl TrialMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == TrialState::Idle
    }

    pub fn current(&self) -> Option<&Trial> {
        self.current.as_ref()
    }

    /// Pending timer, if any.
    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// `Idle -> Fixation`. Returns false if a trial is already in flight.
    pub fn begin(&mut self, mut trial: Trial, now: u64, presenter: &mut impl Presenter) -> bool {
        if !self.is_idle() {
            tracing::warn!(state = ?self.state, "begin ignored, trial already in flight");
            return false;
        }
        presenter.set_response_capture(false);
        presenter.show_fixation();
        trial.timestamps = TrialTimestamps {
            fixation_start: now,
            ..TrialTimestamps::default()
        };
        self.deadline = Some(now + trial.durations.fixation_ms * NS_PER_MS);
        tracing::debug!(
            block = %trial.block,
            trial = trial.index + 1,
            stimulus = trial.entry.id(),
            at_ns = now,
            "fixation"
        );
        self.current = Some(trial);
        self.score = None;
        self.state = TrialState::Fixation;
        true
    }

    /// Accepts the first response of the response window. Anything outside
    /// `AwaitingResponse` (fixation, after a timeout, a second press) is
    /// ignored and returns false.
    pub fn respond(&mut self, direction: Direction, now: u64, presenter: &mut impl Presenter) -> bool {
        if self.state != TrialState::AwaitingResponse {
            return false;
        }
        let Some(trial) = self.current.as_mut() else {
            return false;
        };
        // Cancel the response timer and close input before scoring.
        self.deadline = None;
        presenter.set_response_capture(false);
        trial.response = Some(Response::Pressed(direction));
        trial.timestamps.response = Some(now);
        self.state = TrialState::Scoring;
        self.score(now, presenter);
        true
    }

    /// Fires any expired timers. Returns the outcome once the trial's
    /// feedback or inter-trial interval has elapsed and the machine is idle.
    pub fn update(&mut self, now: u64, presenter: &mut impl Presenter) -> Option<TrialOutcome> {
        loop {
            match self.state {
                TrialState::Idle => return None,
                TrialState::Fixation => {
                    if !self.expired(now) {
                        return None;
                    }
                    self.present_stimulus(now, presenter);
                }
                TrialState::AwaitingResponse => {
                    if !self.expired(now) {
                        return None;
                    }
                    self.deadline = None;
                    presenter.set_response_capture(false);
                    if let Some(trial) = self.current.as_mut() {
                        trial.response = Some(Response::Timeout);
                    }
                    self.state = TrialState::Scoring;
                }
                TrialState::Scoring => self.score(now, presenter),
                TrialState::Feedback | TrialState::InterTrialInterval => {
                    if !self.expired(now) {
                        return None;
                    }
                    return self.finish();
                }
            }
        }
    }

    fn expired(&self, now: u64) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    fn present_stimulus(&mut self, now: u64, presenter: &mut impl Presenter) {
        let Some(trial) = self.current.as_mut() else {
            self.state = TrialState::Idle;
            return;
        };
        match &trial.entry {
            TrialEntry::Regular(stimulus) => presenter.show_stimulus(stimulus),
            TrialEntry::Catch(item) => presenter.show_catch_instruction(item.instruction),
        }
        trial.timestamps.stimulus_onset = Some(now);
        presenter.set_response_capture(true);
        self.deadline = Some(now + trial.durations.response_window_ms * NS_PER_MS);
        self.state = TrialState::AwaitingResponse;
        tracing::debug!(stimulus = trial.entry.id(), at_ns = now, "stimulus onset");
    }

    fn score(&mut self, now: u64, presenter: &mut impl Presenter) {
        let Some(trial) = self.current.as_mut() else {
            self.state = TrialState::Idle;
            return;
        };
        let response = trial.response.unwrap_or(Response::Timeout);
        let correct_response = trial.entry.correct_for(trial.nav_type);
        let accuracy = u8::from(correct_response.is_some() && response.direction() == correct_response);
        let rt_ms = match response {
            Response::Pressed(_) => trial
                .timestamps
                .stimulus_onset
                .zip(trial.timestamps.response)
                .map(|(onset, at)| millis_between(onset, at)),
            Response::Timeout => None,
        };
        trial.timestamps.scored = Some(now);
        self.score = Some(Score {
            response,
            correct_response,
            accuracy,
            rt_ms,
        });
        tracing::debug!(
            stimulus = trial.entry.id(),
            response = %response,
            accuracy,
            rt_ms = ?rt_ms,
            "trial scored"
        );

        if trial.block.is_practice() {
            let feedback = match response {
                Response::Timeout => Feedback::TooSlow {
                    expected: correct_response,
                },
                Response::Pressed(_) if accuracy == 1 => Feedback::Correct,
                Response::Pressed(given) => Feedback::Incorrect {
                    given,
                    expected: correct_response,
                },
            };
            presenter.show_feedback(&feedback);
            self.deadline = Some(now + trial.durations.feedback_ms * NS_PER_MS);
            self.state = TrialState::Feedback;
        } else {
            self.deadline = Some(now + trial.durations.post_response_ms * NS_PER_MS);
            self.state = TrialState::InterTrialInterval;
        }
    }

    fn finish(&mut self) -> Option<TrialOutcome> {
        self.state = TrialState::Idle;
        self.deadline = None;
        let trial = self.current.take()?;
        let score = self.score.take()?;
        Some(TrialOutcome {
            trial,
            response: score.response,
            correct_response: score.correct_response,
            accuracy: score.accuracy,
            rt_ms: score.rt_ms,
        })
    }
}
