//! Scripted participant for headless runs on simulated time.

use crate::app::log_events;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spanav_core::{Direction, TrialState};
use spanav_experiment::{Presenter, SessionStateMachine, Stage, Transport, Trial};
use spanav_timing::{SimulatedTimer, Timer};

const NS_PER_MS: u64 = 1_000_000;

pub struct SimulatedParticipant {
    rng: StdRng,
    accuracy: f64,
    timeout_rate: f64,
    rt_range_ms: (u64, u64),
}

impl SimulatedParticipant {
    pub fn new(seed: u64, accuracy: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            accuracy: accuracy.clamp(0.0, 1.0),
            timeout_rate: 0.03,
            rt_range_ms: (280, 1600),
        }
    }

    pub fn with_timeout_rate(mut self, rate: f64) -> Self {
        self.timeout_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Press and delay after onset, or `None` to let the trial time out.
    pub fn decide(&mut self, trial: &Trial) -> Option<(u64, Direction)> {
        if self.rng.random_bool(self.timeout_rate) {
            return None;
        }
        let rt = self.rng.random_range(self.rt_range_ms.0..=self.rt_range_ms.1);
        let expected = trial.entry.correct_for(trial.nav_type);
        let direction = match expected {
            Some(d) if self.rng.random_bool(self.accuracy) => d,
            Some(d) => {
                let others: Vec<Direction> = Direction::ALL.into_iter().filter(|o| *o != d).collect();
                others[self.rng.random_range(0..others.len())]
            }
            None => Direction::ALL[self.rng.random_range(0..Direction::ALL.len())],
        };
        Some((rt, direction))
    }
}

/// Runs the session to completion, jumping the clock from deadline to
/// deadline. Interstitials are acknowledged at once and familiarization
/// targets are always hit.
pub fn run_simulated<X: Transport>(
    session: &mut SessionStateMachine<SimulatedTimer, X>,
    participant: &mut SimulatedParticipant,
    presenter: &mut impl Presenter,
) {
    let timer = session.timer().clone();
    session.start(presenter);
    while !session.is_finished() {
        match session.stage() {
            Stage::Training => {
                let Some(target) = session.training_target() else {
                    break;
                };
                session.respond(target, presenter);
            }
            Stage::Interstitial(_) => log_events(&session.acknowledge(presenter)),
            Stage::Trial => {
                let Some(deadline) = session.next_deadline() else {
                    break;
                };
                let pending = match session.trial_machine().state() {
                    TrialState::AwaitingResponse => session.trial_machine().current().cloned(),
                    _ => None,
                };
                if let Some(trial) = pending {
                    let onset = trial.timestamps.stimulus_onset.unwrap_or_else(|| timer.now());
                    if let Some((rt, direction)) = participant.decide(&trial) {
                        let at = onset + rt * NS_PER_MS;
                        if at < deadline {
                            timer.sleep_until(at);
                            session.respond(direction, presenter);
                            continue;
                        }
                    }
                }
                timer.sleep_until(deadline);
                log_events(&session.update(presenter));
            }
            Stage::NotStarted | Stage::Finished => break,
        }
    }
}
