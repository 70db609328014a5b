#![allow(dead_code)]

use chrono::Utc;
use spanav_core::{
    Direction, Gender, Handedness, ParticipantGroup, ParticipantInfo, Stimulus, StimulusCatalog,
    TrialState,
};
use spanav_experiment::{
    Feedback, Interstitial, Presenter, SessionEvent, SessionStateMachine, SessionSummary, Stage,
    TrainingPrompt, Transport, Trial,
};
use spanav_timing::{SimulatedTimer, Timer};

/// Records what the session asked to be shown, stamped with simulated time.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub timer: SimulatedTimer,
    pub onsets: Vec<u64>,
    pub fixations: usize,
    pub catch_texts: Vec<String>,
    pub feedback: Vec<Feedback>,
    pub training: Vec<TrainingPrompt>,
    pub screens: Vec<Interstitial>,
    pub preloads: Vec<Vec<String>>,
    pub summaries: Vec<SessionSummary>,
    pub capture: bool,
}

impl RecordingPresenter {
    pub fn new(timer: SimulatedTimer) -> Self {
        Self {
            timer,
            ..Default::default()
        }
    }
}

impl Presenter for RecordingPresenter {
    fn show_fixation(&mut self) {
        self.fixations += 1;
    }

    fn show_stimulus(&mut self, _stimulus: &Stimulus) {
        self.onsets.push(self.timer.now());
    }

    fn show_catch_instruction(&mut self, text: &str) {
        self.onsets.push(self.timer.now());
        self.catch_texts.push(text.to_string());
    }

    fn set_response_capture(&mut self, enabled: bool) {
        self.capture = enabled;
    }

    fn show_training(&mut self, prompt: &TrainingPrompt) {
        self.training.push(*prompt);
    }

    fn show_feedback(&mut self, feedback: &Feedback) {
        self.feedback.push(*feedback);
    }

    fn show_interstitial(&mut self, screen: &Interstitial) {
        self.screens.push(*screen);
    }

    fn show_summary(&mut self, summary: &SessionSummary) {
        self.summaries.push(summary.clone());
    }

    fn preload(&mut self, files: &[String]) {
        self.preloads.push(files.to_vec());
    }
}

pub fn participant(id: &str) -> ParticipantInfo {
    ParticipantInfo {
        id: id.to_string(),
        group: ParticipantGroup::HF,
        age: 27,
        gender: Gender::PreferNot,
        handedness: Handedness::Right,
        device_type: Some("desktop".to_string()),
        registered_at: Utc::now(),
    }
}

fn stimuli(prefix: &str, n: usize) -> Vec<Stimulus> {
    const DIRS: [Direction; 4] = Direction::ALL;
    (0..n)
        .map(|i| Stimulus {
            id: format!("{prefix}{i:02}"),
            file: format!("stimuli/{prefix}/{i:02}.png"),
            egocentric_correct: Some(DIRS[i % 4]),
            allocentric_correct: Some(DIRS[(i + 1) % 4]),
            arrows: Vec::new(),
        })
        .collect()
}

fn control_stimuli(n: usize) -> Vec<Stimulus> {
    (0..n)
        .map(|i| Stimulus {
            id: format!("c{i:02}"),
            file: format!("stimuli/control/{i:02}.png"),
            egocentric_correct: None,
            allocentric_correct: None,
            arrows: vec![Direction::ALL[i % 4], Direction::Up],
        })
        .collect()
}

pub fn catalog(easy: usize, hard: usize, control: usize) -> StimulusCatalog {
    StimulusCatalog {
        easy: stimuli("e", easy),
        hard: stimuli("h", hard),
        control: control_stimuli(control),
    }
}

/// Response plan for one trial: press `Direction` this many ms after onset,
/// or `None` to let it time out.
pub type Plan = Option<(u64, Direction)>;

/// Always presses the expected answer after `rt_ms`.
pub fn correct_after(rt_ms: u64) -> impl FnMut(&Trial) -> Plan {
    move |trial| {
        trial
            .entry
            .correct_for(trial.nav_type)
            .map(|d| (rt_ms, d))
    }
}

/// Runs the session to completion on its simulated clock.
pub fn run_session<X: Transport>(
    session: &mut SessionStateMachine<SimulatedTimer, X>,
    presenter: &mut RecordingPresenter,
    mut plan: impl FnMut(&Trial) -> Plan,
) -> Vec<SessionEvent> {
    let timer = session.timer().clone();
    let mut events = Vec::new();
    let mut guard = 0;
    while !session.is_finished() {
        guard += 1;
        assert!(guard < 100_000, "session did not finish");
        match session.stage() {
            Stage::NotStarted => session.start(presenter),
            Stage::Training => {
                let target = session.training_target().expect("familiarization target");
                assert!(session.respond(target, presenter));
            }
            Stage::Interstitial(_) => events.extend(session.acknowledge(presenter)),
            Stage::Finished => break,
            Stage::Trial => {
                let machine = session.trial_machine();
                let deadline = session.next_deadline().expect("trial has a deadline");
                if machine.state() == TrialState::AwaitingResponse {
                    let trial = machine.current().expect("trial in flight").clone();
                    let onset = trial.timestamps.stimulus_onset.expect("onset recorded");
                    if let Some((rt_ms, direction)) = plan(&trial) {
                        let at = onset + rt_ms * 1_000_000;
                        if at < deadline {
                            timer.sleep_until(at);
                            assert!(session.respond(direction, presenter));
                            continue;
                        }
                    }
                }
                timer.sleep_until(deadline);
                events.extend(session.update(presenter));
            }
        }
    }
    events
}
