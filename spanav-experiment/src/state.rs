use crate::config::ExperimentConfig;
use crate::counterbalance::{CounterbalanceGroup, assign_group, build_block_sequence};
use crate::error::ExperimentError;
use crate::pool::{StimulusPool, UsageTracker, practice_entries};
use crate::presenter::{Interstitial, Presenter, TrainingPrompt};
use crate::rng::{self, SessionRng};
use crate::summary::SessionSummary;
use crate::transport::Transport;
use crate::training::{ButtonTraining, TrainingPress};
use crate::trial::{Trial, TrialMachine, TrialOutcome};
use chrono::Utc;
use spanav_core::{
    BlockLabel, BlockSpec, Difficulty, Direction, NavType, ParticipantInfo, SessionPhase,
    StimulusCatalog, TrialEntry, TrialRecord,
};
use spanav_timing::Timer;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PracticeTrialCompleted(TrialRecord),
    TrialCompleted(TrialRecord),
    BlockStarted {
        index: usize,
        spec: BlockSpec,
    },
    /// The pool could not fill the block; it runs short and is flagged.
    BlockIncomplete {
        index: usize,
        expected: usize,
        actual: usize,
    },
    BlockCompleted {
        index: usize,
    },
    /// A slot had no stimulus and was passed over. `trial` is 1-based.
    TrialSkipped {
        block: BlockLabel,
        trial: usize,
    },
    SessionCompleted(SessionSummary),
}

/// Where the session is between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    NotStarted,
    /// Button familiarization; presses go through `respond`.
    Training,
    /// Waiting for `acknowledge`.
    Interstitial(Interstitial),
    /// A trial is in flight; `update` drives it.
    Trial,
    Finished,
}

/// Mutable progress of one session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub training: Option<ButtonTraining>,
    pub block_index: usize,
    /// 0-based position of the next (or in-flight) trial.
    pub trial_index: usize,
    pub block_entries: Vec<TrialEntry>,
    pub usage: UsageTracker,
    /// Current block's records, appended to `records` when the block ends.
    pub block_records: Vec<TrialRecord>,
    /// Exported log. Practice never lands here.
    pub records: Vec<TrialRecord>,
    /// 1-based numbers of short blocks.
    pub incomplete_blocks: Vec<usize>,
    pub skipped: usize,
}

pub struct SessionStateMachine<T, X>
where
    T: Timer<Timestamp = u64>,
    X: Transport,
{
    phase: SessionPhase,
    stage: Stage,
    timer: T,
    transport: X,
    config: ExperimentConfig,
    catalog: StimulusCatalog,
    participant: ParticipantInfo,
    group: CounterbalanceGroup,
    blocks: Vec<BlockSpec>,
    practice_slots: Vec<(NavType, Option<TrialEntry>)>,
    state: SessionState,
    machine: TrialMachine,
    summary: Option<SessionSummary>,
    jitter: fn() -> u32,
}

impl<T, X> SessionStateMachine<T, X>
where
    T: Timer<Timestamp = u64>,
    X: Transport,
{
    /// Fails when the configuration or participant is invalid, or when the
    /// catalog holds no stimuli at all. Missing individual pools are only
    /// logged; the affected blocks will be flagged incomplete.
    pub fn new(
        config: ExperimentConfig,
        catalog: StimulusCatalog,
        participant: ParticipantInfo,
        timer: T,
        transport: X,
    ) -> Result<Self, ExperimentError> {
        config.validate()?;
        participant
            .validate()
            .map_err(ExperimentError::InvalidParticipant)?;
        if catalog.is_empty() {
            return Err(ExperimentError::EmptyCatalog);
        }

        let group = assign_group(&participant.id);
        let blocks = build_block_sequence(group, config.repetitions);
        for difficulty in catalog.missing_pools(&blocks) {
            tracing::warn!(%difficulty, "catalog has no stimuli for a scheduled difficulty");
        }
        let practice_slots = practice_entries(&catalog, config.practice_trials);

        tracing::info!(
            participant = %participant.id,
            group = %participant.group,
            counterbalance = %group,
            blocks = blocks.len(),
            "session created"
        );

        Ok(Self {
            phase: SessionPhase::default(),
            stage: Stage::default(),
            timer,
            transport,
            config,
            catalog,
            participant,
            group,
            blocks,
            practice_slots,
            state: SessionState::default(),
            machine: TrialMachine::new(),
            summary: None,
            jitter: rng::wall_clock_jitter,
        })
    }

    /// Replaces the wall-clock jitter mixed into block seeds.
    pub fn with_seed_jitter(mut self, jitter: fn() -> u32) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn participant(&self) -> &ParticipantInfo {
        &self.participant
    }

    pub fn counterbalance_group(&self) -> CounterbalanceGroup {
        self.group
    }

    pub fn blocks(&self) -> &[BlockSpec] {
        &self.blocks
    }

    /// Scheduled difficulties the catalog cannot serve.
    pub fn missing_pools(&self) -> Vec<Difficulty> {
        self.catalog.missing_pools(&self.blocks)
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn transport(&self) -> &X {
        &self.transport
    }

    pub fn into_transport(self) -> X {
        self.transport
    }

    pub fn trial_machine(&self) -> &TrialMachine {
        &self.machine
    }

    /// Main-block records completed so far (finished blocks only).
    pub fn records(&self) -> &[TrialRecord] {
        &self.state.records
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Finished
    }

    /// Direction the familiarization is waiting for.
    pub fn training_target(&self) -> Option<Direction> {
        match self.stage {
            Stage::Training => self.state.training.as_ref().and_then(ButtonTraining::current),
            _ => None,
        }
    }

    /// Timestamp at which the in-flight trial next changes state.
    pub fn next_deadline(&self) -> Option<u64> {
        match self.stage {
            Stage::Trial => self.machine.deadline(),
            _ => None,
        }
    }

    /// Leaves the welcome screen.
    pub fn start(&mut self, presenter: &mut impl Presenter) {
        if self.stage != Stage::NotStarted {
            return;
        }
        self.advance_phase();
        if self.config.button_familiarization {
            self.start_training(presenter);
        } else {
            self.enter_practice(presenter);
        }
    }

    /// The participant's "Continue" on an interstitial screen.
    pub fn acknowledge(&mut self, presenter: &mut impl Presenter) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        let Stage::Interstitial(screen) = self.stage else {
            return events;
        };
        match screen {
            Interstitial::PracticeIntro { .. } => self.next_practice_trial(presenter, &mut events),
            Interstitial::PracticeNavType(_) => self.begin_practice_trial(presenter, &mut events),
            Interstitial::PracticeComplete => {
                self.advance_phase();
                self.show_block_intro(presenter);
            }
            Interstitial::BlockIntro { index, .. } => self.start_block(index, presenter, &mut events),
        }
        events
    }

    /// Forwards a directional response to the familiarization or to the
    /// in-flight trial. Returns false when the press did not count: no
    /// response window is open, or it missed the familiarization target.
    pub fn respond(&mut self, direction: Direction, presenter: &mut impl Presenter) -> bool {
        match self.stage {
            Stage::Training => self.training_press(direction, presenter),
            Stage::Trial if self.phase.allows_input() => {
                let now = self.timer.now();
                self.machine.respond(direction, now, presenter)
            }
            _ => false,
        }
    }

    /// Fires expired trial timers and advances the session when a trial ends.
    pub fn update(&mut self, presenter: &mut impl Presenter) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.stage != Stage::Trial {
            return events;
        }
        let now = self.timer.now();
        if let Some(outcome) = self.machine.update(now, presenter) {
            self.complete_trial(outcome, presenter, &mut events);
        }
        events
    }

    fn advance_phase(&mut self) {
        if let Some(next) = self.phase.next() {
            tracing::info!(from = ?self.phase, to = ?next, "phase change");
            self.phase = next;
        }
    }

    fn show(&mut self, screen: Interstitial, presenter: &mut impl Presenter) {
        presenter.set_response_capture(false);
        presenter.show_interstitial(&screen);
        self.stage = Stage::Interstitial(screen);
    }

    fn start_training(&mut self, presenter: &mut impl Presenter) {
        let training = ButtonTraining::shuffled(&mut rand::rng());
        tracing::info!(targets = training.total(), "button familiarization started");
        self.state.training = Some(training);
        self.stage = Stage::Training;
        presenter.set_response_capture(true);
        self.show_training(None, presenter);
    }

    fn show_training(&self, missed: Option<Direction>, presenter: &mut impl Presenter) {
        let Some(training) = &self.state.training else {
            return;
        };
        if let Some(target) = training.current() {
            presenter.show_training(&TrainingPrompt {
                target,
                completed: training.completed(),
                total: training.total(),
                missed,
            });
        }
    }

    fn training_press(&mut self, direction: Direction, presenter: &mut impl Presenter) -> bool {
        let Some(press) = self.state.training.as_mut().and_then(|t| t.press(direction)) else {
            return false;
        };
        match press {
            TrainingPress::Hit => {
                self.show_training(None, presenter);
                true
            }
            TrainingPress::Miss { expected } => {
                tracing::debug!(%expected, pressed = %direction, "familiarization miss");
                self.show_training(Some(direction), presenter);
                false
            }
            TrainingPress::Complete => {
                tracing::info!("button familiarization complete");
                self.state.training = None;
                self.enter_practice(presenter);
                true
            }
        }
    }

    fn enter_practice(&mut self, presenter: &mut impl Presenter) {
        if self.config.practice_trials > 0 {
            self.show(
                Interstitial::PracticeIntro {
                    trials: self.config.practice_trials,
                },
                presenter,
            );
        } else {
            tracing::info!("no practice trials configured");
            self.advance_phase();
            self.show_block_intro(presenter);
        }
    }

    fn show_block_intro(&mut self, presenter: &mut impl Presenter) {
        let index = self.state.block_index;
        let Some(spec) = self.blocks.get(index).copied() else {
            self.complete_session(presenter, &mut Vec::new());
            return;
        };
        self.show(
            Interstitial::BlockIntro {
                index,
                total: self.blocks.len(),
                nav_type: spec.nav_type,
            },
            presenter,
        );
    }

    fn next_practice_trial(&mut self, presenter: &mut impl Presenter, events: &mut Vec<SessionEvent>) {
        let total = self.practice_slots.len();
        let index = self.state.trial_index;
        if index >= total {
            tracing::info!("practice complete");
            self.show(Interstitial::PracticeComplete, presenter);
            return;
        }
        if index == 0 || index == total / 2 {
            let (nav_type, _) = self.practice_slots[index];
            self.show(Interstitial::PracticeNavType(nav_type), presenter);
            return;
        }
        self.begin_practice_trial(presenter, events);
    }

    fn begin_practice_trial(&mut self, presenter: &mut impl Presenter, events: &mut Vec<SessionEvent>) {
        let index = self.state.trial_index;
        match self.practice_slots.get(index).cloned() {
            Some((nav_type, Some(entry))) => {
                let trial = Trial::new(
                    index,
                    BlockLabel::Practice,
                    entry,
                    nav_type,
                    Difficulty::Practice,
                    &self.config,
                );
                self.begin(trial, presenter);
            }
            Some((_, None)) => {
                self.skip(BlockLabel::Practice, events);
                self.next_practice_trial(presenter, events);
            }
            None => self.next_practice_trial(presenter, events),
        }
    }

    fn start_block(&mut self, index: usize, presenter: &mut impl Presenter, events: &mut Vec<SessionEvent>) {
        let Some(spec) = self.blocks.get(index).copied() else {
            self.complete_session(presenter, events);
            return;
        };
        let mut rng = SessionRng::for_scope(
            &format!("{}_block{}", self.participant.id, index),
            (self.jitter)(),
        );
        let prepared = StimulusPool::new(&self.catalog, &mut self.state.usage).prepare_block(
            spec,
            self.config.trials_per_block,
            self.config.catch_trials_per_block,
            &mut rng,
        );

        tracing::info!(
            block = index + 1,
            nav_type = %spec.nav_type,
            difficulty = %spec.difficulty,
            "block started"
        );
        events.push(SessionEvent::BlockStarted { index, spec });

        if !prepared.is_complete() {
            tracing::warn!(
                block = index + 1,
                expected = prepared.expected_len,
                actual = prepared.entries.len(),
                "block is short, stimulus pool cannot fill it"
            );
            events.push(SessionEvent::BlockIncomplete {
                index,
                expected: prepared.expected_len,
                actual: prepared.entries.len(),
            });
            self.state.incomplete_blocks.push(index + 1);
        }

        presenter.preload(&prepared.media());

        self.state.block_index = index;
        self.state.trial_index = 0;
        self.state.block_entries = prepared.entries;
        self.state.block_records.clear();
        self.next_block_trial(presenter, events);
    }

    fn next_block_trial(&mut self, presenter: &mut impl Presenter, events: &mut Vec<SessionEvent>) {
        let block = self.state.block_index;
        while self.state.trial_index < self.config.trials_per_block {
            match self.state.block_entries.get(self.state.trial_index).cloned() {
                Some(entry) => {
                    let spec = self.blocks[block];
                    let trial = Trial::new(
                        self.state.trial_index,
                        BlockLabel::Block(block + 1),
                        entry,
                        spec.nav_type,
                        spec.difficulty,
                        &self.config,
                    );
                    self.begin(trial, presenter);
                    return;
                }
                None => {
                    self.skip(BlockLabel::Block(block + 1), events);
                    self.state.skipped += 1;
                }
            }
        }
        self.finish_block(presenter, events);
    }

    fn begin(&mut self, trial: Trial, presenter: &mut impl Presenter) -> bool {
        let now = self.timer.now();
        if !self.machine.begin(trial, now, presenter) {
            tracing::error!(stage = ?self.stage, "trial not started, another is in flight");
            return false;
        }
        self.stage = Stage::Trial;
        true
    }

    fn skip(&mut self, block: BlockLabel, events: &mut Vec<SessionEvent>) {
        let trial = self.state.trial_index + 1;
        tracing::warn!(%block, trial, "no stimulus for trial slot, skipping");
        events.push(SessionEvent::TrialSkipped { block, trial });
        self.state.trial_index += 1;
    }

    fn complete_trial(
        &mut self,
        outcome: TrialOutcome,
        presenter: &mut impl Presenter,
        events: &mut Vec<SessionEvent>,
    ) {
        let record = self.record_for(outcome);
        if let Err(e) = self.transport.persist(&record) {
            tracing::warn!(error = %e, stimulus = %record.stimulus_id, "failed to persist trial record");
        }
        self.state.trial_index += 1;

        if record.is_practice() {
            events.push(SessionEvent::PracticeTrialCompleted(record));
            self.next_practice_trial(presenter, events);
        } else {
            self.state.block_records.push(record.clone());
            events.push(SessionEvent::TrialCompleted(record));
            self.next_block_trial(presenter, events);
        }
    }

    fn record_for(&self, outcome: TrialOutcome) -> TrialRecord {
        let p = &self.participant;
        let trial = outcome.trial;
        TrialRecord {
            participant_id: p.id.clone(),
            participant_group: p.group,
            age: p.age,
            gender: p.gender,
            handedness: p.handedness,
            device_type: p.device_type.clone(),
            block: trial.block,
            trial: trial.index + 1,
            trial_type: trial.trial_type(),
            navigation_type: trial.nav_type,
            difficulty: trial.difficulty,
            stimulus_id: trial.entry.id().to_string(),
            response: outcome.response,
            correct_response: outcome.correct_response,
            accuracy: outcome.accuracy,
            rt: outcome.rt_ms,
            timestamp: Utc::now(),
        }
    }

    fn finish_block(&mut self, presenter: &mut impl Presenter, events: &mut Vec<SessionEvent>) {
        let index = self.state.block_index;
        let finished = std::mem::take(&mut self.state.block_records);
        tracing::info!(block = index + 1, trials = finished.len(), "block completed");
        self.state.records.extend(finished);
        self.state.block_entries.clear();
        events.push(SessionEvent::BlockCompleted { index });

        if index + 1 < self.blocks.len() {
            self.state.block_index = index + 1;
            self.state.trial_index = 0;
            self.show_block_intro(presenter);
        } else {
            self.complete_session(presenter, events);
        }
    }

    fn complete_session(&mut self, presenter: &mut impl Presenter, events: &mut Vec<SessionEvent>) {
        let summary = SessionSummary::from_records(
            &self.participant,
            self.group,
            &self.state.records,
            self.state.incomplete_blocks.clone(),
            self.state.skipped,
            Utc::now(),
        );
        if let Err(e) = self.transport.persist_summary(&summary) {
            tracing::warn!(error = %e, "failed to persist session summary");
        }
        presenter.set_response_capture(false);
        presenter.show_summary(&summary);
        self.advance_phase();
        self.stage = Stage::Finished;
        tracing::info!(
            participant = %summary.participant_id,
            trials = summary.total_trials,
            accuracy = ?summary.overall_accuracy_pct,
            mean_rt_ms = ?summary.mean_rt_ms,
            "session completed"
        );
        self.summary = Some(summary.clone());
        events.push(SessionEvent::SessionCompleted(summary));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::NullPresenter;
    use crate::transport::MemoryTransport;
    use chrono::Utc;
    use spanav_core::{Gender, Handedness, ParticipantGroup, Stimulus};
    use spanav_timing::SimulatedTimer;

    fn participant(id: &str) -> ParticipantInfo {
        ParticipantInfo {
            id: id.into(),
            group: ParticipantGroup::HNS,
            age: 30,
            gender: Gender::Female,
            handedness: Handedness::Left,
            device_type: Some("desktop".into()),
            registered_at: Utc::now(),
        }
    }

    fn pool(prefix: &str, n: usize) -> Vec<Stimulus> {
        (0..n)
            .map(|i| Stimulus {
                id: format!("{prefix}{i}"),
                file: format!("{prefix}{i}.png"),
                egocentric_correct: Some(Direction::Up),
                allocentric_correct: Some(Direction::Left),
                arrows: Vec::new(),
            })
            .collect()
    }

    fn small_config() -> ExperimentConfig {
        ExperimentConfig {
            trials_per_block: 3,
            practice_trials: 2,
            catch_trials_per_block: 1,
            repetitions: 1,
            button_familiarization: false,
            ..Default::default()
        }
    }

    fn session(
        config: ExperimentConfig,
        catalog: StimulusCatalog,
    ) -> SessionStateMachine<SimulatedTimer, MemoryTransport> {
        SessionStateMachine::new(
            config,
            catalog,
            participant("HNS-12"),
            SimulatedTimer::new(),
            MemoryTransport::default(),
        )
        .unwrap()
        .with_seed_jitter(|| 0)
    }

    fn full_catalog() -> StimulusCatalog {
        StimulusCatalog {
            easy: pool("e", 10),
            hard: pool("h", 10),
            control: pool("c", 10),
        }
    }

    /// Answers "up" as soon as each response window opens.
    fn run_trials(s: &mut SessionStateMachine<SimulatedTimer, MemoryTransport>) -> Vec<SessionEvent> {
        let mut p = NullPresenter;
        let mut events = Vec::new();
        while s.stage() == Stage::Trial {
            let deadline = s.next_deadline().unwrap();
            let timer = s.timer().clone();
            timer.sleep_until(deadline);
            events.extend(s.update(&mut p));
            if s.trial_machine().state() == spanav_core::TrialState::AwaitingResponse {
                timer.advance_ms(250);
                s.respond(Direction::Up, &mut p);
            }
        }
        events
    }

    #[test]
    fn rejects_empty_catalog_and_bad_input() {
        let err = SessionStateMachine::new(
            ExperimentConfig::default(),
            StimulusCatalog::default(),
            participant("X-1"),
            SimulatedTimer::new(),
            MemoryTransport::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ExperimentError::EmptyCatalog));

        let mut young = participant("X-1");
        young.age = 12;
        let err = SessionStateMachine::new(
            ExperimentConfig::default(),
            full_catalog(),
            young,
            SimulatedTimer::new(),
            MemoryTransport::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ExperimentError::InvalidParticipant(_)));
    }

    #[test]
    fn block_order_follows_participant_id() {
        let s = session(ExperimentConfig::default(), full_catalog());
        assert_eq!(s.counterbalance_group(), assign_group("HNS-12"));
        assert_eq!(s.blocks().len(), 9);
        assert!(s.blocks()[4].is_control());
    }

    #[test]
    fn practice_flow_shows_interstitials_and_keeps_records_out_of_log() {
        let mut s = session(small_config(), full_catalog());
        let mut p = NullPresenter;
        s.start(&mut p);
        assert_eq!(s.phase(), SessionPhase::Practice);
        assert_eq!(
            s.stage(),
            Stage::Interstitial(Interstitial::PracticeIntro { trials: 2 })
        );

        s.acknowledge(&mut p);
        assert_eq!(
            s.stage(),
            Stage::Interstitial(Interstitial::PracticeNavType(NavType::Egocentric))
        );
        s.acknowledge(&mut p);
        let events = run_trials(&mut s);
        assert!(matches!(events[0], SessionEvent::PracticeTrialCompleted(_)));
        assert_eq!(
            s.stage(),
            Stage::Interstitial(Interstitial::PracticeNavType(NavType::Allocentric))
        );

        s.acknowledge(&mut p);
        run_trials(&mut s);
        assert_eq!(s.stage(), Stage::Interstitial(Interstitial::PracticeComplete));
        assert_eq!(s.transport().records.len(), 2);
        assert!(s.records().is_empty());

        // Allocentric practice trial answered "up" against "left".
        let second = &s.transport().records[1];
        assert_eq!(second.accuracy, 0);
        assert_eq!(second.trial, 2);
        assert_eq!(second.difficulty, Difficulty::Practice);
        assert_eq!(second.fields()[10], "practice");

        s.acknowledge(&mut p);
        assert_eq!(s.phase(), SessionPhase::Experiment);
        assert!(matches!(
            s.stage(),
            Stage::Interstitial(Interstitial::BlockIntro { index: 0, total: 5, .. })
        ));
    }

    #[test]
    fn full_session_produces_summary() {
        let mut config = small_config();
        config.practice_trials = 0;
        let mut s = session(config, full_catalog());
        let mut p = NullPresenter;
        s.start(&mut p);
        assert_eq!(s.phase(), SessionPhase::Experiment);

        let mut events = Vec::new();
        while !s.is_finished() {
            events.extend(s.acknowledge(&mut p));
            events.extend(run_trials(&mut s));
        }
        assert_eq!(s.phase(), SessionPhase::Debrief);
        assert_eq!(s.records().len(), 15);
        let blocks = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::BlockCompleted { .. }))
            .count();
        assert_eq!(blocks, 5);

        let summary = s.summary().unwrap();
        assert_eq!(summary.total_trials, 15);
        assert_eq!(summary.catch_trials, 5);
        assert!(summary.incomplete_blocks.is_empty());
        assert_eq!(s.transport().summaries.len(), 1);
        assert!(matches!(events.last(), Some(SessionEvent::SessionCompleted(_))));
    }

    #[test]
    fn missing_pool_flags_block_and_skips_slots() {
        let mut config = small_config();
        config.practice_trials = 0;
        let catalog = StimulusCatalog {
            easy: pool("e", 10),
            hard: pool("h", 10),
            control: Vec::new(),
        };
        let mut s = session(config, catalog);
        let mut p = NullPresenter;
        s.start(&mut p);

        let mut events = Vec::new();
        while !s.is_finished() {
            events.extend(s.acknowledge(&mut p));
            events.extend(run_trials(&mut s));
        }
        assert!(events.contains(&SessionEvent::BlockIncomplete {
            index: 4,
            expected: 3,
            actual: 0
        }));
        let skipped = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::TrialSkipped { block: BlockLabel::Block(5), .. }))
            .count();
        assert_eq!(skipped, 3);
        let summary = s.summary().unwrap();
        assert_eq!(summary.incomplete_blocks, vec![5]);
        assert_eq!(summary.skipped_trials, 3);
        assert_eq!(summary.total_trials, 12);
    }

    #[test]
    fn respond_outside_a_trial_is_ignored() {
        let mut s = session(small_config(), full_catalog());
        let mut p = NullPresenter;
        assert!(!s.respond(Direction::Up, &mut p));
        s.start(&mut p);
        assert!(!s.respond(Direction::Up, &mut p));
        assert!(s.update(&mut p).is_empty());
    }

    #[test]
    fn familiarization_waits_for_each_target_before_practice() {
        let config = ExperimentConfig {
            button_familiarization: true,
            ..small_config()
        };
        let mut s = session(config, full_catalog());
        let mut p = NullPresenter;
        s.start(&mut p);
        assert_eq!(s.stage(), Stage::Training);
        assert!(s.acknowledge(&mut p).is_empty());

        for done in 0..8 {
            let target = s.training_target().unwrap();
            let wrong = Direction::ALL.into_iter().find(|d| *d != target).unwrap();
            assert!(!s.respond(wrong, &mut p));
            assert_eq!(s.stage(), Stage::Training);
            assert_eq!(s.training_target(), Some(target));
            assert_eq!(s.state().training.as_ref().unwrap().completed(), done);
            assert!(s.respond(target, &mut p));
        }

        assert_eq!(s.training_target(), None);
        assert!(s.state().training.is_none());
        assert_eq!(
            s.stage(),
            Stage::Interstitial(Interstitial::PracticeIntro { trials: 2 })
        );
        assert!(s.transport().records.is_empty());
    }

    #[test]
    fn second_trial_is_not_started_over_one_in_flight() {
        let mut s = session(small_config(), full_catalog());
        let mut p = NullPresenter;
        s.start(&mut p);
        s.acknowledge(&mut p);
        s.acknowledge(&mut p);
        assert_eq!(s.stage(), Stage::Trial);
        let first = s.trial_machine().current().unwrap().clone();

        let other = Trial::new(
            5,
            BlockLabel::Practice,
            TrialEntry::Regular(pool("x", 1).remove(0)),
            NavType::Egocentric,
            Difficulty::Practice,
            &s.config,
        );
        assert!(!s.begin(other, &mut p));
        assert_eq!(s.trial_machine().current(), Some(&first));
    }
}
