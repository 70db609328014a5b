mod common;

use common::{RecordingPresenter, catalog, correct_after, participant, run_session};
use spanav_core::{BlockLabel, Direction, Response, TrialRecord, TrialType};
use spanav_experiment::{
    ExperimentConfig, ExperimentError, Feedback, Interstitial, JsonLinesTransport, MemoryTransport,
    NullTransport, SessionEvent, SessionStateMachine, Transport, TransportError, build_block_sequence,
};
use spanav_timing::SimulatedTimer;
use std::collections::HashSet;

fn new_session<X: Transport>(
    config: ExperimentConfig,
    id: &str,
    catalog: spanav_core::StimulusCatalog,
    transport: X,
) -> (SessionStateMachine<SimulatedTimer, X>, RecordingPresenter) {
    let timer = SimulatedTimer::new();
    let presenter = RecordingPresenter::new(timer.clone());
    let session = SessionStateMachine::new(config, catalog, participant(id), timer, transport)
        .expect("valid session")
        .with_seed_jitter(|| 7);
    (session, presenter)
}

#[test]
fn default_session_runs_nine_blocks_of_fifteen() {
    let (mut session, mut presenter) = new_session(
        ExperimentConfig::default(),
        "HF-21",
        catalog(40, 40, 20),
        MemoryTransport::default(),
    );
    let events = run_session(&mut session, &mut presenter, correct_after(450));

    let records = session.records();
    assert_eq!(records.len(), 9 * 15);
    assert!(records.iter().all(|r| !r.is_practice()));
    assert!(records.iter().all(|r| r.accuracy == 1 && r.rt == Some(450)));

    for block in 1..=9 {
        let in_block: Vec<&TrialRecord> = records
            .iter()
            .filter(|r| r.block == BlockLabel::Block(block))
            .collect();
        assert_eq!(in_block.len(), 15);
        assert_eq!(in_block.iter().filter(|r| r.trial_type == TrialType::Catch).count(), 1);
        let trials: Vec<usize> = in_block.iter().map(|r| r.trial).collect();
        assert_eq!(trials, (1..=15).collect::<Vec<_>>());
    }

    let expected_order = build_block_sequence(session.counterbalance_group(), 2);
    let started: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::BlockStarted { spec, .. } => Some(*spec),
            _ => None,
        })
        .collect();
    assert_eq!(started, expected_order);

    let summary = session.summary().expect("summary after completion");
    assert_eq!(summary.total_trials, 135);
    assert_eq!(summary.catch_trials, 9);
    assert_eq!(summary.overall_accuracy_pct, Some(100.0));
    assert_eq!(summary.mean_rt_ms, Some(450));
    assert_eq!(presenter.summaries.len(), 1);
    assert_eq!(presenter.preloads.len(), 9);
    assert!(presenter.preloads.iter().all(|files| files.len() == 14));
}

#[test]
fn practice_goes_to_transport_but_not_to_the_log() {
    let (mut session, mut presenter) = new_session(
        ExperimentConfig::default(),
        "DF-4",
        catalog(12, 12, 6),
        MemoryTransport::default(),
    );
    let events = run_session(&mut session, &mut presenter, correct_after(600));

    let practice = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::PracticeTrialCompleted(_)))
        .count();
    assert_eq!(practice, 7);
    assert_eq!(presenter.feedback.len(), 7);
    assert!(presenter.feedback.iter().all(|f| *f == Feedback::Correct));

    let sent = &session.transport().records;
    assert_eq!(sent.len(), 7 + 135);
    assert!(sent[..7].iter().all(TrialRecord::is_practice));
    assert!(session.records().iter().all(|r| !r.is_practice()));

    let nav_screens: Vec<_> = presenter
        .screens
        .iter()
        .filter(|s| matches!(s, Interstitial::PracticeNavType(_)))
        .collect();
    assert_eq!(nav_screens.len(), 2);
}

#[test]
fn familiarization_runs_before_practice_and_records_nothing() {
    let config = ExperimentConfig {
        trials_per_block: 4,
        practice_trials: 2,
        repetitions: 1,
        ..Default::default()
    };
    let (mut session, mut presenter) =
        new_session(config, "HF-15", catalog(10, 10, 10), MemoryTransport::default());
    run_session(&mut session, &mut presenter, correct_after(400));

    let shown: Vec<usize> = presenter.training.iter().map(|p| p.completed).collect();
    assert_eq!(shown, (0..8).collect::<Vec<_>>());
    assert!(presenter.training.iter().all(|p| p.total == 8 && p.missed.is_none()));
    for d in Direction::ALL {
        assert_eq!(presenter.training.iter().filter(|p| p.target == d).count(), 2);
    }
    assert_eq!(
        presenter.screens.first(),
        Some(&Interstitial::PracticeIntro { trials: 2 })
    );
    assert_eq!(session.transport().records.len(), 2 + 5 * 4);
}

#[test]
fn consecutive_onsets_respect_lockout_and_fixation() {
    let (mut session, mut presenter) = new_session(
        ExperimentConfig::default(),
        "HNF-8",
        catalog(40, 40, 20),
        NullTransport,
    );
    // Fast responder: the gap is set by the lockout, not by the response.
    run_session(&mut session, &mut presenter, correct_after(5));

    let min_gap_ns = (500 + 800) * 1_000_000;
    assert_eq!(presenter.onsets.len(), 7 + 135);
    for pair in presenter.onsets.windows(2) {
        assert!(pair[1] - pair[0] >= min_gap_ns, "onsets too close: {pair:?}");
    }
}

#[test]
fn longer_iti_wins_over_lockout() {
    let config = ExperimentConfig {
        practice_trials: 0,
        iti_duration_ms: 1200,
        ..Default::default()
    };
    let (mut session, mut presenter) =
        new_session(config, "HNF-9", catalog(40, 40, 20), NullTransport);
    run_session(&mut session, &mut presenter, correct_after(5));

    let gap_ns = (5 + 1200 + 800) * 1_000_000;
    for pair in presenter.onsets.windows(2) {
        assert!(pair[1] - pair[0] >= gap_ns);
    }
}

#[test]
fn timeouts_are_recorded_with_null_rt() {
    let config = ExperimentConfig {
        practice_trials: 1,
        ..Default::default()
    };
    let (mut session, mut presenter) =
        new_session(config, "HNS-2", catalog(40, 40, 20), MemoryTransport::default());
    run_session(&mut session, &mut presenter, |_| None);

    assert!(session.records().iter().all(|r| {
        r.response == Response::Timeout && r.rt.is_none() && r.accuracy == 0
    }));
    assert!(matches!(presenter.feedback[..], [Feedback::TooSlow { .. }]));
    let summary = session.summary().unwrap();
    assert_eq!(summary.mean_rt_ms, None);
    assert_eq!(summary.overall_accuracy_pct, Some(0.0));
}

#[test]
fn wrong_answers_score_zero_but_keep_rt() {
    let config = ExperimentConfig {
        practice_trials: 0,
        ..Default::default()
    };
    let (mut session, mut presenter) =
        new_session(config, "DNF-5", catalog(40, 40, 20), NullTransport);
    let wrong = |trial: &spanav_experiment::Trial| {
        let expected = trial.entry.correct_for(trial.nav_type)?;
        let other = Direction::ALL.into_iter().find(|d| *d != expected)?;
        Some((700, other))
    };
    run_session(&mut session, &mut presenter, wrong);

    for record in session.records() {
        assert_eq!(record.accuracy, 0);
        assert_eq!(record.rt, Some(700));
        assert_ne!(Some(record.response.direction().unwrap()), record.correct_response);
    }
}

#[test]
fn missing_pool_flags_blocks_instead_of_shortening_silently() {
    let config = ExperimentConfig {
        practice_trials: 0,
        ..Default::default()
    };
    let (mut session, mut presenter) =
        new_session(config, "HF-30", catalog(40, 0, 20), MemoryTransport::default());
    let events = run_session(&mut session, &mut presenter, correct_after(400));

    let incomplete: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::BlockIncomplete { index, actual, .. } => {
                assert_eq!(*actual, 0);
                Some(index + 1)
            }
            _ => None,
        })
        .collect();
    assert_eq!(incomplete.len(), 4);

    let summary = session.summary().unwrap();
    assert_eq!(summary.incomplete_blocks, incomplete);
    assert_eq!(summary.skipped_trials, 4 * 15);
    assert_eq!(session.records().len(), 5 * 15);
}

#[test]
fn empty_catalog_refuses_to_start() {
    let result = SessionStateMachine::new(
        ExperimentConfig::default(),
        catalog(0, 0, 0),
        participant("HF-1"),
        SimulatedTimer::new(),
        NullTransport,
    );
    assert!(matches!(result, Err(ExperimentError::EmptyCatalog)));
}

struct FailingTransport {
    attempts: usize,
}

impl Transport for FailingTransport {
    fn persist(&mut self, _record: &TrialRecord) -> Result<(), TransportError> {
        self.attempts += 1;
        Err(TransportError::Unavailable("sheet endpoint returned 503".into()))
    }

    fn persist_summary(
        &mut self,
        _summary: &spanav_experiment::SessionSummary,
    ) -> Result<(), TransportError> {
        Err(TransportError::Unavailable("sheet endpoint returned 503".into()))
    }
}

#[test]
fn transport_failures_do_not_interrupt_the_session() {
    let (mut session, mut presenter) = new_session(
        ExperimentConfig::default(),
        "DF-77",
        catalog(40, 40, 20),
        FailingTransport { attempts: 0 },
    );
    run_session(&mut session, &mut presenter, correct_after(300));
    assert!(session.is_finished());
    assert_eq!(session.records().len(), 135);
    assert_eq!(session.transport().attempts, 7 + 135);
}

#[test]
fn json_lines_monitor_tags_practice_and_ends_with_summary() {
    let config = ExperimentConfig {
        trials_per_block: 4,
        practice_trials: 2,
        repetitions: 1,
        ..Default::default()
    };
    let (mut session, mut presenter) = new_session(
        config,
        "HNS-40",
        catalog(10, 10, 10),
        JsonLinesTransport::new(Vec::new()),
    );
    run_session(&mut session, &mut presenter, correct_after(350));

    let bytes = session.into_transport().into_inner();
    let lines: Vec<serde_json::Value> = String::from_utf8(bytes)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2 + 5 * 4 + 1);
    assert_eq!(lines[0]["block"], "practice");
    assert_eq!(lines[0]["difficulty"], "practice");
    assert_eq!(lines[2]["block"], 1);
    let summary = &lines.last().unwrap()["summary"];
    assert_eq!(summary["participant_id"], "HNS-40");
    assert_eq!(summary["total_trials"], 20);
}

#[test]
fn sessions_are_independent() {
    let config = ExperimentConfig {
        practice_trials: 0,
        ..Default::default()
    };
    let (mut a, mut pa) = new_session(config.clone(), "HF-1", catalog(40, 40, 20), NullTransport);
    let (mut b, mut pb) = new_session(config, "HF-2", catalog(40, 40, 20), NullTransport);
    run_session(&mut a, &mut pa, correct_after(400));
    run_session(&mut b, &mut pb, |_| None);

    assert_ne!(a.blocks(), b.blocks());
    assert!(a.records().iter().all(|r| r.participant_id == "HF-1" && r.accuracy == 1));
    assert!(b.records().iter().all(|r| r.participant_id == "HF-2" && r.accuracy == 0));
}

#[test]
fn same_participant_gets_same_block_order() {
    let build = || {
        SessionStateMachine::new(
            ExperimentConfig::default(),
            catalog(5, 5, 5),
            participant("DNF-1234"),
            SimulatedTimer::new(),
            NullTransport,
        )
        .unwrap()
    };
    assert_eq!(build().blocks(), build().blocks());
}

#[test]
fn no_id_repeats_within_a_key_until_its_pool_is_exhausted() {
    let config = ExperimentConfig {
        practice_trials: 0,
        ..Default::default()
    };
    // 40 easy ids, two easy blocks per nav type: 28 regular picks per key.
    let (mut session, mut presenter) =
        new_session(config, "HF-3", catalog(40, 40, 20), NullTransport);
    run_session(&mut session, &mut presenter, correct_after(400));

    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    for r in session.records().iter().filter(|r| r.trial_type == TrialType::Regular) {
        let key = (
            r.navigation_type.to_string(),
            r.difficulty.to_string(),
            r.stimulus_id.clone(),
        );
        if r.navigation_type != spanav_core::NavType::Control {
            assert!(seen.insert(key), "{} repeated", r.stimulus_id);
        }
    }
}
