use crate::counterbalance::CounterbalanceGroup;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use spanav_core::{ParticipantGroup, ParticipantInfo, TrialRecord};

/// End-of-session statistics over the exported (non-practice) records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub participant_id: String,
    pub participant_group: ParticipantGroup,
    pub counterbalance_group: CounterbalanceGroup,
    pub total_trials: usize,
    pub regular_trials: usize,
    pub catch_trials: usize,
    pub correct_regular: usize,
    pub correct_catch: usize,
    pub overall_accuracy_pct: Option<f64>,
    pub regular_accuracy_pct: Option<f64>,
    pub catch_accuracy_pct: Option<f64>,
    /// Mean over non-timeout trials, whole milliseconds.
    pub mean_rt_ms: Option<u64>,
    /// 1-based numbers of blocks that came up short.
    pub incomplete_blocks: Vec<usize>,
    pub skipped_trials: usize,
    pub completed_at: DateTime<Utc>,
}

fn pct(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}

impl SessionSummary {
    pub fn from_records(
        participant: &ParticipantInfo,
        counterbalance_group: CounterbalanceGroup,
        records: &[TrialRecord],
        incomplete_blocks: Vec<usize>,
        skipped_trials: usize,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let records: Vec<&TrialRecord> = records.iter().filter(|r| !r.is_practice()).collect();
        let catch_trials = records.iter().filter(|r| r.is_catch()).count();
        let regular_trials = records.len() - catch_trials;
        let correct_catch = records.iter().filter(|r| r.is_catch() && r.is_correct()).count();
        let correct_regular = records.iter().filter(|r| !r.is_catch() && r.is_correct()).count();

        let rts: Vec<u64> = records.iter().filter_map(|r| r.rt).collect();
        let mean_rt_ms = (!rts.is_empty())
            .then(|| (rts.iter().sum::<u64>() as f64 / rts.len() as f64).round() as u64);

        Self {
            participant_id: participant.id.clone(),
            participant_group: participant.group,
            counterbalance_group,
            total_trials: records.len(),
            regular_trials,
            catch_trials,
            correct_regular,
            correct_catch,
            overall_accuracy_pct: pct(correct_regular + correct_catch, records.len()),
            regular_accuracy_pct: pct(correct_regular, regular_trials),
            catch_accuracy_pct: pct(correct_catch, catch_trials),
            mean_rt_ms,
            incomplete_blocks,
            skipped_trials,
            completed_at,
        }
    }

    pub const COLUMNS: [&'static str; 15] = [
        "participant_id",
        "participant_group",
        "counterbalance_group",
        "total_trials",
        "regular_trials",
        "catch_trials",
        "correct_regular",
        "correct_catch",
        "overall_accuracy_pct",
        "regular_accuracy_pct",
        "catch_accuracy_pct",
        "mean_rt_ms",
        "incomplete_blocks",
        "skipped_trials",
        "completed_at",
    ];

    pub fn fields(&self) -> [String; 15] {
        let pct = |v: Option<f64>| v.map(|p| format!("{p:.1}")).unwrap_or_default();
        [
            self.participant_id.clone(),
            self.participant_group.code().to_string(),
            self.counterbalance_group.to_string(),
            self.total_trials.to_string(),
            self.regular_trials.to_string(),
            self.catch_trials.to_string(),
            self.correct_regular.to_string(),
            self.correct_catch.to_string(),
            pct(self.overall_accuracy_pct),
            pct(self.regular_accuracy_pct),
            pct(self.catch_accuracy_pct),
            self.mean_rt_ms.map(|m| m.to_string()).unwrap_or_default(),
            self.incomplete_blocks
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(";"),
            self.skipped_trials.to_string(),
            self.completed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        ]
    }
}
