use crate::error::ExperimentError;
use serde::{Deserialize, Serialize};
use spanav_core::CATCH_STIMULI;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    pub trials_per_block: usize,
    pub practice_trials: usize,
    pub catch_trials_per_block: usize,
    /// How many times the four-block Latin-square row is repeated.
    pub repetitions: usize,
    pub fixation_duration_ms: u64,
    pub max_response_time_ms: u64,
    pub iti_duration_ms: u64,
    /// Minimum gap after a response before the next trial can accept input.
    pub response_lockout_ms: u64,
    /// Practice feedback dwell time.
    pub feedback_duration_ms: u64,
    /// Press-the-shown-arrow warm-up before practice.
    pub button_familiarization: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            trials_per_block: 15,
            practice_trials: 7,
            catch_trials_per_block: 1,
            repetitions: 2,
            fixation_duration_ms: 800,
            max_response_time_ms: 3000,
            iti_duration_ms: 400,
            response_lockout_ms: 500,
            feedback_duration_ms: 2000,
            button_familiarization: true,
        }
    }
}

impl ExperimentConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExperimentError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ExperimentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ExperimentError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ExperimentError> {
        if self.trials_per_block == 0 {
            return Err(ExperimentError::InvalidConfig(
                "trials_per_block must be at least 1".into(),
            ));
        }
        if self.catch_trials_per_block > self.trials_per_block {
            return Err(ExperimentError::InvalidConfig(format!(
                "catch_trials_per_block ({}) exceeds trials_per_block ({})",
                self.catch_trials_per_block, self.trials_per_block
            )));
        }
        if self.catch_trials_per_block > CATCH_STIMULI.len() {
            return Err(ExperimentError::InvalidConfig(format!(
                "catch_trials_per_block ({}) exceeds the {} available catch stimuli",
                self.catch_trials_per_block,
                CATCH_STIMULI.len()
            )));
        }
        if self.max_response_time_ms == 0 {
            return Err(ExperimentError::InvalidConfig(
                "max_response_time_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Regular (non-catch) slots per block.
    pub fn regular_trials_per_block(&self) -> usize {
        self.trials_per_block - self.catch_trials_per_block
    }

    /// Wait after scoring a main-block trial before the next one may start.
    pub fn post_response_gap_ms(&self) -> u64 {
        self.iti_duration_ms.max(self.response_lockout_ms)
    }
}
