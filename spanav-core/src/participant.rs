use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Recruitment group, used as the prefix of assigned participant ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticipantGroup {
    DF,
    HF,
    DNF,
    HNF,
    HNS,
}

impl ParticipantGroup {
    pub const ALL: [ParticipantGroup; 5] = [
        ParticipantGroup::DF,
        ParticipantGroup::HF,
        ParticipantGroup::DNF,
        ParticipantGroup::HNF,
        ParticipantGroup::HNS,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ParticipantGroup::DF => "DF",
            ParticipantGroup::HF => "HF",
            ParticipantGroup::DNF => "DNF",
            ParticipantGroup::HNF => "HNF",
            ParticipantGroup::HNS => "HNS",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ParticipantGroup::DF => "Deaf Fluent Signer",
            ParticipantGroup::HF => "Hearing Fluent Signer",
            ParticipantGroup::DNF => "Deaf Non-Fluent Signer",
            ParticipantGroup::HNF => "Hearing Non-Fluent Signer",
            ParticipantGroup::HNS => "Hearing Non-Signer",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ParticipantGroup::DF => "Deaf individuals who are fluent in sign language",
            ParticipantGroup::HF => "Hearing individuals who are fluent in sign language",
            ParticipantGroup::DNF => "Deaf individuals who are not fluent in sign language",
            ParticipantGroup::HNF => "Hearing individuals who are not fluent in sign language",
            ParticipantGroup::HNS => "Hearing individuals who do not know sign language",
        }
    }
}

impl fmt::Display for ParticipantGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ParticipantGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParticipantGroup::ALL
            .into_iter()
            .find(|g| g.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown participant group `{s}` (expected DF, HF, DNF, HNF or HNS)"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    PreferNot,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::NonBinary => "non-binary",
            Gender::PreferNot => "prefer-not",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "non-binary" => Ok(Gender::NonBinary),
            "prefer-not" => Ok(Gender::PreferNot),
            other => Err(format!("unknown gender `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Right,
    Left,
    Ambidextrous,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Handedness::Right => "right",
            Handedness::Left => "left",
            Handedness::Ambidextrous => "ambidextrous",
        }
    }
}

impl FromStr for Handedness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "right" => Ok(Handedness::Right),
            "left" => Ok(Handedness::Left),
            "ambidextrous" => Ok(Handedness::Ambidextrous),
            other => Err(format!("unknown handedness `{other}`")),
        }
    }
}

/// Demographics collected before the session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub id: String,
    pub group: ParticipantGroup,
    pub age: u8,
    pub gender: Gender,
    pub handedness: Handedness,
    /// Reported by the input adapter (e.g. `desktop`, `mobile/tablet`).
    pub device_type: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl ParticipantInfo {
    pub const MIN_AGE: u8 = 18;
    pub const MAX_AGE: u8 = 100;

    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("participant id is empty".to_string());
        }
        if !(Self::MIN_AGE..=Self::MAX_AGE).contains(&self.age) {
            return Err(format!(
                "age {} outside {}..={}",
                self.age,
                Self::MIN_AGE,
                Self::MAX_AGE
            ));
        }
        Ok(())
    }
}
