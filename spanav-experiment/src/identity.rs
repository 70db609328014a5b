//! Participant id assignment.

use crate::error::TransportError;
use rand::Rng;
use spanav_core::ParticipantGroup;

pub trait IdentityService {
    fn assign_participant_id(&mut self, group: ParticipantGroup) -> Result<String, TransportError>;
}

/// Offline generator: `{GROUP}-{base36 epoch ms}-{5 base36 chars}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalIdentity;

impl IdentityService for LocalIdentity {
    fn assign_participant_id(&mut self, group: ParticipantGroup) -> Result<String, TransportError> {
        const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let mut rng = rand::rng();
        let suffix: String = (0..5)
            .map(|_| char::from(ALPHABET[rng.random_range(0..36)]))
            .collect();
        Ok(format!("{}-{}-{}", group.code(), to_base36(epoch_millis()), suffix))
    }
}

/// Asks `service` for an id and falls back to a locally generated one when
/// it fails or returns a blank id.
pub fn assign_participant_id_or_fallback(
    service: &mut impl IdentityService,
    group: ParticipantGroup,
) -> String {
    match service.assign_participant_id(group) {
        Ok(id) if !id.trim().is_empty() => id,
        Ok(_) => {
            tracing::warn!(group = %group, "identity service returned a blank id, using local fallback");
            fallback_participant_id(group, epoch_millis(), rand::rng().random())
        }
        Err(e) => {
            tracing::warn!(group = %group, error = %e, "identity service unreachable, using local fallback");
            fallback_participant_id(group, epoch_millis(), rand::rng().random())
        }
    }
}

/// `{GROUP}-tmp-{base36 epoch ms}-{8 hex chars}`.
pub fn fallback_participant_id(group: ParticipantGroup, millis: u64, entropy: [u8; 4]) -> String {
    let hex: String = entropy.iter().map(|b| format!("{b:02x}")).collect();
    format!("{}-tmp-{}-{}", group.code(), to_base36(millis), hex)
}

fn epoch_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
