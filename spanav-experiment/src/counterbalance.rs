//! Latin-square counterbalancing of block order.

use serde::Serialize;
use spanav_core::{BlockSpec, Difficulty, NavType};
use std::fmt;

/// Position at which the single control block is inserted.
pub const CONTROL_BLOCK_INDEX: usize = 4;

const E: NavType = NavType::Egocentric;
const A: NavType = NavType::Allocentric;
const EASY: Difficulty = Difficulty::Easy;
const HARD: Difficulty = Difficulty::Hard;

/// Row `g - 1` is the base ordering for counterbalance group `g`.
const LATIN_SQUARE: [[(NavType, Difficulty); 4]; 4] = [
    [(E, EASY), (E, HARD), (A, EASY), (A, HARD)],
    [(E, HARD), (A, HARD), (E, EASY), (A, EASY)],
    [(A, EASY), (E, EASY), (A, HARD), (E, HARD)],
    [(A, HARD), (A, EASY), (E, HARD), (E, EASY)],
];

/// One of the four block orderings, numbered 1 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CounterbalanceGroup(u8);

impl CounterbalanceGroup {
    pub const ALL: [CounterbalanceGroup; 4] = [
        CounterbalanceGroup(1),
        CounterbalanceGroup(2),
        CounterbalanceGroup(3),
        CounterbalanceGroup(4),
    ];

    pub fn new(group: u8) -> Option<Self> {
        (1..=4).contains(&group).then_some(Self(group))
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    fn base_order(&self) -> &'static [(NavType, Difficulty); 4] {
        &LATIN_SQUARE[usize::from(self.0 - 1)]
    }
}

impl fmt::Display for CounterbalanceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Group from the first run of digits in the id, or from the sum of its
/// UTF-16 code units when it has none.
pub fn assign_group(participant_id: &str) -> CounterbalanceGroup {
    let digits: String = participant_id
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    let residue = if digits.is_empty() {
        participant_id
            .encode_utf16()
            .fold(0u32, |acc, unit| (acc + u32::from(unit)) % 4)
    } else {
        // Reduce digit by digit so arbitrarily long runs cannot overflow.
        digits
            .bytes()
            .fold(0u32, |acc, b| (acc * 10 + u32::from(b - b'0')) % 4)
    };

    CounterbalanceGroup(residue as u8 + 1)
}

/// Base row repeated `repetitions` times with one control block spliced in at
/// `CONTROL_BLOCK_INDEX` (or at the end when the sequence is shorter).
pub fn build_block_sequence(group: CounterbalanceGroup, repetitions: usize) -> Vec<BlockSpec> {
    let mut blocks: Vec<BlockSpec> = (0..repetitions)
        .flat_map(|_| group.base_order().iter())
        .map(|&(nav, difficulty)| BlockSpec::new(nav, difficulty))
        .collect();
    let at = CONTROL_BLOCK_INDEX.min(blocks.len());
    blocks.insert(at, BlockSpec::CONTROL);
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_digit_run_decides_group() {
        assert_eq!(assign_group("DF-0001").get(), 2);
        assert_eq!(assign_group("HNS-12-99").get(), 1);
        assert_eq!(assign_group("7").get(), 4);
        assert_eq!(
            assign_group("HF-123456789012345678901234567890").get(),
            (90 % 4) as u8 + 1
        );
    }

    #[test]
    fn ids_without_digits_use_char_sum() {
        // 'A' + 'B' = 65 + 66 = 131, 131 % 4 = 3
        assert_eq!(assign_group("AB").get(), 4);
        assert_eq!(assign_group("").get(), 1);
    }

    #[test]
    fn same_id_same_group() {
        let id = "DNF-tmp-lx0c9-a1b2c3d4";
        assert_eq!(assign_group(id), assign_group(id));
    }

    #[test]
    fn group_one_sequence_matches_latin_row() {
        let seq = build_block_sequence(CounterbalanceGroup::ALL[0], 2);
        assert_eq!(seq.len(), 9);
        assert_eq!(seq[0], BlockSpec::new(E, EASY));
        assert_eq!(seq[3], BlockSpec::new(A, HARD));
        assert_eq!(seq[4], BlockSpec::CONTROL);
        assert_eq!(seq[5], BlockSpec::new(E, EASY));
        assert_eq!(seq[8], BlockSpec::new(A, HARD));
    }

    #[test]
    fn every_group_covers_each_condition_twice() {
        for group in CounterbalanceGroup::ALL {
            let seq = build_block_sequence(group, 2);
            assert_eq!(seq.len(), 9);
            assert_eq!(seq[CONTROL_BLOCK_INDEX], BlockSpec::CONTROL);
            assert_eq!(seq.iter().filter(|b| b.is_control()).count(), 1);
            for nav in [E, A] {
                for difficulty in [EASY, HARD] {
                    let n = seq
                        .iter()
                        .filter(|b| **b == BlockSpec::new(nav, difficulty))
                        .count();
                    assert_eq!(n, 2, "group {group} {nav}/{difficulty}");
                }
            }
        }
    }

    #[test]
    fn latin_square_columns_hold_each_condition_once() {
        for col in 0..4 {
            let mut column: Vec<_> = LATIN_SQUARE.iter().map(|row| row[col]).collect();
            column.sort_by_key(|(n, d)| (n.as_str(), d.as_str()));
            column.dedup();
            assert_eq!(column.len(), 4);
        }
    }

    #[test]
    fn short_sequences_append_control() {
        let seq = build_block_sequence(CounterbalanceGroup::ALL[2], 0);
        assert_eq!(seq, vec![BlockSpec::CONTROL]);
        let seq = build_block_sequence(CounterbalanceGroup::ALL[2], 1);
        assert_eq!(seq.len(), 5);
        assert_eq!(seq[4], BlockSpec::CONTROL);
    }

    #[test]
    fn new_rejects_out_of_range() {
        assert!(CounterbalanceGroup::new(0).is_none());
        assert!(CounterbalanceGroup::new(5).is_none());
        assert_eq!(CounterbalanceGroup::new(3).map(|g| g.get()), Some(3));
    }
}
