//! Seeded generator used for block preparation.
//!
//! A 32-bit splitmix-style mixer (mulberry32): one `u32` of state advanced by
//! a Weyl increment, then scrambled. Not cryptographic. Two generators built
//! from the same seed produce the same infinite draw sequence.

use rand::RngCore;
use rand::rand_core::impls;

const WEYL_INCREMENT: u32 = 0x6D2B_79F5;

#[derive(Debug, Clone)]
pub struct SessionRng {
    state: u32,
}

impl SessionRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Generator for a composite key such as `"<participant>_block3"`.
    pub fn for_scope(key: &str, jitter: u32) -> Self {
        Self::new(derive_seed(key, jitter))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(WEYL_INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform draw in `[0, 1)`.
    pub fn random(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Uniform index in `0..=upper`.
    pub fn index_inclusive(&mut self, upper: usize) -> usize {
        ((self.random() * (upper as f64 + 1.0)) as usize).min(upper)
    }

    /// Fisher-Yates over a copy; `items` is left untouched.
    pub fn shuffle<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut out = items.to_vec();
        for i in (1..out.len()).rev() {
            let j = self.index_inclusive(i);
            out.swap(i, j);
        }
        out
    }
}

impl RngCore for SessionRng {
    fn next_u32(&mut self) -> u32 {
        SessionRng::next_u32(self)
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        impls::fill_bytes_via_next(self, dst)
    }
}

/// Sum of the key's UTF-16 code units, scaled by 1000, plus a jitter term
/// in `0..1000`.
pub fn derive_seed(key: &str, jitter: u32) -> u32 {
    let base = key
        .encode_utf16()
        .fold(0u32, |acc, unit| acc.wrapping_add(u32::from(unit)));
    base.wrapping_mul(1000).wrapping_add(jitter % 1000)
}

/// Millisecond component of the wall clock. Two generators derived moments
/// apart from the same key will therefore differ.
pub fn wall_clock_jitter() -> u32 {
    chrono::Utc::now().timestamp_millis().rem_euclid(1000) as u32
}
