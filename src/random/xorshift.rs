//! The xorshift64 generator that drives every stochastic decision of a
//! replication.
//!
//! Uniform draws are computed as `state / u64::MAX` after each step, so a
//! given seed reproduces the same stream bit for bit on every platform.

use crate::rand::{RngCore, SeedableRng};

/// The largest `f64` strictly below 1.0.
const LARGEST_BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

/// A fast, non-cryptographic 64 bit xorshift generator (shifts 13, 7, 17).
///
/// The state is never zero: a zero seed is remapped to 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    #[must_use]
    pub fn new(seed: u64) -> Xorshift64 {
        Xorshift64 {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    #[must_use]
    pub fn state(&self) -> u64 {
        self.state
    }

    #[inline]
    fn step(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Draws a value uniformly from `[0, 1)`.
    #[inline]
    #[allow(clippy::cast_precision_loss)]
    pub fn next_uniform(&mut self) -> f64 {
        let u = self.step() as f64 / u64::MAX as f64;
        // States within 2^10 of `u64::MAX` round up to exactly 1.0.
        u.min(LARGEST_BELOW_ONE)
    }

    /// Draws an index uniformly from `0..n` as `floor(u * n)`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `n == 0`.
    #[inline]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn sample_index(&mut self, n: usize) -> usize {
        debug_assert!(n > 0, "cannot sample an index from an empty range");
        let index = (self.next_uniform() * n as f64) as usize;
        index.min(n - 1)
    }

    /// Returns true with probability `p`, consuming exactly one draw.
    #[inline]
    pub fn sample_bool(&mut self, p: f64) -> bool {
        self.next_uniform() < p
    }

    /// Fisher–Yates shuffle: for `i` from `len - 1` down to 1, swap `i` with
    /// an index drawn uniformly from `0..=i`.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.sample_index(i + 1);
            items.swap(i, j);
        }
    }
}

impl RngCore for Xorshift64 {
    #[allow(clippy::cast_possible_truncation)]
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.step()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for Xorshift64 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Xorshift64::new(u64::from_le_bytes(seed))
    }

    // The default implementation scrambles the seed; replications are
    // defined in terms of the raw seed value.
    fn seed_from_u64(state: u64) -> Self {
        Xorshift64::new(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_stream_from_seed_one() {
        let mut rng = Xorshift64::new(1);
        assert_eq!(rng.next_u64(), 1_082_269_761);
        assert_eq!(rng.next_u64(), 1_152_992_998_833_853_505);
        assert_eq!(rng.next_u64(), 11_177_516_664_432_764_457);
    }

    #[test]
    fn zero_seed_is_remapped() {
        let mut zero = Xorshift64::new(0);
        let mut one = Xorshift64::new(1);
        assert_eq!(zero.state(), 1);
        assert_eq!(zero.next_u64(), one.next_u64());
        assert_eq!(Xorshift64::seed_from_u64(0).state(), 1);
        assert_eq!(Xorshift64::from_seed([0; 8]).state(), 1);
    }

    #[test]
    fn seed_from_u64_keeps_raw_seed() {
        assert_eq!(Xorshift64::seed_from_u64(987_654_321).state(), 987_654_321);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn uniform_matches_state_ratio() {
        let mut rng = Xorshift64::new(1);
        #[allow(clippy::cast_precision_loss)]
        let expected = 1_082_269_761_f64 / u64::MAX as f64;
        assert_eq!(rng.next_uniform(), expected);
    }

    #[test]
    fn uniform_stays_below_one() {
        let mut rng = Xorshift64::new(1);
        for _ in 0..100_000 {
            let u = rng.next_uniform();
            assert!((0.0..1.0).contains(&u));
        }
        assert!(LARGEST_BELOW_ONE < 1.0);
        #[allow(clippy::cast_precision_loss)]
        let top = (u64::MAX - 1) as f64 / u64::MAX as f64;
        assert_eq!(top, 1.0);
    }

    #[test]
    fn sample_index_in_range() {
        let mut rng = Xorshift64::new(42);
        for n in 1..50 {
            for _ in 0..100 {
                assert!(rng.sample_index(n) < n);
            }
        }
    }

    #[test]
    fn sample_index_is_roughly_uniform() {
        let mut rng = Xorshift64::new(7);
        let mut counts = [0usize; 4];
        for _ in 0..40_000 {
            counts[rng.sample_index(4)] += 1;
        }
        for count in counts {
            assert!((9_000..11_000).contains(&count), "{counts:?}");
        }
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = Xorshift64::new(3);
        let mut items: Vec<usize> = (0..100).collect();
        rng.shuffle(&mut items);
        assert_ne!(items, (0..100).collect::<Vec<_>>());
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn shuffle_is_reproducible() {
        let mut a: Vec<u32> = (0..20).collect();
        let mut b = a.clone();
        Xorshift64::new(11).shuffle(&mut a);
        Xorshift64::new(11).shuffle(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn shuffle_of_short_slices_draws_nothing() {
        let mut rng = Xorshift64::new(5);
        let mut empty: [u8; 0] = [];
        let mut single = [9];
        rng.shuffle(&mut empty);
        rng.shuffle(&mut single);
        assert_eq!(single, [9]);
        assert_eq!(rng, Xorshift64::new(5));
    }

    #[test]
    fn fill_bytes_handles_partial_chunks() {
        let mut rng = Xorshift64::new(1);
        let mut buf = [0u8; 11];
        rng.fill_bytes(&mut buf);
        assert_eq!(&buf[..8], &1_082_269_761_u64.to_le_bytes());
        assert_eq!(&buf[8..], &1_152_992_998_833_853_505_u64.to_le_bytes()[..3]);
    }
}
