//! Stage dwell times.
//!
//! Each agent carries three durations, one for each of the Exposed, Infectious
//! and Recovered stages. They are drawn from a discretised negative
//! exponential: `ceil(-mean * ln(u))` for a uniform draw `u`.

use crate::random::Xorshift64;

/// Draws closer than this to 0 or 1 are replaced by 0.5.
pub const UNIFORM_GUARD: f64 = 1e-10;

/// Converts a uniform draw into a dwell time with the given mean.
///
/// Draws within `UNIFORM_GUARD` of either end of the unit interval are
/// replaced by 0.5 so that `ln(u)` stays finite and non-zero. The result is
/// at least 1.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn duration_from_uniform(u: f64, mean: f64) -> u32 {
    let u = if u <= UNIFORM_GUARD || u >= 1.0 - UNIFORM_GUARD {
        0.5
    } else {
        u
    };
    let days = (-mean * u.ln()).ceil();
    // `as` saturates, so huge means cannot wrap.
    (days as u32).max(1)
}

/// Draws a dwell time with the given mean, consuming exactly one draw.
pub fn sample_duration(rng: &mut Xorshift64, mean: f64) -> u32 {
    duration_from_uniform(rng.next_uniform(), mean)
}

/// The three dwell times an agent is created with.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StageDurations {
    pub exposed: u32,
    pub infectious: u32,
    pub recovered: u32,
}

impl StageDurations {
    /// Draws the latent, infectious and immunity durations, in that order.
    pub fn sample(
        rng: &mut Xorshift64,
        mean_latent: f64,
        mean_infectious: f64,
        mean_immunity: f64,
    ) -> StageDurations {
        let exposed = sample_duration(rng, mean_latent);
        let infectious = sample_duration(rng, mean_infectious);
        let recovered = sample_duration(rng, mean_immunity);
        StageDurations {
            exposed,
            infectious,
            recovered,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn known_values() {
        // -3 * ln(0.5) = 2.079...
        assert_eq!(duration_from_uniform(0.5, 3.0), 3);
        // -7 * ln(0.9) = 0.737...
        assert_eq!(duration_from_uniform(0.9, 7.0), 1);
        // -365 * ln(0.01) = 1680.9...
        assert_eq!(duration_from_uniform(0.01, 365.0), 1681);
    }

    #[test]
    fn degenerate_draws_use_midpoint() {
        let midpoint = duration_from_uniform(0.5, 7.0);
        assert_eq!(duration_from_uniform(0.0, 7.0), midpoint);
        assert_eq!(duration_from_uniform(1e-12, 7.0), midpoint);
        assert_eq!(duration_from_uniform(1.0 - 1e-12, 7.0), midpoint);
        assert_eq!(duration_from_uniform(1.0, 7.0), midpoint);
    }

    #[test]
    fn never_below_one() {
        assert_eq!(duration_from_uniform(0.999_999, 0.5), 1);
        assert_eq!(duration_from_uniform(0.3, 0.0), 1);
    }

    #[test]
    fn sample_consumes_one_draw() {
        let mut rng = Xorshift64::new(99);
        let mut reference = Xorshift64::new(99);
        let duration = sample_duration(&mut rng, 7.0);
        assert_eq!(duration, duration_from_uniform(reference.next_uniform(), 7.0));
        assert_eq!(rng, reference);
    }

    #[test]
    fn stage_durations_draw_in_order() {
        let mut rng = Xorshift64::new(5);
        let mut reference = Xorshift64::new(5);
        let durations = StageDurations::sample(&mut rng, 3.0, 7.0, 365.0);
        assert_eq!(durations.exposed, sample_duration(&mut reference, 3.0));
        assert_eq!(durations.infectious, sample_duration(&mut reference, 7.0));
        assert_eq!(durations.recovered, sample_duration(&mut reference, 365.0));
    }

    #[test]
    fn sample_mean_matches_discretised_exponential() {
        // The ceiling of an exponential with mean m has mean 1 / (1 - e^{-1/m}).
        let mean = 7.0;
        let mut rng = Xorshift64::new(2024);
        let n: u32 = 200_000;
        let total: u64 = (0..n)
            .map(|_| u64::from(sample_duration(&mut rng, mean)))
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let observed = total as f64 / f64::from(n);
        let expected = 1.0 / (1.0 - (-1.0_f64 / mean).exp());
        assert_relative_eq!(observed, expected, max_relative = 0.02);
    }
}
