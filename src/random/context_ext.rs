use std::cell::RefMut;

use crate::context::Context;
use crate::log::trace;
use crate::random::{RngPlugin, Xorshift64};

/// Gets a mutable reference to the generator of this context.
///
/// # Panics
///
/// Panics if `init_random` was not called yet.
fn get_rng(context: &Context) -> RefMut<Xorshift64> {
    let data_container = context
        .get_data_container(RngPlugin)
        .filter(|data| data.base_seed.is_some())
        .expect("You must initialize the random number generator with a base seed");

    data_container
        .rng
        .try_borrow_mut()
        .expect("The random number generator is already borrowed")
}

// This is a trait extension on Context for
// random number generation functionality.
pub trait ContextRandomExt {
    /// Seeds the generator of this context. Calling it again restarts the
    /// stream from the new seed.
    fn init_random(&mut self, base_seed: u64);

    /// Gets a random sample by applying `sampler` to the generator.
    /// Note that this will panic if `init_random` was not called yet.
    fn sample<T>(&self, sampler: impl FnOnce(&mut Xorshift64) -> T) -> T;

    /// Draws an index uniformly from `0..n`.
    fn sample_index(&self, n: usize) -> usize;

    /// Returns true with probability `p`.
    fn sample_bool(&self, p: f64) -> bool;

    /// Shuffles `items` in place with a Fisher–Yates shuffle.
    fn shuffle<T>(&self, items: &mut [T]);
}

impl ContextRandomExt for Context {
    fn init_random(&mut self, base_seed: u64) {
        trace!("initializing random module with seed {base_seed}");
        let data_container = self.get_data_container_mut(RngPlugin);
        data_container.base_seed = Some(base_seed);
        *data_container.rng.get_mut() = Xorshift64::new(base_seed);
    }

    fn sample<T>(&self, sampler: impl FnOnce(&mut Xorshift64) -> T) -> T {
        let mut rng = get_rng(self);
        sampler(&mut rng)
    }

    fn sample_index(&self, n: usize) -> usize {
        self.sample(|rng| rng.sample_index(n))
    }

    fn sample_bool(&self, p: f64) -> bool {
        self.sample(|rng| rng.sample_bool(p))
    }

    fn shuffle<T>(&self, items: &mut [T]) {
        self.sample(|rng| rng.shuffle(items));
    }
}
