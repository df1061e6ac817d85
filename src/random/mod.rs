mod context_ext;
mod xorshift;

use std::cell::RefCell;

pub use context_ext::ContextRandomExt;
pub use xorshift::Xorshift64;

use crate::define_data_plugin;

const SEED_MULTIPLIER: u64 = 123_456_789;
const SEED_OFFSET: u64 = 987_654_321;

/// Derives the base seed of a replication from its identifier as
/// `id * 123456789 + 987654321`, wrapping on overflow.
///
/// A result of zero is remapped to a non-zero state by `Xorshift64::new`.
#[must_use]
pub fn replication_seed(replication_id: u64) -> u64 {
    replication_id
        .wrapping_mul(SEED_MULTIPLIER)
        .wrapping_add(SEED_OFFSET)
}

struct RngData {
    base_seed: Option<u64>,
    rng: RefCell<Xorshift64>,
}

// Registers a data container which stores:
// * base_seed: The seed the generator was last initialized with, `None`
//   until `init_random` is called
// * rng: The generator itself. It is stored in a RefCell to allow for mutable
//   borrow without requiring a mutable borrow of the Context itself.
define_data_plugin!(
    RngPlugin,
    RngData,
    RngData {
        base_seed: None,
        rng: RefCell::new(Xorshift64::new(0)),
    }
);
