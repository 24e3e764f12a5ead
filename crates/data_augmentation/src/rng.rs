//! Thread-local random source for transforms.
//!
//! Transforms never own a generator: every call receives a
//! `&mut dyn RngCore`. Callers that do not want to carry one around can
//! use the per-thread generator here instead. Each thread seeds its own
//! copy, so pipelines on different threads never share mutable state.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::cell::RefCell;

thread_local! {
    /// Thread-local RNG for deterministic randomness.
    pub static THREAD_RNG: RefCell<Option<StdRng>> = const { RefCell::new(None) };
}

/// Seeds this thread's generator. Seed formula: `base_seed + (stream_id << 32)`,
/// giving distinct but reproducible sequences per stream.
pub fn init_rng(base_seed: u64, stream_id: u32) {
    THREAD_RNG.with(|rng| {
        let seed = base_seed.wrapping_add(u64::from(stream_id) << 32);
        *rng.borrow_mut() = Some(StdRng::seed_from_u64(seed));
    })
}

/// Drops this thread's seeded generator, falling back to OS entropy.
pub fn reset_rng() {
    THREAD_RNG.with(|rng| *rng.borrow_mut() = None)
}

/// Runs `f` with this thread's generator, or `rand::rng()` if no seed was set.
pub fn with_rng<R>(f: impl FnOnce(&mut dyn RngCore) -> R) -> R {
    THREAD_RNG.with(|rng| {
        let mut rng_ref = rng.borrow_mut();
        match rng_ref.as_mut() {
            Some(rng) => f(rng),
            None => f(&mut rand::rng()),
        }
    })
}
