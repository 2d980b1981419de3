//! Generation identifiers
//!
//! A record gets a fresh random generation whenever it is (re)initialized and
//! generation 0 when it goes back to the pool. Anyone holding a reference
//! across an unlock compares the captured value with the current one before
//! trusting the record.

use rand::Rng;

/// Generation identifier of a dialog record. Zero means "released".
pub type GenerationId = i32;

/// Generation of a record that sits in the pool
pub const RELEASED_GENERATION: GenerationId = 0;

/// Draw a fresh generation, never zero and never equal to `previous`
pub(crate) fn next_generation(previous: GenerationId) -> GenerationId {
    let mut rng = rand::thread_rng();
    loop {
        let candidate = rng.gen_range(1..=i32::MAX);
        if candidate != previous {
            return candidate;
        }
    }
}
