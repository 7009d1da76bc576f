// crates/brewlog-core/src/core/ids.rs
// ============================================================================
// Module: Record Id Generation
// Description: Time-ordered push identifiers for new records.
// Purpose: Generate collision-resistant record ids that sort by creation time.
// Dependencies: rand, crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! Push ids are 20 characters: eight characters encoding the creation
//! millisecond followed by twelve random characters, all drawn from an
//! alphabet whose byte order matches its digit order. Ids generated later
//! therefore sort later. Within a single millisecond the random suffix is
//! incremented instead of redrawn so ids stay strictly increasing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::core::identifiers::RecordId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Push id alphabet in ascending byte order.
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
/// Number of characters encoding the timestamp.
const TIME_CHARS: usize = 8;
/// Number of random suffix characters.
const RANDOM_CHARS: usize = 12;
/// Highest digit value in the push alphabet.
const MAX_DIGIT: u8 = 63;

// ============================================================================
// SECTION: Generator Trait
// ============================================================================

/// Source of identifiers for newly created records.
pub trait IdGenerator: Send + Sync {
    /// Returns a fresh record id for a record created at `now`.
    fn next_id(&self, now: Timestamp) -> RecordId;
}

// ============================================================================
// SECTION: Push Ids
// ============================================================================

/// Mutable generator state guarded by the generator mutex.
#[derive(Debug)]
struct PushState {
    /// Millisecond encoded by the previous id.
    last_millis: i64,
    /// Random digits of the previous id.
    last_random: [u8; RANDOM_CHARS],
    /// Random source for fresh suffixes.
    rng: StdRng,
}

/// Time-ordered push id generator.
///
/// # Invariants
/// - Ids from one generator are strictly increasing in byte order.
#[derive(Debug)]
pub struct PushIdGenerator {
    /// Generator state.
    state: Mutex<PushState>,
}

impl Default for PushIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PushIdGenerator {
    /// Creates a generator seeded from system entropy.
    #[must_use]
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Creates a deterministic generator for tests.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    /// Builds a generator around an explicit random source.
    fn from_rng(rng: StdRng) -> Self {
        Self {
            state: Mutex::new(PushState {
                last_millis: i64::MIN,
                last_random: [0; RANDOM_CHARS],
                rng,
            }),
        }
    }
}

impl IdGenerator for PushIdGenerator {
    fn next_id(&self, now: Timestamp) -> RecordId {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let state = &mut *guard;
        let mut millis = now.as_unix_millis().max(0);
        if millis <= state.last_millis {
            millis = state.last_millis;
            if !increment_digits(&mut state.last_random) {
                millis = millis.saturating_add(1);
                fill_random(&mut state.rng, &mut state.last_random);
            }
        } else {
            fill_random(&mut state.rng, &mut state.last_random);
        }
        state.last_millis = millis;
        let encoded = encode(millis, &state.last_random);
        drop(guard);
        RecordId::from_generated(encoded)
    }
}

/// Draws a fresh random suffix.
fn fill_random(rng: &mut StdRng, digits: &mut [u8; RANDOM_CHARS]) {
    for digit in digits.iter_mut() {
        *digit = rng.gen_range(0 ..= MAX_DIGIT);
    }
}

/// Increments the suffix as a base-64 number. Returns false on overflow.
fn increment_digits(digits: &mut [u8; RANDOM_CHARS]) -> bool {
    for digit in digits.iter_mut().rev() {
        if *digit < MAX_DIGIT {
            *digit += 1;
            return true;
        }
        *digit = 0;
    }
    false
}

/// Renders the timestamp and suffix digits in the push alphabet.
fn encode(millis: i64, random: &[u8; RANDOM_CHARS]) -> String {
    let mut out = [0_u8; TIME_CHARS + RANDOM_CHARS];
    let mut remaining = millis.unsigned_abs();
    for slot in out[.. TIME_CHARS].iter_mut().rev() {
        *slot = PUSH_CHARS[usize::try_from(remaining % 64).unwrap_or(0)];
        remaining /= 64;
    }
    for (slot, digit) in out[TIME_CHARS ..].iter_mut().zip(random) {
        *slot = PUSH_CHARS[usize::from(*digit)];
    }
    out.iter().map(|byte| char::from(*byte)).collect()
}
