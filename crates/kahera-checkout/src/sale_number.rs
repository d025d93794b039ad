//! # Sale Numbers
//!
//! Human-readable, register-scoped sale numbers printed on receipts.
//!
//! ```text
//!   20261014-3F-9a0c41be
//!   ────┬─── ─┬ ───┬────
//!       │     │    └── 32 random bits (hex)
//!       │     └─────── device code: last two characters of the device id
//!       └───────────── date of sale (UTC)
//! ```
//!
//! Uniqueness is enforced by the sale store; a collision surfaces as
//! `StoreError::Conflict` and the checkout draws a new number.

use chrono::{DateTime, Utc};
use rand::Rng;

/// Device code used when the device id is shorter than two characters.
pub const FALLBACK_DEVICE_CODE: &str = "00";

/// Last two characters of `device_id`, uppercased.
pub fn device_code(device_id: &str) -> String {
    let chars: Vec<char> = device_id.trim().chars().collect();
    if chars.len() < 2 {
        return FALLBACK_DEVICE_CODE.to_string();
    }
    chars[chars.len() - 2..]
        .iter()
        .flat_map(|c| c.to_uppercase())
        .collect()
}

/// Generates a sale number for now with the thread RNG.
pub fn generate(device_id: &str) -> String {
    generate_with(Utc::now(), device_id, &mut rand::thread_rng())
}

/// Generates a sale number for `at` drawing the suffix from `rng`.
pub fn generate_with<R: Rng + ?Sized>(at: DateTime<Utc>, device_id: &str, rng: &mut R) -> String {
    let suffix: u32 = rng.gen();
    format!("{}-{}-{:08x}", at.format("%Y%m%d"), device_code(device_id), suffix)
}
