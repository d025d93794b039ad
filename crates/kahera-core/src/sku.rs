//! # SKU Module
//!
//! SKU generation and the variation-numbering convention used when stock
//! arrives at a new cost.
//!
//! ## SKU Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RICE-7KQ2MZ9A        base SKU   (prefix + "-" + 8-char random body)   │
//! │  RICE-7KQ2MZ9A-1      variation 1 of the base                          │
//! │  RICE-7KQ2MZ9A-2      variation 2 of the base                          │
//! │                                                                         │
//! │  base_sku("RICE-7KQ2MZ9A-2")  = "RICE-7KQ2MZ9A"                        │
//! │  base_sku("RICE-7KQ2MZ9A")    = "RICE-7KQ2MZ9A"  (body isn't numeric)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The base/variation link is only a naming convention. Variations are
//! independent products; nothing here enforces a reference between them.

use rand::Rng;

use crate::MAX_SKU_LENGTH;

/// Symbols for the random body: `[A-Z2-9]` without `I`, `L`, `O`.
pub const BODY_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Letter subset of [`BODY_ALPHABET`]. The body always ends in one, so it
/// can never be read as a variation suffix.
pub const BODY_LETTERS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ";

/// Characters in the random body.
pub const BODY_LENGTH: usize = 8;

/// Generates a new SKU with the thread RNG.
///
/// ## Example
/// ```rust
/// use kahera_core::sku;
///
/// let s = sku::generate("RICE");
/// assert!(s.starts_with("RICE-"));
/// assert!(sku::is_valid_sku(&s));
/// ```
pub fn generate(prefix: &str) -> String {
    generate_with(&mut rand::thread_rng(), prefix)
}

/// Generates a new SKU drawing the body from `rng`.
///
/// An empty prefix yields just the body.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, prefix: &str) -> String {
    let mut body: String = (0..BODY_LENGTH - 1)
        .map(|_| char::from(BODY_ALPHABET[rng.gen_range(0..BODY_ALPHABET.len())]))
        .collect();
    body.push(char::from(BODY_LETTERS[rng.gen_range(0..BODY_LETTERS.len())]));

    if prefix.is_empty() {
        body
    } else {
        format!("{}-{}", prefix, body)
    }
}

/// Splits `sku` into (base, variation) when it ends in `-<digits>`.
fn split_variation(sku: &str) -> Option<(&str, u64)> {
    let (base, suffix) = sku.rsplit_once('-')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number = suffix.parse::<u64>().ok()?;
    Some((base, number))
}

/// Strips a trailing numeric variation suffix.
///
/// ## Example
/// ```rust
/// use kahera_core::sku::base_sku;
///
/// assert_eq!(base_sku("ABC123-1"), "ABC123");
/// assert_eq!(base_sku("RICE-7KQ2MZ9A"), "RICE-7KQ2MZ9A");
/// assert_eq!(base_sku("ABC123"), "ABC123");
/// ```
pub fn base_sku(sku: &str) -> &str {
    split_variation(sku).map(|(base, _)| base).unwrap_or(sku)
}

/// The numeric variation suffix, if any.
pub fn variation_number(sku: &str) -> Option<u64> {
    split_variation(sku).map(|(_, number)| number)
}

/// Builds variation `n` of the base of `sku`.
///
/// ## Example
/// ```rust
/// use kahera_core::sku::generate_variation;
///
/// assert_eq!(generate_variation("ABC123-1", 2), "ABC123-2");
/// ```
pub fn generate_variation(sku: &str, n: u64) -> String {
    format!("{}-{}", base_sku(sku), n)
}

/// Next free variation number for the base of `sku`.
///
/// Only entries of the exact form `base-<k>` count; the unsuffixed base
/// itself is not a variation. Returns 1 when there are none.
pub fn next_variation_number<S: AsRef<str>>(sku: &str, existing_skus: &[S]) -> u64 {
    let base = base_sku(sku);
    existing_skus
        .iter()
        .filter_map(|existing| split_variation(existing.as_ref()))
        .filter(|(existing_base, _)| *existing_base == base)
        .map(|(_, number)| number)
        .max()
        .map_or(1, |max| max + 1)
}

/// Checks the SKU shape: non-empty, at most 50 characters, `[A-Za-z0-9-]+`.
pub fn is_valid_sku(sku: &str) -> bool {
    !sku.is_empty()
        && sku.len() <= MAX_SKU_LENGTH
        && sku.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}
