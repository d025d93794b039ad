//! # Error Types
//!
//! Domain-specific error types for kahera-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kahera-core errors (this file)                                        │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  ├── CodecError       - Cost code could not be decoded                 │
//! │  └── MappingError     - Cost code mapping rejected at save time        │
//! │                                                                         │
//! │  kahera-checkout errors (separate crate)                               │
//! │  └── CheckoutError / StoreError                                        │
//! │                                                                         │
//! │  kahera-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product is not part of the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A stored cost code failed to decode.
    #[error("Cost code error: {0}")]
    Codec(#[from] CodecError),

    /// The cost code mapping is unusable.
    #[error("Cost code mapping error: {0}")]
    Mapping(#[from] MappingError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid SKU).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Codec Error
// =============================================================================

/// A cost code string that cannot be turned back into an amount.
///
/// Decoding never guesses: any input the mapping cannot fully account for
/// is a data-integrity problem and surfaces as one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The code was empty.
    #[error("cost code is empty")]
    EmptyCode,

    /// No token of the mapping matches at `position` (character index).
    #[error("unrecognized cost code token at position {position}: '{remaining}'")]
    UnrecognizedToken { position: usize, remaining: String },

    /// The decoded digits do not fit in a u64.
    #[error("cost code '{code}' decodes to a value that is too large")]
    Overflow { code: String },
}

// =============================================================================
// Mapping Error
// =============================================================================

/// Reasons a cost code mapping is rejected when an administrator saves it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The key word does not have exactly ten letters.
    #[error("a cost code key word needs 10 letters, got {count}")]
    WrongLetterCount { count: usize },

    /// Two digits map to the same letter.
    #[error("letter '{letter}' is assigned to both digit {first} and digit {second}")]
    DuplicateLetter { letter: char, first: u8, second: u8 },

    /// A token contains a digit or whitespace.
    #[error("{token_name} contains an invalid character '{character}'")]
    InvalidCharacter { token_name: String, character: char },

    /// A special token is empty.
    #[error("{token_name} must not be empty")]
    EmptyToken { token_name: String },

    /// One token is a prefix of (or identical to) another, so decoding
    /// would be ambiguous.
    #[error("{shorter} '{shorter_value}' is a prefix of {longer} '{longer_value}'")]
    AmbiguousToken {
        shorter: String,
        shorter_value: String,
        longer: String,
        longer_value: String,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
