//! # Cost Code Codec
//!
//! Turns a peso cost into a short letter code so it can be printed on shelf
//! tags and stock cards without being legible to customers or new staff.
//!
//! ## Encoding
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Default mapping:                                                       │
//! │    1 2 3 4 5 6 7 8 9 0      "00" → X      "000" → Y                    │
//! │    B L A C K H O R S E                                                  │
//! │                                                                         │
//! │  ₱1,000  → "1000" → 1 | 000     → B Y                                  │
//! │  ₱2,050  → "2050" → 2 | 0 | 5 | 0 → L E K E                            │
//! │  ₱10,000 → "10000" → 1 | 000 | 0 → B Y E                               │
//! │                                                                         │
//! │  Scan left to right, longest zero run first: "000", then "00",         │
//! │  then one digit → one letter.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Decoding
//! The inverse parse tries the triple-zero code, the double-zero code, then
//! a single letter at each position. `decode(encode(x)) == x` holds for every
//! mapping that passes [`CostCodeMapping::validate`], because a validated
//! token set is prefix-free and so every code has exactly one parse.
//!
//! The mapping is a plain value: callers fetch it from settings and pass it
//! in. Nothing here caches or reads global state.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CodecError, MappingError};
use crate::money::{Money, CENTAVOS_PER_UNIT};

// =============================================================================
// Mapping
// =============================================================================

/// Digit → letter table plus the two zero-run tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CostCodeMapping {
    /// `digit_to_letter[d]` is the letter for digit `d`.
    pub digit_to_letter: [char; 10],
    pub double_zero_code: String,
    pub triple_zero_code: String,
}

impl Default for CostCodeMapping {
    /// "BLACKHORSE" for 1-9,0, `X` for "00", `Y` for "000".
    fn default() -> Self {
        CostCodeMapping {
            digit_to_letter: ['E', 'B', 'L', 'A', 'C', 'K', 'H', 'O', 'R', 'S'],
            double_zero_code: "X".to_string(),
            triple_zero_code: "Y".to_string(),
        }
    }
}

impl CostCodeMapping {
    /// Builds a mapping from a 10-letter key word read as digits 1..9 then 0.
    ///
    /// ## Example
    /// ```rust
    /// use kahera_core::cost_code::CostCodeMapping;
    ///
    /// let mapping = CostCodeMapping::from_key_word("BLACKHORSE", "X", "Y").unwrap();
    /// assert_eq!(mapping, CostCodeMapping::default());
    /// ```
    pub fn from_key_word(
        key_word: &str,
        double_zero_code: &str,
        triple_zero_code: &str,
    ) -> Result<Self, MappingError> {
        let letters: Vec<char> = key_word.chars().collect();
        if letters.len() != 10 {
            return Err(MappingError::WrongLetterCount {
                count: letters.len(),
            });
        }

        let mut digit_to_letter = ['\0'; 10];
        for (position, letter) in letters.into_iter().enumerate() {
            // position 0 is digit 1, position 9 is digit 0
            digit_to_letter[(position + 1) % 10] = letter;
        }

        let mapping = CostCodeMapping {
            digit_to_letter,
            double_zero_code: double_zero_code.to_string(),
            triple_zero_code: triple_zero_code.to_string(),
        };
        mapping.validate()?;
        Ok(mapping)
    }

    /// Checks the mapping can be decoded unambiguously.
    ///
    /// ## Rules
    /// - The ten digit letters are pairwise distinct
    /// - Both zero-run codes are non-empty
    /// - No token contains an ASCII digit or whitespace
    /// - The twelve tokens are prefix-free (no token is a prefix of, or equal
    ///   to, another), checked with a character trie
    pub fn validate(&self) -> Result<(), MappingError> {
        let mut seen: HashMap<char, u8> = HashMap::new();
        for (digit, &letter) in self.digit_to_letter.iter().enumerate() {
            check_characters(&digit_token_name(digit as u8), &letter.to_string())?;
            if let Some(&first) = seen.get(&letter) {
                return Err(MappingError::DuplicateLetter {
                    letter,
                    first,
                    second: digit as u8,
                });
            }
            seen.insert(letter, digit as u8);
        }

        for (name, token) in [
            (DOUBLE_ZERO_NAME, &self.double_zero_code),
            (TRIPLE_ZERO_NAME, &self.triple_zero_code),
        ] {
            if token.is_empty() {
                return Err(MappingError::EmptyToken {
                    token_name: name.to_string(),
                });
            }
            check_characters(name, token)?;
        }

        let tokens = self.named_tokens();
        let mut trie = TokenTrie::default();
        for (index, (_, token)) in tokens.iter().enumerate() {
            if let Err(conflict) = trie.insert(token, index) {
                let (shorter, longer) = match conflict {
                    Conflict::ExistingIsPrefix(existing) => (existing, index),
                    Conflict::NewIsPrefix(existing) => (index, existing),
                };
                return Err(MappingError::AmbiguousToken {
                    shorter: tokens[shorter].0.clone(),
                    shorter_value: tokens[shorter].1.clone(),
                    longer: tokens[longer].0.clone(),
                    longer_value: tokens[longer].1.clone(),
                });
            }
        }

        Ok(())
    }

    /// Letter for a decimal digit character.
    fn letter_for(&self, digit: u8) -> char {
        self.digit_to_letter[(digit - b'0') as usize]
    }

    fn reverse_lookup(&self) -> HashMap<char, char> {
        self.digit_to_letter
            .iter()
            .enumerate()
            .map(|(digit, &letter)| (letter, char::from(b'0' + digit as u8)))
            .collect()
    }

    fn named_tokens(&self) -> Vec<(String, String)> {
        let mut tokens: Vec<(String, String)> = self
            .digit_to_letter
            .iter()
            .enumerate()
            .map(|(digit, letter)| (digit_token_name(digit as u8), letter.to_string()))
            .collect();
        tokens.push((DOUBLE_ZERO_NAME.to_string(), self.double_zero_code.clone()));
        tokens.push((TRIPLE_ZERO_NAME.to_string(), self.triple_zero_code.clone()));
        tokens
    }
}

const DOUBLE_ZERO_NAME: &str = "double-zero code";
const TRIPLE_ZERO_NAME: &str = "triple-zero code";

fn digit_token_name(digit: u8) -> String {
    format!("letter for digit {}", digit)
}

fn check_characters(token_name: &str, token: &str) -> Result<(), MappingError> {
    match token
        .chars()
        .find(|c| c.is_ascii_digit() || c.is_whitespace() || *c == '\0')
    {
        Some(character) => Err(MappingError::InvalidCharacter {
            token_name: token_name.to_string(),
            character,
        }),
        None => Ok(()),
    }
}

// =============================================================================
// Prefix Trie
// =============================================================================

enum Conflict {
    /// An already-inserted token is a prefix of the new one.
    ExistingIsPrefix(usize),
    /// The new token is a prefix of (or equal to) an inserted one.
    NewIsPrefix(usize),
}

#[derive(Default)]
struct TokenTrie {
    children: BTreeMap<char, TokenTrie>,
    terminal: Option<usize>,
}

impl TokenTrie {
    fn insert(&mut self, token: &str, index: usize) -> Result<(), Conflict> {
        let mut node = self;
        for c in token.chars() {
            if let Some(existing) = node.terminal {
                return Err(Conflict::ExistingIsPrefix(existing));
            }
            node = node.children.entry(c).or_default();
        }
        if let Some(existing) = node.terminal {
            return Err(Conflict::NewIsPrefix(existing));
        }
        if let Some(existing) = node.first_terminal_below() {
            return Err(Conflict::NewIsPrefix(existing));
        }
        node.terminal = Some(index);
        Ok(())
    }

    fn first_terminal_below(&self) -> Option<usize> {
        self.children
            .values()
            .find_map(|child| child.terminal.or_else(|| child.first_terminal_below()))
    }
}

// =============================================================================
// Encode / Decode
// =============================================================================

/// Encodes a money amount, rounded half-up to whole pesos.
///
/// Negative amounts encode as zero.
///
/// ## Example
/// ```rust
/// use kahera_core::cost_code::{encode, CostCodeMapping};
/// use kahera_core::money::Money;
///
/// let mapping = CostCodeMapping::default();
/// assert_eq!(encode(&mapping, Money::from_major_minor(1000, 0)), "BY");
/// assert_eq!(encode(&mapping, Money::from_major_minor(125, 49)), "BLK");
/// ```
pub fn encode(mapping: &CostCodeMapping, amount: Money) -> String {
    encode_units(mapping, amount.round_to_whole_units())
}

/// Encodes a whole-peso value.
pub fn encode_units(mapping: &CostCodeMapping, value: u64) -> String {
    let digits = value.to_string();
    let bytes = digits.as_bytes();
    let mut code = String::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let rest = &bytes[i..];
        if rest.starts_with(b"000") {
            code.push_str(&mapping.triple_zero_code);
            i += 3;
        } else if rest.starts_with(b"00") {
            code.push_str(&mapping.double_zero_code);
            i += 2;
        } else {
            code.push(mapping.letter_for(bytes[i]));
            i += 1;
        }
    }

    code
}

/// Decodes a cost code back to whole pesos.
///
/// ## Errors
/// - [`CodecError::EmptyCode`] for an empty string
/// - [`CodecError::UnrecognizedToken`] when no token matches at a position
/// - [`CodecError::Overflow`] when the digits exceed `u64`
///
/// ## Example
/// ```rust
/// use kahera_core::cost_code::{decode, CostCodeMapping};
///
/// let mapping = CostCodeMapping::default();
/// assert_eq!(decode(&mapping, "BYE").unwrap(), 10_000);
/// assert!(decode(&mapping, "BQ").is_err());
/// ```
pub fn decode(mapping: &CostCodeMapping, code: &str) -> Result<u64, CodecError> {
    if code.is_empty() {
        return Err(CodecError::EmptyCode);
    }

    let reverse = mapping.reverse_lookup();
    let triple = mapping.triple_zero_code.as_str();
    let double = mapping.double_zero_code.as_str();

    let mut digits = String::with_capacity(code.len() * 3);
    let mut offset = 0;
    let mut position = 0;

    while offset < code.len() {
        let rest = &code[offset..];

        if !triple.is_empty() && rest.starts_with(triple) {
            digits.push_str("000");
            offset += triple.len();
            position += triple.chars().count();
            continue;
        }
        if !double.is_empty() && rest.starts_with(double) {
            digits.push_str("00");
            offset += double.len();
            position += double.chars().count();
            continue;
        }

        match rest.chars().next().and_then(|c| reverse.get(&c).map(|d| (c, *d))) {
            Some((letter, digit)) => {
                digits.push(digit);
                offset += letter.len_utf8();
                position += 1;
            }
            None => {
                return Err(CodecError::UnrecognizedToken {
                    position,
                    remaining: rest.to_string(),
                })
            }
        }
    }

    digits.parse::<u64>().map_err(|_| CodecError::Overflow {
        code: code.to_string(),
    })
}

/// Decodes a cost code into a whole-peso [`Money`] value.
pub fn decode_money(mapping: &CostCodeMapping, code: &str) -> Result<Money, CodecError> {
    let units = decode(mapping, code)?;
    i64::try_from(units)
        .ok()
        .and_then(|u| u.checked_mul(CENTAVOS_PER_UNIT))
        .map(Money::from_centavos)
        .ok_or_else(|| CodecError::Overflow {
            code: code.to_string(),
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
