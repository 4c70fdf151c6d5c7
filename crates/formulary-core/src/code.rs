//! Bijective base-26 letter codes.
//!
//! Position 1 maps to the all-`A` string of the configured width, so for
//! width 2: `1 -> "AA"`, `2 -> "AB"`, `26*26 -> "ZZ"`. Encoding and decoding
//! are exact inverses over `[1, 26^width]`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CodeError, CounterExhausted, InvalidCode};

const ALPHABET_LEN: u64 = 26;

/// Default width for every user-facing code family.
pub const DEFAULT_CODE_WIDTH: usize = 2;

/// Widest code the capacity arithmetic supports without overflow.
pub const MAX_CODE_WIDTH: usize = 12;

/// Number of distinct codes representable at `width` letters.
pub fn capacity(width: usize) -> u64 {
    debug_assert!(width >= 1 && width <= MAX_CODE_WIDTH);
    ALPHABET_LEN.pow(width as u32)
}

/// A fixed-width upper-case letter code. Width is carried by the string length.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code(String);

impl Code {
    /// Encode a 1-based sequence number as a `width`-letter code.
    pub fn encode(n: u64, width: usize) -> Result<Self, CodeError> {
        let capacity = capacity(width);
        if n < 1 || n > capacity {
            return Err(CounterExhausted {
                value: n,
                width,
                capacity,
            }
            .into());
        }
        let mut rem = n - 1;
        let mut letters = vec![0u8; width];
        for slot in letters.iter_mut().rev() {
            *slot = b'A' + (rem % ALPHABET_LEN) as u8;
            rem /= ALPHABET_LEN;
        }
        debug_assert_eq!(rem, 0);
        Ok(Self(letters.into_iter().map(char::from).collect()))
    }

    /// Decode back to the 1-based sequence number.
    pub fn decode(&self) -> u64 {
        self.0
            .bytes()
            .fold(0u64, |acc, b| acc * ALPHABET_LEN + u64::from(b - b'A'))
            + 1
    }

    /// Upper-case and trim `raw`, rejecting anything that is not exactly
    /// `width` letters `A`-`Z`.
    pub fn normalize(raw: &str, width: usize) -> Result<Self, CodeError> {
        let cleaned = raw.trim().to_ascii_uppercase();
        if cleaned.len() != width {
            return Err(InvalidCode {
                raw: raw.to_string(),
                reason: format!("expected exactly {width} letters"),
            }
            .into());
        }
        if !cleaned.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(InvalidCode {
                raw: raw.to_string(),
                reason: "only letters A-Z are allowed".to_string(),
            }
            .into());
        }
        Ok(Self(cleaned))
    }

    /// Parse a code whose width is taken from the input itself.
    ///
    /// Used at serde boundaries where the family width is not in scope.
    pub fn parse(raw: &str) -> Result<Self, CodeError> {
        let width = raw.trim().len();
        if width < 1 || width > MAX_CODE_WIDTH {
            return Err(InvalidCode {
                raw: raw.to_string(),
                reason: format!("length must be between 1 and {MAX_CODE_WIDTH} letters"),
            }
            .into());
        }
        Self::normalize(raw, width)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn width(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code({:?})", self.0)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Code {
    type Error = CodeError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Code::parse(&s)
    }
}

impl From<Code> for String {
    fn from(code: Code) -> String {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_maps_position_one_to_all_a() {
        assert_eq!(Code::encode(1, 2).unwrap().as_str(), "AA");
        assert_eq!(Code::encode(2, 2).unwrap().as_str(), "AB");
        assert_eq!(Code::encode(27, 2).unwrap().as_str(), "BA");
        assert_eq!(Code::encode(676, 2).unwrap().as_str(), "ZZ");
        assert_eq!(Code::encode(1, 3).unwrap().as_str(), "AAA");
        assert_eq!(Code::encode(17_576, 3).unwrap().as_str(), "ZZZ");
    }

    #[test]
    fn decode_inverts_encode_over_full_width_two_range() {
        for n in 1..=676 {
            let code = Code::encode(n, 2).unwrap();
            assert_eq!(code.decode(), n, "{code}");
        }
    }

    #[test]
    fn out_of_range_values_are_exhausted() {
        for n in [0, 677, u64::MAX] {
            match Code::encode(n, 2) {
                Err(CodeError::Exhausted(err)) => {
                    assert_eq!(err.capacity, 676);
                    assert_eq!(err.width, 2);
                }
                other => panic!("expected exhaustion for {n}, got {other:?}"),
            }
        }
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(Code::normalize("  ab ", 2).unwrap().as_str(), "AB");
        assert_eq!(Code::normalize("zz", 2).unwrap().as_str(), "ZZ");
    }

    #[test]
    fn normalize_rejects_bad_shapes() {
        for raw in ["", "A", "ABC", "A1", "a-", "Ä B"] {
            assert!(
                matches!(Code::normalize(raw, 2), Err(CodeError::Invalid(_))),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn serde_round_trip_validates() {
        let code: Code = serde_json::from_str("\"ab\"").unwrap();
        assert_eq!(code.as_str(), "AB");
        assert!(serde_json::from_str::<Code>("\"4X\"").is_err());
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"AB\"");
    }
}
