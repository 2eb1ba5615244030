//! Pairing codes and pairing session identifiers.

use std::fmt;

use uuid::Uuid;

use crate::domain::ports::{RandomSource, RandomSourceError};

/// Number of digits in a pairing code.
pub const PAIRING_CODE_LEN: usize = 6;

/// Exclusive upper bound of the numeric code range (`10^6`).
const CODE_SPACE: u32 = 1_000_000;
/// Smallest all-ones mask covering `CODE_SPACE` (20 bits). Draws at or above
/// `CODE_SPACE` are resampled, never reduced modulo.
const CODE_MASK: u32 = 0x000F_FFFF;
/// Upper bound on resampling before the source is treated as broken.
const MAX_CODE_DRAWS: usize = 64;

/// Prefix shared by every pairing session identifier.
pub const SESSION_ID_PREFIX: &str = "pair_";
const SESSION_ID_MAX_LEN: usize = 64;

/// Why a pairing code string was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PairingCodeError {
    /// The code was not exactly six characters long.
    #[error("pairing code must be exactly 6 digits")]
    WrongLength,
    /// The code contained something other than ASCII digits.
    #[error("pairing code must contain only digits")]
    NonDigit,
}

/// Six-digit, zero-padded, human-facing pairing secret.
///
/// # Examples
/// ```
/// use runsight_backend::domain::PairingCode;
///
/// let code = PairingCode::parse("004213").expect("six digits");
/// assert_eq!(code.as_str(), "004213");
/// assert!(PairingCode::parse("4213").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PairingCode(String);

impl PairingCode {
    /// Parse a caller-supplied code.
    ///
    /// # Errors
    /// Returns [`PairingCodeError`] unless the input is exactly six ASCII digits.
    pub fn parse(raw: &str) -> Result<Self, PairingCodeError> {
        if raw.len() != PAIRING_CODE_LEN {
            return Err(PairingCodeError::WrongLength);
        }
        if !raw.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(PairingCodeError::NonDigit);
        }
        Ok(Self(raw.to_owned()))
    }

    /// Draw a uniformly distributed code from `random`.
    ///
    /// Three bytes are masked to 20 bits; values of one million or more are
    /// discarded and redrawn.
    ///
    /// # Errors
    /// Propagates source failures, and reports
    /// [`RandomSourceError::Unavailable`] if every draw falls out of range.
    pub fn generate(random: &dyn RandomSource) -> Result<Self, RandomSourceError> {
        for _ in 0..MAX_CODE_DRAWS {
            let mut buf = [0_u8; 3];
            random.fill_bytes(&mut buf)?;
            let [high, mid, low] = buf;
            let value =
                ((u32::from(high) << 16) | (u32::from(mid) << 8) | u32::from(low)) & CODE_MASK;
            if value < CODE_SPACE {
                return Ok(Self(format!("{value:06}")));
            }
        }
        Err(RandomSourceError::unavailable(
            "random source produced no in-range pairing code",
        ))
    }

    /// Borrow the code text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PairingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PairingCode(******)")
    }
}

/// Why a pairing session identifier was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PairingSessionIdError {
    /// The identifier does not start with `pair_`.
    #[error("pairing session id must start with pair_")]
    MissingPrefix,
    /// Nothing follows the prefix, or the identifier is too long.
    #[error("pairing session id has an invalid length")]
    InvalidLength,
    /// The suffix contains characters other than ASCII alphanumerics.
    #[error("pairing session id contains invalid characters")]
    InvalidCharacters,
}

/// Opaque, globally unique pairing session identifier (`pair_<hex>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairingSessionId(String);

impl PairingSessionId {
    /// Generate a fresh identifier from a random UUID.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{SESSION_ID_PREFIX}{}", Uuid::new_v4().simple()))
    }

    /// Validate an identifier received from a caller or storage.
    ///
    /// # Errors
    /// Returns [`PairingSessionIdError`] when the shape is wrong.
    pub fn new(raw: impl Into<String>) -> Result<Self, PairingSessionIdError> {
        let raw = raw.into();
        let Some(suffix) = raw.strip_prefix(SESSION_ID_PREFIX) else {
            return Err(PairingSessionIdError::MissingPrefix);
        };
        if suffix.is_empty() || raw.len() > SESSION_ID_MAX_LEN {
            return Err(PairingSessionIdError::InvalidLength);
        }
        if !suffix.bytes().all(|byte| byte.is_ascii_alphanumeric()) {
            return Err(PairingSessionIdError::InvalidCharacters);
        }
        Ok(Self(raw))
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PairingSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
