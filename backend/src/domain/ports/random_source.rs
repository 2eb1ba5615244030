//! Port for cryptographically secure random bytes.
//!
//! Pairing codes and device bearer tokens are both drawn through this port so
//! tests can script the exact bytes a draw produces.

use super::define_port_error;

define_port_error! {
    /// Errors raised by random sources.
    pub enum RandomSourceError {
        /// The entropy source could not supply bytes.
        Unavailable { message: String } => "random source unavailable: {message}",
    }
}

/// Source of cryptographically secure random bytes.
#[cfg_attr(test, mockall::automock)]
pub trait RandomSource: Send + Sync {
    /// Fill `dest` completely with random bytes.
    ///
    /// # Errors
    /// Returns [`RandomSourceError::Unavailable`] when entropy cannot be read.
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), RandomSourceError>;
}
