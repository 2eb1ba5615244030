//! Operating-system entropy adapter.

use rand::RngCore;
use rand::rngs::OsRng;

use crate::domain::ports::{RandomSource, RandomSourceError};

/// [`RandomSource`] backed by the operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandomSource;

impl RandomSource for OsRandomSource {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), RandomSourceError> {
        let mut rng = OsRng;
        rng.try_fill_bytes(dest)
            .map_err(|err| RandomSourceError::unavailable(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PairingCode;

    #[test]
    fn fills_buffers_and_yields_valid_codes() {
        let mut first = [0_u8; 32];
        let mut second = [0_u8; 32];
        OsRandomSource.fill_bytes(&mut first).expect("entropy available");
        OsRandomSource.fill_bytes(&mut second).expect("entropy available");
        assert_ne!(first, second);

        let code = PairingCode::generate(&OsRandomSource).expect("code drawn");
        assert_eq!(code.as_str().len(), 6);
    }
}
