//! Deterministic random source.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::ports::{RandomSource, RandomSourceError};

const CODE_DRAW_LEN: usize = 3;

/// Random source that replays scripted pairing codes.
///
/// Three-byte draws (pairing codes) yield the scripted codes in order, then
/// fall back to a counter. Every other draw is filled from a counter, so
/// successive bearer tokens differ.
///
/// # Examples
/// ```
/// use runsight_backend::domain::PairingCode;
/// use runsight_backend::test_support::ScriptedRandomSource;
///
/// let random = ScriptedRandomSource::with_codes(["482913"]);
/// let code = PairingCode::generate(&random).expect("scripted draw");
/// assert_eq!(code.as_str(), "482913");
/// ```
#[derive(Debug, Default)]
pub struct ScriptedRandomSource {
    codes: Mutex<VecDeque<u32>>,
    counter: AtomicU64,
}

impl ScriptedRandomSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the codes returned by successive pairing code draws.
    ///
    /// Panics when a code is not six digits.
    pub fn with_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes = codes
            .into_iter()
            .map(|code| {
                let code = code.as_ref();
                match code.parse::<u32>() {
                    Ok(value) if code.len() == 6 => value,
                    _ => panic!("scripted pairing code must be six digits: {code}"),
                }
            })
            .collect();
        Self {
            codes: Mutex::new(codes),
            counter: AtomicU64::new(0),
        }
    }

    fn next_code(&self, fallback: u64) -> u32 {
        let scripted = match self.codes.lock() {
            Ok(mut codes) => codes.pop_front(),
            Err(_) => panic!("scripted codes mutex"),
        };
        scripted.unwrap_or_else(|| u32::try_from(fallback % 1_000_000).unwrap_or(0))
    }
}

impl RandomSource for ScriptedRandomSource {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), RandomSourceError> {
        let draw = self.counter.fetch_add(1, Ordering::Relaxed);
        if dest.len() == CODE_DRAW_LEN {
            let value = self.next_code(draw);
            dest.copy_from_slice(&[
                ((value >> 16) & 0xFF) as u8,
                ((value >> 8) & 0xFF) as u8,
                (value & 0xFF) as u8,
            ]);
            return Ok(());
        }
        let seed = draw.to_le_bytes();
        for (index, byte) in dest.iter_mut().enumerate() {
            *byte = seed[index % seed.len()] ^ (index as u8);
        }
        Ok(())
    }
}
