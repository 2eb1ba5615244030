//! Device pairing primitives.
//!
//! A mobile user requests a short-lived six-digit code; a device presents the
//! code together with its registration details and receives a bearer token.

mod code;
mod session;

pub use self::code::{
    PAIRING_CODE_LEN, PairingCode, PairingCodeError, PairingSessionId, PairingSessionIdError,
    SESSION_ID_PREFIX,
};
pub use self::session::{
    PAIRING_TTL_SECONDS, PairingSession, PairingSessionDraft, PairingStatus,
    PairingTransitionError, ParsePairingStatusError, pairing_ttl,
};
