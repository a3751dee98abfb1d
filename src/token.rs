//! Opaque identifiers.
//!
//! Session and party tokens double as unguessable capabilities, so they come
//! from the operating system RNG rather than the puzzle-shuffling RNG. The
//! daily key is plain UTC calendar arithmetic, shared by every caller on the
//! same day.

use chrono::Utc;
use rand::RngCore;
use rand::rngs::OsRng;

pub const SESSION_TOKEN_BYTES: usize = 8;
pub const PARTY_TOKEN_BYTES: usize = 16;

/// Fresh session token, [`SESSION_TOKEN_BYTES`] random bytes in hex.
pub fn session_token() -> String {
    random_hex(SESSION_TOKEN_BYTES)
}

/// Fresh party token, [`PARTY_TOKEN_BYTES`] random bytes in hex.
pub fn party_token() -> String {
    random_hex(PARTY_TOKEN_BYTES)
}

/// Today's UTC date as `YYYY-MM-DD`, the default session key.
pub fn daily_key() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}
