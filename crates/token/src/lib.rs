//! `madrasti-token` — structural bearer-token codec.
//!
//! Decodes the payload segment of a JWT-shaped token and checks its expiry
//! claim. Signature verification is intentionally outside this crate: the
//! server is authoritative and re-checks every request; this codec only
//! answers "what does the client-side copy of the token claim, and is it
//! still within its validity window".

pub mod claims;
pub mod codec;

pub use claims::Claims;
pub use codec::{decode, extract_user, is_expired, is_expired_at};
