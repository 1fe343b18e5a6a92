//! `madrasti-store` — durable key/value persistence for session state.
//!
//! The browser build backs this with `localStorage`; tests and server-side
//! contexts inject [`MemoryBackend`]. All values are wrapped in a small
//! `{value, timestamp}` envelope under a fixed namespace prefix so session
//! data never collides with unrelated keys.

pub mod backend;
pub mod session_store;

pub use backend::{MemoryBackend, StorageBackend, StorageError};
pub use session_store::SessionStore;
