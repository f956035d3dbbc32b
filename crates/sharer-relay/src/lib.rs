//! sharer-relay: short-lived storage that reconciles two separately scanned halves
//!
//! The relay owns a single [`RelaySlot`] holding at most one data payload
//! and one key payload plus the time of the last write. Page contexts talk
//! to it only through [`RelayHandle`], which sends one request and awaits
//! one reply over a private oneshot channel. The actor handles requests
//! one at a time, so no two writes interleave.
//!
//! Expiry is lazy: a read first evicts the slot when the last write is older
//! than the configured max age (5 minutes by default). Nothing is ever
//! written to disk.

pub mod actor;
pub mod handle;
pub mod protocol;
pub mod slot;

pub use actor::{channel, spawn, Relay};
pub use handle::RelayHandle;
pub use protocol::{RelayRequest, RelayResponse};
pub use slot::RelaySlot;
