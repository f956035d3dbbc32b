//! sharer-flow: the two user-facing flows
//!
//! Encrypt: [`seal::seal_secret`] compresses and encrypts a secret, then
//! [`package::build_payloads`] turns the two halves into carrier strings
//! and [`sheet::RecoverySheet`] lays them out for printing.
//!
//! Decrypt: [`session::DecryptSession`] collects the halves from page URLs,
//! camera scans and the relay, asks for the security code, and decrypts.

pub mod capability;
pub mod carrier;
pub mod package;
pub mod seal;
pub mod session;
pub mod sheet;

pub use capability::{check_capabilities, CompatibilityReport};
pub use carrier::parse_carrier;
pub use package::{build_payloads, PayloadSet};
pub use seal::{seal_secret, SealedSecret};
pub use session::{DecryptSession, DecryptState};
pub use sheet::{QrRenderer, RecoverySheet, SheetRenderer, TextSheetRenderer};
