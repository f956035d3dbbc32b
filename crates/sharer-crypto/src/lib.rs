//! sharer-crypto: the split-secret envelope
//!
//! Pipeline: plaintext → gzip → AES-256-GCM(final key, random 96-bit IV) → base64
//!
//! Key split:
//! ```text
//! Base Key (256-bit random, carried by QR #2 as base64)
//!   └── Final Key = PBKDF2-HMAC-SHA256(password = security code, salt = base key, 100k rounds)
//!         └── AEAD: AES-256-GCM (iv = random 96-bit, tag = 128-bit, no AAD)
//! Security Code (8 symbols, printed only, never put in a QR code)
//! ```
//!
//! Encrypted payload (QR #1): `base64([12 bytes: IV][ciphertext][16 bytes: GCM tag])`

pub mod code;
pub mod compress;
pub mod encoding;
pub mod envelope;
pub mod kdf;
pub mod keys;

pub use code::{generate_security_code, generate_security_code_with, SecurityCode};
pub use compress::{compress, decompress};
pub use envelope::{decrypt, encrypt};
pub use kdf::{derive_final_key, FinalKey, KdfParams};
pub use keys::{export_key, generate_base_key, import_key, BaseKey};

/// Size of a base or final key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM IV (96-bit)
pub const IV_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// Length of a security code in characters
pub const CODE_LEN: usize = 8;
