//! Base key generation and base64 export/import for the key QR code

use rand::rngs::OsRng;
use rand::RngCore;
use sharer_core::{SharerError, SharerResult};
use zeroize::Zeroize;

use crate::encoding::{from_base64, to_base64};
use crate::KEY_SIZE;

/// The random 256-bit base key carried by the second QR code. Zeroized on drop.
#[derive(Clone)]
pub struct BaseKey {
    bytes: [u8; KEY_SIZE],
}

impl BaseKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for BaseKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for BaseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Fill `buf` from the OS entropy source.
pub fn fill_random(buf: &mut [u8]) -> SharerResult<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| SharerError::EntropyUnavailable(e.to_string()))
}

/// Generate a fresh random base key. Never reused across encryptions.
pub fn generate_base_key() -> SharerResult<BaseKey> {
    let mut bytes = [0u8; KEY_SIZE];
    fill_random(&mut bytes)?;
    Ok(BaseKey::from_bytes(bytes))
}

/// Encode the raw key bytes as base64 for the key payload.
pub fn export_key(key: &BaseKey) -> String {
    to_base64(key.as_bytes())
}

/// Decode a key payload. Anything but exactly 32 bytes is rejected.
pub fn import_key(encoded: &str) -> SharerResult<BaseKey> {
    let mut raw = from_base64(encoded)
        .map_err(|_| SharerError::InvalidKey("key payload is not base64".into()))?;

    if raw.len() != KEY_SIZE {
        let len = raw.len();
        raw.zeroize();
        return Err(SharerError::InvalidKey(format!(
            "key payload has wrong size: {len} bytes (expected {KEY_SIZE})"
        )));
    }

    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&raw);
    raw.zeroize();
    Ok(BaseKey::from_bytes(bytes))
}
