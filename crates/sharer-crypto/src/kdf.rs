//! Key derivation: (base key, security code) → final key via PBKDF2-HMAC-SHA256

use aes_gcm::{Aes256Gcm, KeyInit};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::code::SecurityCode;
use crate::keys::BaseKey;
use crate::KEY_SIZE;

/// The AES-256-GCM key actually used for the envelope.
///
/// Never stored or exported: it is rebuilt from the two shares at decrypt
/// time. Zeroized on drop.
pub struct FinalKey {
    bytes: [u8; KEY_SIZE],
}

impl FinalKey {
    pub(crate) fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new((&self.bytes).into())
    }

    #[cfg(test)]
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for FinalKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for FinalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinalKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// PBKDF2 parameters for the final key
#[derive(Debug, Clone)]
pub struct KdfParams {
    /// HMAC-SHA256 rounds (default: 100000)
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: 100_000,
        }
    }
}

impl KdfParams {
    pub fn new(iterations: u32) -> Self {
        Self { iterations }
    }
}

/// Derive the final key from the base key and the security code.
///
/// The code is the password and the base key bytes are the salt, so a
/// holder of only the key QR code still pays the full work factor for every
/// guess at the 8-character code. Deterministic for a given input pair.
pub fn derive_final_key(base: &BaseKey, code: &SecurityCode, params: &KdfParams) -> FinalKey {
    let mut bytes = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(
        code.expose().as_bytes(),
        base.as_bytes(),
        params.iterations,
        &mut bytes,
    );
    FinalKey { bytes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams::new(1_000)
    }

    fn code(s: &str) -> SecurityCode {
        SecurityCode::parse(s).unwrap()
    }

    #[test]
    fn test_kdf_deterministic() {
        let base = BaseKey::from_bytes([1u8; KEY_SIZE]);
        let k1 = derive_final_key(&base, &code("Ab3$efgh"), &fast());
        let k2 = derive_final_key(&base, &code("Ab3$efgh"), &fast());

        assert_eq!(k1.as_bytes(), k2.as_bytes(), "KDF must be deterministic");
    }

    #[test]
    fn test_kdf_different_codes() {
        let base = BaseKey::from_bytes([1u8; KEY_SIZE]);
        let k1 = derive_final_key(&base, &code("Ab3$efgh"), &fast());
        let k2 = derive_final_key(&base, &code("Ab3$efgi"), &fast());

        assert_ne!(
            k1.as_bytes(),
            k2.as_bytes(),
            "different codes must produce different keys"
        );
    }

    #[test]
    fn test_kdf_different_base_keys() {
        let c = code("Ab3$efgh");
        let k1 = derive_final_key(&BaseKey::from_bytes([1u8; KEY_SIZE]), &c, &fast());
        let k2 = derive_final_key(&BaseKey::from_bytes([2u8; KEY_SIZE]), &c, &fast());

        assert_ne!(
            k1.as_bytes(),
            k2.as_bytes(),
            "different base keys must produce different keys"
        );
    }

    #[test]
    fn test_final_key_is_not_base_key() {
        let base = BaseKey::from_bytes([9u8; KEY_SIZE]);
        let k = derive_final_key(&base, &code("Ab3$efgh"), &fast());
        assert_ne!(k.as_bytes(), base.as_bytes());
    }

    #[test]
    fn test_default_work_factor() {
        assert_eq!(KdfParams::default().iterations, 100_000);
    }
}
