//! AES-256-GCM envelope over the compressed secret
//!
//! Encrypted payload format (before base64):
//! ```text
//! [12 bytes: random IV][N bytes: ciphertext][16 bytes: GCM tag]
//! ```
//!
//! Every decryption failure (bad base64, short payload, tag mismatch) is
//! reported as the same [`SharerError::AuthenticationFailure`], so a wrong
//! security code cannot be told apart from a tampered payload.

use aes_gcm::aead::Aead;
use aes_gcm::Nonce;
use sharer_core::{SharerError, SharerResult};

use crate::code::SecurityCode;
use crate::encoding::{from_base64, to_base64};
use crate::kdf::{derive_final_key, KdfParams};
use crate::keys::{fill_random, BaseKey};
use crate::{IV_SIZE, TAG_SIZE};

/// Encrypt `plaintext` under the key derived from `base` and `code`.
///
/// Returns `base64(iv || ciphertext || tag)` with a fresh random IV.
pub fn encrypt(
    plaintext: &[u8],
    base: &BaseKey,
    code: &SecurityCode,
    params: &KdfParams,
) -> SharerResult<String> {
    let cipher = derive_final_key(base, code, params).cipher();

    let mut iv = [0u8; IV_SIZE];
    fill_random(&mut iv)?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|e| SharerError::Other(anyhow::anyhow!("envelope encryption failed: {e}")))?;

    let mut result = Vec::with_capacity(IV_SIZE + ciphertext.len());
    result.extend_from_slice(&iv);
    result.extend_from_slice(&ciphertext);

    tracing::debug!(
        plaintext_len = plaintext.len(),
        payload_len = result.len(),
        "secret sealed"
    );
    Ok(to_base64(&result))
}

/// Decrypt an encrypted payload produced by [`encrypt`].
pub fn decrypt(
    payload: &str,
    base: &BaseKey,
    code: &SecurityCode,
    params: &KdfParams,
) -> SharerResult<Vec<u8>> {
    let combined = from_base64(payload).map_err(|_| {
        tracing::debug!("encrypted payload is not base64");
        SharerError::AuthenticationFailure
    })?;

    if combined.len() < IV_SIZE + TAG_SIZE {
        tracing::debug!(len = combined.len(), "encrypted payload too short");
        return Err(SharerError::AuthenticationFailure);
    }

    let (iv, ciphertext) = combined.split_at(IV_SIZE);
    let cipher = derive_final_key(base, code, params).cipher();

    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| SharerError::AuthenticationFailure)
}
