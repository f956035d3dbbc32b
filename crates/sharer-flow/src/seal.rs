use sharer_core::config::SharerConfig;
use sharer_core::{SharerError, SharerResult};
use sharer_crypto::{
    compress, encrypt, export_key, generate_base_key, generate_security_code, KdfParams,
    SecurityCode,
};
use tracing::info;
use zeroize::Zeroizing;

use crate::package::{build_payloads, PayloadSet};

/// Output of the encrypt flow.
///
/// The security code is deliberately kept apart from the payloads: it is
/// only ever printed, never put into a QR code.
#[derive(Debug, Clone)]
pub struct SealedSecret {
    pub payloads: PayloadSet,
    pub security_code: SecurityCode,
}

/// Compress, split and encrypt `plaintext`.
///
/// Key derivation is slow on purpose, so the CPU-bound part runs on the
/// blocking pool.
pub async fn seal_secret(plaintext: &str, config: &SharerConfig) -> SharerResult<SealedSecret> {
    let plaintext = Zeroizing::new(plaintext.to_string());
    let params = KdfParams::new(config.crypto.pbkdf2_iterations);

    let (encrypted, key_payload, security_code) = tokio::task::spawn_blocking(move || {
        let packed = Zeroizing::new(compress(&plaintext)?);
        let base_key = generate_base_key()?;
        let security_code = generate_security_code()?;
        let encrypted = encrypt(&packed, &base_key, &security_code, &params)?;
        Ok::<_, SharerError>((encrypted, export_key(&base_key), security_code))
    })
    .await
    .map_err(|e| SharerError::Other(anyhow::anyhow!("sealing task failed: {e}")))??;

    let payloads = build_payloads(&config.carrier, &encrypted, &key_payload);
    info!(
        data_len = payloads.data_url.len(),
        key_len = payloads.key_url.len(),
        "secret split into two carriers"
    );

    Ok(SealedSecret {
        payloads,
        security_code,
    })
}
