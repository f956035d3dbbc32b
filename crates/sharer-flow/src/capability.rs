//! Startup capability check
//!
//! Probes everything the flows depend on once, up front, and reports what is
//! missing instead of failing halfway through an encrypt or decrypt.

use serde::Serialize;
use sharer_crypto::keys::fill_random;
use sharer_crypto::{compress, decompress, decrypt, encrypt, BaseKey, KdfParams, SecurityCode};
use sharer_relay::RelayHandle;

pub const ENTROPY: &str = "OS entropy source";
pub const GZIP: &str = "gzip codec";
pub const AEAD: &str = "AES-256-GCM";
pub const RELAY: &str = "Ephemeral relay (both codes must be scanned in one session)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityReport {
    /// True when nothing required is missing
    pub compatible: bool,
    /// Required features that failed their probe
    pub missing_features: Vec<String>,
    /// Optional features that failed; the flows still work without them
    pub degraded_features: Vec<String>,
}

/// Run every probe. `relay` is the handle the decrypt flow would use.
pub async fn check_capabilities(relay: Option<&RelayHandle>) -> CompatibilityReport {
    let mut missing = Vec::new();
    let mut degraded = Vec::new();

    if fill_random(&mut [0u8; 32]).is_err() {
        missing.push(ENTROPY.to_string());
    }
    if !gzip_works() {
        missing.push(GZIP.to_string());
    }
    if !aead_works() {
        missing.push(AEAD.to_string());
    }

    let relay_ok = match relay {
        Some(handle) => handle.get_data().await.is_ok(),
        None => false,
    };
    if !relay_ok {
        degraded.push(RELAY.to_string());
    }

    let report = CompatibilityReport {
        compatible: missing.is_empty(),
        missing_features: missing,
        degraded_features: degraded,
    };
    tracing::debug!(?report, "capability check finished");
    report
}

fn gzip_works() -> bool {
    const PROBE: &str = "capability probe";
    compress(PROBE)
        .and_then(|packed| decompress(&packed))
        .is_ok_and(|text| text == PROBE)
}

fn aead_works() -> bool {
    let Ok(code) = SecurityCode::parse("Pr0b3!ok") else {
        return false;
    };
    let key = BaseKey::from_bytes([0x5a; sharer_crypto::KEY_SIZE]);
    let params = KdfParams::new(1);

    encrypt(b"probe", &key, &code, &params)
        .and_then(|payload| decrypt(&payload, &key, &code, &params))
        .is_ok_and(|plain| plain == b"probe")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharer_core::config::RelayConfig;

    #[tokio::test]
    async fn everything_present_with_running_relay() {
        let relay = sharer_relay::spawn(&RelayConfig::default());
        let report = check_capabilities(Some(&relay)).await;

        assert!(report.compatible);
        assert!(report.missing_features.is_empty());
        assert!(report.degraded_features.is_empty());
    }

    #[tokio::test]
    async fn missing_relay_degrades_but_stays_compatible() {
        let report = check_capabilities(None).await;

        assert!(report.compatible);
        assert_eq!(report.degraded_features, vec![RELAY.to_string()]);
    }

    #[tokio::test]
    async fn stopped_relay_is_reported() {
        let (relay, handle) = sharer_relay::channel(&RelayConfig::default());
        drop(relay);

        let report = check_capabilities(Some(&handle)).await;
        assert_eq!(report.degraded_features, vec![RELAY.to_string()]);
    }

    #[test]
    fn report_serializes_with_flag_and_lists() {
        let report = CompatibilityReport {
            compatible: false,
            missing_features: vec![GZIP.into()],
            degraded_features: vec![],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["compatible"], false);
        assert_eq!(json["missing_features"][0], GZIP);
    }
}
