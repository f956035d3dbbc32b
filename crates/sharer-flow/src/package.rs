use serde::{Deserialize, Serialize};
use sharer_core::config::CarrierConfig;
use sharer_core::Half;
use url::form_urlencoded;

/// The four strings that end up in QR codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadSet {
    /// `<base>#data=<percent-encoded encrypted payload>`
    pub data_url: String,
    /// `<base>#key=<percent-encoded key payload>`
    pub key_url: String,
    /// Bare encrypted payload, for scanners that cannot open URLs
    pub data_only: Option<String>,
    /// Bare key payload
    pub key_only: Option<String>,
}

impl PayloadSet {
    pub fn url(&self, half: Half) -> &str {
        match half {
            Half::Data => &self.data_url,
            Half::Key => &self.key_url,
        }
    }

    pub fn bare(&self, half: Half) -> Option<&str> {
        match half {
            Half::Data => self.data_only.as_deref(),
            Half::Key => self.key_only.as_deref(),
        }
    }
}

/// Build the carrier URL for one half.
///
/// The payload goes into the fragment so it never reaches a web server.
pub fn carrier_url(base_url: &str, half: Half, payload: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(payload.as_bytes()).collect();
    let base = base_url.split('#').next().unwrap_or(base_url);
    format!("{base}#{}={encoded}", half.param())
}

/// Package the two halves. Pure; no I/O.
pub fn build_payloads(carrier: &CarrierConfig, encrypted: &str, key: &str) -> PayloadSet {
    let (data_only, key_only) = if carrier.data_only_variants {
        (Some(encrypted.to_string()), Some(key.to_string()))
    } else {
        (None, None)
    };

    PayloadSet {
        data_url: carrier_url(&carrier.base_url, Half::Data, encrypted),
        key_url: carrier_url(&carrier.base_url, Half::Key, key),
        data_only,
        key_only,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::parse_carrier;

    fn carrier() -> CarrierConfig {
        CarrierConfig {
            base_url: "https://example.com/secret_sharer".into(),
            data_only_variants: true,
        }
    }

    #[test]
    fn urls_use_fragment_and_escape_base64() {
        let set = build_payloads(&carrier(), "ab+/cd==", "KEY+/=");

        assert_eq!(set.data_url, "https://example.com/secret_sharer#data=ab%2B%2Fcd%3D%3D");
        assert_eq!(set.key_url, "https://example.com/secret_sharer#key=KEY%2B%2F%3D");
        assert_eq!(set.data_only.as_deref(), Some("ab+/cd=="));
        assert_eq!(set.key_only.as_deref(), Some("KEY+/="));
    }

    #[test]
    fn urls_parse_back_to_the_same_payloads() {
        let encrypted = "q83vEjRWeJq83vEjRWeJq83vEjRWeJq83vEjRWeJ+/+/==";
        let key = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=";
        let set = build_payloads(&carrier(), encrypted, key);

        assert_eq!(parse_carrier(&set.data_url).unwrap().data.as_deref(), Some(encrypted));
        assert_eq!(parse_carrier(&set.key_url).unwrap().key.as_deref(), Some(key));
    }

    #[test]
    fn data_only_variants_can_be_disabled() {
        let mut config = carrier();
        config.data_only_variants = false;
        let set = build_payloads(&config, "d", "k");

        assert_eq!(set.bare(Half::Data), None);
        assert_eq!(set.bare(Half::Key), None);
        assert!(set.url(Half::Key).ends_with("#key=k"));
    }

    #[test]
    fn existing_fragment_on_base_is_replaced() {
        assert_eq!(
            carrier_url("https://example.com/app#old", Half::Data, "x"),
            "https://example.com/app#data=x"
        );
    }
}
