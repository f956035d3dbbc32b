//! Binary ↔ text transforms for carrier payloads

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sharer_core::{SharerError, SharerResult};

pub fn to_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn from_base64(s: &str) -> SharerResult<Vec<u8>> {
    STANDARD
        .decode(s.trim())
        .map_err(|e| SharerError::Other(anyhow::anyhow!("base64 decode: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        assert_eq!(to_base64(b"hello world"), "aGVsbG8gd29ybGQ=");
        assert_eq!(from_base64("aGVsbG8gd29ybGQ=").unwrap(), b"hello world");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(from_base64("not base64!!").is_err());
    }

    #[test]
    fn test_tolerates_surrounding_whitespace() {
        assert_eq!(from_base64(" AAEC\n").unwrap(), vec![0u8, 1, 2]);
    }
}
