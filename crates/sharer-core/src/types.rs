use serde::{Deserialize, Serialize};

/// One of the two shares a secret is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Half {
    /// base64(iv || ciphertext), carried by the first QR code
    Data,
    /// base64(base key), carried by the second QR code
    Key,
}

impl Half {
    /// Parameter name used in carrier URLs.
    pub fn param(self) -> &'static str {
        match self {
            Half::Data => "data",
            Half::Key => "key",
        }
    }

    pub fn other(self) -> Half {
        match self {
            Half::Data => Half::Key,
            Half::Key => Half::Data,
        }
    }

    pub fn from_param(name: &str) -> Option<Half> {
        match name {
            "data" => Some(Half::Data),
            "key" => Some(Half::Key),
            _ => None,
        }
    }
}

impl std::fmt::Display for Half {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.param())
    }
}

/// Whatever carrier payloads are known at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Halves {
    pub data: Option<String>,
    pub key: Option<String>,
}

impl Halves {
    pub fn get(&self, half: Half) -> Option<&str> {
        match half {
            Half::Data => self.data.as_deref(),
            Half::Key => self.key.as_deref(),
        }
    }

    pub fn set(&mut self, half: Half, payload: String) {
        match half {
            Half::Data => self.data = Some(payload),
            Half::Key => self.key = Some(payload),
        }
    }

    /// Fill the slots `self` lacks from `other`. Existing values win.
    pub fn merge_missing(&mut self, other: Halves) {
        if self.data.is_none() {
            self.data = other.data;
        }
        if self.key.is_none() {
            self.key = other.key;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_none() && self.key.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.data.is_some() && self.key.is_some()
    }

    /// Iterate over the halves that are present.
    pub fn present(&self) -> impl Iterator<Item = (Half, &str)> {
        [(Half::Data, self.data.as_deref()), (Half::Key, self.key.as_deref())]
            .into_iter()
            .filter_map(|(half, value)| value.map(|v| (half, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_existing_values() {
        let mut from_url = Halves {
            data: Some("url-data".into()),
            key: None,
        };
        from_url.merge_missing(Halves {
            data: Some("relay-data".into()),
            key: Some("relay-key".into()),
        });

        assert_eq!(from_url.data.as_deref(), Some("url-data"));
        assert_eq!(from_url.key.as_deref(), Some("relay-key"));
        assert!(from_url.is_complete());
    }

    #[test]
    fn present_lists_only_known_halves() {
        let halves = Halves {
            data: None,
            key: Some("k".into()),
        };
        let present: Vec<_> = halves.present().collect();
        assert_eq!(present, vec![(Half::Key, "k")]);
    }

    #[test]
    fn half_params_roundtrip() {
        for half in [Half::Data, Half::Key] {
            assert_eq!(Half::from_param(half.param()), Some(half));
            assert_ne!(half.other(), half);
        }
        assert_eq!(Half::from_param("code"), None);
    }
}
