//! Relay message protocol
//!
//! Request: `{"type": "STORE_DATA" | "STORE_KEY" | "GET_DATA" | "GET_KEY" | "GET_ALL" | "CLEAR", "payload"?: string}`
//!
//! Response: `{"data"?: string | null, "key"?: string | null, "success"?: bool, "error"?: string}`

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use sharer_core::{Half, Halves};

pub const UNKNOWN_MESSAGE_TYPE: &str = "Unknown message type";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayRequest {
    StoreData(String),
    StoreKey(String),
    GetData,
    GetKey,
    GetAll,
    Clear,
}

impl RelayRequest {
    pub fn store(half: Half, payload: String) -> Self {
        match half {
            Half::Data => RelayRequest::StoreData(payload),
            Half::Key => RelayRequest::StoreKey(payload),
        }
    }

    /// Wire name of the request type, safe to log.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayRequest::StoreData(_) => "STORE_DATA",
            RelayRequest::StoreKey(_) => "STORE_KEY",
            RelayRequest::GetData => "GET_DATA",
            RelayRequest::GetKey => "GET_KEY",
            RelayRequest::GetAll => "GET_ALL",
            RelayRequest::Clear => "CLEAR",
        }
    }

    /// Decode a JSON request. The error string is what goes back to the caller.
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let wire: WireRequest = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        let payload = |kind: &str| {
            wire.payload
                .clone()
                .ok_or_else(|| format!("{kind} requires a string payload"))
        };

        match wire.kind.as_str() {
            "STORE_DATA" => Ok(RelayRequest::StoreData(payload("STORE_DATA")?)),
            "STORE_KEY" => Ok(RelayRequest::StoreKey(payload("STORE_KEY")?)),
            "GET_DATA" => Ok(RelayRequest::GetData),
            "GET_KEY" => Ok(RelayRequest::GetKey),
            "GET_ALL" => Ok(RelayRequest::GetAll),
            "CLEAR" => Ok(RelayRequest::Clear),
            _ => Err(UNKNOWN_MESSAGE_TYPE.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct WireRequest {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayResponse {
    /// `{"success": true}`
    Ack,
    /// `{"data": ...}`
    Data(Option<String>),
    /// `{"key": ...}`
    Key(Option<String>),
    /// `{"data": ..., "key": ...}`
    All(Halves),
    /// `{"error": ...}`
    Error(String),
}

impl RelayResponse {
    pub fn to_json(&self) -> String {
        // Serializing a map of strings and bools cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"error":"encoding failed"}"#.into())
    }
}

impl Serialize for RelayResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RelayResponse::Ack => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("success", &true)?;
                map.end()
            }
            RelayResponse::Data(data) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("data", data)?;
                map.end()
            }
            RelayResponse::Key(key) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("key", key)?;
                map.end()
            }
            RelayResponse::All(halves) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("data", &halves.data)?;
                map.serialize_entry("key", &halves.key)?;
                map.end()
            }
            RelayResponse::Error(message) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", message)?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_request_type() {
        let cases = [
            (r#"{"type":"STORE_DATA","payload":"abc"}"#, RelayRequest::StoreData("abc".into())),
            (r#"{"type":"STORE_KEY","payload":"k"}"#, RelayRequest::StoreKey("k".into())),
            (r#"{"type":"GET_DATA"}"#, RelayRequest::GetData),
            (r#"{"type":"GET_KEY","payload":null}"#, RelayRequest::GetKey),
            (r#"{"type":"GET_ALL"}"#, RelayRequest::GetAll),
            (r#"{"type":"CLEAR"}"#, RelayRequest::Clear),
        ];
        for (raw, expected) in cases {
            assert_eq!(RelayRequest::from_json(raw).unwrap(), expected, "{raw}");
        }
    }

    #[test]
    fn serialized_requests_parse_back() {
        let request = RelayRequest::StoreKey("a+b/c=".into());
        let raw = serde_json::to_string(&request).unwrap();
        assert_eq!(raw, r#"{"type":"STORE_KEY","payload":"a+b/c="}"#);
        assert_eq!(RelayRequest::from_json(&raw).unwrap(), request);
    }

    #[test]
    fn unknown_type_is_explicit_error() {
        assert_eq!(
            RelayRequest::from_json(r#"{"type":"DUMP_EVERYTHING"}"#).unwrap_err(),
            UNKNOWN_MESSAGE_TYPE
        );
    }

    #[test]
    fn store_without_payload_is_rejected() {
        let err = RelayRequest::from_json(r#"{"type":"STORE_DATA"}"#).unwrap_err();
        assert!(err.contains("payload"));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(RelayRequest::from_json("{not json").is_err());
        assert!(RelayRequest::from_json(r#"{"payload":"x"}"#).is_err());
    }

    #[test]
    fn response_wire_shapes() {
        assert_eq!(RelayResponse::Ack.to_json(), r#"{"success":true}"#);
        assert_eq!(RelayResponse::Data(None).to_json(), r#"{"data":null}"#);
        assert_eq!(
            RelayResponse::Key(Some("k".into())).to_json(),
            r#"{"key":"k"}"#
        );
        assert_eq!(
            RelayResponse::All(Halves {
                data: Some("d".into()),
                key: None
            })
            .to_json(),
            r#"{"data":"d","key":null}"#
        );
        assert_eq!(
            RelayResponse::Error(UNKNOWN_MESSAGE_TYPE.into()).to_json(),
            r#"{"error":"Unknown message type"}"#
        );
    }
}
