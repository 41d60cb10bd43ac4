//! JSON bodies exchanged with the remote store.
//!
//! Every request carries the bearer `token`. Values travel as standard base64
//! with padding since the protocol is textual.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::model::KeyInfo;
use crate::utils::error::{Result, StorageError};

/// Remote operation names, appended to the endpoint to form request URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Lock,
    Unlock,
    Store,
    Load,
    Delete,
    Exists,
    List,
    Stat,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Lock => "lock",
            Operation::Unlock => "unlock",
            Operation::Store => "store",
            Operation::Load => "load",
            Operation::Delete => "delete",
            Operation::Exists => "exists",
            Operation::List => "list",
            Operation::Stat => "stat",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body for lock, unlock, load, delete, exists and stat.
#[derive(Debug, Serialize)]
pub struct KeyRequest<'a> {
    pub key: &'a str,
    pub token: &'a str,
}

#[derive(Debug, Serialize)]
pub struct StoreRequest<'a> {
    pub key: &'a str,
    pub value: String,
    pub token: &'a str,
}

impl<'a> StoreRequest<'a> {
    pub fn new(key: &'a str, value: &[u8], token: &'a str) -> Self {
        Self {
            key,
            value: encode_value(value),
            token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListRequest<'a> {
    pub prefix: &'a str,
    pub recursive: bool,
    pub token: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoadResponse {
    pub value: String,
}

impl LoadResponse {
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        decode_value(&self.value)
    }
}

#[derive(Debug, Deserialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListResponse {
    pub keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatResponse {
    pub key: String,
    pub modified: String,
    pub size: i64,
    #[serde(rename = "isTerminal")]
    pub is_terminal: bool,
}

impl TryFrom<StatResponse> for KeyInfo {
    type Error = StorageError;

    fn try_from(response: StatResponse) -> Result<Self> {
        let modified = parse_modified(&response.modified)?;
        Ok(KeyInfo {
            key: response.key,
            modified,
            size: response.size,
            is_terminal: response.is_terminal,
        })
    }
}

pub fn encode_value(value: &[u8]) -> String {
    STANDARD.encode(value)
}

pub fn decode_value(value: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(value)?)
}

/// RFC 3339 with an explicit offset, e.g. `2021-01-01T00:00:00Z`.
///
/// Only the canonical layout is accepted: an uppercase `T` separator and an
/// offset of `Z` or `±HH:MM`.
pub fn parse_modified(value: &str) -> Result<DateTime<Utc>> {
    let invalid = |reason: String| StorageError::TimestampError {
        value: value.to_string(),
        reason,
    };

    if !has_rfc3339_layout(value.as_bytes()) {
        return Err(invalid(
            "expected YYYY-MM-DDTHH:MM:SS[.fraction] followed by Z or +HH:MM".to_string(),
        ));
    }

    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| invalid(e.to_string()))
}

fn has_rfc3339_layout(bytes: &[u8]) -> bool {
    fn digits(bytes: &[u8]) -> bool {
        bytes.iter().all(u8::is_ascii_digit)
    }

    if bytes.len() < 20 {
        return false;
    }
    let date_time = digits(&bytes[0..4])
        && bytes[4] == b'-'
        && digits(&bytes[5..7])
        && bytes[7] == b'-'
        && digits(&bytes[8..10])
        && bytes[10] == b'T'
        && digits(&bytes[11..13])
        && bytes[13] == b':'
        && digits(&bytes[14..16])
        && bytes[16] == b':'
        && digits(&bytes[17..19]);
    if !date_time {
        return false;
    }

    let mut offset = &bytes[19..];
    if let Some((b'.', fraction)) = offset.split_first() {
        let len = fraction.iter().take_while(|b| b.is_ascii_digit()).count();
        if len == 0 {
            return false;
        }
        offset = &fraction[len..];
    }

    match offset {
        [b'Z'] => true,
        [b'+' | b'-', hours @ .., b':', _, _] if hours.len() == 2 => {
            digits(hours) && digits(&offset[4..])
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_store_request_shape() {
        let request = StoreRequest::new("certs/a.pem", b"hello", "tkn");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"key": "certs/a.pem", "value": "aGVsbG8=", "token": "tkn"})
        );
    }

    #[test]
    fn test_list_request_shape() {
        let request = ListRequest {
            prefix: "certs/",
            recursive: true,
            token: "tkn",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"prefix": "certs/", "recursive": true, "token": "tkn"})
        );
    }

    #[test]
    fn test_binary_values_survive_encoding() {
        let samples: [&[u8]; 3] = [b"", &[0x00, 0xff, 0xfe, 0x80], "ü\n".as_bytes()];
        for sample in samples {
            assert_eq!(decode_value(&encode_value(sample)).unwrap(), sample);
        }
        assert_eq!(encode_value(b""), "");
    }

    #[test]
    fn test_invalid_base64_is_decode_error() {
        let err = decode_value("not base64!").unwrap_err();
        assert!(matches!(err, StorageError::DecodeError(_)));
    }

    #[test]
    fn test_stat_response_conversion() {
        let response: StatResponse = serde_json::from_value(serde_json::json!({
            "key": "certs/a.pem",
            "modified": "2023-05-01T14:00:00+02:00",
            "size": 1234,
            "isTerminal": true
        }))
        .unwrap();

        let info = KeyInfo::try_from(response).unwrap();
        assert_eq!(info.modified, Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap());
        assert_eq!(info.size, 1234);
        assert!(info.is_terminal);
    }

    #[test]
    fn test_canonical_timestamps_parse() {
        let expected = Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_modified("2023-05-01T12:00:00Z").unwrap(), expected);
        assert_eq!(parse_modified("2023-05-01T07:00:00-05:00").unwrap(), expected);

        let fractional = parse_modified("2023-05-01T12:00:00.250Z").unwrap();
        assert_eq!(fractional.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_malformed_timestamp_is_error() {
        for bad in [
            "",
            "2023-05-01",
            "2023-05-01 12:00:00",
            "yesterday",
            "2023-05-01 12:00:00Z",
            "2023-05-01t12:00:00Z",
            "2023-05-01T12:00:00z",
            "2023-05-01T12:00:00",
            "2023-05-01T12:00:00+0200",
            "2023-05-01T12:00:00.Z",
            "2023-05-01T12:00:00Z ",
            "2023-13-01T12:00:00Z",
        ] {
            let err = parse_modified(bad).unwrap_err();
            assert!(matches!(err, StorageError::TimestampError { .. }), "{bad}");
        }
    }
}
