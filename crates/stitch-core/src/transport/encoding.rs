//! Chunk body framing: raw bytes or base64 text.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Request header that marks a base64 text body.
pub const ENCODING_HEADER: &str = "X-Stitch-Encoding";

const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    #[default]
    Raw,
    Base64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unsupported content type {0:?}")]
    UnsupportedContentType(String),
    #[error("unsupported payload encoding {0:?}")]
    UnsupportedEncoding(String),
    #[error("malformed base64 payload: {0}")]
    Base64(String),
}

impl PayloadEncoding {
    pub fn content_type(self) -> &'static str {
        match self {
            PayloadEncoding::Raw => OCTET_STREAM,
            PayloadEncoding::Base64 => TEXT_PLAIN,
        }
    }

    /// Value for `ENCODING_HEADER`, if this encoding sends one.
    pub fn header_value(self) -> Option<&'static str> {
        match self {
            PayloadEncoding::Raw => None,
            PayloadEncoding::Base64 => Some("base64"),
        }
    }

    pub fn encode(self, chunk: &[u8]) -> Vec<u8> {
        match self {
            PayloadEncoding::Raw => chunk.to_vec(),
            PayloadEncoding::Base64 => STANDARD.encode(chunk).into_bytes(),
        }
    }

    /// Work out the encoding from request headers. A missing content type is
    /// treated as raw.
    pub fn from_headers(
        content_type: Option<&str>,
        encoding: Option<&str>,
    ) -> Result<Self, DecodeError> {
        let mime = content_type
            .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
            .unwrap_or_else(|| OCTET_STREAM.to_string());
        let encoding = encoding.map(|e| e.trim().to_ascii_lowercase());
        match (mime.as_str(), encoding.as_deref()) {
            (OCTET_STREAM, None) => Ok(PayloadEncoding::Raw),
            (TEXT_PLAIN, Some("base64")) => Ok(PayloadEncoding::Base64),
            (OCTET_STREAM | TEXT_PLAIN, Some(other)) => {
                Err(DecodeError::UnsupportedEncoding(other.to_string()))
            }
            _ => Err(DecodeError::UnsupportedContentType(mime)),
        }
    }

    pub fn decode(self, body: &[u8]) -> Result<Vec<u8>, DecodeError> {
        match self {
            PayloadEncoding::Raw => Ok(body.to_vec()),
            PayloadEncoding::Base64 => {
                let text: Vec<u8> = body
                    .iter()
                    .copied()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect();
                STANDARD
                    .decode(text)
                    .map_err(|e| DecodeError::Base64(e.to_string()))
            }
        }
    }
}

impl fmt::Display for PayloadEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PayloadEncoding::Raw => "raw",
            PayloadEncoding::Base64 => "base64",
        })
    }
}

impl FromStr for PayloadEncoding {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(PayloadEncoding::Raw),
            "base64" => Ok(PayloadEncoding::Base64),
            other => Err(DecodeError::UnsupportedEncoding(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_framing() {
        let chunk = b"\x00\x01binary\xff";
        let body = PayloadEncoding::Base64.encode(chunk);
        assert_eq!(body, b"AAFiaW5hcnn/");
        let enc = PayloadEncoding::from_headers(Some("text/plain; charset=utf-8"), Some("base64"))
            .unwrap();
        assert_eq!(enc, PayloadEncoding::Base64);
        assert_eq!(enc.decode(b"AAFiaW5h\r\ncnn/").unwrap(), chunk);
    }

    #[test]
    fn raw_by_default() {
        assert_eq!(
            PayloadEncoding::from_headers(None, None).unwrap(),
            PayloadEncoding::Raw
        );
        assert_eq!(
            PayloadEncoding::from_headers(Some("application/octet-stream"), None).unwrap(),
            PayloadEncoding::Raw
        );
    }

    #[test]
    fn rejects_unknown_framing() {
        assert!(matches!(
            PayloadEncoding::from_headers(Some("application/json"), None),
            Err(DecodeError::UnsupportedContentType(_))
        ));
        assert!(matches!(
            PayloadEncoding::from_headers(Some("text/plain"), None),
            Err(DecodeError::UnsupportedContentType(_))
        ));
        assert!(matches!(
            PayloadEncoding::from_headers(Some("text/plain"), Some("gzip")),
            Err(DecodeError::UnsupportedEncoding(_))
        ));
        assert!(matches!(
            PayloadEncoding::Base64.decode(b"not base64!"),
            Err(DecodeError::Base64(_))
        ));
    }

    #[test]
    fn parse_names() {
        assert_eq!("Base64".parse::<PayloadEncoding>().unwrap(), PayloadEncoding::Base64);
        assert_eq!(PayloadEncoding::Raw.to_string(), "raw");
        assert!("hex".parse::<PayloadEncoding>().is_err());
    }
}
