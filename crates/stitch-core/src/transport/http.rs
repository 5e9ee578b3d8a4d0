//! `ChunkTransport` over HTTP: one curl easy handle per request.

use std::io::Read;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use super::{ChunkTransport, PayloadEncoding, TransportError, ENCODING_HEADER};
use crate::chunking::ChunkDescriptor;
use crate::control::CancelToken;
use crate::identity::FileIdentity;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Abort if throughput stays below `LOW_SPEED_LIMIT` bytes/s for this long.
const LOW_SPEED_TIME: Duration = Duration::from_secs(60);
const LOW_SPEED_LIMIT: u32 = 1024;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3600);

/// Error body written by the receiver (`{"error": ..., "code": ...}`).
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    code: String,
}

struct Response {
    status: u32,
    body: Vec<u8>,
}

impl Response {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).trim().to_string()
    }
}

enum Method<'a> {
    Get,
    Post {
        body: &'a [u8],
        headers: Vec<String>,
    },
}

/// HTTP client for a `stitch serve` receiver.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base: Url,
    encoding: PayloadEncoding,
}

impl HttpTransport {
    /// `server_url` is the receiver's base URL, e.g. `http://127.0.0.1:8750`.
    pub fn new(server_url: &str, encoding: PayloadEncoding) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(server_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base, encoding })
    }

    fn endpoint(
        &self,
        path: &str,
        identity: &FileIdentity,
        extra: &[(&str, u64)],
    ) -> Result<Url, TransportError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| TransportError::BadRequest(format!("bad endpoint {path}: {e}")))?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("directory", identity.directory());
            q.append_pair("filename", identity.filename());
            for (k, v) in extra {
                q.append_pair(k, &v.to_string());
            }
        }
        Ok(url)
    }

    fn perform(
        &self,
        url: &Url,
        method: Method<'_>,
        cancel: Option<&CancelToken>,
    ) -> Result<Response, TransportError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str())?;
        easy.connect_timeout(CONNECT_TIMEOUT)?;
        easy.low_speed_limit(LOW_SPEED_LIMIT)?;
        easy.low_speed_time(LOW_SPEED_TIME)?;
        easy.timeout(REQUEST_TIMEOUT)?;
        if cancel.is_some() {
            easy.progress(true)?;
        }

        let mut body_in: &[u8] = &[];
        if let Method::Post { body, headers } = method {
            easy.post(true)?;
            easy.post_field_size(body.len() as u64)?;
            let mut list = curl::easy::List::new();
            for h in &headers {
                list.append(h)?;
            }
            // No `Expect: 100-continue` round trip.
            list.append("Expect:")?;
            easy.http_headers(list)?;
            body_in = body;
        }

        let mut body_out = Vec::new();
        let result = {
            let mut transfer = easy.transfer();
            transfer.read_function(|buf| Ok(body_in.read(buf).unwrap_or(0)))?;
            transfer.write_function(|data| {
                body_out.extend_from_slice(data);
                Ok(data.len())
            })?;
            if let Some(cancel) = cancel {
                transfer.progress_function(|_, _, _, _| !cancel.is_cancelled())?;
            }
            transfer.perform()
        };
        if let Err(e) = result {
            if e.is_aborted_by_callback() {
                return Err(TransportError::Cancelled);
            }
            return Err(TransportError::Curl(e));
        }

        let status = easy.response_code()?;
        Ok(Response {
            status,
            body: body_out,
        })
    }
}

/// Map a non-success receiver answer to a `TransportError`.
fn error_for(resp: &Response) -> TransportError {
    let parsed: ErrorBody = serde_json::from_slice(&resp.body).unwrap_or_default();
    let message = if parsed.error.is_empty() {
        resp.text()
    } else {
        parsed.error
    };
    match resp.status {
        429 | 503 => TransportError::Unavailable(message),
        415 => TransportError::UnsupportedPayload(message),
        413 => TransportError::TooLarge(message),
        403 => TransportError::IndexOutOfRange(message),
        400 if parsed.code == "NO_PAYLOAD" => TransportError::NoPayload(message),
        400 => TransportError::BadRequest(message),
        409 if parsed.code == "CONFLICT" => TransportError::Conflict(message),
        409 => TransportError::Incomplete(message),
        404 => TransportError::NotFound(message),
        500 => TransportError::Internal(message),
        status => TransportError::UnexpectedStatus {
            status,
            body: message,
        },
    }
}

impl ChunkTransport for HttpTransport {
    fn upload_chunk(
        &self,
        chunk: &ChunkDescriptor,
        payload: &[u8],
        cancel: &CancelToken,
    ) -> Result<(), TransportError> {
        let url = self.endpoint(
            "api/chunks",
            &chunk.identity,
            &[("chunk", chunk.index), ("total", chunk.total_chunks)],
        )?;
        let body = self.encoding.encode(payload);
        let mut headers = vec![format!("Content-Type: {}", self.encoding.content_type())];
        if let Some(value) = self.encoding.header_value() {
            headers.push(format!("{ENCODING_HEADER}: {value}"));
        }
        let resp = self.perform(
            &url,
            Method::Post {
                body: &body,
                headers,
            },
            Some(cancel),
        )?;
        match resp.status {
            201 => Ok(()),
            _ => Err(error_for(&resp)),
        }
    }

    fn chunk_exists(&self, identity: &FileIdentity, index: u64) -> Result<bool, TransportError> {
        let url = self.endpoint("api/chunks", identity, &[("chunk", index)])?;
        let resp = self.perform(&url, Method::Get, None)?;
        match resp.status {
            200 => Ok(true),
            404 => Ok(false),
            _ => Err(error_for(&resp)),
        }
    }

    fn assembled_exists(&self, identity: &FileIdentity) -> Result<bool, TransportError> {
        let url = self.endpoint("api/files", identity, &[])?;
        let resp = self.perform(&url, Method::Get, None)?;
        match resp.status {
            200 => Ok(true),
            404 => Ok(false),
            _ => Err(error_for(&resp)),
        }
    }

    fn merge(&self, identity: &FileIdentity, total_chunks: u64) -> Result<(), TransportError> {
        let url = self.endpoint("api/merge", identity, &[("total", total_chunks)])?;
        let resp = self.perform(
            &url,
            Method::Post {
                body: &[],
                headers: Vec::new(),
            },
            None,
        )?;
        match resp.status {
            200 | 201 => Ok(()),
            _ => Err(error_for(&resp)),
        }
    }

    fn digest(&self, identity: &FileIdentity) -> Result<String, TransportError> {
        let url = self.endpoint("api/digest", identity, &[])?;
        let resp = self.perform(&url, Method::Get, None)?;
        match resp.status {
            200 => Ok(resp.text()),
            _ => Err(error_for(&resp)),
        }
    }
}
