//! Classify transport errors, HTTP statuses and curl errors into retry kinds.

use crate::retry::policy::ErrorKind;
use crate::transport::TransportError;

/// Classify an HTTP status code the client did not map to a receiver answer.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        // Gateway in front of the receiver could not reach it.
        502 | 504 => ErrorKind::Connection,
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify a transport error into an `ErrorKind`.
pub fn classify(e: &TransportError) -> ErrorKind {
    match e {
        TransportError::Unavailable(_) => ErrorKind::Throttled,
        TransportError::Curl(ce) => classify_curl_error(ce),
        TransportError::Incomplete(_) => ErrorKind::Incomplete,
        TransportError::UnexpectedStatus { status, .. } => classify_http_status(*status),
        TransportError::UnsupportedPayload(_)
        | TransportError::TooLarge(_)
        | TransportError::IndexOutOfRange(_)
        | TransportError::NoPayload(_)
        | TransportError::BadRequest(_)
        | TransportError::NotFound(_)
        | TransportError::Conflict(_)
        | TransportError::Internal(_)
        | TransportError::Cancelled => ErrorKind::Other,
    }
}
