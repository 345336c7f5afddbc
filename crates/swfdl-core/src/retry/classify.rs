//! Map transfer failures onto retry kinds.

use super::error::TransferError;
use super::policy::ErrorKind;

/// 429 and 503 are throttling, other 5xx are server errors, the rest is fatal.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    let network = [
        e.is_couldnt_connect(),
        e.is_couldnt_resolve_host(),
        e.is_couldnt_resolve_proxy(),
        e.is_recv_error(),
        e.is_send_error(),
        e.is_read_error(),
        e.is_got_nothing(),
        // Body shorter than Content-Length.
        e.is_partial_file(),
    ];
    if e.is_operation_timedout() {
        ErrorKind::Timeout
    } else if network.into_iter().any(|hit| hit) {
        ErrorKind::Connection
    } else {
        ErrorKind::Other
    }
}

pub fn classify(e: &TransferError) -> ErrorKind {
    match e {
        TransferError::Curl(ce) => classify_curl_error(ce),
        TransferError::Http(code) => classify_http_status(*code),
        TransferError::Storage(_) => ErrorKind::Other,
    }
}
