//! Parse HTTP response header lines.

/// Headers of the final response (after redirects).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    /// Body size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
    /// `Content-Type` value if present.
    pub content_type: Option<String>,
}

/// Parse collected header lines. libcurl reports the headers of every response
/// in a redirect chain; a status line starts a new block, so only the last
/// response's headers survive.
pub fn parse_headers(lines: &[String]) -> ResponseHeaders {
    let mut out = ResponseHeaders::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            out = ResponseHeaders::default();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                out.content_length = value.parse::<u64>().ok();
            } else if name.eq_ignore_ascii_case("content-type") {
                out.content_type = Some(value.to_string());
            }
        }
    }

    out
}
