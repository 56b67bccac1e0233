use crate::http::reader::find_headers_end;
use crate::http::request::{Method, Request};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    /// The request line is missing, not CRLF-terminated, not three tokens,
    /// or its target does not start with `/`
    MalformedRequestLine,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MalformedRequestLine => f.write_str("malformed request line"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses the request line and headers out of a raw buffer.
///
/// Anything after the blank line is ignored. Header lines without a `:` are
/// skipped rather than rejected; a repeated header keeps its last value.
pub fn parse_http_request(buf: &[u8]) -> Result<Request, ParseError> {
    // Keep the first CRLF of the terminator so the last header line still
    // ends in '\r' like every other line.
    let head = match find_headers_end(buf) {
        Some(end) => &buf[..end + 2],
        None => buf,
    };

    let head = std::str::from_utf8(head).map_err(|_| ParseError::MalformedRequestLine)?;
    let mut lines = head.split('\n');

    // Request line
    let request_line = lines
        .next()
        .and_then(|line| line.strip_suffix('\r'))
        .ok_or(ParseError::MalformedRequestLine)?;

    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(path), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::MalformedRequestLine);
    };

    if !path.starts_with('/') {
        return Err(ParseError::MalformedRequestLine);
    }

    // Headers
    let mut headers = HashMap::new();

    for line in lines {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            break;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);

        headers.insert(key.to_string(), value.to_string());
    }

    Ok(Request {
        method: Method::parse(method),
        path: path.to_string(),
        version: version.to_string(),
        headers,
    })
}
