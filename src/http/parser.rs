use crate::http::request::{Method, Request};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Header block is not valid text
    InvalidEncoding,
    /// Request line is not `METHOD SP target SP version`
    MalformedRequestLine,
    /// A header line has no `": "` separator
    MalformedHeader,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidEncoding => f.write_str("request head is not valid UTF-8"),
            ParseError::MalformedRequestLine => f.write_str("malformed request line"),
            ParseError::MalformedHeader => f.write_str("malformed header line"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Decodes a complete header block into a [`Request`].
///
/// `block` is everything up to and including the `\r\n\r\n` terminator, as
/// returned by [`read_head`](crate::http::reader::read_head).
pub fn parse_request_head(block: &[u8]) -> Result<Request, ParseError> {
    let text = std::str::from_utf8(block).map_err(|_| ParseError::InvalidEncoding)?;

    let (request_line, header_section) = text
        .split_once("\r\n")
        .unwrap_or((text, ""));

    let (method, target, version) = parse_request_line(request_line)?;
    let headers = parse_headers(header_section)?;

    Ok(Request {
        method: Method::parse(method),
        target: target.to_string(),
        version: version.to_string(),
        headers,
    })
}

/// Splits a request line on single spaces into exactly three tokens.
pub fn parse_request_line(line: &str) -> Result<(&str, &str, &str), ParseError> {
    let mut parts = line.split(' ');

    let method = parts.next().ok_or(ParseError::MalformedRequestLine)?;
    let target = parts.next().ok_or(ParseError::MalformedRequestLine)?;
    let version = parts.next().ok_or(ParseError::MalformedRequestLine)?;

    if parts.next().is_some() || method.is_empty() || version.is_empty() {
        return Err(ParseError::MalformedRequestLine);
    }
    if !target.starts_with('/') {
        return Err(ParseError::MalformedRequestLine);
    }

    Ok((method, target, version))
}

/// Splits a header section into a name → value map.
///
/// Blank lines are skipped, so the trailing `\r\n\r\n` of a block is
/// harmless. Names and values are taken verbatim around the first `": "`.
pub fn parse_headers(section: &str) -> Result<HashMap<String, String>, ParseError> {
    let mut headers = HashMap::new();

    for line in section.split("\r\n") {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line
            .split_once(": ")
            .ok_or(ParseError::MalformedHeader)?;

        headers.insert(key.to_string(), value.to_string());
    }

    Ok(headers)
}
