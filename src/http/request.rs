use std::collections::HashMap;

/// HTTP request methods.
///
/// The server serves GET and accepts POST bodies. Any other token is kept
/// verbatim so it can be logged and answered with 405 Method Not Allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a static resource
    Get,
    /// POST - Submit a request body
    Post,
    /// Any other method token, case preserved
    Unsupported(String),
}

/// Represents a parsed HTTP request head from a client.
///
/// Only ever built from a complete header block, so no field is partially
/// populated. The POST body is not part of the request; it is read off the
/// connection afterwards by the body reader.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, or anything else)
    pub method: Method,
    /// The raw request target as sent (e.g., "/index.html")
    pub target: String,
    /// HTTP version (typically "HTTP/1.1")
    pub version: String,
    /// Request headers, names kept byte-for-byte; a repeated name keeps the last value
    pub headers: HashMap<String, String>,
}

impl Method {
    /// Parses an HTTP method token.
    ///
    /// Matching is case-sensitive, as HTTP method tokens are.
    ///
    /// # Example
    ///
    /// ```
    /// # use hearth::http::request::Method;
    /// assert_eq!(Method::parse("GET"), Method::Get);
    /// assert_eq!(Method::parse("get"), Method::Unsupported("get".to_string()));
    /// ```
    pub fn parse(s: &str) -> Self {
        match s {
            "GET" => Method::Get,
            "POST" => Method::Post,
            other => Method::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Unsupported(token) => token,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Request {
    /// Retrieves a header value by its exact name.
    ///
    /// Names are not case-normalized: `Content-Length` and `content-length`
    /// are different keys.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(key)
            .map(|v| v.as_str())
    }

    /// Parses the Content-Length header as a non-negative integer.
    ///
    /// Returns `None` if the header is missing or not a valid number.
    pub fn content_length(&self) -> Option<usize> {
        self.header("Content-Length")
            .and_then(|v| v.parse().ok())
    }
}
