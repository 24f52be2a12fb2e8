use hearth::http::parser::{parse_headers, parse_request_head, parse_request_line, ParseError};
use hearth::http::request::Method;

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let parsed = parse_request_head(req).unwrap();

    assert_eq!(parsed.method, Method::Get);
    assert_eq!(parsed.target, "/");
    assert_eq!(parsed.version, "HTTP/1.1");
    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
    assert_eq!(parsed.headers.len(), 1);
}

#[test]
fn test_parse_post_request_head() {
    let req = b"POST /api HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\n";
    let parsed = parse_request_head(req).unwrap();

    assert_eq!(parsed.method, Method::Post);
    assert_eq!(parsed.target, "/api");
    assert_eq!(parsed.content_length(), Some(5));
}

#[test]
fn test_parse_multiple_headers() {
    let req = b"GET /path HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n";
    let parsed = parse_request_head(req).unwrap();

    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
    assert_eq!(parsed.headers.get("User-Agent").unwrap(), "test-client");
    assert_eq!(parsed.headers.get("Accept").unwrap(), "*/*");
}

#[test]
fn test_parse_request_without_headers() {
    let parsed = parse_request_head(b"GET /a.txt HTTP/1.0\r\n\r\n").unwrap();

    assert_eq!(parsed.version, "HTTP/1.0");
    assert!(parsed.headers.is_empty());
}

#[test]
fn test_parse_duplicate_header_last_wins() {
    let req = b"GET / HTTP/1.1\r\nX-Tag: first\r\nX-Tag: second\r\n\r\n";
    let parsed = parse_request_head(req).unwrap();

    assert_eq!(parsed.headers.get("X-Tag").unwrap(), "second");
}

#[test]
fn test_parse_request_target_kept_raw() {
    let req = b"GET /search?q=rust%20lang HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let parsed = parse_request_head(req).unwrap();

    assert_eq!(parsed.target, "/search?q=rust%20lang");
}

#[test]
fn test_parse_unknown_method_is_not_an_error() {
    let parsed = parse_request_head(b"DELETE /x HTTP/1.1\r\n\r\n").unwrap();

    assert_eq!(parsed.method, Method::Unsupported("DELETE".to_string()));
}

#[test]
fn test_parse_request_line_too_few_tokens() {
    for line in ["GET /", "GET", ""] {
        assert_eq!(parse_request_line(line), Err(ParseError::MalformedRequestLine));
    }
}

#[test]
fn test_parse_request_line_too_many_tokens() {
    assert_eq!(
        parse_request_line("GET / HTTP/1.1 extra"),
        Err(ParseError::MalformedRequestLine)
    );
}

#[test]
fn test_parse_request_line_double_space() {
    assert_eq!(
        parse_request_line("GET  / HTTP/1.1"),
        Err(ParseError::MalformedRequestLine)
    );
}

#[test]
fn test_parse_request_line_target_must_be_origin_form() {
    assert_eq!(
        parse_request_line("GET index.html HTTP/1.1"),
        Err(ParseError::MalformedRequestLine)
    );
}

#[test]
fn test_parse_malformed_header() {
    let req = b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n";
    let result = parse_request_head(req);

    assert!(matches!(result, Err(ParseError::MalformedHeader)));
}

#[test]
fn test_parse_header_requires_colon_space() {
    assert_eq!(parse_headers("Host:example.com\r\n"), Err(ParseError::MalformedHeader));
}

#[test]
fn test_parse_invalid_utf8_head() {
    let result = parse_request_head(b"GET /\xff HTTP/1.1\r\n\r\n");

    assert!(matches!(result, Err(ParseError::InvalidEncoding)));
}

#[test]
fn test_parse_header_case_preservation() {
    let req = b"GET / HTTP/1.1\r\ncontent-type: application/json\r\n\r\n";
    let parsed = parse_request_head(req).unwrap();

    assert!(parsed.headers.contains_key("content-type"));
    assert!(!parsed.headers.contains_key("Content-Type"));
}

#[test]
fn test_parse_header_value_not_trimmed() {
    let parsed = parse_request_head(b"GET / HTTP/1.1\r\nX-Pad:  spaced \r\n\r\n").unwrap();

    assert_eq!(parsed.headers.get("X-Pad").unwrap(), " spaced ");
}
