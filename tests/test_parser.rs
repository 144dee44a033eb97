use airwire::http::parser::{ParseError, Status};
use airwire::http::response::ResponseMessage;

#[test]
fn test_parse_response_with_body() {
    let raw = b"PROTO 200 OK\r\nContent-Length: 5\r\n\r\nHELLO";
    let header_len = raw.len() - 5;
    let mut message = ResponseMessage::new();

    let status = message.parse(raw).unwrap();

    assert_eq!(status, Status::Complete(header_len + 5));
    assert_eq!(message.status(), 200);
    assert_eq!(message.status_message(), "OK");
    assert_eq!(message.content(), Some(&b"HELLO"[..]));
    assert_eq!(message.headers().get("Content-Length"), Some("5"));
}

#[test]
fn test_parse_partial_body_leaves_message_unchanged() {
    let raw = b"PROTO 200 OK\r\nContent-Length: 10\r\n\r\nHELLO";
    let mut message = ResponseMessage::new();
    message.set_status(404, "Not Found");
    message.set_content(Some(b"previous".as_slice()));
    message.headers_mut().set("X-Marker", Some("kept"));
    let before = message.clone();

    let status = message.parse(raw).unwrap();

    assert_eq!(status, Status::Partial);
    assert_eq!(status.consumed(), 0);
    assert_eq!(message, before);
}

#[test]
fn test_parse_missing_blank_line() {
    let raw = b"PROTO 200 OK\r\nContent-Length: 0";
    let mut message = ResponseMessage::new();

    assert_eq!(message.parse(raw), Ok(Status::Partial));
    assert_eq!(message, ResponseMessage::new());
}

#[test]
fn test_parse_missing_blank_line_ignores_declared_length() {
    for raw in [
        &b"PROTO 200 OK\r\nContent-Length: 3\r\nabc"[..],
        &b"PROTO 200 OK\r\n"[..],
        &b"PROTO 200 OK"[..],
        &b""[..],
    ] {
        let mut message = ResponseMessage::new();
        assert_eq!(message.parse(raw), Ok(Status::Partial));
    }
}

#[test]
fn test_parse_status_line_missing_message() {
    let raw = b"PROTO 200\r\nContent-Length: 0\r\n\r\n";
    let mut message = ResponseMessage::new();

    assert_eq!(message.parse(raw), Err(ParseError::MalformedStatusLine));
    assert_eq!(message, ResponseMessage::new());
}

#[test]
fn test_parse_status_line_single_token() {
    let raw = b"PROTO\r\n\r\n";
    let mut message = ResponseMessage::new();

    assert_eq!(message.parse(raw), Err(ParseError::MalformedStatusLine));
}

#[test]
fn test_parse_invalid_status_code() {
    let raw = b"PROTO abc OK\r\n\r\n";
    let mut message = ResponseMessage::new();

    assert!(matches!(
        message.parse(raw),
        Err(ParseError::InvalidStatusCode(_))
    ));
    assert_eq!(message.status(), 500);
}

#[test]
fn test_parse_invalid_content_length() {
    let raw = b"PROTO 200 OK\r\nContent-Length: lots\r\n\r\n";
    let mut message = ResponseMessage::new();

    assert_eq!(
        message.parse(raw),
        Err(ParseError::InvalidContentLength("lots".to_string()))
    );
    assert_eq!(message, ResponseMessage::new());
}

#[test]
fn test_parse_signed_content_length() {
    let raw = b"PROTO 200 OK\r\nContent-Length: +5\r\n\r\nHELLO";
    let mut message = ResponseMessage::new();

    assert_eq!(
        message.parse(raw),
        Err(ParseError::InvalidContentLength("+5".to_string()))
    );
    assert_eq!(message, ResponseMessage::new());
}

#[test]
fn test_parse_signed_status_code() {
    let raw = b"PROTO +200 OK\r\n\r\n";
    let mut message = ResponseMessage::new();

    assert_eq!(
        message.parse(raw),
        Err(ParseError::InvalidStatusCode("+200".to_string()))
    );
    assert_eq!(message, ResponseMessage::new());
}

#[test]
fn test_parse_skips_header_with_stray_carriage_return() {
    let raw = b"PROTO 200 OK\r\nX-Split: a\rb\r\nCSeq: 3\r\n\r\n";
    let mut message = ResponseMessage::new();

    assert_eq!(message.parse(raw), Ok(Status::Complete(raw.len())));
    assert!(!message.headers().contains("X-Split"));
    assert_eq!(message.headers().get("CSeq"), Some("3"));
}

#[test]
fn test_parse_invalid_utf8_head() {
    let raw = b"PROTO 200 \xff\xfe\r\n\r\n";
    let mut message = ResponseMessage::new();

    assert_eq!(message.parse(raw), Err(ParseError::InvalidEncoding));
    assert_eq!(message, ResponseMessage::new());
}

#[test]
fn test_parse_status_message_with_spaces() {
    let raw = b"RTSP/1.0 453 Not Enough Bandwidth\r\nCSeq: 4\r\n\r\n";
    let mut message = ResponseMessage::new();

    assert_eq!(message.parse(raw), Ok(Status::Complete(raw.len())));
    assert_eq!(message.status(), 453);
    assert_eq!(message.status_message(), "Not Enough Bandwidth");
    assert_eq!(message.headers().get("CSeq"), Some("4"));
}

#[test]
fn test_parse_without_content_length_has_no_body() {
    let raw = b"RTSP/1.0 200 OK\r\nCSeq: 1\r\n\r\ntrailing";
    let mut message = ResponseMessage::new();

    let status = message.parse(raw).unwrap();

    // Bytes after the head belong to the next message.
    assert_eq!(status.consumed(), raw.len() - "trailing".len());
    assert_eq!(message.content(), None);
    assert!(!message.headers().contains("Content-Length"));
}

#[test]
fn test_parse_zero_content_length_means_no_body() {
    let raw = b"PROTO 204 No Content\r\nContent-Length: 0\r\n\r\n";
    let mut message = ResponseMessage::new();

    assert_eq!(message.parse(raw), Ok(Status::Complete(raw.len())));
    assert_eq!(message.content(), None);
    assert!(!message.headers().contains("Content-Length"));
}

#[test]
fn test_parse_bare_newline_endings() {
    let raw = b"PROTO 200 OK\nContent-Length: 2\n\nhi";
    let mut message = ResponseMessage::new();

    assert_eq!(message.parse(raw), Ok(Status::Complete(raw.len())));
    assert_eq!(message.status_message(), "OK");
    assert_eq!(message.content(), Some(&b"hi"[..]));
}

#[test]
fn test_parse_binary_body() {
    let raw = b"PROTO 200 OK\r\nContent-Length: 4\r\n\r\n\x00\x01\x02\x03";
    let mut message = ResponseMessage::new();

    message.parse(raw).unwrap();

    assert_eq!(message.content(), Some(&[0u8, 1, 2, 3][..]));
}

#[test]
fn test_parse_consumes_only_first_message() {
    let first = b"PROTO 200 OK\r\nContent-Length: 3\r\n\r\none".to_vec();
    let second = b"PROTO 201 Created\r\nContent-Length: 3\r\n\r\ntwo".to_vec();
    let raw = [first.clone(), second.clone()].concat();
    let mut message = ResponseMessage::new();

    let consumed = message.parse(&raw).unwrap().consumed();
    assert_eq!(consumed, first.len());
    assert_eq!(message.content(), Some(&b"one"[..]));

    let consumed = message.parse(&raw[consumed..]).unwrap().consumed();
    assert_eq!(consumed, second.len());
    assert_eq!(message.status(), 201);
    assert_eq!(message.content(), Some(&b"two"[..]));
}

#[test]
fn test_parse_replaces_previous_headers() {
    let mut message = ResponseMessage::new();
    message.headers_mut().set("X-Old", Some("1"));
    message.set_content(Some(b"old body".as_slice()));

    message
        .parse(b"PROTO 200 OK\r\nX-New: 2\r\n\r\n")
        .unwrap();

    assert_eq!(message.headers().get("X-Old"), None);
    assert_eq!(message.headers().get("X-New"), Some("2"));
    assert_eq!(message.content(), None);
}

#[test]
fn test_parse_grows_to_completion_byte_by_byte() {
    let raw = b"PROTO 200 OK\r\nContent-Length: 5\r\n\r\nHELLO";
    let mut message = ResponseMessage::new();

    for end in 0..raw.len() {
        assert_eq!(message.parse(&raw[..end]), Ok(Status::Partial), "prefix {}", end);
        assert_eq!(message, ResponseMessage::new());
    }

    assert_eq!(message.parse(raw), Ok(Status::Complete(raw.len())));
}
