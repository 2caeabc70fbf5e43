use clsp::{
    config::MAX_HEADER_LINE,
    lsp::{read_message_from, FramedTransport, LspClient},
    protocol::LSPRequest,
    ClientError, FramingError,
};
use rstest::rstest;
use serde_json::{json, Value};
use std::time::Duration;
use test_support::{frame, FakeServer};
use tokio::time::Instant;

async fn decode(wire: &[u8]) -> Result<Value, ClientError> {
    let mut reader = wire;
    read_message_from(&mut reader).await
}

#[tokio::test]
async fn test_write_message_declares_byte_length() {
    let request = LSPRequest::new(1, "workspace/symbol", Some(json!({"query": "main"})));
    let mut transport = FramedTransport::new(&b""[..], Vec::new());

    transport.write_message(&request).await.unwrap();
    let (_, written) = transport.into_parts();

    let wire = String::from_utf8(written).unwrap();
    let (header, body) = wire.split_once("\r\n\r\n").unwrap();
    assert_eq!(header, format!("Content-Length: {}", body.len()));

    let decoded: Value = serde_json::from_str(body).unwrap();
    assert_eq!(decoded["jsonrpc"], "2.0");
    assert_eq!(decoded["method"], "workspace/symbol");
    assert_eq!(decoded["id"], 1);
}

#[tokio::test]
async fn test_multibyte_body_round_trips() {
    let body = json!({"text": "fn 名前() -> 🦀"});
    let mut transport = FramedTransport::new(&b""[..], Vec::new());
    transport.write_message(&body).await.unwrap();
    let (_, written) = transport.into_parts();

    assert_eq!(decode(&written).await.unwrap(), body);
}

#[tokio::test]
async fn test_unknown_headers_are_ignored() {
    let wire = b"Content-Type: application/vscode-jsonrpc; charset=utf-8\r\nX-Trace: 1\r\nContent-Length: 13\r\n\r\n{\"result\":42}";

    assert_eq!(decode(wire).await.unwrap(), json!({"result": 42}));
}

#[tokio::test]
async fn test_header_order_does_not_matter() {
    let wire = b"Content-Length: 2\r\nContent-Type: application/json\r\n\r\n[]";

    assert_eq!(decode(wire).await.unwrap(), json!([]));
}

#[rstest]
#[case::non_numeric(b"Content-Length: abc\r\n\r\n{}".as_slice())]
#[case::negative(b"Content-Length: -5\r\n\r\n{}".as_slice())]
#[tokio::test]
async fn test_invalid_content_length(#[case] wire: &'static [u8]) {
    let err = decode(wire).await.unwrap_err();

    assert!(
        matches!(err, ClientError::Framing(FramingError::InvalidContentLength(_))),
        "unexpected error: {err}"
    );
}

#[rstest]
#[case::crlf(b"Content-Length: 2\r\n\r\n{}".as_slice())]
#[case::bare_newline(b"Content-Length: 2\n\n{}".as_slice())]
#[case::mixed(b"Content-Type: application/json\nContent-Length: 2\r\n\n{}".as_slice())]
#[tokio::test]
async fn test_line_terminators(#[case] wire: &'static [u8]) {
    assert_eq!(decode(wire).await.unwrap(), json!({}));
}

#[rstest]
#[case::non_utf8(
    b"\xff\xfe: x\r\n\r\n".as_slice(),
    |e: &FramingError| matches!(e, FramingError::NonUtf8Header)
)]
#[case::no_colon(
    b"garbage\r\n\r\n{}".as_slice(),
    |e: &FramingError| matches!(e, FramingError::MalformedHeader(line) if line == "garbage")
)]
#[tokio::test]
async fn test_malformed_header_lines(
    #[case] wire: &'static [u8],
    #[case] expected: fn(&FramingError) -> bool,
) {
    let err = decode(wire).await.unwrap_err();

    let ClientError::Framing(framing) = &err else {
        panic!("expected a framing error, got {err}");
    };
    assert!(expected(framing), "unexpected error: {framing}");
}

#[tokio::test]
async fn test_header_line_without_newline_is_capped() {
    let wire = vec![b'a'; MAX_HEADER_LINE * 4];

    let err = decode(&wire).await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Framing(FramingError::HeaderLineTooLong { max }) if max == MAX_HEADER_LINE
    ));
}

#[tokio::test]
async fn test_long_unknown_header_within_cap_is_ignored() {
    let mut wire = format!("X-Padding: {}\r\n", "p".repeat(MAX_HEADER_LINE / 2)).into_bytes();
    wire.extend_from_slice(b"Content-Length: 2\r\n\r\n[]");

    assert_eq!(decode(&wire).await.unwrap(), json!([]));
}

#[tokio::test]
async fn test_missing_content_length() {
    let err = decode(b"Content-Type: application/json\r\n\r\n{}")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Framing(FramingError::MissingContentLength)
    ));
    assert!(err.to_string().contains("no Content-Length header found"));
}

#[tokio::test]
async fn test_zero_length_body_is_invalid_json() {
    let err = decode(b"Content-Length: 0\r\n\r\n").await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Framing(FramingError::InvalidJson(_))
    ));
}

#[tokio::test]
async fn test_invalid_json_body() {
    let err = decode(b"Content-Length: 5\r\n\r\n{nope").await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Framing(FramingError::InvalidJson(_))
    ));
}

#[tokio::test]
async fn test_truncated_body_is_io_error() {
    let err = decode(b"Content-Length: 50\r\n\r\n{\"id\":1}")
        .await
        .unwrap_err();

    let ClientError::Io(io) = err else {
        panic!("expected an IO error");
    };
    assert_eq!(io.kind(), std::io::ErrorKind::UnexpectedEof);
}

#[tokio::test]
async fn test_stream_closed_mid_headers_is_io_error() {
    let err = decode(b"Content-Length: 2\r\n").await.unwrap_err();

    assert!(matches!(err, ClientError::Io(_)));
}

#[tokio::test]
async fn test_oversized_message_is_rejected() {
    let err = decode(b"Content-Length: 999999999999\r\n\r\n")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Framing(FramingError::MessageTooLarge { .. })
    ));
}

#[tokio::test]
async fn test_reads_continue_across_split_writes() {
    let ((reader, writer), mut server) = FakeServer::connect();
    let mut transport = FramedTransport::new(reader, writer);

    let wire = frame(&json!({"jsonrpc": "2.0", "id": 3, "result": "ok"}));
    let (head, tail) = wire.split_at(10);
    let (head, tail) = (head.to_vec(), tail.to_vec());

    let sender = tokio::spawn(async move {
        server.send_raw(&head).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        server.send_raw(&tail).await.unwrap();
        server
    });

    let message = transport.read_message().await.unwrap();
    assert_eq!(message["result"], "ok");
    sender.await.unwrap();
}

#[tokio::test]
async fn test_framing_error_surfaces_through_client() {
    let ((reader, writer), mut server) = FakeServer::connect();
    let mut client = LspClient::new(reader, writer);

    let responder = tokio::spawn(async move {
        server.expect_request("workspace/symbol").await.unwrap();
        server
            .send_raw(b"Content-Type: application/json\r\n\r\n{}")
            .await
            .unwrap();
        server
    });

    let err = client
        .send_request(
            "workspace/symbol",
            None,
            Instant::now() + Duration::from_secs(5),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Framing(FramingError::MissingContentLength)
    ));
    responder.await.unwrap();
}
