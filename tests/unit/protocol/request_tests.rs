use clsp::protocol::{Incoming, LSPNotification, LSPRequest, LSPResponse, ResponseError};
use serde_json::{from_str, json, to_string, Value};

#[test]
fn test_lsp_request_serialization() {
    let request = LSPRequest::new(1, "initialize", Some(json!({"rootUri": "file:///tmp/proj"})));

    let serialized = to_string(&request).unwrap();
    let deserialized: LSPRequest = from_str(&serialized).unwrap();

    assert_eq!(deserialized, request);
    assert_eq!(deserialized.jsonrpc, "2.0");
}

#[test]
fn test_lsp_response_serialization() {
    let response = LSPResponse {
        jsonrpc: "2.0".to_string(),
        id: Some(1),
        result: Some(json!({"capabilities": {}})),
        error: None,
    };

    let serialized = to_string(&response).unwrap();
    let deserialized: LSPResponse = from_str(&serialized).unwrap();

    assert_eq!(response.result, deserialized.result);
    assert!(deserialized.error.is_none());
}

#[test]
fn test_lsp_error_response() {
    let error_response = LSPResponse {
        jsonrpc: "2.0".to_string(),
        id: Some(1),
        result: None,
        error: Some(ResponseError {
            code: -32601,
            message: "Method not found".to_string(),
            data: None,
        }),
    };

    let serialized = to_string(&error_response).unwrap();
    assert!(!serialized.contains("\"result\""));

    let deserialized: LSPResponse = from_str(&serialized).unwrap();
    assert!(deserialized.result.is_none());
    assert!(deserialized.is_well_formed());

    let error = deserialized.error.unwrap();
    assert_eq!(error.code, -32601);
    assert_eq!(error.message, "Method not found");
    assert_eq!(error.to_string(), "[-32601] Method not found");
}

#[test]
fn test_error_data_is_kept() {
    let response: LSPResponse = from_str(
        r#"{"jsonrpc":"2.0","id":4,"error":{"code":-32602,"message":"Invalid params","data":{"field":"position"}}}"#,
    )
    .unwrap();

    let error = response.error.unwrap();
    assert_eq!(error.data, Some(json!({"field": "position"})));
}

#[test]
fn test_notification_without_id() {
    let notification = LSPNotification::new(
        "textDocument/didOpen",
        Some(json!({"uri": "file:///test.rs"})),
    );

    let serialized = to_string(&notification).unwrap();
    assert!(!serialized.contains("\"id\""));

    let value: Value = from_str(&serialized).unwrap();
    assert_eq!(
        Incoming::classify(&value),
        Incoming::Notification {
            method: "textDocument/didOpen".to_string()
        }
    );
}

#[test]
fn test_response_with_both_fields_is_not_well_formed() {
    let response: LSPResponse = from_str(
        r#"{"jsonrpc":"2.0","id":1,"result":1,"error":{"code":1,"message":"x"}}"#,
    )
    .unwrap();

    assert!(!response.is_well_formed());
}

#[test]
fn test_null_id_response() {
    let response: LSPResponse = from_str(
        r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#,
    )
    .unwrap();

    assert_eq!(response.id, None);
    assert_eq!(response.error.unwrap().code, -32700);
}
