use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::JSONRPC_VERSION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LSPRequest {
    pub jsonrpc: String,
    pub id: i64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl LSPRequest {
    pub fn new(id: i64, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.to_string(),
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LSPNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl LSPNotification {
    pub fn new(method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
        }
    }
}

/// A response from the server.
///
/// `result` distinguishes a missing key (`None`) from an explicit `null`
/// (`Some(Value::Null)`), which is what a `shutdown` reply carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LSPResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl LSPResponse {
    /// True when exactly one of `result` and `error` is populated.
    pub fn is_well_formed(&self) -> bool {
        self.result.is_some() != self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for ResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// How an incoming message relates to the pending request.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// One-way message from the server, e.g. `textDocument/publishDiagnostics`.
    Notification { method: String },
    /// A request the server sends to the client, e.g. `window/workDoneProgress/create`.
    ServerRequest { method: String, id: Value },
    /// Anything without a method is treated as a response.
    Response,
}

impl Incoming {
    pub fn classify(message: &Value) -> Self {
        let Some(method) = message
            .get("method")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
        else {
            return Incoming::Response;
        };

        match message.get("id") {
            Some(id) if !id.is_null() => Incoming::ServerRequest {
                method: method.to_string(),
                id: id.clone(),
            },
            _ => Incoming::Notification {
                method: method.to_string(),
            },
        }
    }
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
