use log::{debug, info, warn};
use serde_json::{json, Value};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    time::Instant,
};

use super::framing::FramedTransport;
use crate::{
    error::{ClientError, FramingError, Result},
    protocol::{Incoming, LSPNotification, LSPRequest, LSPResponse},
};

/// Lifecycle of a session.
///
/// There is no value for a session that has not started yet: a client only
/// exists once its streams are open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    /// A read or write was abandoned or failed; a stream may sit mid-message.
    Desynchronized,
    ShuttingDown,
    Closed,
}

/// Outcome of one step of the shutdown sequence.
#[derive(Debug)]
pub enum Step {
    Done,
    Skipped,
    Failed(ClientError),
}

impl Step {
    pub fn is_done(&self) -> bool {
        matches!(self, Step::Done)
    }

    pub fn error(&self) -> Option<&ClientError> {
        match self {
            Step::Failed(e) => Some(e),
            _ => None,
        }
    }

    fn from_result(result: Result<()>) -> Self {
        match result {
            Ok(()) => Step::Done,
            Err(e) => Step::Failed(e),
        }
    }
}

#[derive(Debug)]
pub struct ShutdownReport {
    pub shutdown: Step,
    pub exit: Step,
}

/// Synchronous request/response client over a framed byte stream.
///
/// Every method takes `&mut self`, so at most one request is ever in flight.
pub struct LspClient<R, W> {
    transport: Option<FramedTransport<R, W>>,
    next_id: i64,
    state: SessionState,
    /// Set once a frame may have been cut off on the writer.
    write_broken: bool,
}

impl<R, W> LspClient<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            transport: Some(FramedTransport::new(reader, writer)),
            next_id: 1,
            state: SessionState::Running,
            write_broken: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The id the next request will carry.
    pub fn next_id(&self) -> i64 {
        self.next_id
    }

    pub async fn send_request(
        &mut self,
        method: &str,
        params: Option<Value>,
        deadline: Instant,
    ) -> Result<LSPResponse> {
        match self.state {
            SessionState::Running => {}
            SessionState::Desynchronized => return Err(ClientError::Desynchronized),
            SessionState::ShuttingDown | SessionState::Closed => return Err(ClientError::Closed),
        }

        self.exchange(method, params, deadline).await
    }

    /// Send a notification. Fails with [`ClientError::Desynchronized`] once
    /// an earlier write was cut off, since the server could not parse it.
    pub async fn send_notification(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        let Some(transport) = self.transport.as_mut() else {
            return Err(ClientError::Closed);
        };
        if self.write_broken {
            return Err(ClientError::Desynchronized);
        }

        debug!("Sending LSP notification: {}", method);
        let result = transport
            .write_message(&LSPNotification::new(method, params))
            .await;
        if result.as_ref().is_err_and(ClientError::desynchronizes) {
            self.write_broken = true;
            if self.state == SessionState::Running {
                self.state = SessionState::Desynchronized;
            }
        }
        result
    }

    /// Run the `initialize` request and follow it with `initialized`.
    ///
    /// Returns the server's `InitializeResult`. An `error` in the reply is
    /// surfaced as [`ClientError::Protocol`] and leaves the session running.
    pub async fn initialize(&mut self, root_uri: &str, deadline: Instant) -> Result<Value> {
        let response = self
            .send_request("initialize", Some(initialize_params(root_uri)), deadline)
            .await?;

        if let Some(error) = response.error {
            warn!("LSP initialize failed: {}", error);
            return Err(ClientError::Protocol(error));
        }

        self.send_notification("initialized", Some(json!({}))).await?;
        info!("LSP session initialized with root {}", root_uri);

        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Send `shutdown` then `exit`, and close both streams.
    ///
    /// A desynchronized session skips `shutdown`, since its reply could not
    /// be told apart from stale bytes on the stream.
    pub async fn shutdown(&mut self, deadline: Instant) -> ShutdownReport {
        if self.state == SessionState::Closed {
            return ShutdownReport {
                shutdown: Step::Failed(ClientError::Closed),
                exit: Step::Failed(ClientError::Closed),
            };
        }

        let desynchronized = self.state == SessionState::Desynchronized;
        self.state = SessionState::ShuttingDown;

        let shutdown = if desynchronized {
            warn!("Skipping LSP shutdown request on a desynchronized session");
            Step::Skipped
        } else {
            let result = match self.exchange("shutdown", None, deadline).await {
                Ok(response) => match response.error {
                    Some(error) => Err(ClientError::Protocol(error)),
                    None => Ok(()),
                },
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                warn!("LSP shutdown request failed: {}", e);
            }
            Step::from_result(result)
        };

        let exit = if self.write_broken {
            warn!("Skipping LSP exit notification after a truncated write");
            Step::Skipped
        } else {
            let result = self.send_notification("exit", None).await;
            if let Err(e) = &result {
                warn!("LSP exit notification failed: {}", e);
            }
            Step::from_result(result)
        };

        // Dropping the transport closes the child's stdin and stdout.
        self.transport = None;
        self.state = SessionState::Closed;

        ShutdownReport { shutdown, exit }
    }

    async fn exchange(
        &mut self,
        method: &str,
        params: Option<Value>,
        deadline: Instant,
    ) -> Result<LSPResponse> {
        let Some(transport) = self.transport.as_mut() else {
            return Err(ClientError::Closed);
        };

        let id = self.next_id;
        self.next_id += 1;

        let request = LSPRequest::new(id, method, params);
        debug!("Sending LSP request: {} (id {})", method, id);

        let written = match tokio::time::timeout_at(deadline, transport.write_message(&request))
            .await
        {
            Ok(written) => written,
            Err(_) => Err(ClientError::deadline(format!(
                "{method} request (id {id}) to be written"
            ))),
        };

        let outcome = match written {
            Err(e) => {
                if e.desynchronizes() {
                    self.write_broken = true;
                }
                Err(e)
            }
            Ok(()) => match tokio::time::timeout_at(deadline, await_response(transport, id)).await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(ClientError::deadline(format!("{method} response (id {id})"))),
            },
        };

        if let Err(e) = &outcome {
            if e.desynchronizes() && self.state == SessionState::Running {
                warn!("LSP session desynchronized: {}", e);
                self.state = SessionState::Desynchronized;
            }
        }

        outcome
    }
}

async fn await_response<R, W>(transport: &mut FramedTransport<R, W>, id: i64) -> Result<LSPResponse>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let message = transport.read_message().await?;

        match Incoming::classify(&message) {
            Incoming::Notification { method } => {
                debug!("Received LSP notification: {}", method);
                continue;
            }
            Incoming::ServerRequest {
                method,
                id: server_id,
            } => {
                debug!("Ignoring server request: {} (id {})", method, server_id);
                continue;
            }
            Incoming::Response => {}
        }

        let received = message.get("id").and_then(Value::as_i64);
        if received != Some(id) {
            debug!(
                "Received unexpected response id {}, expected {}",
                message.get("id").unwrap_or(&Value::Null),
                id
            );
            continue;
        }

        let response: LSPResponse = serde_json::from_value(message)
            .map_err(|e| FramingError::MalformedResponse(e.to_string()))?;

        if !response.is_well_formed() {
            return Err(FramingError::MalformedResponse(format!(
                "response {id} must carry exactly one of result or error"
            ))
            .into());
        }

        debug!(
            "Received LSP response (id {}, has_error: {})",
            id,
            response.error.is_some()
        );
        return Ok(response);
    }
}

/// Parameters for `initialize`: this process, the root URI, and a fixed
/// set of client capabilities.
pub fn initialize_params(root_uri: &str) -> Value {
    json!({
        "processId": std::process::id(),
        "rootUri": root_uri,
        "capabilities": {
            "textDocument": {
                "completion": {
                    "completionItem": {
                        "snippetSupport": true
                    }
                },
                "hover": {
                    "contentFormat": ["markdown", "plaintext"]
                },
                "documentSymbol": {},
                "workspaceSymbol": {}
            },
            "workspace": {
                "symbol": {}
            }
        }
    })
}
