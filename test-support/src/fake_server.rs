use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Value};
use tokio::io::{
    duplex, split, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf,
    WriteHalf,
};

/// Buffer size of the in-memory pipe between client and fake server.
const PIPE_CAPACITY: usize = 256 * 1024;

/// Frame a JSON body the way a language server writes it.
pub fn frame(body: &Value) -> Vec<u8> {
    let content = serde_json::to_vec(body).expect("JSON values always serialize");
    let mut framed = format!("Content-Length: {}\r\n\r\n", content.len()).into_bytes();
    framed.extend_from_slice(&content);
    framed
}

/// The server end of an in-memory LSP connection.
///
/// Tests drive it step by step: read what the client sent, then write
/// whatever the scenario needs, including deliberately broken framing.
pub struct FakeServer {
    reader: BufReader<ReadHalf<DuplexStream>>,
    writer: WriteHalf<DuplexStream>,
}

/// The client end: hand these to the client under test.
pub type ClientStreams = (ReadHalf<DuplexStream>, WriteHalf<DuplexStream>);

impl FakeServer {
    pub fn connect() -> (ClientStreams, FakeServer) {
        let (client_side, server_side) = duplex(PIPE_CAPACITY);
        let (server_read, server_write) = split(server_side);

        (
            split(client_side),
            FakeServer {
                reader: BufReader::new(server_read),
                writer: server_write,
            },
        )
    }

    /// Read one framed message written by the client.
    pub async fn read_message(&mut self) -> Result<Value> {
        let mut content_length = None;
        let mut line = String::new();

        loop {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                bail!("client closed the stream");
            }

            let header = line.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some(value) = header.strip_prefix("Content-Length: ") {
                content_length = Some(value.parse::<usize>()?);
            }
        }

        let length = content_length.ok_or_else(|| anyhow!("client omitted Content-Length"))?;
        let mut body = vec![0u8; length];
        self.reader.read_exact(&mut body).await?;

        serde_json::from_slice(&body).context("client sent invalid JSON")
    }

    /// Read a message and check it is a request for `method`.
    pub async fn expect_request(&mut self, method: &str) -> Result<Value> {
        let message = self.read_message().await?;
        if message["method"] != method || message.get("id").is_none() {
            bail!("expected request {method}, got {message}");
        }
        Ok(message)
    }

    /// Read a message and check it is a notification for `method`.
    pub async fn expect_notification(&mut self, method: &str) -> Result<Value> {
        let message = self.read_message().await?;
        if message["method"] != method || message.get("id").is_some() {
            bail!("expected notification {method}, got {message}");
        }
        Ok(message)
    }

    pub async fn send(&mut self, body: &Value) -> Result<()> {
        self.send_raw(&frame(body)).await
    }

    /// Write bytes verbatim, bypassing framing.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub async fn respond(&mut self, id: &Value, result: Value) -> Result<()> {
        self.send(&json!({"jsonrpc": "2.0", "id": id, "result": result}))
            .await
    }

    pub async fn respond_error(&mut self, id: &Value, code: i64, message: &str) -> Result<()> {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": code, "message": message}
        }))
        .await
    }

    pub async fn notify(&mut self, method: &str, params: Value) -> Result<()> {
        self.send(&json!({"jsonrpc": "2.0", "method": method, "params": params}))
            .await
    }

    /// Answer `initialize` with empty capabilities and swallow `initialized`.
    pub async fn accept_initialize(&mut self) -> Result<Value> {
        let request = self.expect_request("initialize").await?;
        self.respond(&request["id"], json!({"capabilities": {}}))
            .await?;
        self.expect_notification("initialized").await?;
        Ok(request)
    }

    /// Answer `shutdown` with `null` and wait for `exit`.
    pub async fn accept_shutdown(&mut self) -> Result<()> {
        let request = self.expect_request("shutdown").await?;
        self.respond(&request["id"], Value::Null).await?;
        self.expect_notification("exit").await?;
        Ok(())
    }
}
