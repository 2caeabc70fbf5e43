use log::trace;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};

use crate::{
    config::{MAX_HEADER_LINE, MAX_MESSAGE_SIZE},
    error::{ClientError, FramingError, Result},
};

const CONTENT_LENGTH: &str = "Content-Length";

/// `Content-Length` framed JSON messages over a pair of byte streams.
///
/// The reader is buffered once for the lifetime of the transport so bytes
/// read ahead of one message are still there for the next.
pub struct FramedTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
}

impl<R, W> FramedTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    pub async fn write_message<T: Serialize + ?Sized>(&mut self, body: &T) -> Result<()> {
        write_message_to(&mut self.writer, body).await
    }

    pub async fn read_message(&mut self) -> Result<Value> {
        read_message_from(&mut self.reader).await
    }

    /// Split the transport so each stream can be closed on its own.
    pub fn into_parts(self) -> (BufReader<R>, W) {
        (self.reader, self.writer)
    }
}

/// Write one framed message and flush it.
pub async fn write_message_to<W, T>(writer: &mut W, body: &T) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
    T: Serialize + ?Sized,
{
    let content = serde_json::to_vec(body).map_err(ClientError::Encode)?;
    let header = format!("{CONTENT_LENGTH}: {}\r\n\r\n", content.len());

    trace!("Sending LSP message: {}", String::from_utf8_lossy(&content));

    writer.write_all(header.as_bytes()).await?;
    writer.write_all(&content).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed message and decode its body as JSON.
pub async fn read_message_from<R>(reader: &mut R) -> Result<Value>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let length = read_headers(reader).await?;

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;

    trace!("Received LSP message: {}", String::from_utf8_lossy(&body));

    serde_json::from_slice(&body).map_err(|e| FramingError::InvalidJson(e).into())
}

async fn read_headers<R>(reader: &mut R) -> Result<usize>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut content_length = None;
    let mut line = Vec::new();

    loop {
        line.clear();
        let bytes_read = (&mut *reader)
            .take(MAX_HEADER_LINE as u64 + 1)
            .read_until(b'\n', &mut line)
            .await?;
        if bytes_read == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stream closed while reading message headers",
            )
            .into());
        }

        if line.len() > MAX_HEADER_LINE && !line.ends_with(b"\n") {
            return Err(FramingError::HeaderLineTooLong {
                max: MAX_HEADER_LINE,
            }
            .into());
        }

        let text = std::str::from_utf8(&line).map_err(|_| FramingError::NonUtf8Header)?;
        let text = text.trim_end_matches(|c| c == '\r' || c == '\n');
        if text.is_empty() {
            break;
        }

        if let Some(length) = parse_content_length(text)? {
            content_length = Some(length);
        }
    }

    let length = content_length.ok_or(FramingError::MissingContentLength)?;
    if length > MAX_MESSAGE_SIZE {
        return Err(FramingError::MessageTooLarge {
            size: length,
            max: MAX_MESSAGE_SIZE,
        }
        .into());
    }

    Ok(length)
}

/// Parse one header line. Returns `None` for headers other than `Content-Length`.
fn parse_content_length(line: &str) -> std::result::Result<Option<usize>, FramingError> {
    let Some((name, value)) = line.split_once(':') else {
        return Err(FramingError::MalformedHeader(line.to_string()));
    };

    if !name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
        return Ok(None);
    }

    let value = value.trim();
    value
        .parse::<usize>()
        .map(Some)
        .map_err(|_| FramingError::InvalidContentLength(value.to_string()))
}
