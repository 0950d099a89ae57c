use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::codec::frame;

// -----------------------------------------------------------------------------
// ----- Constants -------------------------------------------------------------

const READ_CAPACITY_HINT: usize = 4096;

// -----------------------------------------------------------------------------
// ----- GatewayConnection -----------------------------------------------------

/// Buffered byte-stream connection to the gateway. Frame extraction is
/// delegated to the codec; this type only owns the socket and the read
/// buffer.
#[derive(Debug)]
pub struct GatewayConnection {
    stream: TcpStream,
    buffer: BytesMut,
}

impl GatewayConnection {
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> std::io::Result<Self> {
        let addr = format!("{host}:{port}");
        let stream = tokio::time::timeout(timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out")
            })??;
        stream.set_nodelay(true)?;

        Ok(Self {
            stream,
            buffer: BytesMut::with_capacity(READ_CAPACITY_HINT),
        })
    }

    pub async fn send_frame(&mut self, raw: &str) -> std::io::Result<()> {
        self.stream.write_all(raw.as_bytes()).await
    }

    /// Next complete frame, or `None` once the gateway closes the stream.
    pub async fn read_frame(&mut self) -> std::io::Result<Option<String>> {
        loop {
            if let Some(raw) = frame::extract(&mut self.buffer) {
                return Ok(Some(raw));
            }

            self.buffer.reserve(READ_CAPACITY_HINT);
            let n = self.stream.read_buf(&mut self.buffer).await?;
            if n == 0 {
                return Ok(None);
            }
        }
    }

    /// Split for the running session: the listening loop takes the sole
    /// reader (with any bytes already buffered), the workers share the
    /// writer behind a lock.
    pub fn into_split(self) -> (FrameReader, OwnedWriteHalf) {
        let (reader, writer) = self.stream.into_split();
        (
            FrameReader {
                reader,
                buffer: self.buffer,
            },
            writer,
        )
    }
}

// -----------------------------------------------------------------------------
// ----- FrameReader -----------------------------------------------------------

/// Read half of a split connection, used exclusively by the listening loop.
#[derive(Debug)]
pub struct FrameReader {
    reader: OwnedReadHalf,
    buffer: BytesMut,
}

impl FrameReader {
    pub async fn next_frame(&mut self) -> std::io::Result<Option<String>> {
        loop {
            if let Some(raw) = frame::extract(&mut self.buffer) {
                return Ok(Some(raw));
            }

            self.buffer.reserve(READ_CAPACITY_HINT);
            let n = self.reader.read_buf(&mut self.buffer).await?;
            if n == 0 {
                return Ok(None);
            }
        }
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
