use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::frame::{Frame, RequestParser};

/// Initial capacity of the per-client query buffer.
const IO_BUF: usize = 16 * 1024;

/// One client connection: the socket, the growable query buffer bytes are
/// read into, and the framing state for partially-received requests.
pub struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
    parser: RequestParser,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Connection {
        Connection {
            stream,
            buffer: BytesMut::with_capacity(IO_BUF),
            parser: RequestParser::new(),
        }
    }

    /// Next complete argument vector, reading from the socket as needed.
    ///
    /// `Ok(None)` is a clean disconnect. Protocol violations (oversized or
    /// malformed frames) and mid-frame disconnects surface as errors; the
    /// caller drops the connection.
    pub async fn read_command(&mut self) -> crate::Result<Option<Vec<Bytes>>> {
        loop {
            if let Some(args) = self.parser.parse(&mut self.buffer)? {
                return Ok(Some(args));
            }
            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err("connection reset by peer".into());
            }
        }
    }

    pub async fn write_frame(&mut self, frame: &Frame) -> crate::Result<()> {
        self.stream.write_all(&frame.serialize()).await?;
        Ok(())
    }
}
