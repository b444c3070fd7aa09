use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::WRONGTYPE;
use crate::data::bitmap::BitOp;
use crate::data::Bitmap;
use crate::db::{DbInner, Value};
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Combine two bitmaps with AND, OR, or XOR and reply with the resulting
/// byte string. Missing keys act as empty bitmaps.
#[derive(Debug, PartialEq)]
pub struct BitOpCmd {
    pub op: Bytes,
    pub first: Bytes,
    pub second: Bytes,
}

fn two_bitmaps<'a>(
    state: &'a mut DbInner,
    first: &[u8],
    second: &[u8],
) -> Result<(Option<&'a Bitmap>, Option<&'a Bitmap>), Frame> {
    state.get(first);
    state.get(second);
    let a = match state.peek(first) {
        Some(Value::Bitmap(bitmap)) => Some(bitmap),
        Some(_) => return Err(Frame::Error(WRONGTYPE.to_string())),
        None => None,
    };
    let b = match state.peek(second) {
        Some(Value::Bitmap(bitmap)) => Some(bitmap),
        Some(_) => return Err(Frame::Error(WRONGTYPE.to_string())),
        None => None,
    };
    Ok((a, b))
}

impl Executable for BitOpCmd {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let Some(op) = BitOp::from_name(&self.op) else {
            return Ok(Outcome::read(Frame::Error("ERR syntax error".to_string())));
        };
        let empty = Bitmap::new();
        let mut state = server.db.lock();
        let result = match two_bitmaps(&mut state, &self.first, &self.second) {
            Ok((a, b)) => a.unwrap_or(&empty).bit_op(b.unwrap_or(&empty), op),
            Err(reply) => return Ok(Outcome::read(reply)),
        };
        Ok(Outcome::read(Frame::Bulk(Bytes::from(result))))
    }
}

impl TryFrom<&mut CommandParser> for BitOpCmd {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let op = parser.next_bytes()?;
        let first = parser.next_bytes()?;
        let second = parser.next_bytes()?;
        Ok(Self { op, first, second })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::Server;

    fn seed_bitmap(server: &Server, key: &str, bytes: Vec<u8>) {
        server.db.lock().set(
            Bytes::copy_from_slice(key.as_bytes()),
            Value::Bitmap(Bitmap::from_bytes(bytes)),
        );
    }

    #[tokio::test]
    async fn combines_bitmaps() {
        let server = Server::for_tests();
        seed_bitmap(&server, "a", vec![0b1100_0000]);
        seed_bitmap(&server, "b", vec![0b0110_0000]);

        let cmd = BitOpCmd {
            op: Bytes::from("AND"),
            first: Bytes::from("a"),
            second: Bytes::from("b"),
        };
        assert_eq!(
            cmd.exec(server.clone()).unwrap().reply,
            Frame::Bulk(Bytes::from(vec![0b0100_0000]))
        );

        let cmd = BitOpCmd {
            op: Bytes::from("xor"),
            first: Bytes::from("a"),
            second: Bytes::from("b"),
        };
        assert_eq!(
            cmd.exec(server).unwrap().reply,
            Frame::Bulk(Bytes::from(vec![0b1010_0000]))
        );
    }

    #[tokio::test]
    async fn unknown_operator_is_a_syntax_error() {
        let server = Server::for_tests();
        let cmd = BitOpCmd {
            op: Bytes::from("nand"),
            first: Bytes::from("a"),
            second: Bytes::from("b"),
        };
        assert_eq!(
            cmd.exec(server).unwrap().reply,
            Frame::Error("ERR syntax error".to_string())
        );
    }
}
