use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::setbit::parse_bit;
use crate::commands::{BIT_VALUE, WRONGTYPE};
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Offset of the first bit equal to the target. A missing key behaves as
/// an all-zero bitmap: `:0` when searching for 0, `:-1` when searching for
/// 1. No match is `:-1`.
///
/// Ref: <https://redis.io/docs/latest/commands/bitpos/>
#[derive(Debug, PartialEq)]
pub struct BitPos {
    pub key: Bytes,
    pub target: Bytes,
}

impl Executable for BitPos {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let Some(target) = parse_bit(&self.target) else {
            return Ok(Outcome::read(Frame::Error(BIT_VALUE.to_string())));
        };
        let mut state = server.db.lock();
        let reply = match state.get(&self.key) {
            Some(Value::Bitmap(bitmap)) => match bitmap.bit_pos(target) {
                Some(offset) => Frame::Integer(offset as i64),
                None => Frame::Integer(-1),
            },
            Some(_) => Frame::Error(WRONGTYPE.to_string()),
            None => {
                if target {
                    Frame::Integer(-1)
                } else {
                    Frame::Integer(0)
                }
            }
        };
        Ok(Outcome::read(reply))
    }
}

impl TryFrom<&mut CommandParser> for BitPos {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let target = parser.next_bytes()?;
        Ok(Self { key, target })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Bitmap;
    use crate::server::Server;

    #[tokio::test]
    async fn finds_first_set_bit() {
        let server = Server::for_tests();
        {
            let mut bitmap = Bitmap::new();
            bitmap.set_bit(13, true);
            server.db.lock().set(Bytes::from("bm"), Value::Bitmap(bitmap));
        }

        let cmd = BitPos {
            key: Bytes::from("bm"),
            target: Bytes::from("1"),
        };
        assert_eq!(cmd.exec(server).unwrap().reply, Frame::Integer(13));
    }

    #[tokio::test]
    async fn missing_key_depends_on_target() {
        let server = Server::for_tests();
        let cmd = BitPos {
            key: Bytes::from("bm"),
            target: Bytes::from("0"),
        };
        assert_eq!(cmd.exec(server.clone()).unwrap().reply, Frame::Integer(0));

        let cmd = BitPos {
            key: Bytes::from("bm"),
            target: Bytes::from("1"),
        };
        assert_eq!(cmd.exec(server).unwrap().reply, Frame::Integer(-1));
    }
}
