use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{parse_i64, NOT_INTEGER, WRONGTYPE};
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Element at a signed index; out of range (or a missing key) is a null
/// bulk.
///
/// Ref: <https://redis.io/docs/latest/commands/lindex/>
#[derive(Debug, PartialEq)]
pub struct LIndex {
    pub key: Bytes,
    pub index: Bytes,
}

impl Executable for LIndex {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let Some(index) = parse_i64(&self.index) else {
            return Ok(Outcome::read(Frame::Error(NOT_INTEGER.to_string())));
        };
        let mut state = server.db.lock();
        let reply = match state.get(&self.key) {
            Some(Value::List(list)) => match list.index(index) {
                Some(value) => Frame::Bulk(value.clone()),
                None => Frame::Null,
            },
            Some(_) => Frame::Error(WRONGTYPE.to_string()),
            None => Frame::Null,
        };
        Ok(Outcome::read(reply))
    }
}

impl TryFrom<&mut CommandParser> for LIndex {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let index = parser.next_bytes()?;
        Ok(Self { key, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::List;
    use crate::server::Server;

    #[tokio::test]
    async fn indexes_from_both_ends() {
        let server = Server::for_tests();
        {
            let mut list = List::new();
            for v in ["a", "b", "c"] {
                list.rpush(Bytes::from(v));
            }
            server.db.lock().set(Bytes::from("l"), Value::List(list));
        }

        for (index, expected) in [
            ("0", Frame::Bulk(Bytes::from("a"))),
            ("-1", Frame::Bulk(Bytes::from("c"))),
            ("5", Frame::Null),
        ] {
            let cmd = LIndex {
                key: Bytes::from("l"),
                index: Bytes::from(index),
            };
            assert_eq!(cmd.exec(server.clone()).unwrap().reply, expected);
        }
    }
}
