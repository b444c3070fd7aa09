use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::WRONGTYPE;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Remove and return the head of a list. Missing key or empty list is a
/// null bulk.
///
/// Ref: <https://redis.io/docs/latest/commands/lpop/>
#[derive(Debug, PartialEq)]
pub struct LPop {
    pub key: Bytes,
}

impl Executable for LPop {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        match state.get_mut(&self.key) {
            Some(Value::List(list)) => match list.lpop() {
                Some(value) => Ok(Outcome::wrote(Frame::Bulk(value))),
                None => Ok(Outcome::read(Frame::Null)),
            },
            Some(_) => Ok(Outcome::read(Frame::Error(WRONGTYPE.to_string()))),
            None => Ok(Outcome::read(Frame::Null)),
        }
    }
}

impl TryFrom<&mut CommandParser> for LPop {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::List;
    use crate::server::Server;

    #[tokio::test]
    async fn pops_the_head() {
        let server = Server::for_tests();
        {
            let mut list = List::new();
            list.rpush(Bytes::from("a"));
            list.rpush(Bytes::from("b"));
            server.db.lock().set(Bytes::from("l"), Value::List(list));
        }

        let cmd = LPop {
            key: Bytes::from("l"),
        };
        let outcome = cmd.exec(server).unwrap();
        assert_eq!(outcome, Outcome::wrote(Frame::Bulk(Bytes::from("a"))));
    }

    #[tokio::test]
    async fn missing_key_is_null() {
        let server = Server::for_tests();
        let cmd = LPop {
            key: Bytes::from("l"),
        };
        assert_eq!(cmd.exec(server).unwrap(), Outcome::read(Frame::Null));
    }
}
