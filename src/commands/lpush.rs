use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{arity_error, WRONGTYPE};
use crate::data::List;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Prepend one or more values to a list, creating it when missing.
/// Replies with the list length after the pushes.
///
/// Ref: <https://redis.io/docs/latest/commands/lpush/>
#[derive(Debug, PartialEq)]
pub struct LPush {
    pub key: Bytes,
    pub values: Vec<Bytes>,
}

impl Executable for LPush {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        if self.values.is_empty() {
            return Ok(Outcome::read(arity_error("lpush")));
        }
        let mut state = server.db.lock();
        match state.get_mut(&self.key) {
            Some(Value::List(list)) => {
                for value in self.values {
                    list.lpush(value);
                }
                Ok(Outcome::wrote(Frame::Integer(list.len() as i64)))
            }
            Some(_) => Ok(Outcome::read(Frame::Error(WRONGTYPE.to_string()))),
            None => {
                let mut list = List::new();
                for value in self.values {
                    list.lpush(value);
                }
                let len = list.len() as i64;
                state.set(self.key, Value::List(list));
                Ok(Outcome::wrote(Frame::Integer(len)))
            }
        }
    }
}

impl TryFrom<&mut CommandParser> for LPush {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let values = parser.remaining();
        Ok(Self { key, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::Server;

    #[tokio::test]
    async fn pushes_to_the_head() {
        let server = Server::for_tests();
        let cmd = LPush {
            key: Bytes::from("mylist"),
            values: vec![Bytes::from("a")],
        };
        assert_eq!(
            cmd.exec(server.clone()).unwrap(),
            Outcome::wrote(Frame::Integer(1))
        );

        let cmd = LPush {
            key: Bytes::from("mylist"),
            values: vec![Bytes::from("b")],
        };
        assert_eq!(
            cmd.exec(server.clone()).unwrap(),
            Outcome::wrote(Frame::Integer(2))
        );

        let mut state = server.db.lock();
        let Some(Value::List(list)) = state.get_mut(b"mylist") else {
            panic!("expected a list");
        };
        let items: Vec<&Bytes> = list.iter().collect();
        assert_eq!(items, vec![&Bytes::from("b"), &Bytes::from("a")]);
    }

    #[tokio::test]
    async fn wrong_type_is_rejected() {
        let server = Server::for_tests();
        server
            .db
            .lock()
            .set(Bytes::from("s"), Value::Str(Bytes::from("v")));

        let cmd = LPush {
            key: Bytes::from("s"),
            values: vec![Bytes::from("a")],
        };
        let outcome = cmd.exec(server).unwrap();
        assert_eq!(outcome, Outcome::read(Frame::Error(WRONGTYPE.to_string())));
    }
}
