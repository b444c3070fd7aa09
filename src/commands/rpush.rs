use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{arity_error, WRONGTYPE};
use crate::data::List;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Append one or more values to a list, creating it when missing.
///
/// Ref: <https://redis.io/docs/latest/commands/rpush/>
#[derive(Debug, PartialEq)]
pub struct RPush {
    pub key: Bytes,
    pub values: Vec<Bytes>,
}

impl Executable for RPush {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        if self.values.is_empty() {
            return Ok(Outcome::read(arity_error("rpush")));
        }
        let mut state = server.db.lock();
        match state.get_mut(&self.key) {
            Some(Value::List(list)) => {
                for value in self.values {
                    list.rpush(value);
                }
                Ok(Outcome::wrote(Frame::Integer(list.len() as i64)))
            }
            Some(_) => Ok(Outcome::read(Frame::Error(WRONGTYPE.to_string()))),
            None => {
                let mut list = List::new();
                for value in self.values {
                    list.rpush(value);
                }
                let len = list.len() as i64;
                state.set(self.key, Value::List(list));
                Ok(Outcome::wrote(Frame::Integer(len)))
            }
        }
    }
}

impl TryFrom<&mut CommandParser> for RPush {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let values = parser.remaining();
        Ok(Self { key, values })
    }
}
