use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::WRONGTYPE;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Remove the first occurrence of a value from a list. Replies with the
/// number of removed elements (0 or 1).
#[derive(Debug, PartialEq)]
pub struct LRem {
    pub key: Bytes,
    pub value: Bytes,
}

impl Executable for LRem {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        match state.get_mut(&self.key) {
            Some(Value::List(list)) => {
                if list.remove_first(&self.value) {
                    Ok(Outcome::wrote(Frame::Integer(1)))
                } else {
                    Ok(Outcome::read(Frame::Integer(0)))
                }
            }
            Some(_) => Ok(Outcome::read(Frame::Error(WRONGTYPE.to_string()))),
            None => Ok(Outcome::read(Frame::Integer(0))),
        }
    }
}

impl TryFrom<&mut CommandParser> for LRem {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let value = parser.next_bytes()?;
        Ok(Self { key, value })
    }
}
