use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::WRONGTYPE;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Remove and return the tail of a list.
///
/// Ref: <https://redis.io/docs/latest/commands/rpop/>
#[derive(Debug, PartialEq)]
pub struct RPop {
    pub key: Bytes,
}

impl Executable for RPop {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        match state.get_mut(&self.key) {
            Some(Value::List(list)) => match list.rpop() {
                Some(value) => Ok(Outcome::wrote(Frame::Bulk(value))),
                None => Ok(Outcome::read(Frame::Null)),
            },
            Some(_) => Ok(Outcome::read(Frame::Error(WRONGTYPE.to_string()))),
            None => Ok(Outcome::read(Frame::Null)),
        }
    }
}

impl TryFrom<&mut CommandParser> for RPop {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
