use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{parse_i64, NOT_INTEGER, WRONGTYPE};
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Overwrite the element at a signed index.
///
/// Ref: <https://redis.io/docs/latest/commands/lset/>
#[derive(Debug, PartialEq)]
pub struct LSet {
    pub key: Bytes,
    pub index: Bytes,
    pub value: Bytes,
}

impl Executable for LSet {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let Some(index) = parse_i64(&self.index) else {
            return Ok(Outcome::read(Frame::Error(NOT_INTEGER.to_string())));
        };
        let mut state = server.db.lock();
        match state.get_mut(&self.key) {
            Some(Value::List(list)) => match list.set(index, self.value) {
                Ok(()) => Ok(Outcome::wrote(Frame::Simple("OK".to_string()))),
                Err(_) => Ok(Outcome::read(Frame::Error(
                    "ERR index out of range".to_string(),
                ))),
            },
            Some(_) => Ok(Outcome::read(Frame::Error(WRONGTYPE.to_string()))),
            None => Ok(Outcome::read(Frame::Error("ERR no such key".to_string()))),
        }
    }
}

impl TryFrom<&mut CommandParser> for LSet {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let index = parser.next_bytes()?;
        let value = parser.next_bytes()?;
        Ok(Self { key, index, value })
    }
}
