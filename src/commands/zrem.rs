use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{arity_error, WRONGTYPE};
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Remove one or more members from a sorted set, replying with how many
/// were present.
///
/// Ref: <https://redis.io/docs/latest/commands/zrem/>
#[derive(Debug, PartialEq)]
pub struct ZRem {
    pub key: Bytes,
    pub members: Vec<Bytes>,
}

impl Executable for ZRem {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        if self.members.is_empty() {
            return Ok(Outcome::read(arity_error("zrem")));
        }
        let mut state = server.db.lock();
        match state.get_mut(&self.key) {
            Some(Value::ZSet(zset)) => {
                let mut removed = 0;
                for member in &self.members {
                    if zset.remove(member) {
                        removed += 1;
                    }
                }
                let reply = Frame::Integer(removed);
                if removed > 0 {
                    Ok(Outcome::wrote(reply))
                } else {
                    Ok(Outcome::read(reply))
                }
            }
            Some(_) => Ok(Outcome::read(Frame::Error(WRONGTYPE.to_string()))),
            None => Ok(Outcome::read(Frame::Integer(0))),
        }
    }
}

impl TryFrom<&mut CommandParser> for ZRem {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let members = parser.remaining();
        Ok(Self { key, members })
    }
}
