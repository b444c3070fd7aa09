use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{arity_error, WRONGTYPE};
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Delete one or more hash fields, replying with how many existed.
///
/// Ref: <https://redis.io/docs/latest/commands/hdel/>
#[derive(Debug, PartialEq)]
pub struct HDel {
    pub key: Bytes,
    pub fields: Vec<Bytes>,
}

impl Executable for HDel {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        if self.fields.is_empty() {
            return Ok(Outcome::read(arity_error("hdel")));
        }
        let mut state = server.db.lock();
        match state.get_mut(&self.key) {
            Some(Value::Hash(hash)) => {
                let mut removed = 0;
                for field in &self.fields {
                    if hash.remove(field).is_some() {
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

impl TryFrom<&mut CommandParser> for HDel {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let fields = parser.remaining();
        Ok(Self { key, fields })
    }
}
