use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::WRONGTYPE;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Cardinality of a sorted set.
///
/// Ref: <https://redis.io/docs/latest/commands/zcard/>
#[derive(Debug, PartialEq)]
pub struct ZCard {
    pub key: Bytes,
}

impl Executable for ZCard {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        let reply = match state.get(&self.key) {
            Some(Value::ZSet(zset)) => Frame::Integer(zset.len() as i64),
            Some(_) => Frame::Error(WRONGTYPE.to_string()),
            None => Frame::Integer(0),
        };
        Ok(Outcome::read(reply))
    }
}

impl TryFrom<&mut CommandParser> for ZCard {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
