use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::WRONGTYPE;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// 1-based position of a member under the `(score, member)` ordering.
/// Missing member or key is a null bulk.
#[derive(Debug, PartialEq)]
pub struct ZRank {
    pub key: Bytes,
    pub member: Bytes,
}

impl Executable for ZRank {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        let reply = match state.get_mut(&self.key) {
            Some(Value::ZSet(zset)) => match zset.rank(&self.member) {
                Some(rank) => Frame::Integer(rank as i64),
                None => Frame::Null,
            },
            Some(_) => Frame::Error(WRONGTYPE.to_string()),
            None => Frame::Null,
        };
        Ok(Outcome::read(reply))
    }
}

impl TryFrom<&mut CommandParser> for ZRank {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let member = parser.next_bytes()?;
        Ok(Self { key, member })
    }
}
