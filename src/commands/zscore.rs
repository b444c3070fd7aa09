use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{format_f64, WRONGTYPE};
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Score of a member, rendered as a bulk string; missing member or key is
/// a null bulk.
///
/// Ref: <https://redis.io/docs/latest/commands/zscore/>
#[derive(Debug, PartialEq)]
pub struct ZScore {
    pub key: Bytes,
    pub member: Bytes,
}

impl Executable for ZScore {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        let reply = match state.get_mut(&self.key) {
            Some(Value::ZSet(zset)) => match zset.score(&self.member) {
                Some(score) => Frame::Bulk(Bytes::from(format_f64(score))),
                None => Frame::Null,
            },
            Some(_) => Frame::Error(WRONGTYPE.to_string()),
            None => Frame::Null,
        };
        Ok(Outcome::read(reply))
    }
}

impl TryFrom<&mut CommandParser> for ZScore {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let member = parser.next_bytes()?;
        Ok(Self { key, member })
    }
}
