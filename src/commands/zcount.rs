use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{parse_f64, NOT_FLOAT, WRONGTYPE};
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// How many members have `low <= score <= high`.
///
/// Ref: <https://redis.io/docs/latest/commands/zcount/>
#[derive(Debug, PartialEq)]
pub struct ZCount {
    pub key: Bytes,
    pub low: Bytes,
    pub high: Bytes,
}

impl Executable for ZCount {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let (Some(low), Some(high)) = (parse_f64(&self.low), parse_f64(&self.high)) else {
            return Ok(Outcome::read(Frame::Error(NOT_FLOAT.to_string())));
        };
        let mut state = server.db.lock();
        let reply = match state.get(&self.key) {
            Some(Value::ZSet(zset)) => Frame::Integer(zset.count_in_range(low, high) as i64),
            Some(_) => Frame::Error(WRONGTYPE.to_string()),
            None => Frame::Integer(0),
        };
        Ok(Outcome::read(reply))
    }
}

impl TryFrom<&mut CommandParser> for ZCount {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let low = parser.next_bytes()?;
        let high = parser.next_bytes()?;
        Ok(Self { key, low, high })
    }
}
