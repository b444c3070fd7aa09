use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{parse_i64, NOT_INTEGER, WRONGTYPE};
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Members between two rank positions (0-based, inclusive, negatives from
/// the tail), in `(score, member)` order.
///
/// Ref: <https://redis.io/docs/latest/commands/zrange/>
#[derive(Debug, PartialEq)]
pub struct ZRange {
    pub key: Bytes,
    pub start: Bytes,
    pub stop: Bytes,
}

impl Executable for ZRange {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let (Some(start), Some(stop)) = (parse_i64(&self.start), parse_i64(&self.stop)) else {
            return Ok(Outcome::read(Frame::Error(NOT_INTEGER.to_string())));
        };
        let mut state = server.db.lock();
        let reply = match state.get(&self.key) {
            Some(Value::ZSet(zset)) => {
                let len = zset.len() as i64;
                let mut start = if start < 0 { len + start } else { start };
                let mut stop = if stop < 0 { len + stop } else { stop };
                start = start.max(0);
                stop = stop.min(len - 1);
                if start > stop || len == 0 {
                    Frame::Array(Vec::new())
                } else {
                    Frame::Array(
                        zset.iter()
                            .skip(start as usize)
                            .take((stop - start + 1) as usize)
                            .map(|(member, _)| Frame::Bulk(member.clone()))
                            .collect(),
                    )
                }
            }
            Some(_) => Frame::Error(WRONGTYPE.to_string()),
            None => Frame::Array(Vec::new()),
        };
        Ok(Outcome::read(reply))
    }
}

impl TryFrom<&mut CommandParser> for ZRange {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let start = parser.next_bytes()?;
        let stop = parser.next_bytes()?;
        Ok(Self { key, start, stop })
    }
}
