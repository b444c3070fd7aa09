use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{parse_i64, NOT_INTEGER, WRONGTYPE};
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Inclusive slice of a list between two signed endpoints.
///
/// Ref: <https://redis.io/docs/latest/commands/lrange/>
#[derive(Debug, PartialEq)]
pub struct LRange {
    pub key: Bytes,
    pub left: Bytes,
    pub right: Bytes,
}

impl Executable for LRange {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let (Some(left), Some(right)) = (parse_i64(&self.left), parse_i64(&self.right)) else {
            return Ok(Outcome::read(Frame::Error(NOT_INTEGER.to_string())));
        };
        let mut state = server.db.lock();
        let reply = match state.get(&self.key) {
            Some(Value::List(list)) => Frame::Array(
                list.range(left, right)
                    .map(|value| Frame::Bulk(value.clone()))
                    .collect(),
            ),
            Some(_) => Frame::Error(WRONGTYPE.to_string()),
            None => Frame::Array(Vec::new()),
        };
        Ok(Outcome::read(reply))
    }
}

impl TryFrom<&mut CommandParser> for LRange {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let left = parser.next_bytes()?;
        let right = parser.next_bytes()?;
        Ok(Self { key, left, right })
    }
}
