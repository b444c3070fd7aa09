use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::setbit::parse_offset;
use crate::commands::{BIT_OFFSET, WRONGTYPE};
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Read a single bit; offsets past the end (and missing keys) read as 0.
///
/// Ref: <https://redis.io/docs/latest/commands/getbit/>
#[derive(Debug, PartialEq)]
pub struct GetBit {
    pub key: Bytes,
    pub offset: Bytes,
}

impl Executable for GetBit {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let Some(offset) = parse_offset(&self.offset) else {
            return Ok(Outcome::read(Frame::Error(BIT_OFFSET.to_string())));
        };
        let mut state = server.db.lock();
        let reply = match state.get(&self.key) {
            Some(Value::Bitmap(bitmap)) => Frame::Integer(i64::from(bitmap.get_bit(offset))),
            Some(_) => Frame::Error(WRONGTYPE.to_string()),
            None => Frame::Integer(0),
        };
        Ok(Outcome::read(reply))
    }
}

impl TryFrom<&mut CommandParser> for GetBit {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let offset = parser.next_bytes()?;
        Ok(Self { key, offset })
    }
}
