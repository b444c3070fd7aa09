use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::WRONGTYPE;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Population count of a bitmap.
///
/// Ref: <https://redis.io/docs/latest/commands/bitcount/>
#[derive(Debug, PartialEq)]
pub struct BitCount {
    pub key: Bytes,
}

impl Executable for BitCount {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        let reply = match state.get(&self.key) {
            Some(Value::Bitmap(bitmap)) => Frame::Integer(bitmap.bit_count() as i64),
            Some(_) => Frame::Error(WRONGTYPE.to_string()),
            None => Frame::Integer(0),
        };
        Ok(Outcome::read(reply))
    }
}

impl TryFrom<&mut CommandParser> for BitCount {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
