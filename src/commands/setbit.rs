use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{parse_i64, BIT_OFFSET, BIT_VALUE, WRONGTYPE};
use crate::data::Bitmap;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Set a single bit and reply with its previous value. The bitmap grows as
/// needed.
///
/// Ref: <https://redis.io/docs/latest/commands/setbit/>
#[derive(Debug, PartialEq)]
pub struct SetBit {
    pub key: Bytes,
    pub offset: Bytes,
    pub value: Bytes,
}

pub(crate) fn parse_offset(bytes: &[u8]) -> Option<u64> {
    match parse_i64(bytes) {
        Some(offset) if offset >= 0 => Some(offset as u64),
        _ => None,
    }
}

pub(crate) fn parse_bit(bytes: &[u8]) -> Option<bool> {
    match bytes {
        b"0" => Some(false),
        b"1" => Some(true),
        _ => None,
    }
}

impl Executable for SetBit {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let Some(offset) = parse_offset(&self.offset) else {
            return Ok(Outcome::read(Frame::Error(BIT_OFFSET.to_string())));
        };
        let Some(value) = parse_bit(&self.value) else {
            return Ok(Outcome::read(Frame::Error(BIT_VALUE.to_string())));
        };
        let mut state = server.db.lock();
        match state.get_mut(&self.key) {
            Some(Value::Bitmap(bitmap)) => {
                let previous = bitmap.set_bit(offset, value);
                Ok(Outcome::wrote(Frame::Integer(i64::from(previous))))
            }
            Some(_) => Ok(Outcome::read(Frame::Error(WRONGTYPE.to_string()))),
            None => {
                let mut bitmap = Bitmap::new();
                let previous = bitmap.set_bit(offset, value);
                state.set(self.key, Value::Bitmap(bitmap));
                Ok(Outcome::wrote(Frame::Integer(i64::from(previous))))
            }
        }
    }
}

impl TryFrom<&mut CommandParser> for SetBit {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let offset = parser.next_bytes()?;
        let value = parser.next_bytes()?;
        Ok(Self { key, offset, value })
    }
}
