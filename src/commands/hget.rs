use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::WRONGTYPE;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Value of a hash field; missing key or field is a null bulk.
///
/// Ref: <https://redis.io/docs/latest/commands/hget/>
#[derive(Debug, PartialEq)]
pub struct HGet {
    pub key: Bytes,
    pub field: Bytes,
}

impl Executable for HGet {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        let reply = match state.get_mut(&self.key) {
            Some(Value::Hash(hash)) => match hash.get(&self.field) {
                Some(value) => Frame::Bulk(value.clone()),
                None => Frame::Null,
            },
            Some(_) => Frame::Error(WRONGTYPE.to_string()),
            None => Frame::Null,
        };
        Ok(Outcome::read(reply))
    }
}

impl TryFrom<&mut CommandParser> for HGet {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let field = parser.next_bytes()?;
        Ok(Self { key, field })
    }
}
