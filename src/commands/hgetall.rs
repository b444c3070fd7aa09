use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::WRONGTYPE;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Every field and value of a hash, interleaved. Iteration order is
/// whatever the backing table yields.
///
/// Ref: <https://redis.io/docs/latest/commands/hgetall/>
#[derive(Debug, PartialEq)]
pub struct HGetAll {
    pub key: Bytes,
}

impl Executable for HGetAll {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        let reply = match state.get(&self.key) {
            Some(Value::Hash(hash)) => {
                let mut items = Vec::with_capacity(hash.len() * 2);
                for (field, value) in hash.iter() {
                    items.push(Frame::Bulk(field.clone()));
                    items.push(Frame::Bulk(value.clone()));
                }
                Frame::Array(items)
            }
            Some(_) => Frame::Error(WRONGTYPE.to_string()),
            None => Frame::Array(Vec::new()),
        };
        Ok(Outcome::read(reply))
    }
}

impl TryFrom<&mut CommandParser> for HGetAll {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
