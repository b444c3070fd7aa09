use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::WRONGTYPE;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Whether a hash field exists: `:1` or `:0`.
///
/// Ref: <https://redis.io/docs/latest/commands/hexists/>
#[derive(Debug, PartialEq)]
pub struct HExists {
    pub key: Bytes,
    pub field: Bytes,
}

impl Executable for HExists {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        let reply = match state.get_mut(&self.key) {
            Some(Value::Hash(hash)) => Frame::Integer(i64::from(hash.contains(&self.field))),
            Some(_) => Frame::Error(WRONGTYPE.to_string()),
            None => Frame::Integer(0),
        };
        Ok(Outcome::read(reply))
    }
}

impl TryFrom<&mut CommandParser> for HExists {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let field = parser.next_bytes()?;
        Ok(Self { key, field })
    }
}
