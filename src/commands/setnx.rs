use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Set a key only when it does not already hold a value. Replies `:1` when
/// the value was installed, `:0` when the key was taken.
///
/// Ref: <https://redis.io/docs/latest/commands/setnx/>
#[derive(Debug, PartialEq)]
pub struct SetNx {
    pub key: Bytes,
    pub value: Bytes,
}

impl Executable for SetNx {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        if state.set_if_absent(self.key, Value::Str(self.value)) {
            Ok(Outcome::wrote(Frame::Integer(1)))
        } else {
            Ok(Outcome::read(Frame::Integer(0)))
        }
    }
}

impl TryFrom<&mut CommandParser> for SetNx {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let value = parser.next_bytes()?;
        Ok(Self { key, value })
    }
}
