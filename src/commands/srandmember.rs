use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::WRONGTYPE;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// A random member, without removing it.
///
/// Ref: <https://redis.io/docs/latest/commands/srandmember/>
#[derive(Debug, PartialEq)]
pub struct SRandMember {
    pub key: Bytes,
}

impl Executable for SRandMember {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        let reply = match state.get_mut(&self.key) {
            Some(Value::Set(set)) => match set.random_member() {
                Some(member) => Frame::Bulk(member),
                None => Frame::Null,
            },
            Some(_) => Frame::Error(WRONGTYPE.to_string()),
            None => Frame::Null,
        };
        Ok(Outcome::read(reply))
    }
}

impl TryFrom<&mut CommandParser> for SRandMember {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
