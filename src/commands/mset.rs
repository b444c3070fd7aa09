use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::arity_error;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Set several keys in one command.
///
/// Ref: <https://redis.io/docs/latest/commands/mset/>
#[derive(Debug, PartialEq)]
pub struct MSet {
    pub pairs: Vec<Bytes>,
}

impl Executable for MSet {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        if self.pairs.is_empty() || self.pairs.len() % 2 != 0 {
            return Ok(Outcome::read(arity_error("mset")));
        }
        let mut state = server.db.lock();
        for pair in self.pairs.chunks_exact(2) {
            state.set(pair[0].clone(), Value::Str(pair[1].clone()));
        }
        Ok(Outcome::wrote(Frame::Simple("OK".to_string())))
    }
}

impl TryFrom<&mut CommandParser> for MSet {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self {
            pairs: parser.remaining(),
        })
    }
}
