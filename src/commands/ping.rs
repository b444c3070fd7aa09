use crate::commands::executable::{Executable, Outcome};
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Returns PONG. Mostly useful to test whether a connection is still alive.
///
/// Ref: <https://redis.io/docs/latest/commands/ping/>
#[derive(Debug, PartialEq)]
pub struct Ping;

impl Executable for Ping {
    fn exec(self, _server: Server) -> Result<Outcome, Error> {
        Ok(Outcome::read(Frame::Simple("PONG".to_string())))
    }
}

impl TryFrom<&mut CommandParser> for Ping {
    type Error = Error;

    fn try_from(_parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}
