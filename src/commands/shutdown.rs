use crate::commands::executable::{Executable, Outcome};
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Stops the server. The accept loop drains, the AOF buffer is flushed and
/// the process exits cleanly.
#[derive(Debug, PartialEq)]
pub struct Shutdown;

impl Executable for Shutdown {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        server.request_shutdown();
        Ok(Outcome::read(Frame::Simple("OK".to_string())))
    }
}

impl TryFrom<&mut CommandParser> for Shutdown {
    type Error = Error;

    fn try_from(_parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}
