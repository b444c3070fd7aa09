use tracing::error;

use crate::commands::executable::{Executable, Outcome};
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Synchronously snapshot the whole keyspace to the RDB file.
///
/// Ref: <https://redis.io/docs/latest/commands/save/>
#[derive(Debug, PartialEq)]
pub struct Save;

impl Executable for Save {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        if server.rdb.is_saving() {
            return Ok(Outcome::read(Frame::Error(
                "ERR Background save already in progress".to_string(),
            )));
        }
        match server.rdb.save(&server.db) {
            Ok(()) => Ok(Outcome::read(Frame::Simple("OK".to_string()))),
            Err(err) => {
                error!(%err, "rdb save failed");
                Ok(Outcome::read(Frame::Error(
                    "ERR Failed to save rdb file".to_string(),
                )))
            }
        }
    }
}

impl TryFrom<&mut CommandParser> for Save {
    type Error = Error;

    fn try_from(_parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}
