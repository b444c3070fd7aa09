use tracing::error;

use crate::commands::executable::{Executable, Outcome};
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Snapshot the keyspace without stalling other clients: the encode happens
/// on the loop (race-free, since no command can interleave) and the file
/// write goes to a background thread.
///
/// Ref: <https://redis.io/docs/latest/commands/bgsave/>
#[derive(Debug, PartialEq)]
pub struct BgSave;

impl Executable for BgSave {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        if server.rdb.is_saving() {
            return Ok(Outcome::read(Frame::Error(
                "ERR Background save already in progress".to_string(),
            )));
        }
        match server.rdb.bg_save(&server.db) {
            Ok(()) => Ok(Outcome::read(Frame::Simple(
                "Background saving started".to_string(),
            ))),
            Err(err) => {
                error!(%err, "rdb background save failed");
                Ok(Outcome::read(Frame::Error(
                    "ERR Failed to save rdb file".to_string(),
                )))
            }
        }
    }
}

impl TryFrom<&mut CommandParser> for BgSave {
    type Error = Error;

    fn try_from(_parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}
