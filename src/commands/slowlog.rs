use crate::commands::executable::{Executable, Outcome};
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Inspect or reset the slow log. Subcommands: GET, LEN, RESET.
///
/// Ref: <https://redis.io/docs/latest/commands/slowlog/>
#[derive(Debug, PartialEq)]
pub struct SlowLogCmd {
    pub subcommand: String,
}

impl Executable for SlowLogCmd {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        let reply = match self.subcommand.to_ascii_lowercase().as_str() {
            // Array of entries, newest first; each entry is
            // [id, start-time, duration, argv].
            "get" => Frame::Array(
                state
                    .slowlog
                    .iter()
                    .map(|entry| {
                        Frame::Array(vec![
                            Frame::Integer(entry.id),
                            Frame::Integer(entry.time),
                            Frame::Integer(entry.duration),
                            Frame::Array(
                                entry.args.iter().cloned().map(Frame::Bulk).collect(),
                            ),
                        ])
                    })
                    .collect(),
            ),
            "len" => Frame::Integer(state.slowlog.len() as i64),
            "reset" => {
                state.slowlog.reset();
                Frame::Simple("OK".to_string())
            }
            other => Frame::Error(format!("ERR unknown subcommand '{}'", other)),
        };
        Ok(Outcome::read(reply))
    }
}

impl TryFrom<&mut CommandParser> for SlowLogCmd {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let subcommand = parser.next_string()?;
        Ok(Self { subcommand })
    }
}
