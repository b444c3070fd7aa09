use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::arity_error;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Count how many of the named keys exist. Expired keys do not count.
///
/// Ref: <https://redis.io/docs/latest/commands/exists/>
#[derive(Debug, PartialEq)]
pub struct Exists {
    pub keys: Vec<Bytes>,
}

impl Executable for Exists {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        if self.keys.is_empty() {
            return Ok(Outcome::read(arity_error("exists")));
        }
        let mut state = server.db.lock();
        let count = self
            .keys
            .iter()
            .filter(|key| state.get(key).is_some())
            .count();
        Ok(Outcome::read(Frame::Integer(count as i64)))
    }
}

impl TryFrom<&mut CommandParser> for Exists {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self {
            keys: parser.remaining(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Value;
    use crate::server::Server;

    #[tokio::test]
    async fn counts_repeats() {
        let server = Server::for_tests();
        server
            .db
            .lock()
            .set(Bytes::from("a"), Value::Str(Bytes::from("1")));

        let cmd = Exists {
            keys: vec![Bytes::from("a"), Bytes::from("a"), Bytes::from("nope")],
        };
        let outcome = cmd.exec(server).unwrap();
        assert_eq!(outcome, Outcome::read(Frame::Integer(2)));
    }
}
