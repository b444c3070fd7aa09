use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::arity_error;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Remove one or more keys, replying with how many existed.
///
/// Ref: <https://redis.io/docs/latest/commands/del/>
#[derive(Debug, PartialEq)]
pub struct Del {
    pub keys: Vec<Bytes>,
}

impl Executable for Del {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        if self.keys.is_empty() {
            return Ok(Outcome::read(arity_error("del")));
        }
        let mut state = server.db.lock();
        let mut removed = 0;
        for key in &self.keys {
            if state.remove(key) {
                removed += 1;
            }
        }
        let reply = Frame::Integer(removed);
        if removed > 0 {
            Ok(Outcome::wrote(reply))
        } else {
            Ok(Outcome::read(reply))
        }
    }
}

impl TryFrom<&mut CommandParser> for Del {
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
    async fn counts_only_existing_keys() {
        let server = Server::for_tests();
        {
            let mut state = server.db.lock();
            state.set(Bytes::from("a"), Value::Str(Bytes::from("1")));
            state.set(Bytes::from("b"), Value::Str(Bytes::from("2")));
        }

        let cmd = Del {
            keys: vec![Bytes::from("a"), Bytes::from("missing"), Bytes::from("b")],
        };
        let outcome = cmd.exec(server.clone()).unwrap();
        assert_eq!(outcome, Outcome::wrote(Frame::Integer(2)));
        assert!(server.db.lock().is_empty());
    }

    #[tokio::test]
    async fn deleting_nothing_is_clean() {
        let server = Server::for_tests();
        let cmd = Del {
            keys: vec![Bytes::from("missing")],
        };
        let outcome = cmd.exec(server).unwrap();
        assert_eq!(outcome, Outcome::read(Frame::Integer(0)));
    }
}
