use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::WRONGTYPE;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Get the string value of a key. A missing (or expired) key is a null
/// bulk; a key of another type is a WRONGTYPE error.
///
/// Ref: <https://redis.io/docs/latest/commands/get/>
#[derive(Debug, PartialEq)]
pub struct Get {
    pub key: Bytes,
}

impl Executable for Get {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        let reply = match state.get(&self.key) {
            Some(Value::Str(value)) => Frame::Bulk(value.clone()),
            Some(_) => Frame::Error(WRONGTYPE.to_string()),
            None => Frame::Null,
        };
        Ok(Outcome::read(reply))
    }
}

impl TryFrom<&mut CommandParser> for Get {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::Server;

    #[tokio::test]
    async fn missing_key_is_null() {
        let server = Server::for_tests();
        let cmd = Get {
            key: Bytes::from("nope"),
        };
        let outcome = cmd.exec(server).unwrap();
        assert_eq!(outcome, Outcome::read(Frame::Null));
    }

    #[tokio::test]
    async fn returns_stored_value() {
        let server = Server::for_tests();
        server
            .db
            .lock()
            .set(Bytes::from("foo"), Value::Str(Bytes::from("bar")));

        let cmd = Get {
            key: Bytes::from("foo"),
        };
        let outcome = cmd.exec(server).unwrap();
        assert_eq!(outcome.reply, Frame::Bulk(Bytes::from("bar")));
        assert!(!outcome.dirty);
    }

    #[tokio::test]
    async fn non_string_value_is_wrongtype() {
        let server = Server::for_tests();
        server.db.lock().set(
            Bytes::from("l"),
            Value::List(crate::data::List::new()),
        );

        let cmd = Get {
            key: Bytes::from("l"),
        };
        let outcome = cmd.exec(server).unwrap();
        assert_eq!(outcome.reply, Frame::Error(WRONGTYPE.to_string()));
    }
}
