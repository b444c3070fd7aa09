use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{parse_i64, NOT_INTEGER};
use crate::db::now_secs;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Attach a time-to-live, in seconds, to an existing key. The deadline is
/// stored as an absolute UNIX second; when it passes, the key is evicted
/// lazily on access or by the periodic sweep. Replies `:1` when the
/// deadline was set, `:0` when the key does not exist.
///
/// In the AOF this command is rewritten with its absolute deadline so a
/// replay is independent of when it happens.
///
/// Ref: <https://redis.io/docs/latest/commands/expire/>
#[derive(Debug, PartialEq)]
pub struct Expire {
    pub key: Bytes,
    pub seconds: Bytes,
}

impl Executable for Expire {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let Some(seconds) = parse_i64(&self.seconds) else {
            return Ok(Outcome::read(Frame::Error(NOT_INTEGER.to_string())));
        };
        let mut state = server.db.lock();
        if state.set_expire(&self.key, now_secs() + seconds) {
            Ok(Outcome::wrote(Frame::Integer(1)))
        } else {
            Ok(Outcome::read(Frame::Integer(0)))
        }
    }
}

impl TryFrom<&mut CommandParser> for Expire {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let seconds = parser.next_bytes()?;
        Ok(Self { key, seconds })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Value;
    use crate::server::Server;

    #[tokio::test]
    async fn sets_absolute_deadline() {
        let server = Server::for_tests();
        server
            .db
            .lock()
            .set(Bytes::from("k"), Value::Str(Bytes::from("v")));

        let cmd = Expire {
            key: Bytes::from("k"),
            seconds: Bytes::from("100"),
        };
        let before = now_secs();
        let outcome = cmd.exec(server.clone()).unwrap();
        assert_eq!(outcome, Outcome::wrote(Frame::Integer(1)));

        let deadline = server.db.lock().expire_deadline(b"k").unwrap();
        assert!(deadline >= before + 100);
        assert!(deadline <= now_secs() + 100);
    }

    #[tokio::test]
    async fn missing_key_replies_zero() {
        let server = Server::for_tests();
        let cmd = Expire {
            key: Bytes::from("nope"),
            seconds: Bytes::from("100"),
        };
        let outcome = cmd.exec(server).unwrap();
        assert_eq!(outcome, Outcome::read(Frame::Integer(0)));
    }

    #[tokio::test]
    async fn zero_seconds_expires_on_next_access() {
        let server = Server::for_tests();
        server
            .db
            .lock()
            .set(Bytes::from("x"), Value::Str(Bytes::from("1")));

        let cmd = Expire {
            key: Bytes::from("x"),
            seconds: Bytes::from("0"),
        };
        cmd.exec(server.clone()).unwrap();
        assert!(server.db.lock().get(b"x").is_none());
    }

    #[tokio::test]
    async fn non_integer_seconds_errors() {
        let server = Server::for_tests();
        let cmd = Expire {
            key: Bytes::from("k"),
            seconds: Bytes::from("soon"),
        };
        let outcome = cmd.exec(server).unwrap();
        assert_eq!(
            outcome,
            Outcome::read(Frame::Error(NOT_INTEGER.to_string()))
        );
    }
}
