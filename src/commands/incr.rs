use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{parse_i64, NOT_INTEGER, WRONGTYPE};
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Increment the integer stored at a key by one. A missing key counts from
/// zero; a non-integer value or an overflow is an error.
///
/// Ref: <https://redis.io/docs/latest/commands/incr/>
#[derive(Debug, PartialEq)]
pub struct Incr {
    pub key: Bytes,
}

impl Executable for Incr {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        // Replace the payload in place so an attached expiration survives.
        match state.get_mut(&self.key) {
            Some(Value::Str(value)) => {
                let Some(next) = parse_i64(value).and_then(|n| n.checked_add(1)) else {
                    return Ok(Outcome::read(Frame::Error(NOT_INTEGER.to_string())));
                };
                *value = Bytes::from(next.to_string());
                Ok(Outcome::wrote(Frame::Integer(next)))
            }
            Some(_) => Ok(Outcome::read(Frame::Error(WRONGTYPE.to_string()))),
            None => {
                state.set(self.key, Value::Str(Bytes::from("1")));
                Ok(Outcome::wrote(Frame::Integer(1)))
            }
        }
    }
}

impl TryFrom<&mut CommandParser> for Incr {
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
    async fn existing_integer_increments() {
        let server = Server::for_tests();
        server
            .db
            .lock()
            .set(Bytes::from("counter"), Value::Str(Bytes::from("10")));

        let cmd = Incr {
            key: Bytes::from("counter"),
        };
        let outcome = cmd.exec(server.clone()).unwrap();
        assert_eq!(outcome, Outcome::wrote(Frame::Integer(11)));

        let mut state = server.db.lock();
        assert!(matches!(state.get(b"counter"), Some(Value::Str(v)) if v == "11"));
    }

    #[tokio::test]
    async fn missing_key_starts_at_one() {
        let server = Server::for_tests();
        let cmd = Incr {
            key: Bytes::from("counter"),
        };
        let outcome = cmd.exec(server).unwrap();
        assert_eq!(outcome, Outcome::wrote(Frame::Integer(1)));
    }

    #[tokio::test]
    async fn non_integer_value_errors() {
        let server = Server::for_tests();
        server
            .db
            .lock()
            .set(Bytes::from("k"), Value::Str(Bytes::from("abc")));

        let cmd = Incr {
            key: Bytes::from("k"),
        };
        let outcome = cmd.exec(server).unwrap();
        assert_eq!(
            outcome,
            Outcome::read(Frame::Error(NOT_INTEGER.to_string()))
        );
    }

    #[tokio::test]
    async fn overflow_errors_and_keeps_value() {
        let server = Server::for_tests();
        server.db.lock().set(
            Bytes::from("k"),
            Value::Str(Bytes::from(i64::MAX.to_string())),
        );

        let cmd = Incr {
            key: Bytes::from("k"),
        };
        let outcome = cmd.exec(server.clone()).unwrap();
        assert!(!outcome.dirty);

        let mut state = server.db.lock();
        let max = i64::MAX.to_string();
        assert!(matches!(state.get(b"k"), Some(Value::Str(v)) if v == max.as_str()));
    }
}
