use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{arity_error, WRONGTYPE};
use crate::data::Dict;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Set one or more field/value pairs in a hash, creating it when missing.
/// Replies with the number of fields that did not exist before.
///
/// Ref: <https://redis.io/docs/latest/commands/hset/>
#[derive(Debug, PartialEq)]
pub struct HSet {
    pub key: Bytes,
    pub pairs: Vec<Bytes>,
}

impl Executable for HSet {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        if self.pairs.is_empty() || self.pairs.len() % 2 != 0 {
            return Ok(Outcome::read(arity_error("hset")));
        }
        let mut state = server.db.lock();
        match state.get_mut(&self.key) {
            Some(Value::Hash(hash)) => {
                let added = set_pairs(hash, &self.pairs);
                Ok(Outcome::wrote(Frame::Integer(added)))
            }
            Some(_) => Ok(Outcome::read(Frame::Error(WRONGTYPE.to_string()))),
            None => {
                let mut hash = Dict::new();
                let added = set_pairs(&mut hash, &self.pairs);
                state.set(self.key, Value::Hash(hash));
                Ok(Outcome::wrote(Frame::Integer(added)))
            }
        }
    }
}

fn set_pairs(hash: &mut Dict<Bytes>, pairs: &[Bytes]) -> i64 {
    let mut added = 0;
    for pair in pairs.chunks_exact(2) {
        if !hash.contains(&pair[0]) {
            added += 1;
        }
        hash.set(pair[0].clone(), pair[1].clone());
    }
    added
}

impl TryFrom<&mut CommandParser> for HSet {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let pairs = parser.remaining();
        Ok(Self { key, pairs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::Server;

    #[tokio::test]
    async fn counts_new_fields_only() {
        let server = Server::for_tests();
        let cmd = HSet {
            key: Bytes::from("h"),
            pairs: vec![
                Bytes::from("f1"),
                Bytes::from("v1"),
                Bytes::from("f2"),
                Bytes::from("v2"),
            ],
        };
        assert_eq!(
            cmd.exec(server.clone()).unwrap(),
            Outcome::wrote(Frame::Integer(2))
        );

        // Overwrite one field, add another.
        let cmd = HSet {
            key: Bytes::from("h"),
            pairs: vec![
                Bytes::from("f1"),
                Bytes::from("changed"),
                Bytes::from("f3"),
                Bytes::from("v3"),
            ],
        };
        assert_eq!(
            cmd.exec(server.clone()).unwrap(),
            Outcome::wrote(Frame::Integer(1))
        );

        let mut state = server.db.lock();
        let Some(Value::Hash(hash)) = state.get_mut(b"h") else {
            panic!("expected a hash");
        };
        assert_eq!(hash.get(b"f1"), Some(&Bytes::from("changed")));
        assert_eq!(hash.len(), 3);
    }

    #[tokio::test]
    async fn odd_pair_count_is_an_arity_error() {
        let server = Server::for_tests();
        let cmd = HSet {
            key: Bytes::from("h"),
            pairs: vec![Bytes::from("f1")],
        };
        let outcome = cmd.exec(server).unwrap();
        assert!(matches!(outcome.reply, Frame::Error(_)));
        assert!(!outcome.dirty);
    }
}
