use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{arity_error, parse_f64, NOT_FLOAT, WRONGTYPE};
use crate::data::zset::ZaddOutcome;
use crate::data::SortedSet;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Add `(score, member)` pairs to a sorted set, creating it when missing.
/// A pair with an unchanged score is a no-op; a changed score moves the
/// member. Replies with the number of members that were new.
///
/// Ref: <https://redis.io/docs/latest/commands/zadd/>
#[derive(Debug, PartialEq)]
pub struct ZAdd {
    pub key: Bytes,
    /// Alternating score, member.
    pub pairs: Vec<Bytes>,
}

impl Executable for ZAdd {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        if self.pairs.is_empty() || self.pairs.len() % 2 != 0 {
            return Ok(Outcome::read(arity_error("zadd")));
        }
        let mut scored = Vec::with_capacity(self.pairs.len() / 2);
        for pair in self.pairs.chunks_exact(2) {
            let Some(score) = parse_f64(&pair[0]) else {
                return Ok(Outcome::read(Frame::Error(NOT_FLOAT.to_string())));
            };
            scored.push((score, pair[1].clone()));
        }

        let mut state = server.db.lock();
        match state.get_mut(&self.key) {
            Some(Value::ZSet(zset)) => {
                let added = add_pairs(zset, scored);
                Ok(Outcome::wrote(Frame::Integer(added)))
            }
            Some(_) => Ok(Outcome::read(Frame::Error(WRONGTYPE.to_string()))),
            None => {
                let mut zset = SortedSet::new();
                let added = add_pairs(&mut zset, scored);
                state.set(self.key, Value::ZSet(zset));
                Ok(Outcome::wrote(Frame::Integer(added)))
            }
        }
    }
}

fn add_pairs(zset: &mut SortedSet, pairs: Vec<(f64, Bytes)>) -> i64 {
    let mut added = 0;
    for (score, member) in pairs {
        if zset.add(member, score) == ZaddOutcome::Added {
            added += 1;
        }
    }
    added
}

impl TryFrom<&mut CommandParser> for ZAdd {
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
    async fn adds_and_updates() {
        let server = Server::for_tests();
        let cmd = ZAdd {
            key: Bytes::from("s"),
            pairs: vec![
                Bytes::from("1"),
                Bytes::from("m1"),
                Bytes::from("2"),
                Bytes::from("m2"),
            ],
        };
        assert_eq!(
            cmd.exec(server.clone()).unwrap(),
            Outcome::wrote(Frame::Integer(2))
        );

        // Same score is a no-op, new score an update; neither counts as new.
        let cmd = ZAdd {
            key: Bytes::from("s"),
            pairs: vec![
                Bytes::from("1"),
                Bytes::from("m1"),
                Bytes::from("5"),
                Bytes::from("m2"),
            ],
        };
        assert_eq!(
            cmd.exec(server.clone()).unwrap(),
            Outcome::wrote(Frame::Integer(0))
        );

        let mut state = server.db.lock();
        let Some(Value::ZSet(zset)) = state.get_mut(b"s") else {
            panic!("expected a zset");
        };
        assert_eq!(zset.score(b"m2"), Some(5.0));
    }

    #[tokio::test]
    async fn bad_score_is_a_float_error() {
        let server = Server::for_tests();
        let cmd = ZAdd {
            key: Bytes::from("s"),
            pairs: vec![Bytes::from("high"), Bytes::from("m1")],
        };
        assert_eq!(
            cmd.exec(server).unwrap(),
            Outcome::read(Frame::Error(NOT_FLOAT.to_string()))
        );
    }
}
