use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::WRONGTYPE;
use crate::data::Set as DataSet;
use crate::db::{DbInner, Value};
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Members present in both sets. Missing keys behave as empty sets.
///
/// Ref: <https://redis.io/docs/latest/commands/sinter/>
#[derive(Debug, PartialEq)]
pub struct SInter {
    pub first: Bytes,
    pub second: Bytes,
}

/// Expire-check both keys, then view them as sets. `Err` carries the
/// WRONGTYPE reply.
pub(crate) fn two_sets<'a>(
    state: &'a mut DbInner,
    first: &[u8],
    second: &[u8],
) -> Result<(Option<&'a DataSet>, Option<&'a DataSet>), Frame> {
    state.get(first);
    state.get(second);
    let a = match state.peek(first) {
        Some(Value::Set(set)) => Some(set),
        Some(_) => return Err(Frame::Error(WRONGTYPE.to_string())),
        None => None,
    };
    let b = match state.peek(second) {
        Some(Value::Set(set)) => Some(set),
        Some(_) => return Err(Frame::Error(WRONGTYPE.to_string())),
        None => None,
    };
    Ok((a, b))
}

pub(crate) fn members_reply(members: Vec<Bytes>) -> Frame {
    Frame::Array(members.into_iter().map(Frame::Bulk).collect())
}

impl Executable for SInter {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        let members = match two_sets(&mut state, &self.first, &self.second) {
            Ok((Some(a), Some(b))) => a.intersection(b),
            Ok(_) => Vec::new(),
            Err(reply) => return Ok(Outcome::read(reply)),
        };
        Ok(Outcome::read(members_reply(members)))
    }
}

impl TryFrom<&mut CommandParser> for SInter {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let first = parser.next_bytes()?;
        let second = parser.next_bytes()?;
        Ok(Self { first, second })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::Server;

    fn seed_set(server: &Server, key: &str, members: &[&str]) {
        let mut set = DataSet::new();
        for member in members {
            set.add(Bytes::copy_from_slice(member.as_bytes()));
        }
        server
            .db
            .lock()
            .set(Bytes::copy_from_slice(key.as_bytes()), Value::Set(set));
    }

    #[tokio::test]
    async fn intersects_two_sets() {
        let server = Server::for_tests();
        seed_set(&server, "a", &["x", "y", "z"]);
        seed_set(&server, "b", &["y", "z", "w"]);

        let cmd = SInter {
            first: Bytes::from("a"),
            second: Bytes::from("b"),
        };
        let Frame::Array(mut items) = cmd.exec(server).unwrap().reply else {
            panic!("expected array reply");
        };
        items.sort_by_key(|frame| format!("{frame}"));
        assert_eq!(
            items,
            vec![
                Frame::Bulk(Bytes::from("y")),
                Frame::Bulk(Bytes::from("z"))
            ]
        );
    }

    #[tokio::test]
    async fn missing_operand_empties_the_result() {
        let server = Server::for_tests();
        seed_set(&server, "a", &["x"]);

        let cmd = SInter {
            first: Bytes::from("a"),
            second: Bytes::from("missing"),
        };
        assert_eq!(cmd.exec(server).unwrap().reply, Frame::Array(Vec::new()));
    }
}
