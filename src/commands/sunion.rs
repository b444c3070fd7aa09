use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::sinter::{members_reply, two_sets};
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Members present in either set.
///
/// Ref: <https://redis.io/docs/latest/commands/sunion/>
#[derive(Debug, PartialEq)]
pub struct SUnion {
    pub first: Bytes,
    pub second: Bytes,
}

impl Executable for SUnion {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        let members = match two_sets(&mut state, &self.first, &self.second) {
            Ok((Some(a), Some(b))) => a.union(b),
            Ok((Some(a), None)) => a.iter().cloned().collect(),
            Ok((None, Some(b))) => b.iter().cloned().collect(),
            Ok((None, None)) => Vec::new(),
            Err(reply) => return Ok(Outcome::read(reply)),
        };
        Ok(Outcome::read(members_reply(members)))
    }
}

impl TryFrom<&mut CommandParser> for SUnion {
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
    use crate::data::Set as DataSet;
    use crate::db::Value;
    use crate::frame::Frame;
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
    async fn unions_without_duplicates() {
        let server = Server::for_tests();
        seed_set(&server, "a", &["x", "y"]);
        seed_set(&server, "b", &["y", "z"]);

        let cmd = SUnion {
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
                Frame::Bulk(Bytes::from("x")),
                Frame::Bulk(Bytes::from("y")),
                Frame::Bulk(Bytes::from("z"))
            ]
        );
    }
}
