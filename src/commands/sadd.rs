use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{arity_error, WRONGTYPE};
use crate::data::Set as DataSet;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Add one or more members to a set, creating it when missing. Replies
/// with the number of members that were not already present.
///
/// Ref: <https://redis.io/docs/latest/commands/sadd/>
#[derive(Debug, PartialEq)]
pub struct SAdd {
    pub key: Bytes,
    pub members: Vec<Bytes>,
}

impl Executable for SAdd {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        if self.members.is_empty() {
            return Ok(Outcome::read(arity_error("sadd")));
        }
        let mut state = server.db.lock();
        match state.get_mut(&self.key) {
            Some(Value::Set(set)) => {
                let added = add_members(set, self.members);
                Ok(Outcome::wrote(Frame::Integer(added)))
            }
            Some(_) => Ok(Outcome::read(Frame::Error(WRONGTYPE.to_string()))),
            None => {
                let mut set = DataSet::new();
                let added = add_members(&mut set, self.members);
                state.set(self.key, Value::Set(set));
                Ok(Outcome::wrote(Frame::Integer(added)))
            }
        }
    }
}

fn add_members(set: &mut DataSet, members: Vec<Bytes>) -> i64 {
    let mut added = 0;
    for member in members {
        if set.add(member) {
            added += 1;
        }
    }
    added
}

impl TryFrom<&mut CommandParser> for SAdd {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let members = parser.remaining();
        Ok(Self { key, members })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::Server;

    #[tokio::test]
    async fn counts_new_members_only() {
        let server = Server::for_tests();
        let cmd = SAdd {
            key: Bytes::from("s"),
            members: vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("a")],
        };
        assert_eq!(
            cmd.exec(server.clone()).unwrap(),
            Outcome::wrote(Frame::Integer(2))
        );

        let cmd = SAdd {
            key: Bytes::from("s"),
            members: vec![Bytes::from("b"), Bytes::from("c")],
        };
        assert_eq!(
            cmd.exec(server).unwrap(),
            Outcome::wrote(Frame::Integer(1))
        );
    }
}
