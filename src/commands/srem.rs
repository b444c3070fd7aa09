use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{arity_error, WRONGTYPE};
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Remove one or more members from a set, replying with how many were
/// present.
///
/// Ref: <https://redis.io/docs/latest/commands/srem/>
#[derive(Debug, PartialEq)]
pub struct SRem {
    pub key: Bytes,
    pub members: Vec<Bytes>,
}

impl Executable for SRem {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        if self.members.is_empty() {
            return Ok(Outcome::read(arity_error("srem")));
        }
        let mut state = server.db.lock();
        match state.get_mut(&self.key) {
            Some(Value::Set(set)) => {
                let mut removed = 0;
                for member in &self.members {
                    if set.remove(member) {
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
            Some(_) => Ok(Outcome::read(Frame::Error(WRONGTYPE.to_string()))),
            None => Ok(Outcome::read(Frame::Integer(0))),
        }
    }
}

impl TryFrom<&mut CommandParser> for SRem {
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
    use crate::data::Set as DataSet;
    use crate::server::Server;

    #[tokio::test]
    async fn counts_present_members() {
        let server = Server::for_tests();
        {
            let mut set = DataSet::new();
            set.add(Bytes::from("a"));
            set.add(Bytes::from("b"));
            server.db.lock().set(Bytes::from("s"), Value::Set(set));
        }

        let cmd = SRem {
            key: Bytes::from("s"),
            members: vec![Bytes::from("a"), Bytes::from("missing")],
        };
        assert_eq!(
            cmd.exec(server).unwrap(),
            Outcome::wrote(Frame::Integer(1))
        );
    }
}
