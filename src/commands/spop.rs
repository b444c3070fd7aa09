use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::WRONGTYPE;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Remove and return a random member.
///
/// Ref: <https://redis.io/docs/latest/commands/spop/>
#[derive(Debug, PartialEq)]
pub struct SPop {
    pub key: Bytes,
}

impl Executable for SPop {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        match state.get_mut(&self.key) {
            Some(Value::Set(set)) => match set.pop() {
                Some(member) => Ok(Outcome::wrote(Frame::Bulk(member))),
                None => Ok(Outcome::read(Frame::Null)),
            },
            Some(_) => Ok(Outcome::read(Frame::Error(WRONGTYPE.to_string()))),
            None => Ok(Outcome::read(Frame::Null)),
        }
    }
}

impl TryFrom<&mut CommandParser> for SPop {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Set as DataSet;
    use crate::server::Server;

    #[tokio::test]
    async fn pops_until_empty() {
        let server = Server::for_tests();
        {
            let mut set = DataSet::new();
            set.add(Bytes::from("only"));
            server.db.lock().set(Bytes::from("s"), Value::Set(set));
        }

        let cmd = SPop {
            key: Bytes::from("s"),
        };
        assert_eq!(
            cmd.exec(server.clone()).unwrap(),
            Outcome::wrote(Frame::Bulk(Bytes::from("only")))
        );

        let cmd = SPop {
            key: Bytes::from("s"),
        };
        assert_eq!(cmd.exec(server).unwrap(), Outcome::read(Frame::Null));
    }
}
