use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::WRONGTYPE;
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Every member of a set, in table order.
///
/// Ref: <https://redis.io/docs/latest/commands/smembers/>
#[derive(Debug, PartialEq)]
pub struct SMembers {
    pub key: Bytes,
}

impl Executable for SMembers {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        let reply = match state.get(&self.key) {
            Some(Value::Set(set)) => {
                Frame::Array(set.iter().cloned().map(Frame::Bulk).collect())
            }
            Some(_) => Frame::Error(WRONGTYPE.to_string()),
            None => Frame::Array(Vec::new()),
        };
        Ok(Outcome::read(reply))
    }
}

impl TryFrom<&mut CommandParser> for SMembers {
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
    async fn lists_all_members() {
        let server = Server::for_tests();
        {
            let mut set = DataSet::new();
            set.add(Bytes::from("a"));
            set.add(Bytes::from("b"));
            server.db.lock().set(Bytes::from("s"), Value::Set(set));
        }

        let cmd = SMembers {
            key: Bytes::from("s"),
        };
        let Frame::Array(mut items) = cmd.exec(server).unwrap().reply else {
            panic!("expected array reply");
        };
        items.sort_by_key(|frame| format!("{frame}"));
        assert_eq!(
            items,
            vec![
                Frame::Bulk(Bytes::from("a")),
                Frame::Bulk(Bytes::from("b"))
            ]
        );
    }
}
