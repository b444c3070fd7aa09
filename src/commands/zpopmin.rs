use bytes::Bytes;

use crate::commands::executable::{Executable, Outcome};
use crate::commands::{format_f64, WRONGTYPE};
use crate::db::Value;
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use super::CommandParser;

/// Remove and return the member with the lowest `(score, member)` pair, as
/// a two-element array of member and score. Missing or empty is `*0`.
///
/// Ref: <https://redis.io/docs/latest/commands/zpopmin/>
#[derive(Debug, PartialEq)]
pub struct ZPopMin {
    pub key: Bytes,
}

impl Executable for ZPopMin {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        let mut state = server.db.lock();
        match state.get_mut(&self.key) {
            Some(Value::ZSet(zset)) => match zset.pop_min() {
                Some((member, score)) => Ok(Outcome::wrote(Frame::Array(vec![
                    Frame::Bulk(member),
                    Frame::Bulk(Bytes::from(format_f64(score))),
                ]))),
                None => Ok(Outcome::read(Frame::Array(Vec::new()))),
            },
            Some(_) => Ok(Outcome::read(Frame::Error(WRONGTYPE.to_string()))),
            None => Ok(Outcome::read(Frame::Array(Vec::new()))),
        }
    }
}

impl TryFrom<&mut CommandParser> for ZPopMin {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
