use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

/// What a command handler produced: the reply to send, and whether the
/// keyspace changed. Only dirty outcomes of mutator commands reach the AOF.
#[derive(Debug, PartialEq)]
pub struct Outcome {
    pub reply: Frame,
    pub dirty: bool,
}

impl Outcome {
    /// A reply that left the keyspace untouched.
    pub fn read(reply: Frame) -> Outcome {
        Outcome {
            reply,
            dirty: false,
        }
    }

    /// A reply for a command that modified the keyspace.
    pub fn wrote(reply: Frame) -> Outcome {
        Outcome { reply, dirty: true }
    }
}

pub trait Executable {
    fn exec(self, server: Server) -> Result<Outcome, Error>;
}
