pub mod aof;
pub mod rdb;

pub use aof::{Aof, AofError};
pub use rdb::{Rdb, RdbError};
