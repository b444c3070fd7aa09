pub mod executable;

pub mod bgsave;
pub mod bitcount;
pub mod bitop;
pub mod bitpos;
pub mod del;
pub mod exists;
pub mod expire;
pub mod get;
pub mod getbit;
pub mod hdel;
pub mod hexists;
pub mod hget;
pub mod hgetall;
pub mod hset;
pub mod incr;
pub mod lindex;
pub mod llen;
pub mod lpop;
pub mod lpush;
pub mod lrange;
pub mod lrem;
pub mod lset;
pub mod mset;
pub mod ping;
pub mod rpop;
pub mod rpush;
pub mod sadd;
pub mod save;
pub mod scard;
pub mod sdiff;
pub mod set;
pub mod setbit;
pub mod setnx;
pub mod shutdown;
pub mod sinter;
pub mod sismember;
pub mod slowlog;
pub mod smembers;
pub mod spop;
pub mod srandmember;
pub mod srem;
pub mod sunion;
pub mod zadd;
pub mod zcard;
pub mod zcount;
pub mod zpopmin;
pub mod zrange;
pub mod zrank;
pub mod zrem;
pub mod zscore;

use std::{str, vec};

use bytes::Bytes;
use thiserror::Error as ThisError;

use crate::commands::executable::{Executable, Outcome};
use crate::frame::Frame;
use crate::server::Server;
use crate::Error;

use bgsave::BgSave;
use bitcount::BitCount;
use bitop::BitOpCmd;
use bitpos::BitPos;
use del::Del;
use exists::Exists;
use expire::Expire;
use get::Get;
use getbit::GetBit;
use hdel::HDel;
use hexists::HExists;
use hget::HGet;
use hgetall::HGetAll;
use hset::HSet;
use incr::Incr;
use lindex::LIndex;
use llen::LLen;
use lpop::LPop;
use lpush::LPush;
use lrange::LRange;
use lrem::LRem;
use lset::LSet;
use mset::MSet;
use ping::Ping;
use rpop::RPop;
use rpush::RPush;
use sadd::SAdd;
use save::Save;
use scard::SCard;
use sdiff::SDiff;
use set::Set;
use setbit::SetBit;
use setnx::SetNx;
use shutdown::Shutdown;
use sinter::SInter;
use sismember::SIsMember;
use slowlog::SlowLogCmd;
use smembers::SMembers;
use spop::SPop;
use srandmember::SRandMember;
use srem::SRem;
use sunion::SUnion;
use zadd::ZAdd;
use zcard::ZCard;
use zcount::ZCount;
use zpopmin::ZPopMin;
use zrange::ZRange;
use zrank::ZRank;
use zrem::ZRem;
use zscore::ZScore;

pub(crate) const WRONGTYPE: &str =
    "WRONGTYPE Operation against a key holding the wrong kind of value";
pub(crate) const NOT_INTEGER: &str = "ERR value is not an integer or out of range";
pub(crate) const NOT_FLOAT: &str = "ERR value is not a valid float";
pub(crate) const BIT_OFFSET: &str = "ERR bit offset is not an integer or out of range";
pub(crate) const BIT_VALUE: &str = "ERR bit is not an integer or out of range";

/// Sentinel arity for commands that accept a variable argument count and
/// validate it themselves.
pub const MULTI: i64 = -1;

pub struct CommandSpec {
    pub name: &'static str,
    /// Exact argument count including the command name, or [`MULTI`].
    pub arity: i64,
    /// Mutators reach the AOF when their outcome is dirty.
    pub mutator: bool,
}

const fn spec(name: &'static str, arity: i64, mutator: bool) -> CommandSpec {
    CommandSpec {
        name,
        arity,
        mutator,
    }
}

pub static COMMAND_TABLE: &[CommandSpec] = &[
    // system
    spec("ping", 1, false),
    spec("shutdown", 1, false),
    spec("save", 1, false),
    spec("bgsave", 1, false),
    spec("slowlog", 2, false),
    // string
    spec("set", 3, true),
    spec("mset", MULTI, true),
    spec("setnx", 3, true),
    spec("get", 2, false),
    spec("del", MULTI, true),
    spec("exists", MULTI, false),
    spec("incr", 2, true),
    spec("expire", 3, true),
    // list
    spec("lpush", MULTI, true),
    spec("rpush", MULTI, true),
    spec("lpop", 2, true),
    spec("rpop", 2, true),
    spec("lset", 4, true),
    spec("lrem", 3, true),
    spec("llen", 2, false),
    spec("lindex", 3, false),
    spec("lrange", 4, false),
    // hash
    spec("hset", MULTI, true),
    spec("hget", 3, false),
    spec("hdel", MULTI, true),
    spec("hexists", 3, false),
    spec("hgetall", 2, false),
    // set
    spec("sadd", MULTI, true),
    spec("scard", 2, false),
    spec("sismember", 3, false),
    spec("smembers", 2, false),
    spec("srandmember", 2, false),
    spec("srem", MULTI, true),
    spec("spop", 2, true),
    spec("sinter", 3, false),
    spec("sdiff", 3, false),
    spec("sunion", 3, false),
    // sorted set
    spec("zadd", MULTI, true),
    spec("zcard", 2, false),
    spec("zscore", 3, false),
    spec("zrange", 4, false),
    spec("zrank", 3, false),
    spec("zrem", MULTI, true),
    spec("zcount", 4, false),
    spec("zpopmin", 2, true),
    // bitmap
    spec("setbit", 4, true),
    spec("getbit", 3, false),
    spec("bitcount", 2, false),
    spec("bitop", 4, false),
    spec("bitpos", 3, false),
];

/// ASCII case-insensitive command table lookup.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMAND_TABLE
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(name))
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Ping(Ping),
    Shutdown(Shutdown),
    Save(Save),
    BgSave(BgSave),
    SlowLog(SlowLogCmd),
    Set(Set),
    MSet(MSet),
    SetNx(SetNx),
    Get(Get),
    Del(Del),
    Exists(Exists),
    Incr(Incr),
    Expire(Expire),
    LPush(LPush),
    RPush(RPush),
    LPop(LPop),
    RPop(RPop),
    LSet(LSet),
    LRem(LRem),
    LLen(LLen),
    LIndex(LIndex),
    LRange(LRange),
    HSet(HSet),
    HGet(HGet),
    HDel(HDel),
    HExists(HExists),
    HGetAll(HGetAll),
    SAdd(SAdd),
    SCard(SCard),
    SIsMember(SIsMember),
    SMembers(SMembers),
    SRandMember(SRandMember),
    SRem(SRem),
    SPop(SPop),
    SInter(SInter),
    SDiff(SDiff),
    SUnion(SUnion),
    ZAdd(ZAdd),
    ZCard(ZCard),
    ZScore(ZScore),
    ZRange(ZRange),
    ZRank(ZRank),
    ZRem(ZRem),
    ZCount(ZCount),
    ZPopMin(ZPopMin),
    SetBit(SetBit),
    GetBit(GetBit),
    BitCount(BitCount),
    BitOp(BitOpCmd),
    BitPos(BitPos),
}

impl Command {
    /// Build the typed command for an argument vector whose name has
    /// already passed table lookup and arity checking.
    pub fn from_argv(name: &str, argv: &[Bytes]) -> Result<Command, Error> {
        let parser = &mut CommandParser::new(argv[1..].to_vec());
        match name {
            "ping" => Ping::try_from(parser).map(Command::Ping),
            "shutdown" => Shutdown::try_from(parser).map(Command::Shutdown),
            "save" => Save::try_from(parser).map(Command::Save),
            "bgsave" => BgSave::try_from(parser).map(Command::BgSave),
            "slowlog" => SlowLogCmd::try_from(parser).map(Command::SlowLog),
            "set" => Set::try_from(parser).map(Command::Set),
            "mset" => MSet::try_from(parser).map(Command::MSet),
            "setnx" => SetNx::try_from(parser).map(Command::SetNx),
            "get" => Get::try_from(parser).map(Command::Get),
            "del" => Del::try_from(parser).map(Command::Del),
            "exists" => Exists::try_from(parser).map(Command::Exists),
            "incr" => Incr::try_from(parser).map(Command::Incr),
            "expire" => Expire::try_from(parser).map(Command::Expire),
            "lpush" => LPush::try_from(parser).map(Command::LPush),
            "rpush" => RPush::try_from(parser).map(Command::RPush),
            "lpop" => LPop::try_from(parser).map(Command::LPop),
            "rpop" => RPop::try_from(parser).map(Command::RPop),
            "lset" => LSet::try_from(parser).map(Command::LSet),
            "lrem" => LRem::try_from(parser).map(Command::LRem),
            "llen" => LLen::try_from(parser).map(Command::LLen),
            "lindex" => LIndex::try_from(parser).map(Command::LIndex),
            "lrange" => LRange::try_from(parser).map(Command::LRange),
            "hset" => HSet::try_from(parser).map(Command::HSet),
            "hget" => HGet::try_from(parser).map(Command::HGet),
            "hdel" => HDel::try_from(parser).map(Command::HDel),
            "hexists" => HExists::try_from(parser).map(Command::HExists),
            "hgetall" => HGetAll::try_from(parser).map(Command::HGetAll),
            "sadd" => SAdd::try_from(parser).map(Command::SAdd),
            "scard" => SCard::try_from(parser).map(Command::SCard),
            "sismember" => SIsMember::try_from(parser).map(Command::SIsMember),
            "smembers" => SMembers::try_from(parser).map(Command::SMembers),
            "srandmember" => SRandMember::try_from(parser).map(Command::SRandMember),
            "srem" => SRem::try_from(parser).map(Command::SRem),
            "spop" => SPop::try_from(parser).map(Command::SPop),
            "sinter" => SInter::try_from(parser).map(Command::SInter),
            "sdiff" => SDiff::try_from(parser).map(Command::SDiff),
            "sunion" => SUnion::try_from(parser).map(Command::SUnion),
            "zadd" => ZAdd::try_from(parser).map(Command::ZAdd),
            "zcard" => ZCard::try_from(parser).map(Command::ZCard),
            "zscore" => ZScore::try_from(parser).map(Command::ZScore),
            "zrange" => ZRange::try_from(parser).map(Command::ZRange),
            "zrank" => ZRank::try_from(parser).map(Command::ZRank),
            "zrem" => ZRem::try_from(parser).map(Command::ZRem),
            "zcount" => ZCount::try_from(parser).map(Command::ZCount),
            "zpopmin" => ZPopMin::try_from(parser).map(Command::ZPopMin),
            "setbit" => SetBit::try_from(parser).map(Command::SetBit),
            "getbit" => GetBit::try_from(parser).map(Command::GetBit),
            "bitcount" => BitCount::try_from(parser).map(Command::BitCount),
            "bitop" => BitOpCmd::try_from(parser).map(Command::BitOp),
            "bitpos" => BitPos::try_from(parser).map(Command::BitPos),
            name => Err(format!("unknown command {:?} passed table lookup", name).into()),
        }
    }
}

impl Executable for Command {
    fn exec(self, server: Server) -> Result<Outcome, Error> {
        match self {
            Command::Ping(cmd) => cmd.exec(server),
            Command::Shutdown(cmd) => cmd.exec(server),
            Command::Save(cmd) => cmd.exec(server),
            Command::BgSave(cmd) => cmd.exec(server),
            Command::SlowLog(cmd) => cmd.exec(server),
            Command::Set(cmd) => cmd.exec(server),
            Command::MSet(cmd) => cmd.exec(server),
            Command::SetNx(cmd) => cmd.exec(server),
            Command::Get(cmd) => cmd.exec(server),
            Command::Del(cmd) => cmd.exec(server),
            Command::Exists(cmd) => cmd.exec(server),
            Command::Incr(cmd) => cmd.exec(server),
            Command::Expire(cmd) => cmd.exec(server),
            Command::LPush(cmd) => cmd.exec(server),
            Command::RPush(cmd) => cmd.exec(server),
            Command::LPop(cmd) => cmd.exec(server),
            Command::RPop(cmd) => cmd.exec(server),
            Command::LSet(cmd) => cmd.exec(server),
            Command::LRem(cmd) => cmd.exec(server),
            Command::LLen(cmd) => cmd.exec(server),
            Command::LIndex(cmd) => cmd.exec(server),
            Command::LRange(cmd) => cmd.exec(server),
            Command::HSet(cmd) => cmd.exec(server),
            Command::HGet(cmd) => cmd.exec(server),
            Command::HDel(cmd) => cmd.exec(server),
            Command::HExists(cmd) => cmd.exec(server),
            Command::HGetAll(cmd) => cmd.exec(server),
            Command::SAdd(cmd) => cmd.exec(server),
            Command::SCard(cmd) => cmd.exec(server),
            Command::SIsMember(cmd) => cmd.exec(server),
            Command::SMembers(cmd) => cmd.exec(server),
            Command::SRandMember(cmd) => cmd.exec(server),
            Command::SRem(cmd) => cmd.exec(server),
            Command::SPop(cmd) => cmd.exec(server),
            Command::SInter(cmd) => cmd.exec(server),
            Command::SDiff(cmd) => cmd.exec(server),
            Command::SUnion(cmd) => cmd.exec(server),
            Command::ZAdd(cmd) => cmd.exec(server),
            Command::ZCard(cmd) => cmd.exec(server),
            Command::ZScore(cmd) => cmd.exec(server),
            Command::ZRange(cmd) => cmd.exec(server),
            Command::ZRank(cmd) => cmd.exec(server),
            Command::ZRem(cmd) => cmd.exec(server),
            Command::ZCount(cmd) => cmd.exec(server),
            Command::ZPopMin(cmd) => cmd.exec(server),
            Command::SetBit(cmd) => cmd.exec(server),
            Command::GetBit(cmd) => cmd.exec(server),
            Command::BitCount(cmd) => cmd.exec(server),
            Command::BitOp(cmd) => cmd.exec(server),
            Command::BitPos(cmd) => cmd.exec(server),
        }
    }
}

/// Iterator over the arguments following the command name.
pub(crate) struct CommandParser {
    parts: vec::IntoIter<Bytes>,
}

impl CommandParser {
    pub(crate) fn new(args: Vec<Bytes>) -> Self {
        CommandParser {
            parts: args.into_iter(),
        }
    }

    pub(crate) fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        self.parts.next().ok_or(CommandParserError::EndOfStream)
    }

    pub(crate) fn next_string(&mut self) -> Result<String, CommandParserError> {
        let bytes = self.next_bytes()?;
        str::from_utf8(&bytes)
            .map(|s| s.to_string())
            .map_err(CommandParserError::InvalidUTF8String)
    }

    /// Everything not yet consumed.
    pub(crate) fn remaining(&mut self) -> Vec<Bytes> {
        self.parts.by_ref().collect()
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub(crate) enum CommandParserError {
    #[error("protocol error; invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("protocol error; attempting to extract a value failed due to the frame being fully consumed")]
    EndOfStream,
}

/// The `-ERR wrong number of arguments` reply, also produced by MULTI
/// commands that validate their own shape.
pub(crate) fn arity_error(name: &str) -> Frame {
    Frame::Error(format!("ERR wrong number of arguments for '{}' command", name))
}

pub(crate) fn parse_i64(bytes: &[u8]) -> Option<i64> {
    str::from_utf8(bytes).ok()?.parse().ok()
}

pub(crate) fn parse_f64(bytes: &[u8]) -> Option<f64> {
    str::from_utf8(bytes).ok()?.parse().ok()
}

/// Shortest decimal rendering of a score, matching the reply format of the
/// float-valued commands.
pub(crate) fn format_f64(value: f64) -> String {
    value.to_string()
}
