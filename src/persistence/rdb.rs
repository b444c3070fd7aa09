use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use crc::{Crc, CRC_64_ECMA_182};
use thiserror::Error as ThisError;
use tracing::{error, info};

use crate::commands::{format_f64, parse_f64};
use crate::data::{Bitmap, Dict, List, Set, SortedSet};
use crate::db::{Db, Value};

const MAGIC: &[u8; 5] = b"GODIS";
const VERSION: &[u8; 4] = b"0001";

const OPCODE_EXPIRE: u8 = 0xfd;
const OPCODE_EOF: u8 = 0xff;

const TAG_STRING: u8 = 0x00;
const TAG_LIST: u8 = 0x01;
const TAG_SET: u8 = 0x02;
const TAG_ZSET: u8 = 0x03;
const TAG_HASH: u8 = 0x04;
const TAG_BITMAP: u8 = 0x05;

const CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_ECMA_182);

#[derive(Debug, ThisError)]
pub enum RdbError {
    #[error("rdb file does not exist")]
    FileNotExist,
    #[error("rdb magic mismatch")]
    AppName,
    #[error("rdb version mismatch")]
    Version,
    #[error("rdb checksum mismatch")]
    FileDamaged,
    #[error("rdb record malformed")]
    LoadFailed,
    #[error("background save already in progress")]
    SaveInProgress,
    #[error("rdb io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The snapshot engine. A single in-progress flag serializes SAVE and
/// BGSAVE; the file is always written to a temp path and renamed over the
/// target, so readers only ever see a complete snapshot.
pub struct Rdb {
    path: PathBuf,
    checksum: bool,
    saving: Arc<AtomicBool>,
}

impl Rdb {
    pub fn new(path: PathBuf, checksum: bool) -> Rdb {
        Rdb {
            path,
            checksum,
            saving: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Write the snapshot synchronously.
    pub fn save(&self, db: &Db) -> Result<(), RdbError> {
        self.begin_save()?;
        let encoded = self.encode(db);
        let result = write_atomic(&self.path, &encoded);
        self.saving.store(false, Ordering::Release);
        result
    }

    /// Encode the snapshot on the caller's context (no command can
    /// interleave with it), then write and rename on a blocking thread.
    pub fn bg_save(&self, db: &Db) -> Result<(), RdbError> {
        self.begin_save()?;
        let encoded = self.encode(db);
        let path = self.path.clone();
        let saving = self.saving.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(err) = write_atomic(&path, &encoded) {
                error!(%err, "background rdb write failed");
            } else {
                info!(path = %path.display(), "background rdb save finished");
            }
            saving.store(false, Ordering::Release);
        });
        Ok(())
    }

    fn begin_save(&self) -> Result<(), RdbError> {
        if self
            .saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(RdbError::SaveInProgress);
        }
        Ok(())
    }

    fn encode(&self, db: &Db) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(VERSION);

        let state = db.lock();
        for (key, value, deadline) in state.iter_entries() {
            if let Some(when) = deadline {
                out.push(OPCODE_EXPIRE);
                out.extend_from_slice(&(when as u64).to_be_bytes());
            }
            match value {
                Value::Str(s) => {
                    out.push(TAG_STRING);
                    write_string(&mut out, key);
                    write_string(&mut out, s);
                }
                Value::List(list) => {
                    out.push(TAG_LIST);
                    write_string(&mut out, key);
                    write_len(&mut out, list.len());
                    for item in list.iter() {
                        write_string(&mut out, item);
                    }
                }
                Value::Set(set) => {
                    out.push(TAG_SET);
                    write_string(&mut out, key);
                    write_len(&mut out, set.len());
                    for member in set.iter() {
                        write_string(&mut out, member);
                    }
                }
                Value::ZSet(zset) => {
                    out.push(TAG_ZSET);
                    write_string(&mut out, key);
                    write_len(&mut out, zset.len() as usize);
                    for (member, score) in zset.iter() {
                        write_string(&mut out, member);
                        write_string(&mut out, format_f64(score).as_bytes());
                    }
                }
                Value::Hash(hash) => {
                    out.push(TAG_HASH);
                    write_string(&mut out, key);
                    write_len(&mut out, hash.len());
                    for (field, value) in hash.iter() {
                        write_string(&mut out, field);
                        write_string(&mut out, value);
                    }
                }
                Value::Bitmap(bitmap) => {
                    out.push(TAG_BITMAP);
                    write_string(&mut out, key);
                    write_string(&mut out, bitmap.as_bytes());
                }
            }
        }
        out.push(OPCODE_EOF);

        if self.checksum {
            let sum = CRC64.checksum(&out);
            out.extend_from_slice(&sum.to_be_bytes());
        }
        out
    }

    /// Load a snapshot into an empty database. A missing file is reported
    /// as [`RdbError::FileNotExist`]; callers treat it as an empty
    /// database. Format errors abort startup.
    pub fn load(&self, db: &Db) -> Result<usize, RdbError> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(RdbError::FileNotExist)
            }
            Err(err) => return Err(err.into()),
        };

        let mut reader = Reader::new(&data);
        if reader.take(MAGIC.len())? != MAGIC {
            return Err(RdbError::AppName);
        }
        if reader.take(VERSION.len())? != VERSION {
            return Err(RdbError::Version);
        }

        let mut loaded = 0;
        let mut state = db.lock();
        loop {
            let mut tag = reader.take_u8()?;
            let mut deadline = None;
            if tag == OPCODE_EXPIRE {
                let raw = reader.take(8)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(raw);
                deadline = Some(u64::from_be_bytes(buf) as i64);
                tag = reader.take_u8()?;
            }
            if tag == OPCODE_EOF {
                if self.checksum {
                    let end = reader.pos;
                    let expected = u64::from_be_bytes(
                        reader.take(8)?.try_into().map_err(|_| RdbError::LoadFailed)?,
                    );
                    if CRC64.checksum(&data[..end]) != expected {
                        return Err(RdbError::FileDamaged);
                    }
                }
                break;
            }

            let key = reader.take_string()?;
            let value = read_value(&mut reader, tag)?;
            state.set(key.clone(), value);
            if let Some(when) = deadline {
                state.set_expire(&key, when);
            }
            loaded += 1;
        }
        info!(loaded, path = %self.path.display(), "rdb load finished");
        Ok(loaded)
    }
}

fn read_value(reader: &mut Reader<'_>, tag: u8) -> Result<Value, RdbError> {
    match tag {
        TAG_STRING => Ok(Value::Str(reader.take_string()?)),
        TAG_LIST => {
            let count = reader.take_len()?;
            let mut list = List::new();
            for _ in 0..count {
                list.rpush(reader.take_string()?);
            }
            Ok(Value::List(list))
        }
        TAG_SET => {
            let count = reader.take_len()?;
            let mut set = Set::new();
            for _ in 0..count {
                set.add(reader.take_string()?);
            }
            Ok(Value::Set(set))
        }
        TAG_ZSET => {
            let count = reader.take_len()?;
            let mut zset = SortedSet::new();
            for _ in 0..count {
                let member = reader.take_string()?;
                let score = parse_f64(&reader.take_string()?).ok_or(RdbError::LoadFailed)?;
                zset.add(member, score);
            }
            Ok(Value::ZSet(zset))
        }
        TAG_HASH => {
            let count = reader.take_len()?;
            let mut hash = Dict::new();
            for _ in 0..count {
                let field = reader.take_string()?;
                let value = reader.take_string()?;
                hash.set(field, value);
            }
            Ok(Value::Hash(hash))
        }
        TAG_BITMAP => {
            let bytes = reader.take_string()?;
            Ok(Value::Bitmap(Bitmap::from_bytes(bytes.to_vec())))
        }
        _ => Err(RdbError::LoadFailed),
    }
}

/// The 6/14/32-bit big-endian length encoding: the top two bits of the
/// first byte select the width.
fn write_len(out: &mut Vec<u8>, len: usize) {
    if len <= 0x3f {
        out.push(len as u8);
    } else if len <= 0x3fff {
        out.push(0x40 | (len >> 8) as u8);
        out.push(len as u8);
    } else {
        out.push(0x80);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    }
}

fn write_string(out: &mut Vec<u8>, bytes: &[u8]) {
    write_len(out, bytes.len());
    out.extend_from_slice(bytes);
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<(), RdbError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], RdbError> {
        if self.pos + n > self.data.len() {
            return Err(RdbError::LoadFailed);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8, RdbError> {
        Ok(self.take(1)?[0])
    }

    fn take_len(&mut self) -> Result<usize, RdbError> {
        let first = self.take_u8()?;
        match first >> 6 {
            0b00 => Ok(first as usize),
            0b01 => {
                let second = self.take_u8()?;
                Ok(((first as usize & 0x3f) << 8) | second as usize)
            }
            0b10 if first == 0x80 => {
                let raw = self.take(4)?;
                let mut buf = [0u8; 4];
                buf.copy_from_slice(raw);
                Ok(u32::from_be_bytes(buf) as usize)
            }
            _ => Err(RdbError::LoadFailed),
        }
    }

    fn take_string(&mut self) -> Result<Bytes, RdbError> {
        let len = self.take_len()?;
        Ok(Bytes::copy_from_slice(self.take(len)?))
    }
}
