use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::data::{Bitmap, Dict, List, Set, SortedSet};
use crate::slowlog::SlowLog;

/// Keys sampled from the expire dictionary per cron tick.
const EXPIRE_SAMPLE_COUNT: usize = 100;

/// A stored value. Every key maps to exactly one of these shapes; commands
/// check the shape before touching the payload and reply WRONGTYPE on a
/// mismatch.
pub enum Value {
    Str(Bytes),
    List(List<Bytes>),
    Hash(Dict<Bytes>),
    Set(Set),
    ZSet(SortedSet),
    Bitmap(Bitmap),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Hash(_) => "hash",
            Value::Set(_) => "set",
            Value::ZSet(_) => "zset",
            Value::Bitmap(_) => "bitmap",
        }
    }
}

/// Shared handle to the database. Cheap to clone; all access goes through
/// [`Db::lock`], and a command holds the guard for its whole execution, so
/// commands are atomic with respect to one another.
#[derive(Clone)]
pub struct Db {
    inner: Arc<Mutex<DbInner>>,
}

impl Db {
    pub fn new(worker_id: u16, slowlog_max_len: usize) -> Self {
        Db {
            inner: Arc::new(Mutex::new(DbInner {
                data: Dict::new(),
                expires: Dict::new(),
                slowlog: SlowLog::new(worker_id, slowlog_max_len),
            })),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, DbInner> {
        self.inner.lock().unwrap()
    }
}

/// The keyspace, its expiration dictionary, and the slow log. Everything a
/// command mutates lives here, under one lock.
pub struct DbInner {
    data: Dict<Value>,
    /// Key -> absolute deadline, UNIX seconds. Always a subset of the
    /// keyspace.
    expires: Dict<i64>,
    pub slowlog: SlowLog,
}

impl DbInner {
    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&mut self, key: &[u8]) -> Option<&Value> {
        self.expire_if_needed(key);
        self.data.get(key)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Value> {
        self.expire_if_needed(key);
        self.data.get_mut(key)
    }

    /// Lookup without the lazy-expiration check or a rehash step. Callers
    /// that need two values at once run [`DbInner::get`] on each key first,
    /// then peek both.
    pub fn peek(&self, key: &[u8]) -> Option<&Value> {
        self.data.peek(key)
    }

    /// Install a value, replacing whatever was there and dropping any
    /// expiration.
    pub fn set(&mut self, key: Bytes, value: Value) {
        self.expires.remove(&key);
        self.data.set(key, value);
    }

    /// Install only when the key is absent. An expired value does not count
    /// as present.
    pub fn set_if_absent(&mut self, key: Bytes, value: Value) -> bool {
        self.expire_if_needed(&key);
        self.data.set_if_absent(key, value)
    }

    /// Remove a key and its expiration. Returns whether a live key was
    /// removed.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        self.expire_if_needed(key);
        self.expires.remove(key);
        self.data.remove(key).is_some()
    }

    /// Attach an absolute deadline (UNIX seconds) to an existing key.
    /// Returns false when the key does not exist.
    pub fn set_expire(&mut self, key: &[u8], deadline: i64) -> bool {
        self.expire_if_needed(key);
        if !self.data.contains(key) {
            return false;
        }
        self.expires.set(Bytes::copy_from_slice(key), deadline);
        true
    }

    pub fn expire_deadline(&mut self, key: &[u8]) -> Option<i64> {
        self.expires.get(key).copied()
    }

    /// Drop the key now if its deadline has passed.
    fn expire_if_needed(&mut self, key: &[u8]) {
        let Some(&deadline) = self.expires.get(key) else {
            return;
        };
        if deadline > now_secs() {
            return;
        }
        self.expires.remove(key);
        self.data.remove(key);
    }

    /// One periodic expiration pass: sample up to [`EXPIRE_SAMPLE_COUNT`]
    /// random deadlines and evict the overdue ones. Returns how many keys
    /// were dropped.
    pub fn expire_cycle(&mut self) -> usize {
        let now = now_secs();
        let mut removed = 0;
        for _ in 0..EXPIRE_SAMPLE_COUNT {
            let Some((key, deadline)) = self
                .expires
                .random_entry()
                .map(|(key, deadline)| (key.clone(), *deadline))
            else {
                break;
            };
            if deadline <= now {
                self.expires.remove(&key);
                self.data.remove(&key);
                removed += 1;
            }
        }
        removed
    }

    /// Read-only view of every live entry with its optional deadline, for
    /// snapshot serialization.
    pub fn iter_entries(&self) -> impl Iterator<Item = (&Bytes, &Value, Option<i64>)> {
        self.data
            .iter()
            .map(|(key, value)| (key, value, self.expires.peek(key).copied()))
    }
}

/// Seconds since the UNIX epoch.
pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Microseconds since the UNIX epoch.
pub fn now_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}
