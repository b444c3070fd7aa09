use bytes::Bytes;
use rand::Rng;

/// Buckets allocated for a fresh table.
pub const INIT_SIZE: usize = 8;
/// Load factor (`used / size`) beyond which a resize starts.
const FORCE_RATIO: usize = 2;
/// Empty-bucket retries for [`Dict::random_entry`].
const RANDOM_RETRIES: usize = 1000;
/// Empty-bucket retries for [`Dict::random_take`].
const RANDOM_TAKE_RETRIES: usize = 512;

type Link<V> = Option<Box<Entry<V>>>;

struct Entry<V> {
    key: Bytes,
    val: V,
    next: Link<V>,
}

struct Table<V> {
    buckets: Vec<Link<V>>,
    used: usize,
}

impl<V> Table<V> {
    fn with_size(size: usize) -> Self {
        let mut buckets = Vec::with_capacity(size);
        buckets.resize_with(size, || None);
        Table { buckets, used: 0 }
    }

    fn mask(&self) -> u64 {
        self.buckets.len() as u64 - 1
    }
}

/// A chained hash table that rehashes incrementally.
///
/// Up to two backing tables exist at a time. While a resize is in progress
/// every key-touching call migrates one non-empty bucket chain from the old
/// table to the new one; once the old table drains, the new table is
/// promoted. Lookups consult both tables, inserts go to the newest.
///
/// Keys are byte strings; this one structure backs the keyspace, the expire
/// dictionary, hash values, set members, and sorted-set score lookups.
pub struct Dict<V> {
    table: Table<V>,
    rehash_to: Option<Table<V>>,
    /// Next `table` bucket to migrate; only meaningful while rehashing.
    cursor: usize,
}

impl<V> Default for Dict<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Dict<V> {
    pub fn new() -> Self {
        Dict {
            table: Table::with_size(INIT_SIZE),
            rehash_to: None,
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.table.used + self.rehash_to.as_ref().map_or(0, |t| t.used)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_rehashing(&self) -> bool {
        self.rehash_to.is_some()
    }

    pub fn get(&mut self, key: &[u8]) -> Option<&V> {
        self.rehash_step();
        self.find(key).map(|entry| &entry.val)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        self.rehash_step();
        self.find_mut(key).map(|entry| &mut entry.val)
    }

    /// Lookup without driving a rehash step; for read-only contexts such as
    /// snapshot serialization.
    pub fn peek(&self, key: &[u8]) -> Option<&V> {
        self.find(key).map(|entry| &entry.val)
    }

    pub fn contains(&mut self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace. Replacement keeps the original key allocation.
    pub fn set(&mut self, key: Bytes, val: V) {
        self.rehash_step();
        self.expand_if_needed();
        if let Some(entry) = self.find_mut(&key) {
            entry.val = val;
            return;
        }
        self.insert_new(key, val);
    }

    /// Insert only when absent. Returns false when the key already exists.
    pub fn set_if_absent(&mut self, key: Bytes, val: V) -> bool {
        self.rehash_step();
        self.expand_if_needed();
        if self.find(&key).is_some() {
            return false;
        }
        self.insert_new(key, val);
        true
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<V> {
        self.rehash_step();
        let hash = hash_key(key);
        let idx = (hash & self.table.mask()) as usize;
        if let Some(val) = remove_in_chain(&mut self.table.buckets[idx], key) {
            self.table.used -= 1;
            return Some(val);
        }
        let new = self.rehash_to.as_mut()?;
        let idx = (hash & new.mask()) as usize;
        let val = remove_in_chain(&mut new.buckets[idx], key)?;
        new.used -= 1;
        Some(val)
    }

    /// A uniformly-ish random entry, or `None` when the sampled buckets all
    /// came up empty.
    pub fn random_entry(&mut self) -> Option<(&Bytes, &V)> {
        self.rehash_step();
        self.random_from(RANDOM_RETRIES)
    }

    /// Remove and return a random entry.
    pub fn random_take(&mut self) -> Option<(Bytes, V)> {
        self.rehash_step();
        let key = {
            let (key, _) = self.random_from(RANDOM_TAKE_RETRIES)?;
            key.clone()
        };
        let val = self.remove(&key)?;
        Some((key, val))
    }

    fn random_from(&self, retries: usize) -> Option<(&Bytes, &V)> {
        // Sample whichever table currently holds more entries.
        let table = match &self.rehash_to {
            Some(new) if new.used > self.table.used => new,
            _ => &self.table,
        };
        if table.used == 0 {
            return None;
        }
        let mut rng = rand::thread_rng();
        let mut idx = rng.gen_range(0..table.buckets.len());
        let mut attempts = 0;
        while table.buckets[idx].is_none() && attempts < retries {
            idx = rng.gen_range(0..table.buckets.len());
            attempts += 1;
        }
        let mut entry = table.buckets[idx].as_deref()?;
        let chain_len = chain_length(&table.buckets[idx]);
        for _ in 0..rng.gen_range(0..chain_len) {
            entry = entry.next.as_deref()?;
        }
        Some((&entry.key, &entry.val))
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            dict: self,
            in_new: false,
            bucket: 0,
            entry: None,
            started: false,
        }
    }

    fn find(&self, key: &[u8]) -> Option<&Entry<V>> {
        let hash = hash_key(key);
        let idx = (hash & self.table.mask()) as usize;
        if let Some(entry) = find_in_chain(&self.table.buckets[idx], key) {
            return Some(entry);
        }
        let new = self.rehash_to.as_ref()?;
        let idx = (hash & new.mask()) as usize;
        find_in_chain(&new.buckets[idx], key)
    }

    fn find_mut(&mut self, key: &[u8]) -> Option<&mut Entry<V>> {
        let hash = hash_key(key);
        let idx = (hash & self.table.mask()) as usize;
        if find_in_chain(&self.table.buckets[idx], key).is_some() {
            return find_mut_in_chain(&mut self.table.buckets[idx], key);
        }
        let new = self.rehash_to.as_mut()?;
        let idx = (hash & new.mask()) as usize;
        find_mut_in_chain(&mut new.buckets[idx], key)
    }

    fn insert_new(&mut self, key: Bytes, val: V) {
        let hash = hash_key(&key);
        let table = self.rehash_to.as_mut().unwrap_or(&mut self.table);
        let idx = (hash & table.mask()) as usize;
        let next = table.buckets[idx].take();
        table.buckets[idx] = Some(Box::new(Entry { key, val, next }));
        table.used += 1;
    }

    /// Migrate one non-empty bucket chain from the old table.
    fn rehash_step(&mut self) {
        let Some(new) = self.rehash_to.as_mut() else {
            return;
        };
        if self.table.used > 0 {
            while self.table.buckets[self.cursor].is_none() {
                self.cursor += 1;
            }
            let mut chain = self.table.buckets[self.cursor].take();
            while let Some(mut entry) = chain {
                chain = entry.next.take();
                let idx = (hash_key(&entry.key) & new.mask()) as usize;
                entry.next = new.buckets[idx].take();
                new.buckets[idx] = Some(entry);
                self.table.used -= 1;
                new.used += 1;
            }
            self.cursor += 1;
        }
        if self.table.used == 0 {
            if let Some(new) = self.rehash_to.take() {
                self.table = new;
            }
        }
    }

    fn expand_if_needed(&mut self) {
        if self.is_rehashing() {
            return;
        }
        let size = self.table.buckets.len();
        let used = self.table.used;
        if used > size && used / size > FORCE_RATIO {
            // Stable and strictly growing here, so expand cannot fail.
            let _ = self.expand(used * 2);
        }
    }

    /// Start rehashing into a table of the next power of two >= `size`.
    /// Fails while a rehash is running or when the target is not a strict
    /// growth.
    pub fn expand(&mut self, size: usize) -> Result<(), ExpandError> {
        let target = next_power(size);
        if self.is_rehashing() || target <= self.table.buckets.len() {
            return Err(ExpandError);
        }
        self.rehash_to = Some(Table::with_size(target));
        self.cursor = 0;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ExpandError;

impl std::fmt::Display for ExpandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dict expand rejected")
    }
}

impl std::error::Error for ExpandError {}

pub struct Iter<'a, V> {
    dict: &'a Dict<V>,
    in_new: bool,
    bucket: usize,
    entry: Option<&'a Entry<V>>,
    started: bool,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a Bytes, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.entry {
                self.entry = entry.next.as_deref();
                return Some((&entry.key, &entry.val));
            }
            let table = if self.in_new {
                self.dict.rehash_to.as_ref()?
            } else {
                &self.dict.table
            };
            if self.started {
                self.bucket += 1;
            }
            self.started = true;
            if self.bucket >= table.buckets.len() {
                if self.in_new {
                    return None;
                }
                self.in_new = true;
                self.bucket = 0;
                self.started = false;
                continue;
            }
            self.entry = table.buckets[self.bucket].as_deref();
        }
    }
}

fn next_power(size: usize) -> usize {
    let mut power = INIT_SIZE;
    while power < size {
        power *= 2;
    }
    power
}

/// FNV-1a over the key bytes; stable across runs so RDB files sample the
/// same distribution after a reload.
fn hash_key(key: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for &byte in key {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

fn find_in_chain<'a, V>(link: &'a Link<V>, key: &[u8]) -> Option<&'a Entry<V>> {
    match link {
        None => None,
        Some(entry) if entry.key.as_ref() == key => Some(entry),
        Some(entry) => find_in_chain(&entry.next, key),
    }
}

fn find_mut_in_chain<'a, V>(link: &'a mut Link<V>, key: &[u8]) -> Option<&'a mut Entry<V>> {
    match link {
        None => None,
        Some(entry) => {
            if entry.key.as_ref() == key {
                Some(entry)
            } else {
                find_mut_in_chain(&mut entry.next, key)
            }
        }
    }
}

fn remove_in_chain<V>(link: &mut Link<V>, key: &[u8]) -> Option<V> {
    let here = matches!(link, Some(entry) if entry.key.as_ref() == key);
    if here {
        let mut entry = link.take()?;
        *link = entry.next.take();
        Some(entry.val)
    } else if let Some(entry) = link {
        remove_in_chain(&mut entry.next, key)
    } else {
        None
    }
}

fn chain_length<V>(link: &Link<V>) -> usize {
    let mut len = 0;
    let mut cur = link.as_deref();
    while let Some(entry) = cur {
        len += 1;
        cur = entry.next.as_deref();
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn key(i: usize) -> Bytes {
        Bytes::from(format!("key-{i}"))
    }

    #[test]
    fn set_get_remove() {
        let mut dict = Dict::new();
        dict.set(Bytes::from("foo"), 1);
        assert_eq!(dict.get(b"foo"), Some(&1));
        dict.set(Bytes::from("foo"), 2);
        assert_eq!(dict.get(b"foo"), Some(&2));
        assert_eq!(dict.len(), 1);

        assert_eq!(dict.remove(b"foo"), Some(2));
        assert_eq!(dict.remove(b"foo"), None);
        assert!(dict.is_empty());
    }

    #[test]
    fn set_if_absent_rejects_existing() {
        let mut dict = Dict::new();
        assert!(dict.set_if_absent(Bytes::from("foo"), 1));
        assert!(!dict.set_if_absent(Bytes::from("foo"), 2));
        assert_eq!(dict.get(b"foo"), Some(&1));
    }

    #[test]
    fn grows_and_rehashes_incrementally() {
        let mut dict = Dict::new();
        for i in 0..64 {
            dict.set(key(i), i);
        }
        // Growth triggered somewhere along the way; drive steps until done.
        assert_eq!(dict.len(), 64);
        while dict.is_rehashing() {
            let _ = dict.get(b"key-0");
        }
        for i in 0..64 {
            assert_eq!(dict.get(&key(i)), Some(&i));
        }
    }

    #[test]
    fn logical_view_is_stable_during_rehash() {
        let mut dict = Dict::new();
        for i in 0..500 {
            dict.set(key(i), i);
            // Whatever the physical split, length and membership agree
            // with the logical map.
            assert_eq!(dict.len(), i + 1);
        }
        let seen: HashSet<Vec<u8>> = dict.iter().map(|(k, _)| k.to_vec()).collect();
        assert_eq!(seen.len(), 500);
        for i in 0..500 {
            assert!(seen.contains(&key(i).to_vec()));
        }
    }

    #[test]
    fn removal_during_rehash() {
        let mut dict = Dict::new();
        for i in 0..100 {
            dict.set(key(i), i);
        }
        for i in 0..100 {
            assert_eq!(dict.remove(&key(i)), Some(i));
        }
        assert!(dict.is_empty());
    }

    #[test]
    fn expand_rejects_non_growth() {
        let mut dict: Dict<u32> = Dict::new();
        assert_eq!(dict.expand(4), Err(ExpandError));
        assert!(dict.expand(32).is_ok());
        // Already rehashing.
        assert_eq!(dict.expand(128), Err(ExpandError));
    }

    #[test]
    fn random_entry_hits_only_live_keys() {
        let mut dict = Dict::new();
        assert!(dict.random_entry().is_none());
        for i in 0..32 {
            dict.set(key(i), i);
        }
        for _ in 0..100 {
            let (k, v) = dict.random_entry().expect("dict is not empty");
            assert_eq!(k, &key(*v));
        }
    }

    #[test]
    fn random_take_drains_everything() {
        let mut dict = Dict::new();
        for i in 0..32 {
            dict.set(key(i), i);
        }
        let mut taken = HashSet::new();
        while let Some((k, _)) = dict.random_take() {
            assert!(taken.insert(k.to_vec()));
        }
        assert_eq!(taken.len(), 32);
        assert!(dict.is_empty());
    }
}
