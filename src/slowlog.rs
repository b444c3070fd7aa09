use bytes::Bytes;

use crate::data::List;

/// One command that ran over the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct SlowLogEntry {
    pub id: i64,
    /// Start of execution, microseconds since the epoch.
    pub time: i64,
    /// Execution time in microseconds.
    pub duration: i64,
    pub args: Vec<Bytes>,
}

/// Bounded ring of slow commands, newest at the head.
pub struct SlowLog {
    entries: List<SlowLogEntry>,
    max_len: usize,
    worker_id: u16,
    next_seq: u64,
}

impl SlowLog {
    pub fn new(worker_id: u16, max_len: usize) -> Self {
        SlowLog {
            entries: List::new(),
            max_len,
            worker_id,
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record(&mut self, time: i64, duration: i64, args: Vec<Bytes>) {
        while self.entries.len() >= self.max_len.max(1) {
            self.entries.rpop();
        }
        let id = self.next_id();
        self.entries.lpush(SlowLogEntry {
            id,
            time,
            duration,
            args,
        });
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &SlowLogEntry> {
        self.entries.iter()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Ids fold the worker id into the high bits so entries from different
    /// workers never collide.
    fn next_id(&mut self) -> i64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        ((self.worker_id as i64) << 48) | (seq as i64 & 0xffff_ffff_ffff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cmd: &str) -> Vec<Bytes> {
        cmd.split(' ').map(|s| Bytes::copy_from_slice(s.as_bytes())).collect()
    }

    #[test]
    fn newest_entry_is_first() {
        let mut log = SlowLog::new(0, 8);
        log.record(100, 5000, args("GET a"));
        log.record(200, 7000, args("GET b"));

        let durations: Vec<i64> = log.iter().map(|e| e.duration).collect();
        assert_eq!(durations, vec![7000, 5000]);
    }

    #[test]
    fn trims_oldest_past_the_cap() {
        let mut log = SlowLog::new(0, 3);
        for i in 0..10 {
            log.record(i, i, args("PING"));
        }
        assert_eq!(log.len(), 3);
        let times: Vec<i64> = log.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![9, 8, 7]);
    }

    #[test]
    fn ids_are_unique_and_carry_the_worker() {
        let mut log = SlowLog::new(7, 8);
        log.record(0, 0, args("PING"));
        log.record(0, 0, args("PING"));
        let ids: Vec<i64> = log.iter().map(|e| e.id).collect();
        assert_ne!(ids[0], ids[1]);
        for id in ids {
            assert_eq!(id >> 48, 7);
        }
    }

    #[test]
    fn reset_clears_everything() {
        let mut log = SlowLog::new(0, 8);
        log.record(0, 0, args("PING"));
        log.reset();
        assert!(log.is_empty());
    }
}
