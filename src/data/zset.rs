use bytes::Bytes;

use crate::data::dict::Dict;
use crate::data::skiplist::SkipList;

/// What a ZADD did for one `(member, score)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZaddOutcome {
    Added,
    Updated,
    Unchanged,
}

/// Sorted set: a score dictionary paired with a skip list over the same
/// members. The dictionary answers score lookups in O(1); the skip list
/// keeps `(score, member)` order for ranges and ranks. Both sides always
/// hold exactly the same member set.
#[derive(Default)]
pub struct SortedSet {
    scores: Dict<f64>,
    index: SkipList,
}

impl SortedSet {
    pub fn new() -> Self {
        SortedSet {
            scores: Dict::new(),
            index: SkipList::new(),
        }
    }

    pub fn len(&self) -> u64 {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn score(&mut self, member: &[u8]) -> Option<f64> {
        self.scores.get(member).copied()
    }

    pub fn add(&mut self, member: Bytes, score: f64) -> ZaddOutcome {
        match self.scores.get(&member).copied() {
            Some(old) if old == score => ZaddOutcome::Unchanged,
            Some(old) => {
                self.scores.set(member.clone(), score);
                self.index.update_score(old, &member, score);
                ZaddOutcome::Updated
            }
            None => {
                self.scores.set(member.clone(), score);
                self.index.insert(score, member);
                ZaddOutcome::Added
            }
        }
    }

    /// Remove a member from both sides. Returns false when absent.
    pub fn remove(&mut self, member: &[u8]) -> bool {
        let Some(score) = self.scores.remove(member) else {
            return false;
        };
        self.index.delete(score, member)
    }

    /// Take the smallest `(score, member)` pair.
    pub fn pop_min(&mut self) -> Option<(Bytes, f64)> {
        let (member, score) = {
            let (member, score) = self.index.first()?;
            (member.clone(), score)
        };
        self.index.delete(score, &member);
        self.scores.remove(&member);
        Some((member, score))
    }

    pub fn rank(&mut self, member: &[u8]) -> Option<u64> {
        let score = self.score(member)?;
        self.index.rank_of(score, member)
    }

    pub fn count_in_range(&self, low: f64, high: f64) -> u64 {
        self.index.count_in_score_range(low, high)
    }

    /// Members in `(score, member)` order.
    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, f64)> {
        self.index.iter()
    }
}
