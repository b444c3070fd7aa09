use bytes::Bytes;
use rand::Rng;

/// Hard cap on node height.
pub const MAX_LEVEL: usize = 32;
/// Probability that a node gains one more level.
const P_BRANCH: f64 = 0.25;

const HEAD: usize = 0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Link {
    forward: Option<usize>,
    /// Level-0 positions this link crosses; a trailing link (no forward)
    /// stores the distance to the end of the list.
    span: u64,
}

#[derive(Debug)]
struct Node {
    member: Bytes,
    score: f64,
    backward: Option<usize>,
    levels: Vec<Link>,
}

/// Probabilistic ordered index over `(score, member)` pairs.
///
/// Nodes live in an arena and link to each other by index, so splicing
/// never moves a node. Every forward link carries a span, which makes rank
/// queries logarithmic.
pub struct SkipList {
    nodes: Vec<Node>,
    free: Vec<usize>,
    level: usize,
    length: u64,
    tail: Option<usize>,
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

impl SkipList {
    pub fn new() -> Self {
        SkipList {
            nodes: vec![Node {
                member: Bytes::new(),
                score: 0.0,
                backward: None,
                levels: vec![Link::default(); MAX_LEVEL],
            }],
            free: Vec::new(),
            level: 1,
            length: 0,
            tail: None,
        }
    }

    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn insert(&mut self, score: f64, member: Bytes) {
        let mut update = [HEAD; MAX_LEVEL];
        let mut rank = [0u64; MAX_LEVEL];

        let mut x = HEAD;
        for i in (0..self.level).rev() {
            rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
            while let Some(next) = self.nodes[x].levels[i].forward {
                if !precedes(&self.nodes[next], score, &member) {
                    break;
                }
                rank[i] += self.nodes[x].levels[i].span;
                x = next;
            }
            update[i] = x;
        }

        let level = self.random_level();
        if level > self.level {
            for i in self.level..level {
                rank[i] = 0;
                update[i] = HEAD;
                self.nodes[HEAD].levels[i].span = self.length;
            }
            self.level = level;
        }

        let node = self.alloc(score, member, level);
        for i in 0..level {
            let prev = update[i];
            let prev_link = self.nodes[prev].levels[i];
            self.nodes[node].levels[i] = Link {
                forward: prev_link.forward,
                span: prev_link.span - (rank[0] - rank[i]),
            };
            self.nodes[prev].levels[i] = Link {
                forward: Some(node),
                span: (rank[0] - rank[i]) + 1,
            };
        }
        for i in level..self.level {
            self.nodes[update[i]].levels[i].span += 1;
        }

        self.nodes[node].backward = (update[0] != HEAD).then_some(update[0]);
        match self.nodes[node].levels[0].forward {
            Some(next) => self.nodes[next].backward = Some(node),
            None => self.tail = Some(node),
        }
        self.length += 1;
    }

    /// Remove the node matching both score and member exactly. Returns
    /// whether it was found.
    pub fn delete(&mut self, score: f64, member: &[u8]) -> bool {
        let mut update = [HEAD; MAX_LEVEL];
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].levels[i].forward {
                if !precedes(&self.nodes[next], score, member) {
                    break;
                }
                x = next;
            }
            update[i] = x;
        }
        let Some(target) = self.nodes[x].levels[0].forward else {
            return false;
        };
        if self.nodes[target].score != score || self.nodes[target].member.as_ref() != member {
            return false;
        }
        self.unlink(target, &update);
        true
    }

    /// Move a member to a new score. The node is deleted and reinserted so
    /// the ordering key never disagrees with the stored score.
    pub fn update_score(&mut self, old_score: f64, member: &[u8], new_score: f64) {
        if self.delete(old_score, member) {
            self.insert(new_score, Bytes::copy_from_slice(member));
        }
    }

    /// 1-based position of a member under the `(score, member)` ordering.
    pub fn rank_of(&self, score: f64, member: &[u8]) -> Option<u64> {
        let mut rank = 0u64;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].levels[i].forward {
                let node = &self.nodes[next];
                let into_target = node.score < score
                    || (node.score == score && node.member.as_ref() <= member);
                if !into_target {
                    break;
                }
                rank += self.nodes[x].levels[i].span;
                x = next;
            }
            if x != HEAD
                && self.nodes[x].score == score
                && self.nodes[x].member.as_ref() == member
            {
                return Some(rank);
            }
        }
        None
    }

    /// Node at a 1-based rank.
    pub fn element_by_rank(&self, rank: u64) -> Option<(&Bytes, f64)> {
        if rank == 0 || rank > self.length {
            return None;
        }
        let mut traversed = 0u64;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].levels[i].forward {
                if traversed + self.nodes[x].levels[i].span > rank {
                    break;
                }
                traversed += self.nodes[x].levels[i].span;
                x = next;
            }
            if traversed == rank && x != HEAD {
                let node = &self.nodes[x];
                return Some((&node.member, node.score));
            }
        }
        None
    }

    /// Members with `low <= score <= high`, counted on the bottom level.
    pub fn count_in_score_range(&self, low: f64, high: f64) -> u64 {
        let mut count = 0;
        for (_, score) in self.iter() {
            if score > high {
                break;
            }
            if score >= low {
                count += 1;
            }
        }
        count
    }

    /// First member in `(score, member)` order, without removing it.
    pub fn first(&self) -> Option<(&Bytes, f64)> {
        let idx = self.nodes[HEAD].levels[0].forward?;
        let node = &self.nodes[idx];
        Some((&node.member, node.score))
    }

    /// Bottom-level walk in `(score, member)` order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            next: self.nodes[HEAD].levels[0].forward,
        }
    }

    fn alloc(&mut self, score: f64, member: Bytes, level: usize) -> usize {
        let node = Node {
            member,
            score,
            backward: None,
            levels: vec![Link::default(); level],
        };
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn unlink(&mut self, target: usize, update: &[usize; MAX_LEVEL]) {
        for i in 0..self.level {
            let prev = update[i];
            if self.nodes[prev].levels[i].forward == Some(target) {
                let removed = self.nodes[target].levels[i];
                self.nodes[prev].levels[i].span += removed.span;
                self.nodes[prev].levels[i].span -= 1;
                self.nodes[prev].levels[i].forward = removed.forward;
            } else {
                self.nodes[prev].levels[i].span -= 1;
            }
        }
        match self.nodes[target].levels[0].forward {
            Some(next) => self.nodes[next].backward = self.nodes[target].backward,
            None => self.tail = self.nodes[target].backward,
        }
        while self.level > 1 && self.nodes[HEAD].levels[self.level - 1].forward.is_none() {
            self.level -= 1;
        }
        self.length -= 1;
        self.nodes[target] = Node {
            member: Bytes::new(),
            score: 0.0,
            backward: None,
            levels: Vec::new(),
        };
        self.free.push(target);
    }

    fn random_level(&self) -> usize {
        let mut rng = rand::thread_rng();
        let mut level = 1;
        while level < MAX_LEVEL && rng.gen_bool(P_BRANCH) {
            level += 1;
        }
        level
    }
}

/// Does `node` sort strictly before `(score, member)`?
fn precedes(node: &Node, score: f64, member: &[u8]) -> bool {
    node.score < score || (node.score == score && node.member.as_ref() < member)
}

pub struct Iter<'a> {
    list: &'a SkipList,
    next: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a Bytes, f64);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        let node = &self.list.nodes[idx];
        self.next = node.levels[0].forward;
        Some((&node.member, node.score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;

    /// Walk every maintained structure and assert the documented
    /// invariants hold.
    fn check_invariants(list: &SkipList) {
        // Bottom level is sorted by (score, member) and has `length` nodes,
        // with consistent backward pointers.
        let mut count = 0u64;
        let mut prev: Option<usize> = None;
        let mut cursor = list.nodes[HEAD].levels[0].forward;
        while let Some(idx) = cursor {
            let node = &list.nodes[idx];
            if let Some(prev_idx) = prev {
                let prev_node = &list.nodes[prev_idx];
                assert!(
                    (prev_node.score, prev_node.member.as_ref())
                        < (node.score, node.member.as_ref()),
                    "bottom level out of order"
                );
            }
            assert_eq!(node.backward, prev, "backward pointer mismatch");
            count += 1;
            prev = idx.into();
            cursor = node.levels[0].forward;
        }
        assert_eq!(count, list.length, "length does not match bottom walk");
        assert_eq!(list.tail, prev, "tail does not match bottom walk");

        // On every level the spans sum to the length (trailing links count
        // the distance to the end).
        for level in 0..list.level {
            let mut sum = 0u64;
            let mut x = HEAD;
            loop {
                sum += list.nodes[x].levels[level].span;
                match list.nodes[x].levels[level].forward {
                    Some(next) => x = next,
                    None => break,
                }
            }
            assert_eq!(sum, list.length, "span sum broken at level {level}");
        }
    }

    #[test]
    fn insert_orders_by_score_then_member() {
        let mut list = SkipList::new();
        list.insert(2.0, Bytes::from("b"));
        list.insert(1.0, Bytes::from("c"));
        list.insert(1.0, Bytes::from("a"));

        let members: Vec<&str> = list
            .iter()
            .map(|(m, _)| std::str::from_utf8(m).unwrap())
            .collect();
        assert_eq!(members, vec!["a", "c", "b"]);
        check_invariants(&list);
    }

    #[test]
    fn delete_requires_exact_match() {
        let mut list = SkipList::new();
        list.insert(1.0, Bytes::from("a"));
        assert!(!list.delete(2.0, b"a"));
        assert!(!list.delete(1.0, b"b"));
        assert!(list.delete(1.0, b"a"));
        assert!(list.is_empty());
        check_invariants(&list);
    }

    #[test]
    fn rank_is_one_based() {
        let mut list = SkipList::new();
        list.insert(1.0, Bytes::from("m1"));
        list.insert(2.0, Bytes::from("m2"));
        list.insert(1.5, Bytes::from("m3"));

        assert_eq!(list.rank_of(1.0, b"m1"), Some(1));
        assert_eq!(list.rank_of(1.5, b"m3"), Some(2));
        assert_eq!(list.rank_of(2.0, b"m2"), Some(3));
        assert_eq!(list.rank_of(9.0, b"m1"), None);
    }

    #[test]
    fn element_by_rank_descends_spans() {
        let mut list = SkipList::new();
        for i in 1..=100 {
            list.insert(i as f64, Bytes::from(format!("m{i:03}")));
        }
        for rank in [1u64, 2, 50, 99, 100] {
            let (member, score) = list.element_by_rank(rank).unwrap();
            assert_eq!(member, &Bytes::from(format!("m{rank:03}")));
            assert_eq!(score, rank as f64);
        }
        assert_eq!(list.element_by_rank(0), None);
        assert_eq!(list.element_by_rank(101), None);
    }

    #[test]
    fn count_in_score_range_is_inclusive() {
        let mut list = SkipList::new();
        for i in 1..=10 {
            list.insert(i as f64, Bytes::from(format!("m{i}")));
        }
        assert_eq!(list.count_in_score_range(3.0, 7.0), 5);
        assert_eq!(list.count_in_score_range(0.0, 100.0), 10);
        assert_eq!(list.count_in_score_range(11.0, 12.0), 0);
    }

    #[test]
    fn update_score_relocates() {
        let mut list = SkipList::new();
        list.insert(1.0, Bytes::from("a"));
        list.insert(2.0, Bytes::from("b"));
        list.update_score(1.0, b"a", 3.0);

        let members: Vec<&str> = list
            .iter()
            .map(|(m, _)| std::str::from_utf8(m).unwrap())
            .collect();
        assert_eq!(members, vec!["b", "a"]);
        check_invariants(&list);
    }

    #[test]
    fn randomized_inserts_and_deletes_keep_invariants() {
        let mut list = SkipList::new();
        let mut rng = rand::thread_rng();

        let mut entries: Vec<(f64, Bytes)> = (0..300)
            .map(|i| {
                let score = rng.gen_range(0..50) as f64 / 2.0;
                (score, Bytes::from(format!("member-{i}")))
            })
            .collect();
        for (score, member) in &entries {
            list.insert(*score, member.clone());
        }
        check_invariants(&list);

        entries.shuffle(&mut rng);
        for (score, member) in entries.drain(..150) {
            assert!(list.delete(score, &member));
        }
        check_invariants(&list);
        assert_eq!(list.len(), 150);

        // Ranks agree with a bottom-level walk.
        let walked: Vec<(Bytes, f64)> =
            list.iter().map(|(m, s)| (m.clone(), s)).collect();
        for (pos, (member, score)) in walked.iter().enumerate() {
            assert_eq!(list.rank_of(*score, member), Some(pos as u64 + 1));
        }
    }
}
