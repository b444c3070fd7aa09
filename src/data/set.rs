use bytes::Bytes;

use crate::data::dict::Dict;

/// Unordered member set over the rehashing dictionary.
#[derive(Default)]
pub struct Set {
    members: Dict<()>,
}

impl Set {
    pub fn new() -> Self {
        Set {
            members: Dict::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns false when the member was already present.
    pub fn add(&mut self, member: Bytes) -> bool {
        self.members.set_if_absent(member, ())
    }

    pub fn contains(&mut self, member: &[u8]) -> bool {
        self.members.contains(member)
    }

    /// Membership test without driving a rehash step, so two sets can be
    /// inspected at the same time.
    pub fn has(&self, member: &[u8]) -> bool {
        self.members.peek(member).is_some()
    }

    pub fn remove(&mut self, member: &[u8]) -> bool {
        self.members.remove(member).is_some()
    }

    pub fn random_member(&mut self) -> Option<Bytes> {
        self.members.random_entry().map(|(member, _)| member.clone())
    }

    /// Remove and return a random member.
    pub fn pop(&mut self) -> Option<Bytes> {
        self.members.random_take().map(|(member, _)| member)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.members.iter().map(|(member, _)| member)
    }

    pub fn intersection(&self, other: &Set) -> Vec<Bytes> {
        self.iter()
            .filter(|member| other.has(member))
            .cloned()
            .collect()
    }

    pub fn difference(&self, other: &Set) -> Vec<Bytes> {
        self.iter()
            .filter(|member| !other.has(member))
            .cloned()
            .collect()
    }

    pub fn union(&self, other: &Set) -> Vec<Bytes> {
        let mut out: Vec<Bytes> = self.iter().cloned().collect();
        for member in other.iter() {
            if !out.iter().any(|m| m == member) {
                out.push(member.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(members: &[&str]) -> Set {
        let mut set = Set::new();
        for member in members {
            set.add(Bytes::copy_from_slice(member.as_bytes()));
        }
        set
    }

    fn sorted(mut members: Vec<Bytes>) -> Vec<Bytes> {
        members.sort();
        members
    }

    #[test]
    fn add_is_idempotent() {
        let mut set = Set::new();
        assert!(set.add(Bytes::from("a")));
        assert!(!set.add(Bytes::from("a")));
        assert_eq!(set.len(), 1);
        assert!(set.contains(b"a"));
    }

    #[test]
    fn remove_and_pop_drain() {
        let mut set = set_of(&["a", "b"]);
        assert!(set.remove(b"a"));
        assert!(!set.remove(b"a"));
        assert_eq!(set.pop(), Some(Bytes::from("b")));
        assert_eq!(set.pop(), None);
    }

    #[test]
    fn random_member_does_not_remove() {
        let mut set = set_of(&["only"]);
        assert_eq!(set.random_member(), Some(Bytes::from("only")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn algebra() {
        let a = set_of(&["x", "y", "z"]);
        let b = set_of(&["y", "z", "w"]);

        assert_eq!(
            sorted(a.intersection(&b)),
            vec![Bytes::from("y"), Bytes::from("z")]
        );
        assert_eq!(sorted(a.difference(&b)), vec![Bytes::from("x")]);
        assert_eq!(
            sorted(a.union(&b)),
            vec![
                Bytes::from("w"),
                Bytes::from("x"),
                Bytes::from("y"),
                Bytes::from("z")
            ]
        );
    }
}
