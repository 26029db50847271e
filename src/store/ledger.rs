use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A record that may appear at most once per key.
pub trait Keyed {
    type Key: Eq + Hash + Clone + Debug;

    fn key(&self) -> Self::Key;
}

/// Insertion-ordered records with a composite-key index.
///
/// Serializes as a plain JSON array, so the stored shape is the same as a
/// `Vec<T>`. Loading an array that repeats a key keeps the position of the
/// first occurrence and the contents of the last one.
#[derive(Debug, Clone)]
pub struct UniqueLedger<T: Keyed> {
    records: Vec<T>,
    index: HashMap<T::Key, usize>,
}

impl<T: Keyed> Default for UniqueLedger<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Keyed> UniqueLedger<T> {
    pub fn from_records(records: Vec<T>) -> Self {
        let mut ledger = Self::default();
        for record in records {
            let key = record.key();
            match ledger.index.get(&key) {
                Some(&pos) => ledger.records[pos] = record,
                None => {
                    ledger.index.insert(key, ledger.records.len());
                    ledger.records.push(record);
                }
            }
        }
        ledger
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.index.get(key).map(|&pos| &self.records[pos])
    }

    /// Finds the record for `key` and hands it to `update`, or appends the
    /// record built by `create`. Either way exactly one record holds the key
    /// afterwards and an existing record keeps its position.
    pub fn upsert_with<C, U>(&mut self, key: T::Key, create: C, update: U) -> &T
    where
        C: FnOnce() -> T,
        U: FnOnce(&mut T),
    {
        let pos = match self.index.get(&key) {
            Some(&pos) => {
                update(&mut self.records[pos]);
                pos
            }
            None => {
                let record = create();
                debug_assert!(record.key() == key);
                let pos = self.records.len();
                self.records.push(record);
                self.index.insert(key, pos);
                pos
            }
        };
        &self.records[pos]
    }

    /// Keeps only the records matching `keep`. Returns how many were dropped.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.records.len();
        self.records.retain(keep);
        self.reindex();
        before - self.records.len()
    }

    fn reindex(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(pos, r)| (r.key(), pos))
            .collect();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Keyed + Clone> UniqueLedger<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.records.clone()
    }
}

impl<T: Keyed + PartialEq> PartialEq for UniqueLedger<T> {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl<'a, T: Keyed> IntoIterator for &'a UniqueLedger<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl<T: Keyed> From<Vec<T>> for UniqueLedger<T> {
    fn from(records: Vec<T>) -> Self {
        Self::from_records(records)
    }
}

impl<T: Keyed + Serialize> Serialize for UniqueLedger<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.records.serialize(serializer)
    }
}

impl<'de, T: Keyed + Deserialize<'de>> Deserialize<'de> for UniqueLedger<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<T>::deserialize(deserializer).map(Self::from_records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Mark {
        who: String,
        day: u32,
        value: u32,
    }

    impl Keyed for Mark {
        type Key = (String, u32);

        fn key(&self) -> Self::Key {
            (self.who.clone(), self.day)
        }
    }

    fn mark(who: &str, day: u32, value: u32) -> Mark {
        Mark {
            who: who.to_string(),
            day,
            value,
        }
    }

    #[test]
    fn test_upsert_keeps_one_record_per_key() {
        let mut ledger = UniqueLedger::default();
        ledger.upsert_with(("a".into(), 1), || mark("a", 1, 10), |m| m.value = 10);
        ledger.upsert_with(("b".into(), 1), || mark("b", 1, 20), |m| m.value = 20);
        ledger.upsert_with(("a".into(), 1), || mark("a", 1, 99), |m| m.value = 30);

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.as_slice()[0], mark("a", 1, 30));
        assert_eq!(ledger.get(&("b".into(), 1)).map(|m| m.value), Some(20));
    }

    #[test]
    fn test_retain_rebuilds_the_index() {
        let mut ledger = UniqueLedger::from_records(vec![
            mark("a", 1, 1),
            mark("b", 1, 2),
            mark("a", 2, 3),
        ]);

        let removed = ledger.retain(|m| m.who != "a");
        assert_eq!(removed, 2);
        assert_eq!(ledger.get(&("b".into(), 1)).map(|m| m.value), Some(2));
        assert!(ledger.get(&("a".into(), 2)).is_none());

        ledger.upsert_with(("a".into(), 2), || mark("a", 2, 4), |_| {});
        assert_eq!(ledger.as_slice()[1], mark("a", 2, 4));
    }

    #[test]
    fn test_loading_duplicates_collapses_to_the_last_value() {
        let json = r#"[{"who":"a","day":1,"value":1},{"who":"b","day":1,"value":2},{"who":"a","day":1,"value":3}]"#;
        let ledger: UniqueLedger<Mark> = serde_json::from_str(json).unwrap();

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.as_slice()[0], mark("a", 1, 3));
        assert_eq!(
            serde_json::to_string(&ledger).unwrap(),
            r#"[{"who":"a","day":1,"value":3},{"who":"b","day":1,"value":2}]"#
        );
    }
}
