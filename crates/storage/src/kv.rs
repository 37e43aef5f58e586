//! KvStore: pure in-memory mapping
//!
//! ## Semantics
//!
//! - `set` never overwrites: it inserts only when the key is absent
//! - `get` and `delete` report a missing key as `None`, never as an error
//! - `replace` swaps the whole mapping, which is how a snapshot load lands
//!
//! A key is present if and only if it was inserted by a successful `set` and
//! not removed by a later `delete` (or a later `replace` says otherwise).

use gatekv_core::{StoreKey, StoreValue, Value};
use std::collections::hash_map::{HashMap, Iter};

/// In-memory key-value map
#[derive(Debug, Clone)]
pub struct KvStore<K, V = Value> {
    data: HashMap<K, V>,
}

impl<K: StoreKey, V: StoreValue> Default for KvStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StoreKey, V: StoreValue> KvStore<K, V> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// Insert `value` under `key` unless the key is already present.
    ///
    /// Returns `true` if the value was inserted, `false` if the key existed
    /// (in which case the stored value is left untouched).
    pub fn set(&mut self, key: K, value: V) -> bool {
        use std::collections::hash_map::Entry;
        match self.data.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// Look up a key
    pub fn get(&self, key: &K) -> Option<&V> {
        self.data.get(key)
    }

    /// Remove a key, returning its prior value
    pub fn delete(&mut self, key: &K) -> Option<V> {
        self.data.remove(key)
    }

    /// Returns true if the key is present
    pub fn contains_key(&self, key: &K) -> bool {
        self.data.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over all entries in unspecified order
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.data.iter()
    }

    /// Discard the current mapping and adopt `data` wholesale.
    ///
    /// Never merges: keys absent from `data` are gone afterwards.
    pub fn replace(&mut self, data: HashMap<K, V>) {
        self.data = data;
    }

    /// Borrow the underlying mapping
    pub fn as_map(&self) -> &HashMap<K, V> {
        &self.data
    }

    /// Consume the store, returning the underlying mapping
    pub fn into_inner(self) -> HashMap<K, V> {
        self.data
    }
}

impl<K: StoreKey, V: StoreValue> From<HashMap<K, V>> for KvStore<K, V> {
    fn from(data: HashMap<K, V>) -> Self {
        Self { data }
    }
}

impl<K: StoreKey, V: StoreValue + PartialEq> PartialEq for KvStore<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<'a, K: StoreKey, V: StoreValue> IntoIterator for &'a KvStore<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_set_then_get() {
        let mut store: KvStore<i64> = KvStore::new();
        assert!(store.set(0, Value::Int(1)));
        assert_eq!(store.get(&0), Some(&Value::Int(1)));
    }

    #[test]
    fn test_set_never_overwrites() {
        let mut store: KvStore<i64> = KvStore::new();
        assert!(store.set(0, Value::from("first")));
        assert!(!store.set(0, Value::from("second")));
        assert_eq!(store.get(&0), Some(&Value::from("first")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing_is_none() {
        let store: KvStore<String> = KvStore::new();
        assert!(store.get(&"nope".to_string()).is_none());
    }

    #[test]
    fn test_delete_present_and_absent() {
        let mut store: KvStore<i64> = KvStore::new();
        store.set(3, Value::Bool(true));

        assert_eq!(store.delete(&3), Some(Value::Bool(true)));
        assert!(store.get(&3).is_none());

        assert_eq!(store.delete(&3), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_after_delete_inserts_again() {
        let mut store: KvStore<i64> = KvStore::new();
        store.set(1, Value::Int(1));
        store.delete(&1);
        assert!(store.set(1, Value::Int(2)));
        assert_eq!(store.get(&1), Some(&Value::Int(2)));
    }

    #[test]
    fn test_replace_discards_previous_contents() {
        let mut store: KvStore<i64> = KvStore::new();
        store.set(1, Value::Int(1));
        store.set(2, Value::Int(2));

        let mut incoming = HashMap::new();
        incoming.insert(9, Value::Int(9));
        store.replace(incoming);

        assert!(!store.contains_key(&1));
        assert!(!store.contains_key(&2));
        assert_eq!(store.get(&9), Some(&Value::Int(9)));
        assert_eq!(store.len(), 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(u8, i64),
        Delete(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any::<u8>(), any::<i64>()).prop_map(|(k, v)| Op::Set(k % 16, v)),
            any::<u8>().prop_map(|k| Op::Delete(k % 16)),
        ]
    }

    proptest! {
        /// The store agrees with a reference model built from insert-if-absent
        /// and remove on a plain HashMap.
        #[test]
        fn prop_matches_reference_model(ops in proptest::collection::vec(op_strategy(), 0..64)) {
            let mut store: KvStore<u8, i64> = KvStore::new();
            let mut model: HashMap<u8, i64> = HashMap::new();

            for op in ops {
                match op {
                    Op::Set(k, v) => {
                        let expected = !model.contains_key(&k);
                        if expected {
                            model.insert(k, v);
                        }
                        prop_assert_eq!(store.set(k, v), expected);
                    }
                    Op::Delete(k) => {
                        prop_assert_eq!(store.delete(&k), model.remove(&k));
                    }
                }
            }

            prop_assert_eq!(store.as_map(), &model);
        }
    }
}
