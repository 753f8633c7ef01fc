// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! A wrapper around a `typed_generational_arena::Arena` that also provides fast lookup.
//!
//! We use `MappedArena` to store type descriptors and built operations. In
//! each of these cases, we need to look up the underlying object given a key:
//! the canonical type name for descriptors, the operation name (or the
//! nesting trail plus the name) for operations. Resolution happens per
//! request, so the lookup must not be a linear search.
//!
//! Unlike a plain map, the arena hands out stable indices, so model parts can
//! reference each other by index instead of by owned keys.

use std::{
    collections::{HashMap, hash_map::Keys},
    hash::Hash,
    ops,
};

use serde::{Deserialize, Serialize};

use typed_generational_arena::{Arena, IgnoreGeneration, Index};

pub type SerializableSlab<T> = Arena<T, usize, IgnoreGeneration>;
pub type SerializableSlabIndex<T> = Index<T, usize, IgnoreGeneration>;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MappedArena<K: Eq + Hash, V> {
    values: SerializableSlab<V>,
    map: HashMap<K, SerializableSlabIndex<V>>,
}

impl<K: Eq + Hash, V> MappedArena<K, V> {
    pub fn values(self) -> SerializableSlab<V> {
        self.values
    }

    pub fn values_ref(&self) -> &SerializableSlab<V> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> Keys<'_, K, SerializableSlabIndex<V>> {
        self.map.keys()
    }

    pub fn get_id<Q>(&self, key: &Q) -> Option<SerializableSlabIndex<V>>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.map.get(key).copied()
    }

    pub fn get_by_key<Q>(&self, key: &Q) -> Option<&V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.get_id(key).map(|id| &self[id])
    }

    pub fn get_by_key_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        if let Some(id) = self.get_id(key) {
            Some(&mut self[id])
        } else {
            None
        }
    }

    pub fn get_by_id_mut(&mut self, id: SerializableSlabIndex<V>) -> &mut V {
        &mut self.values[id]
    }

    /// Interning add: if the key is already present, the existing index is
    /// returned and the value is dropped.
    pub fn add(&mut self, key: K, typ: V) -> SerializableSlabIndex<V> {
        let existing = self.map.get(&key).copied();
        if let Some(existing) = existing {
            return existing;
        }

        let id = self.values.insert(typ);
        self.map.insert(key, id);
        id
    }

    pub fn iter(&self) -> typed_generational_arena::Iter<'_, V, usize, IgnoreGeneration> {
        self.values.iter()
    }
}

impl<K: Eq + Hash, V> Default for MappedArena<K, V> {
    fn default() -> Self {
        MappedArena {
            values: SerializableSlab::new(),
            map: HashMap::default(),
        }
    }
}

impl<K: Eq + Hash, V> ops::Index<SerializableSlabIndex<V>> for MappedArena<K, V> {
    type Output = V;

    #[inline]
    fn index(&self, id: SerializableSlabIndex<V>) -> &V {
        &self.values[id]
    }
}

impl<K: Eq + Hash, V> ops::IndexMut<SerializableSlabIndex<V>> for MappedArena<K, V> {
    #[inline]
    fn index_mut(&mut self, id: SerializableSlabIndex<V>) -> &mut V {
        &mut self.values[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn add_interns_by_key() {
        let mut arena: MappedArena<String, &str> = MappedArena::default();

        let first = arena.add("user".to_string(), "first");
        let second = arena.add("user".to_string(), "second");

        assert_eq!(first, second);
        assert_eq!(arena[first], "first");
    }

    #[multiplatform_test]
    fn composite_keys() {
        let mut arena: MappedArena<(Vec<String>, String), u32> = MappedArena::default();

        let key = (vec!["user".to_string()], "friends".to_string());
        let id = arena.add(key.clone(), 42);

        assert_eq!(arena.get_id(&key), Some(id));
        assert_eq!(arena.get_by_key(&key), Some(&42));
        assert_eq!(
            arena.get_by_key(&(vec![], "friends".to_string())),
            None
        );
    }
}
