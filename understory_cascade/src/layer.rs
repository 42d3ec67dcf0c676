// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property override layers.
//!
//! A [`Layer`] is one batch of property assignments. A style holds its layers
//! in insertion order and later layers override earlier ones. Within a layer,
//! keys keep their insertion order so that equal-priority writes resolve
//! deterministically.

use alloc::boxed::Box;

use smallvec::SmallVec;

/// Most layers come from single assignments.
const INLINE_ENTRIES: usize = 2;

/// An insertion-ordered batch of `key → raw value` assignments.
///
/// # Example
///
/// ```rust
/// use understory_cascade::Layer;
///
/// let mut layer = Layer::new();
/// layer.insert("color", 0xff0000_u32);
/// layer.insert("size", 12);
/// layer.insert("color", 0x00ff00);
///
/// assert_eq!(layer.len(), 2);
/// assert_eq!(layer.get("color"), Some(&0x00ff00));
/// assert_eq!(layer.keys().collect::<Vec<_>>(), ["color", "size"]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Layer<V> {
    entries: SmallVec<[(Box<str>, V); INLINE_ENTRIES]>,
}

impl<V> Default for Layer<V> {
    fn default() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }
}

impl<V> Layer<V> {
    /// Creates an empty layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a layer holding a single assignment.
    #[must_use]
    pub fn single(key: &str, value: V) -> Self {
        let mut layer = Self::new();
        layer.insert(key, value);
        layer
    }

    /// Returns the number of keys in this layer.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if this layer assigns nothing.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assigns `value` to `key`, keeping the key's original position if it
    /// was already present. Returns the previous value.
    pub fn insert(&mut self, key: &str, value: V) -> Option<V> {
        match self.entries.iter_mut().find(|(k, _)| &**k == key) {
            Some((_, slot)) => Some(core::mem::replace(slot, value)),
            None => {
                self.entries.push((Box::from(key), value));
                None
            }
        }
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let position = self.entries.iter().position(|(k, _)| &**k == key)?;
        Some(self.entries.remove(position).1)
    }

    /// Returns the value assigned to `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, v)| v)
    }

    /// Returns `true` if this layer assigns `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| &**k == key)
    }

    /// Returns the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(k, _)| &**k)
    }

    /// Returns the assignments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> + '_ {
        self.entries.iter().map(|(k, v)| (&**k, v))
    }

    /// Keeps only the assignments for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|(k, _)| keep(&**k));
    }
}

impl<'k, V> FromIterator<(&'k str, V)> for Layer<V> {
    fn from_iter<I: IntoIterator<Item = (&'k str, V)>>(iter: I) -> Self {
        let mut layer = Self::new();
        for (key, value) in iter {
            layer.insert(key, value);
        }
        layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn insert_replaces_in_place() {
        let mut layer = Layer::new();
        assert_eq!(layer.insert("a", 1), None);
        assert_eq!(layer.insert("b", 2), None);
        assert_eq!(layer.insert("a", 3), Some(1));
        assert_eq!(layer.iter().collect::<Vec<_>>(), [("a", &3), ("b", &2)]);
    }

    #[test]
    fn remove_and_contains() {
        let mut layer: Layer<i32> = [("a", 1), ("b", 2)].into_iter().collect();
        assert!(layer.contains_key("a"));
        assert_eq!(layer.remove("a"), Some(1));
        assert_eq!(layer.remove("a"), None);
        assert!(!layer.contains_key("a"));
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn retain_can_empty_layer() {
        let mut layer = Layer::single("a", 1);
        layer.retain(|k| k != "a");
        assert!(layer.is_empty());
    }
}
