// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style nodes and their build state.
//!
//! A [`StyleNode`] is the unit of inheritance: an optional name, a declared
//! parent name, ordered override layers, and a variant selector. Once built,
//! it also carries its two resolved parent links and a resolved-value cache.
//! Every mutation that can change resolution drops the build state.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::config::VariantIndex;
use crate::layer::Layer;
use crate::name::StyleName;
use crate::property::PropertyIndex;

/// Handle to a style node owned by a [`StyleRegistry`](crate::StyleRegistry).
///
/// Handles are small and copyable. They carry the registry generation they
/// were issued in, so a handle kept across
/// [`reset`](crate::StyleRegistry::reset) is reported as stale instead of
/// aliasing a newer node.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct StyleId {
    index: u32,
    generation: u32,
}

impl StyleId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) const fn idx(self) -> usize {
        self.index as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StyleId({}v{})", self.index, self.generation)
    }
}

/// Output of a build: both parent links and the merged cache.
#[derive(Debug)]
pub(crate) struct Resolved<V> {
    /// Arena index of the declared parent.
    pub(crate) down: Option<usize>,
    /// Arena index of the enclosing style.
    pub(crate) left: Option<usize>,
    /// `variant × width + property` slots; absent when the node has no layers.
    pub(crate) cache: Option<Box<[Option<V>]>>,
    /// Property count the cache was laid out with.
    pub(crate) width: usize,
}

impl<V> Resolved<V> {
    pub(crate) fn slot(&self, variant: VariantIndex, property: PropertyIndex) -> Option<&V> {
        let column = usize::from(property.index());
        if column >= self.width {
            return None;
        }
        let cache = self.cache.as_ref()?;
        cache
            .get(usize::from(variant.index()) * self.width + column)?
            .as_ref()
    }
}

#[derive(Debug)]
pub(crate) enum BuildState<V> {
    Unbuilt,
    /// On the build stack; reaching it again means a cycle.
    Building,
    Built(Resolved<V>),
}

/// A named (or anonymous) style with layered property overrides.
///
/// Nodes are created and owned by a [`StyleRegistry`](crate::StyleRegistry);
/// use [`StyleRegistry::node_mut`](crate::StyleRegistry::node_mut) to
/// declare properties on them.
#[derive(Debug)]
pub struct StyleNode<V> {
    name: Option<StyleName>,
    parent: Option<StyleName>,
    layers: Vec<Layer<V>>,
    variant: VariantIndex,
    pub(crate) state: BuildState<V>,
}

impl<V> StyleNode<V> {
    pub(crate) fn new(name: Option<StyleName>, parent: Option<StyleName>) -> Self {
        Self {
            name,
            parent,
            layers: Vec::new(),
            variant: VariantIndex::DEFAULT,
            state: BuildState::Unbuilt,
        }
    }

    /// Returns the registered name, or `None` for anonymous styles.
    #[must_use]
    #[inline]
    pub fn name(&self) -> Option<&StyleName> {
        self.name.as_ref()
    }

    /// Returns the declared parent name.
    #[must_use]
    #[inline]
    pub fn parent(&self) -> Option<&StyleName> {
        self.parent.as_ref()
    }

    /// Returns the override layers, earliest first.
    #[must_use]
    #[inline]
    pub fn layers(&self) -> &[Layer<V>] {
        &self.layers
    }

    /// Returns the selected variant.
    #[must_use]
    #[inline]
    pub fn variant(&self) -> VariantIndex {
        self.variant
    }

    /// Returns `true` if the node has a current build.
    #[must_use]
    #[inline]
    pub fn is_built(&self) -> bool {
        matches!(self.state, BuildState::Built(_))
    }

    /// Returns `true` if the node is built and owns a resolved cache.
    #[must_use]
    pub fn has_cache(&self) -> bool {
        matches!(&self.state, BuildState::Built(r) if r.cache.is_some())
    }

    /// Returns `true` if any layer assigns `key`.
    #[must_use]
    pub fn has_property(&self, key: &str) -> bool {
        self.layers.iter().any(|l| l.contains_key(key))
    }

    /// Appends a single-assignment layer `{key: value}`.
    pub fn set_property(&mut self, key: &str, value: V) {
        self.layers.push(Layer::single(key, value));
        self.unbuild();
    }

    /// Appends a layer as one batch.
    pub fn push_layer(&mut self, layer: Layer<V>) {
        self.layers.push(layer);
        self.unbuild();
    }

    /// Removes `key` from every layer. Emptied layers stay in place.
    ///
    /// Returns `true` if any layer held the key.
    pub fn remove_property(&mut self, key: &str) -> bool {
        let mut removed = false;
        for layer in &mut self.layers {
            removed |= layer.remove(key).is_some();
        }
        self.unbuild();
        removed
    }

    /// Replaces the declared parent.
    pub fn set_parent(&mut self, parent: Option<StyleName>) {
        self.parent = parent;
        self.unbuild();
    }

    /// Drops every layer.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.unbuild();
    }

    /// Replaces the layers wholesale.
    pub fn replace_layers(&mut self, layers: Vec<Layer<V>>) {
        self.layers = layers;
        self.unbuild();
    }

    /// Appends the keys of `defaults` that no existing layer assigns.
    ///
    /// Keys already set anywhere are dropped from the batch; the rest, if
    /// any, become one new layer.
    pub fn set_defaults(&mut self, mut defaults: Layer<V>) {
        defaults.retain(|key| !self.layers.iter().any(|l| l.contains_key(key)));
        if defaults.is_empty() {
            return;
        }
        self.push_layer(defaults);
    }

    /// Selects the variant used by [`StyleRegistry::get`](crate::StyleRegistry::get).
    ///
    /// This does not touch the build: the cache holds every variant.
    /// Returns `true` if the selection changed. Callers go through
    /// [`StyleRegistry::set_variant`](crate::StyleRegistry::set_variant),
    /// which checks the tag against the configuration.
    pub(crate) fn set_variant(&mut self, variant: VariantIndex) -> bool {
        if self.variant == variant {
            return false;
        }
        self.variant = variant;
        true
    }

    pub(crate) fn set_name(&mut self, name: StyleName) {
        self.name = Some(name);
        self.unbuild();
    }

    pub(crate) fn resolved(&self) -> Option<&Resolved<V>> {
        match &self.state {
            BuildState::Built(resolved) => Some(resolved),
            _ => None,
        }
    }

    /// Drops the links and the cache together.
    pub(crate) fn unbuild(&mut self) {
        self.state = BuildState::Unbuilt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn built<V>(node: &mut StyleNode<V>) {
        node.state = BuildState::Built(Resolved {
            down: None,
            left: None,
            cache: None,
            width: 0,
        });
    }

    #[test]
    fn set_property_appends_layer_and_dirties() {
        let mut node = StyleNode::new(Some(StyleName::new("a")), None);
        built(&mut node);
        node.set_property("color", 1);
        node.set_property("color", 2);
        assert_eq!(node.layers().len(), 2);
        assert!(!node.is_built());
    }

    #[test]
    fn remove_property_keeps_empty_layers() {
        let mut node = StyleNode::new(None, None);
        node.set_property("color", 1);
        node.push_layer([("color", 2), ("size", 3)].into_iter().collect());
        built(&mut node);

        assert!(node.remove_property("color"));
        assert_eq!(node.layers().len(), 2);
        assert!(node.layers()[0].is_empty());
        assert!(!node.has_property("color"));
        assert!(node.has_property("size"));
        assert!(!node.is_built());
    }

    #[test]
    fn set_defaults_skips_existing_keys() {
        let mut node = StyleNode::new(None, None);
        node.set_property("color", 1);

        node.set_defaults([("color", 9), ("size", 4)].into_iter().collect());
        assert_eq!(node.layers().len(), 2);
        assert_eq!(node.layers()[1].keys().collect::<Vec<_>>(), ["size"]);

        // Nothing new: no layer appended.
        node.set_defaults(Layer::single("size", 5));
        assert_eq!(node.layers().len(), 2);
    }

    #[test]
    fn variant_selection_keeps_build() {
        let mut node: StyleNode<i32> = StyleNode::new(None, None);
        built(&mut node);
        assert!(!node.set_variant(VariantIndex::DEFAULT));
        assert!(node.set_variant(VariantIndex::new(2)));
        assert_eq!(node.variant(), VariantIndex::new(2));
        assert!(node.is_built());
    }

    #[test]
    fn clear_and_replace_dirty() {
        let mut node = StyleNode::new(None, Some(StyleName::new("base")));
        node.set_property("a", 1);
        built(&mut node);
        node.clear();
        assert!(node.layers().is_empty());
        assert!(!node.is_built());

        built(&mut node);
        node.replace_layers(vec![Layer::single("b", 2)]);
        assert_eq!(node.layers().len(), 1);
        assert!(!node.is_built());

        built(&mut node);
        node.set_parent(None);
        assert_eq!(node.parent(), None);
        assert!(!node.is_built());
    }

    #[test]
    fn resolved_slot_bounds() {
        let resolved = Resolved {
            down: None,
            left: None,
            cache: Some(Box::from([Some(1), None, Some(3), Some(4)])),
            width: 2,
        };
        assert_eq!(resolved.slot(VariantIndex::DEFAULT, PropertyIndex::new(0)), Some(&1));
        assert_eq!(resolved.slot(VariantIndex::DEFAULT, PropertyIndex::new(1)), None);
        assert_eq!(resolved.slot(VariantIndex::new(1), PropertyIndex::new(1)), Some(&4));
        assert_eq!(resolved.slot(VariantIndex::new(2), PropertyIndex::new(0)), None);
        assert_eq!(resolved.slot(VariantIndex::DEFAULT, PropertyIndex::new(2)), None);
    }
}
