// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The style registry: node arena, naming, and declaration surface.
//!
//! Lookups that may create styles are spelled out as such:
//!
//! - [`StyleRegistry::style`] resolves a simple name, synthesizing
//!   `prefix_suffix` styles whose parent is `suffix`.
//! - [`StyleRegistry::child`] resolves `name[segment]`, synthesizing a style
//!   whose parent sits at the same relative position under the declared
//!   parent.
//! - [`StyleRegistry::full_style`] combines both for structured names.
//!
//! [`StyleRegistry::lookup`] and [`StyleRegistry::exists`] never create.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use tracing::debug;

use crate::config::CascadeConfig;
use crate::error::CascadeError;
use crate::name::StyleName;
use crate::node::{StyleId, StyleNode};
use crate::property::{PropertyFunction, PropertyFunctions, PropertyIndex};

/// What a style's declared parent should be.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ParentRef {
    /// No declared parent.
    #[default]
    None,
    /// A parent by name; the style need not exist yet.
    Name(StyleName),
    /// The name of an existing, named style.
    Style(StyleId),
}

impl From<StyleName> for ParentRef {
    fn from(name: StyleName) -> Self {
        Self::Name(name)
    }
}

impl From<Option<StyleName>> for ParentRef {
    fn from(name: Option<StyleName>) -> Self {
        name.map_or(Self::None, Self::Name)
    }
}

impl From<&str> for ParentRef {
    fn from(name: &str) -> Self {
        Self::Name(StyleName::new(name))
    }
}

impl From<StyleId> for ParentRef {
    fn from(id: StyleId) -> Self {
        Self::Style(id)
    }
}

/// Owner of every style node, the name table, and the property functions.
///
/// Nodes live in an arena and are addressed by [`StyleId`]. Names map to at
/// most one node. The registry is single-threaded: resolution takes
/// `&mut self` because it builds caches lazily.
///
/// # Example
///
/// ```rust
/// use understory_cascade::{ParentRef, StyleName, StyleRegistry};
///
/// let mut styles = StyleRegistry::<u32>::default();
/// let color = styles.register_property("color");
///
/// let text = styles.create(StyleName::new("text"), ParentRef::None)?;
/// styles.node_mut(text)?.set_property("color", 0x202020);
///
/// // `button_text` does not exist yet: it is created with `text` as parent.
/// let button_text = styles.style("button_text")?;
/// assert_eq!(styles.get(button_text, color)?, Some(&0x202020));
/// # Ok::<(), understory_cascade::CascadeError>(())
/// ```
pub struct StyleRegistry<V> {
    config: CascadeConfig,
    functions: PropertyFunctions<V>,
    pub(crate) nodes: Vec<StyleNode<V>>,
    pub(crate) names: HashMap<StyleName, usize>,
    generation: u32,
}

impl<V: Clone> Default for StyleRegistry<V> {
    fn default() -> Self {
        Self::new(CascadeConfig::default())
    }
}

impl<V: Clone> StyleRegistry<V> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(config: CascadeConfig) -> Self {
        Self {
            config,
            functions: PropertyFunctions::new(),
            nodes: Vec::new(),
            names: HashMap::new(),
            generation: 0,
        }
    }

    /// Returns the configuration.
    #[must_use]
    #[inline]
    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Returns the property table.
    #[must_use]
    #[inline]
    pub fn functions(&self) -> &PropertyFunctions<V> {
        &self.functions
    }

    // =========================================================================
    // Property registration
    // =========================================================================

    /// Registers a property column together with its standard key family.
    ///
    /// The bare `name` writes every variant at sub-priority 0, and each
    /// configured prefix `p` makes `p + name` write the prefix's variants at
    /// the prefix's sub-priority.
    pub fn register_property(&mut self, name: &str) -> PropertyIndex {
        let property = self.functions.register_property(name);
        self.functions
            .register_function(name, PropertyFunction::all(property, 0));
        for prefix in self.config.prefixes() {
            let key = alloc::format!("{}{name}", prefix.name());
            self.functions.register_function(
                &key,
                PropertyFunction::variants(property, prefix.variants(), prefix.priority()),
            );
        }
        property
    }

    /// Registers (or replaces) the merge function for `key`.
    ///
    /// Only builds that happen afterwards see the new function.
    pub fn register_property_function(
        &mut self,
        key: &str,
        function: PropertyFunction<V>,
    ) -> Option<PropertyFunction<V>> {
        self.functions.register_function(key, function)
    }

    /// Looks up a property column by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<PropertyIndex> {
        self.functions.property(name)
    }

    // =========================================================================
    // Naming
    // =========================================================================

    /// Returns the number of registered names.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no names are registered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the number of live nodes, anonymous ones included.
    #[must_use]
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Looks up a registered name without creating anything.
    #[must_use]
    pub fn lookup(&self, name: &StyleName) -> Option<StyleId> {
        self.names.get(name).map(|&index| self.handle(index))
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn exists(&self, name: &StyleName) -> bool {
        self.names.contains_key(name)
    }

    /// Returns an iterator over registered names and their styles.
    pub fn names(&self) -> impl Iterator<Item = (&StyleName, StyleId)> + '_ {
        self.names
            .iter()
            .map(|(name, &index)| (name, self.handle(index)))
    }

    /// Resolves a single-segment style name, creating it if needed.
    ///
    /// An unregistered `prefix_suffix` (split at the first separator, both
    /// parts non-empty) is created with the style `suffix` as its declared
    /// parent, resolving `suffix` the same way first.
    ///
    /// # Errors
    ///
    /// [`CascadeError::NotFound`] if the name is unregistered and cannot be
    /// split, or its suffix cannot be resolved.
    pub fn style(&mut self, name: &str) -> Result<StyleId, CascadeError> {
        let key = StyleName::new(name);
        if let Some(&index) = self.names.get(&key) {
            return Ok(self.handle(index));
        }

        let not_found = || CascadeError::NotFound {
            name: name.to_string(),
        };
        let Some((prefix, suffix)) = name.split_once(self.config.separator()) else {
            return Err(not_found());
        };
        if prefix.is_empty() || suffix.is_empty() {
            return Err(not_found());
        }
        self.style(suffix).map_err(|_| not_found())?;

        let index = self.insert(Some(key), Some(StyleName::new(suffix)));
        debug!(style = name, parent = suffix, "created style from separator");
        Ok(self.handle(index))
    }

    /// Resolves a structured name, creating styles along the way if needed.
    ///
    /// The first segment goes through [`style`](Self::style) and each further
    /// segment through [`child`](Self::child).
    ///
    /// # Errors
    ///
    /// [`CascadeError::NotFound`] if the first segment cannot be resolved.
    pub fn full_style(&mut self, name: &StyleName) -> Result<StyleId, CascadeError> {
        if let Some(&index) = self.names.get(name) {
            return Ok(self.handle(index));
        }
        let mut id = self.style(name.first())?;
        for segment in name.segments().skip(1) {
            id = self.child(id, segment)?;
        }
        Ok(id)
    }

    /// Resolves `style[segment]`, creating it if needed.
    ///
    /// A new child of a style with declared parent `p` gets `p[segment]` as
    /// its declared parent; that name is only resolved when the child is
    /// built.
    ///
    /// # Errors
    ///
    /// [`CascadeError::StaleHandle`] for a dead handle and
    /// [`CascadeError::Anonymous`] if `id` has no name.
    pub fn child(&mut self, id: StyleId, segment: &str) -> Result<StyleId, CascadeError> {
        let node = self.node(id)?;
        let Some(base) = node.name() else {
            return Err(CascadeError::Anonymous);
        };
        let name = base.child(segment);
        if let Some(&index) = self.names.get(&name) {
            return Ok(self.handle(index));
        }
        let parent = node.parent().map(|p| p.child(segment));

        debug!(style = %name, "created indexed style");
        let index = self.insert(Some(name), parent);
        Ok(self.handle(index))
    }

    /// Creates a style with a declared parent and registers it under `name`.
    ///
    /// A previous registration of `name` is replaced; that node stays alive
    /// but is no longer reachable by name.
    ///
    /// # Errors
    ///
    /// [`CascadeError::InvalidAssignment`] if `parent` refers to a dead or
    /// anonymous style.
    pub fn create(
        &mut self,
        name: StyleName,
        parent: impl Into<ParentRef>,
    ) -> Result<StyleId, CascadeError> {
        let parent = self.parent_name(parent.into(), || name.to_string())?;
        let index = self.insert(Some(name), parent);
        Ok(self.handle(index))
    }

    /// Creates an anonymous style, which is never registered.
    ///
    /// # Errors
    ///
    /// [`CascadeError::InvalidAssignment`] if `parent` refers to a dead or
    /// anonymous style.
    pub fn create_anonymous(&mut self, parent: impl Into<ParentRef>) -> Result<StyleId, CascadeError> {
        let parent = self.parent_name(parent.into(), || String::from("<anonymous>"))?;
        let index = self.insert(None, parent);
        Ok(self.handle(index))
    }

    /// Registers an existing style under `name`, renaming it.
    ///
    /// # Errors
    ///
    /// [`CascadeError::InvalidAssignment`] if `id` is not a live style.
    pub fn assign(&mut self, name: StyleName, id: StyleId) -> Result<(), CascadeError> {
        let index = self
            .index_of(id)
            .map_err(|_| CascadeError::InvalidAssignment {
                name: name.to_string(),
            })?;
        self.nodes[index].set_name(name.clone());
        self.names.insert(name, index);
        Ok(())
    }

    // =========================================================================
    // Node access and declaration
    // =========================================================================

    /// Returns a style node.
    ///
    /// # Errors
    ///
    /// [`CascadeError::StaleHandle`] for a dead handle.
    pub fn node(&self, id: StyleId) -> Result<&StyleNode<V>, CascadeError> {
        let index = self.index_of(id)?;
        Ok(&self.nodes[index])
    }

    /// Returns a style node for declaring properties.
    ///
    /// # Errors
    ///
    /// [`CascadeError::StaleHandle`] for a dead handle.
    pub fn node_mut(&mut self, id: StyleId) -> Result<&mut StyleNode<V>, CascadeError> {
        let index = self.index_of(id)?;
        Ok(&mut self.nodes[index])
    }

    /// Replaces the declared parent of a style.
    ///
    /// # Errors
    ///
    /// [`CascadeError::StaleHandle`] for a dead `id` and
    /// [`CascadeError::InvalidAssignment`] if `parent` refers to a dead or
    /// anonymous style.
    pub fn set_parent(
        &mut self,
        id: StyleId,
        parent: impl Into<ParentRef>,
    ) -> Result<(), CascadeError> {
        let index = self.index_of(id)?;
        let parent = self.parent_name(parent.into(), || self.describe(index))?;
        self.nodes[index].set_parent(parent);
        Ok(())
    }

    /// Replaces the layers of `id` with a copy of the layers of `from`.
    ///
    /// # Errors
    ///
    /// [`CascadeError::StaleHandle`] if either handle is dead.
    pub fn take(&mut self, id: StyleId, from: StyleId) -> Result<(), CascadeError> {
        let layers = self.node(from)?.layers().to_vec();
        self.node_mut(id)?.replace_layers(layers);
        Ok(())
    }

    /// Selects the variant a style reads through [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// [`CascadeError::UnknownVariant`] if `tag` is not configured.
    pub fn set_variant(&mut self, id: StyleId, tag: &str) -> Result<(), CascadeError> {
        let variant = self
            .config
            .variant(tag)
            .ok_or_else(|| CascadeError::UnknownVariant {
                tag: tag.to_string(),
            })?;
        self.node_mut(id)?.set_variant(variant);
        Ok(())
    }

    /// Drops every style and name. Property functions stay registered.
    ///
    /// Handles issued before the reset become stale.
    pub fn reset(&mut self) {
        debug!(styles = self.nodes.len(), "resetting style registry");
        self.nodes.clear();
        self.names.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    pub(crate) fn index_of(&self, id: StyleId) -> Result<usize, CascadeError> {
        if id.generation() != self.generation || id.idx() >= self.nodes.len() {
            return Err(CascadeError::StaleHandle);
        }
        Ok(id.idx())
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "insert caps the arena below u32::MAX nodes"
    )]
    pub(crate) fn handle(&self, index: usize) -> StyleId {
        StyleId::new(index as u32, self.generation)
    }

    pub(crate) fn describe(&self, index: usize) -> String {
        self.nodes
            .get(index)
            .and_then(StyleNode::name)
            .map_or_else(|| String::from("<anonymous>"), ToString::to_string)
    }

    fn insert(&mut self, name: Option<StyleName>, parent: Option<StyleName>) -> usize {
        assert!(
            self.nodes.len() < u32::MAX as usize,
            "Too many styles (max {})",
            u32::MAX
        );
        let index = self.nodes.len();
        if let Some(name) = &name {
            self.names.insert(name.clone(), index);
        }
        self.nodes.push(StyleNode::new(name, parent));
        index
    }

    fn parent_name(
        &self,
        parent: ParentRef,
        target: impl FnOnce() -> String,
    ) -> Result<Option<StyleName>, CascadeError> {
        match parent {
            ParentRef::None => Ok(None),
            ParentRef::Name(name) => Ok(Some(name)),
            ParentRef::Style(id) => self
                .index_of(id)
                .ok()
                .and_then(|index| self.nodes[index].name().cloned())
                .map(Some)
                .ok_or_else(|| CascadeError::InvalidAssignment { name: target() }),
        }
    }
}

impl<V> fmt::Debug for StyleRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleRegistry")
            .field("config", &self.config)
            .field("functions", &self.functions)
            .field("nodes", &self.nodes.len())
            .field("names", &self.names.len())
            .field("generation", &self.generation)
            .finish()
    }
}
