// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Building caches and resolving properties.
//!
//! A build links a node to its declared parent (`down`) and, for a nested
//! name, to its enclosing style (`left`), building both first. It then merges
//! the node's own layers into a `variant × property` cache through the
//! registered property functions.
//!
//! Resolution walks from a node through `down` links. The first `left` link
//! seen on the way is remembered and taken once the `down` chain runs out.
//! The first cache holding the slot wins. Every node on the walk is built on
//! demand, so a walk never reads links left over from before an invalidation.

use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;

use tracing::{debug, trace};

use crate::config::VariantIndex;
use crate::error::CascadeError;
use crate::name::StyleName;
use crate::node::{BuildState, Resolved, StyleId};
use crate::property::{PropertyIndex, SlotWriter};
use crate::registry::StyleRegistry;

impl<V: Clone> StyleRegistry<V> {
    /// Builds a style, linking and building its ancestors first.
    ///
    /// Building an already built style does nothing.
    ///
    /// # Errors
    ///
    /// [`CascadeError::NotFound`] if a parent or enclosing name cannot be
    /// resolved and [`CascadeError::Cycle`] if the style is its own ancestor.
    /// A failed build leaves the style unbuilt.
    pub fn build(&mut self, id: StyleId) -> Result<(), CascadeError> {
        let index = self.index_of(id)?;
        self.build_index(index).map(|_| ())
    }

    /// Drops the links and cache of one style.
    ///
    /// Descendants keep their own caches; they pick up the change once they
    /// are rebuilt.
    ///
    /// # Errors
    ///
    /// [`CascadeError::StaleHandle`] for a dead handle.
    pub fn unbuild(&mut self, id: StyleId) -> Result<(), CascadeError> {
        self.node_mut(id)?.unbuild();
        Ok(())
    }

    /// Returns `true` if the style currently holds links and a cache.
    ///
    /// # Errors
    ///
    /// [`CascadeError::StaleHandle`] for a dead handle.
    pub fn is_built(&self, id: StyleId) -> Result<bool, CascadeError> {
        Ok(self.node(id)?.is_built())
    }

    /// Unbuilds every style, then builds every registered one.
    ///
    /// Anonymous styles are left unbuilt and build again on first use.
    ///
    /// # Errors
    ///
    /// The first build error, in arena order.
    pub fn rebuild(&mut self) -> Result<(), CascadeError> {
        for node in &mut self.nodes {
            node.unbuild();
        }
        let mut registered: Vec<usize> = self.names.values().copied().collect();
        registered.sort_unstable();
        registered.dedup();
        debug!(styles = registered.len(), "rebuilding styles");
        for index in registered {
            self.build_index(index)?;
        }
        Ok(())
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolves a property in the style's selected variant.
    ///
    /// Returns `Ok(None)` when no reachable layer sets the property.
    ///
    /// # Errors
    ///
    /// Any error from building a style on the walk.
    pub fn get(&mut self, id: StyleId, property: PropertyIndex) -> Result<Option<&V>, CascadeError> {
        let variant = self.node(id)?.variant();
        self.get_variant(id, property, variant)
    }

    /// Resolves a property in an explicit variant.
    ///
    /// # Errors
    ///
    /// Any error from building a style on the walk.
    pub fn get_variant(
        &mut self,
        id: StyleId,
        property: PropertyIndex,
        variant: VariantIndex,
    ) -> Result<Option<&V>, CascadeError> {
        let start = self.index_of(id)?;
        let source = self.walk(start, |_, resolved| {
            resolved.slot(variant, property).is_some()
        })?;
        Ok(source
            .and_then(|index| self.nodes[index].resolved())
            .and_then(|resolved| resolved.slot(variant, property)))
    }

    /// Resolves a property by name in a variant given by tag.
    ///
    /// # Errors
    ///
    /// [`CascadeError::UnknownProperty`] or [`CascadeError::UnknownVariant`]
    /// for names missing from the registry, otherwise as
    /// [`get_variant`](Self::get_variant).
    pub fn resolve(
        &mut self,
        id: StyleId,
        property: &str,
        variant: &str,
    ) -> Result<Option<&V>, CascadeError> {
        let property = self
            .property(property)
            .ok_or_else(|| CascadeError::UnknownProperty {
                key: property.to_string(),
            })?;
        let variant = self
            .config()
            .variant(variant)
            .ok_or_else(|| CascadeError::UnknownVariant {
                tag: variant.to_string(),
            })?;
        self.get_variant(id, property, variant)
    }

    /// Returns the style whose cache supplies a property, if any.
    ///
    /// # Errors
    ///
    /// Any error from building a style on the walk.
    pub fn source_of(
        &mut self,
        id: StyleId,
        property: PropertyIndex,
        variant: VariantIndex,
    ) -> Result<Option<StyleId>, CascadeError> {
        let start = self.index_of(id)?;
        let source = self.walk(start, |_, resolved| {
            resolved.slot(variant, property).is_some()
        })?;
        Ok(source.map(|index| self.handle(index)))
    }

    /// Returns the styles resolution visits from `id`, in fallback order.
    ///
    /// A style reachable along several paths is listed once, at its first
    /// visit.
    ///
    /// # Errors
    ///
    /// Any error from building a style on the walk.
    pub fn inspect(&mut self, id: StyleId) -> Result<Vec<StyleId>, CascadeError> {
        let start = self.index_of(id)?;
        let mut order: Vec<usize> = Vec::new();
        self.walk(start, |index, _| {
            if !order.contains(&index) {
                order.push(index);
            }
            false
        })?;
        Ok(order.into_iter().map(|index| self.handle(index)).collect())
    }

    /// Builds a style and returns its declared parent.
    ///
    /// # Errors
    ///
    /// As [`build`](Self::build).
    pub fn down_parent(&mut self, id: StyleId) -> Result<Option<StyleId>, CascadeError> {
        let index = self.index_of(id)?;
        let down = self.build_index(index)?.down;
        Ok(down.map(|index| self.handle(index)))
    }

    /// Builds a style and returns its enclosing style.
    ///
    /// # Errors
    ///
    /// As [`build`](Self::build).
    pub fn left_parent(&mut self, id: StyleId) -> Result<Option<StyleId>, CascadeError> {
        let index = self.index_of(id)?;
        let left = self.build_index(index)?.left;
        Ok(left.map(|index| self.handle(index)))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    pub(crate) fn build_index(&mut self, index: usize) -> Result<&Resolved<V>, CascadeError> {
        if matches!(self.nodes[index].state, BuildState::Building) {
            return Err(CascadeError::Cycle {
                name: self.describe(index),
            });
        }
        if !self.nodes[index].is_built() {
            self.nodes[index].state = BuildState::Building;
            let (down, left) = match self.link(index) {
                Ok(links) => links,
                Err(err) => {
                    self.nodes[index].state = BuildState::Unbuilt;
                    return Err(err);
                }
            };
            let width = self.functions().property_count();
            let cache = self.merge_layers(index, width);
            debug!(
                style = %self.describe(index),
                cached = cache.is_some(),
                "built style"
            );
            self.nodes[index].state = BuildState::Built(Resolved {
                down,
                left,
                cache,
                width,
            });
        }
        match &self.nodes[index].state {
            BuildState::Built(resolved) => Ok(resolved),
            _ => Err(CascadeError::Cycle {
                name: self.describe(index),
            }),
        }
    }

    fn link(&mut self, index: usize) -> Result<(Option<usize>, Option<usize>), CascadeError> {
        let parent = self.nodes[index].parent().cloned();
        let enclosing = self.nodes[index].name().and_then(StyleName::enclosing);
        let down = match parent {
            Some(name) => Some(self.build_named(&name)?),
            None => None,
        };
        let left = match enclosing {
            Some(name) => Some(self.build_named(&name)?),
            None => None,
        };
        Ok((down, left))
    }

    fn build_named(&mut self, name: &StyleName) -> Result<usize, CascadeError> {
        let id = self.full_style(name)?;
        let index = self.index_of(id)?;
        self.build_index(index)?;
        Ok(index)
    }

    fn merge_layers(&self, index: usize, width: usize) -> Option<Box<[Option<V>]>> {
        let node = &self.nodes[index];
        if node.layers().is_empty() {
            return None;
        }
        let len = self.config().variant_count() * width;
        let mut slots: Vec<Option<V>> = core::iter::repeat_with(|| None).take(len).collect();
        let mut priorities = vec![0_u32; len];
        let stride = self.config().layer_stride();

        for (position, layer) in node.layers().iter().enumerate() {
            let base = u32::try_from(position)
                .unwrap_or(u32::MAX)
                .saturating_mul(stride);
            let mut writer = SlotWriter::new(&mut slots, &mut priorities, base, stride, width);
            for (key, value) in layer.iter() {
                match self.functions().function(key) {
                    Some(function) => function.apply(&mut writer, value),
                    None => trace!(key, "skipping unregistered property key"),
                }
            }
        }
        Some(slots.into_boxed_slice())
    }

    /// Visits nodes in resolution order until `visit` returns `true`.
    ///
    /// The walk is bounded so that a cycle slipping past build detection
    /// still terminates.
    fn walk(
        &mut self,
        start: usize,
        mut visit: impl FnMut(usize, &Resolved<V>) -> bool,
    ) -> Result<Option<usize>, CascadeError> {
        let mut current = Some(start);
        let mut left = None;
        let mut steps = 0_usize;
        while let Some(index) = current {
            // Builds on the way may add nodes, so the bound follows the arena.
            let bound = self
                .nodes
                .len()
                .saturating_mul(self.nodes.len().saturating_add(1));
            if steps > bound {
                return Err(CascadeError::Cycle {
                    name: self.describe(start),
                });
            }
            steps += 1;
            let resolved = self.build_index(index)?;
            if visit(index, resolved) {
                return Ok(Some(index));
            }
            if left.is_none() {
                left = resolved.left;
            }
            current = resolved.down.or_else(|| left.take());
        }
        Ok(None)
    }
}
