// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capturing and restoring declared style state.

use alloc::vec::Vec;
use core::fmt;

use tracing::debug;

use crate::error::CascadeError;
use crate::layer::Layer;
use crate::name::StyleName;
use crate::registry::StyleRegistry;

#[derive(Clone, PartialEq)]
struct SnapshotEntry<V> {
    name: StyleName,
    parent: Option<StyleName>,
    layers: Vec<Layer<V>>,
}

/// The declared parent and layers of every named style at one point in time.
///
/// Caches are not captured; restored styles rebuild on next use.
#[derive(Clone, PartialEq)]
pub struct StyleSnapshot<V> {
    entries: Vec<SnapshotEntry<V>>,
}

impl<V> StyleSnapshot<V> {
    /// Returns the number of captured styles.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was captured.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the captured names in sorted order.
    pub fn names(&self) -> impl ExactSizeIterator<Item = &StyleName> + '_ {
        self.entries.iter().map(|entry| &entry.name)
    }
}

impl<V> fmt::Debug for StyleSnapshot<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl<V: Clone> StyleRegistry<V> {
    /// Captures the declared parent and a deep copy of the layers of every
    /// named style.
    #[must_use]
    pub fn backup(&self) -> StyleSnapshot<V> {
        let mut entries: Vec<_> = self
            .names
            .iter()
            .map(|(name, &index)| {
                let node = &self.nodes[index];
                SnapshotEntry {
                    name: name.clone(),
                    parent: node.parent().cloned(),
                    layers: node.layers().to_vec(),
                }
            })
            .collect();
        entries.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        StyleSnapshot { entries }
    }

    /// Writes a snapshot back.
    ///
    /// Each captured name is resolved with [`full_style`](Self::full_style),
    /// creating it if the naming rules allow, and then gets its captured
    /// parent and layers and is marked unbuilt. Styles named after the
    /// snapshot was taken are left alone.
    ///
    /// # Errors
    ///
    /// [`CascadeError::NotFound`] if a captured name cannot be resolved, for
    /// example a plain name after [`reset`](Self::reset). Entries sorted before
    /// the failing one have already been restored.
    pub fn restore(&mut self, snapshot: &StyleSnapshot<V>) -> Result<(), CascadeError> {
        debug!(styles = snapshot.len(), "restoring style snapshot");
        for entry in &snapshot.entries {
            let id = self.full_style(&entry.name)?;
            let node = self.node_mut(id)?;
            node.set_parent(entry.parent.clone());
            node.replace_layers(entry.layers.clone());
        }
        Ok(())
    }
}
