// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration.
//!
//! This module provides [`CascadeConfig`] and [`CascadeConfigBuilder`]: the
//! set of state variants a resolved cache is laid out for, the priority
//! stride between layers, the separator used for auto-created names, and the
//! property-key prefixes that target individual variants.

use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;
use core::fmt;

use smallvec::SmallVec;

/// Default priority distance between consecutive layers.
pub const DEFAULT_LAYER_STRIDE: u32 = 16;

/// Default separator for the `prefix_suffix` naming convention.
pub const DEFAULT_SEPARATOR: char = '_';

/// Name of the only variant when none are configured.
pub const DEFAULT_VARIANT: &str = "default";

/// Identifies a state variant by position in the configuration.
///
/// Index `0` is the default variant that new styles select.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VariantIndex(u8);

impl VariantIndex {
    /// The default variant.
    pub const DEFAULT: Self = Self(0);

    /// Creates a variant index.
    #[must_use]
    #[inline]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Returns the underlying index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u8 {
        self.0
    }
}

impl fmt::Debug for VariantIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VariantIndex").field(&self.0).finish()
    }
}

/// A property-key prefix that writes to a subset of variants.
///
/// With variants `idle` and `hover`, the prefix `hover_` turns the key
/// `hover_color` into a write of `color` for the `hover` variant only, at the
/// prefix's sub-priority within its layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prefix {
    name: Box<str>,
    variants: SmallVec<[VariantIndex; 4]>,
    priority: u32,
}

impl Prefix {
    /// Returns the prefix text, including its trailing separator.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the variants this prefix writes.
    #[must_use]
    #[inline]
    pub fn variants(&self) -> &[VariantIndex] {
        &self.variants
    }

    /// Returns the sub-priority used within a layer.
    #[must_use]
    #[inline]
    pub fn priority(&self) -> u32 {
        self.priority
    }
}

/// Immutable engine configuration.
///
/// Use [`CascadeConfigBuilder`] to construct one; [`CascadeConfig::default`]
/// has a single `"default"` variant, a stride of
/// [`DEFAULT_LAYER_STRIDE`], and `'_'` as separator.
///
/// # Example
///
/// ```rust
/// use understory_cascade::{CascadeConfigBuilder, VariantIndex};
///
/// let config = CascadeConfigBuilder::new()
///     .variant("idle")
///     .variant("hover")
///     .layer_stride(8)
///     .build();
///
/// assert_eq!(config.variant_count(), 2);
/// assert_eq!(config.variant("hover"), Some(VariantIndex::new(1)));
/// assert_eq!(config.prefixes()[1].name(), "hover_");
/// ```
#[derive(Clone, Debug)]
pub struct CascadeConfig {
    variants: Vec<Box<str>>,
    prefixes: Vec<Prefix>,
    layer_stride: u32,
    separator: char,
}

impl CascadeConfig {
    /// Returns the number of variants.
    #[must_use]
    #[inline]
    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }

    /// Looks up a variant by name.
    #[must_use]
    pub fn variant(&self, tag: &str) -> Option<VariantIndex> {
        self.variants
            .iter()
            .position(|v| &**v == tag)
            .and_then(|i| u8::try_from(i).ok())
            .map(VariantIndex::new)
    }

    /// Returns the name of a variant.
    #[must_use]
    pub fn variant_name(&self, variant: VariantIndex) -> Option<&str> {
        self.variants
            .get(usize::from(variant.index()))
            .map(AsRef::as_ref)
    }

    /// Returns an iterator over the variant names in index order.
    pub fn variants(&self) -> impl Iterator<Item = &str> + '_ {
        self.variants.iter().map(AsRef::as_ref)
    }

    /// Returns the configured key prefixes.
    #[must_use]
    #[inline]
    pub fn prefixes(&self) -> &[Prefix] {
        &self.prefixes
    }

    /// Returns the priority distance between consecutive layers.
    #[must_use]
    #[inline]
    pub fn layer_stride(&self) -> u32 {
        self.layer_stride
    }

    /// Returns the separator used to split auto-created style names.
    #[must_use]
    #[inline]
    pub fn separator(&self) -> char {
        self.separator
    }
}

impl Default for CascadeConfig {
    fn default() -> Self {
        CascadeConfigBuilder::new().build()
    }
}

/// Builder for [`CascadeConfig`].
#[derive(Clone, Debug)]
pub struct CascadeConfigBuilder {
    variants: Vec<Box<str>>,
    prefixes: Vec<(Box<str>, Vec<Box<str>>, u32)>,
    layer_stride: u32,
    separator: char,
    variant_prefixes: bool,
}

impl Default for CascadeConfigBuilder {
    fn default() -> Self {
        Self {
            variants: Vec::new(),
            prefixes: Vec::new(),
            layer_stride: DEFAULT_LAYER_STRIDE,
            separator: DEFAULT_SEPARATOR,
            variant_prefixes: true,
        }
    }
}

impl CascadeConfigBuilder {
    /// Creates a builder with default settings and no variants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a variant. The first variant added is the default one.
    #[must_use]
    pub fn variant(mut self, name: &str) -> Self {
        self.variants.push(Box::from(name));
        self
    }

    /// Sets the priority distance between consecutive layers.
    ///
    /// Every sub-priority used by a property function must be below this.
    #[must_use]
    pub fn layer_stride(mut self, stride: u32) -> Self {
        self.layer_stride = stride;
        self
    }

    /// Sets the separator used by the `prefix_suffix` naming convention and
    /// by generated per-variant prefixes.
    #[must_use]
    pub fn separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Sets whether every variant gets its own `variant_` key prefix.
    ///
    /// Enabled by default. Only applies when more than one variant exists.
    #[must_use]
    pub fn variant_prefixes(mut self, enabled: bool) -> Self {
        self.variant_prefixes = enabled;
        self
    }

    /// Adds a key prefix targeting the named variants at `priority`.
    #[must_use]
    pub fn prefix(mut self, name: &str, variants: &[&str], priority: u32) -> Self {
        self.prefixes.push((
            Box::from(name),
            variants.iter().map(|v| Box::from(*v)).collect(),
            priority,
        ));
        self
    }

    /// Builds the configuration.
    ///
    /// # Panics
    ///
    /// Panics if the stride is below 2, if more than 256 variants are
    /// configured, if a variant name repeats, if a prefix names an unknown
    /// variant, or if a prefix priority is not below the stride.
    #[must_use]
    pub fn build(self) -> CascadeConfig {
        let Self {
            mut variants,
            prefixes: custom,
            layer_stride,
            separator,
            variant_prefixes,
        } = self;

        assert!(
            layer_stride >= 2,
            "layer stride must leave room for sub-priorities (got {layer_stride})"
        );
        if variants.is_empty() {
            variants.push(Box::from(DEFAULT_VARIANT));
        }
        assert!(
            variants.len() <= usize::from(u8::MAX) + 1,
            "Too many variants configured (max {})",
            usize::from(u8::MAX) + 1
        );
        for (i, name) in variants.iter().enumerate() {
            assert!(
                !variants[..i].contains(name),
                "Variant '{name}' is configured twice"
            );
        }

        let index_of = |name: &str| {
            variants
                .iter()
                .position(|v| &**v == name)
                .and_then(|i| u8::try_from(i).ok())
                .map(VariantIndex::new)
        };

        let mut prefixes = Vec::new();
        if variant_prefixes && variants.len() > 1 {
            for (i, name) in variants.iter().enumerate() {
                let Ok(index) = u8::try_from(i) else { break };
                prefixes.push(Prefix {
                    name: format!("{name}{separator}").into_boxed_str(),
                    variants: SmallVec::from_slice(&[VariantIndex::new(index)]),
                    priority: 1,
                });
            }
        }
        for (name, targets, priority) in custom {
            assert!(
                priority < layer_stride,
                "Prefix '{name}' priority {priority} collides with the next layer (stride {layer_stride})"
            );
            let variants = targets
                .iter()
                .map(|t| match index_of(t) {
                    Some(index) => index,
                    None => panic!("Prefix '{name}' targets unknown variant '{t}'"),
                })
                .collect();
            prefixes.push(Prefix {
                name,
                variants,
                priority,
            });
        }

        CascadeConfig {
            variants,
            prefixes,
            layer_stride,
            separator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn default_config_has_single_variant() {
        let config = CascadeConfig::default();
        assert_eq!(config.variant_count(), 1);
        assert_eq!(config.variant(DEFAULT_VARIANT), Some(VariantIndex::DEFAULT));
        assert_eq!(config.layer_stride(), DEFAULT_LAYER_STRIDE);
        assert_eq!(config.separator(), '_');
        assert!(config.prefixes().is_empty());
    }

    #[test]
    fn variant_prefixes_follow_separator() {
        let config = CascadeConfigBuilder::new()
            .variant("idle")
            .variant("hover")
            .separator('-')
            .build();

        let names: Vec<_> = config.prefixes().iter().map(Prefix::name).collect();
        assert_eq!(names, vec!["idle-", "hover-"]);
        assert_eq!(config.prefixes()[1].variants(), &[VariantIndex::new(1)]);
        assert_eq!(config.prefixes()[1].priority(), 1);
    }

    #[test]
    fn custom_prefix_resolves_variants() {
        let config = CascadeConfigBuilder::new()
            .variant("idle")
            .variant("hover")
            .variant("selected_idle")
            .variant("selected_hover")
            .variant_prefixes(false)
            .prefix("selected_", &["selected_idle", "selected_hover"], 2)
            .build();

        assert_eq!(config.prefixes().len(), 1);
        let prefix = &config.prefixes()[0];
        assert_eq!(
            prefix.variants(),
            &[VariantIndex::new(2), VariantIndex::new(3)]
        );
        assert_eq!(config.variant_name(VariantIndex::new(3)), Some("selected_hover"));
        assert_eq!(config.variant_name(VariantIndex::new(9)), None);
    }

    #[test]
    #[should_panic(expected = "unknown variant")]
    fn prefix_with_unknown_variant_panics() {
        let _ = CascadeConfigBuilder::new()
            .variant("idle")
            .prefix("hover_", &["hover"], 1)
            .build();
    }

    #[test]
    #[should_panic(expected = "collides with the next layer")]
    fn prefix_priority_must_fit_in_stride() {
        let _ = CascadeConfigBuilder::new()
            .variant("idle")
            .layer_stride(4)
            .prefix("strong_", &["idle"], 4)
            .build();
    }

    #[test]
    #[should_panic(expected = "configured twice")]
    fn duplicate_variant_panics() {
        let _ = CascadeConfigBuilder::new()
            .variant("idle")
            .variant("idle")
            .build();
    }
}
