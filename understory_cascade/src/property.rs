// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property columns and the merge functions that fill them.
//!
//! A resolved cache is a grid of `variant_count × property_count` slots.
//! [`PropertyIndex`] names a column of that grid. A [`PropertyFunction`] is
//! registered per property *key* (the name used in layers) and decides which
//! slots a raw value lands in, through a [`SlotWriter`] that enforces layer
//! priorities.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::config::VariantIndex;

/// Identifies a property column in resolved caches.
///
/// Indices are handed out by [`PropertyFunctions::register_property`] in
/// registration order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyIndex(u16);

impl PropertyIndex {
    /// Creates a property index.
    #[must_use]
    #[inline]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Returns the underlying index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for PropertyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PropertyIndex").field(&self.0).finish()
    }
}

/// Write access to the slots of a cache under construction.
///
/// Each layer of a style gets a writer whose base priority is
/// `layer_position × stride`. A write's effective priority is the base plus
/// its sub-priority, clamped to `stride - 1` so that no write reaches the next
/// layer. It only lands if the slot is empty or the stored priority is not
/// higher. Ties go to the later write.
pub struct SlotWriter<'a, V> {
    slots: &'a mut [Option<V>],
    priorities: &'a mut [u32],
    base: u32,
    stride: u32,
    width: usize,
}

impl<'a, V: Clone> SlotWriter<'a, V> {
    pub(crate) fn new(
        slots: &'a mut [Option<V>],
        priorities: &'a mut [u32],
        base: u32,
        stride: u32,
        width: usize,
    ) -> Self {
        debug_assert_eq!(slots.len(), priorities.len(), "slot arrays must match");
        Self {
            slots,
            priorities,
            base,
            stride,
            width,
        }
    }

    /// Returns the number of variants in the cache.
    #[must_use]
    pub fn variant_count(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.slots.len() / self.width
        }
    }

    /// Returns the base priority of the layer being merged.
    #[must_use]
    #[inline]
    pub fn base_priority(&self) -> u32 {
        self.base
    }

    /// Writes `value` into one variant of one property.
    ///
    /// Returns `true` if the slot took the value. Out-of-range targets are
    /// ignored.
    pub fn write(
        &mut self,
        variant: VariantIndex,
        property: PropertyIndex,
        priority: u32,
        value: V,
    ) -> bool {
        let column = usize::from(property.index());
        if column >= self.width {
            return false;
        }
        let slot = usize::from(variant.index()) * self.width + column;
        if slot >= self.slots.len() {
            return false;
        }
        let effective = self
            .base
            .saturating_add(priority.min(self.stride.saturating_sub(1)));
        if self.slots[slot].is_some() && self.priorities[slot] > effective {
            return false;
        }
        self.slots[slot] = Some(value);
        self.priorities[slot] = effective;
        true
    }

    /// Writes `value` into every variant of `property`.
    pub fn write_all(&mut self, property: PropertyIndex, priority: u32, value: &V) {
        for variant in 0..self.variant_count() {
            let Ok(variant) = u8::try_from(variant) else {
                break;
            };
            self.write(VariantIndex::new(variant), property, priority, value.clone());
        }
    }
}

impl<V> fmt::Debug for SlotWriter<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotWriter")
            .field("slots", &self.slots.len())
            .field("base", &self.base)
            .field("stride", &self.stride)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

/// Merge logic for one property key.
///
/// The common shapes are data; anything else is a closure over a
/// [`SlotWriter`].
pub enum PropertyFunction<V> {
    /// Writes the value to `property` in every variant.
    All {
        /// Target column.
        property: PropertyIndex,
        /// Sub-priority within the layer.
        priority: u32,
    },
    /// Writes the value to `property` in the listed variants.
    Variants {
        /// Target column.
        property: PropertyIndex,
        /// Target variants.
        variants: SmallVec<[VariantIndex; 4]>,
        /// Sub-priority within the layer.
        priority: u32,
    },
    /// Arbitrary merge logic, e.g. shorthands that expand to several columns.
    Custom(Rc<dyn Fn(&mut SlotWriter<'_, V>, &V)>),
}

impl<V: Clone> PropertyFunction<V> {
    /// A function writing `property` in every variant at `priority`.
    #[must_use]
    pub fn all(property: PropertyIndex, priority: u32) -> Self {
        Self::All { property, priority }
    }

    /// A function writing `property` in `variants` at `priority`.
    #[must_use]
    pub fn variants(property: PropertyIndex, variants: &[VariantIndex], priority: u32) -> Self {
        Self::Variants {
            property,
            variants: SmallVec::from_slice(variants),
            priority,
        }
    }

    /// A function backed by a closure.
    #[must_use]
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&mut SlotWriter<'_, V>, &V) + 'static,
    {
        Self::Custom(Rc::new(f))
    }

    /// Merges `value` into the slots behind `writer`.
    pub fn apply(&self, writer: &mut SlotWriter<'_, V>, value: &V) {
        match self {
            Self::All { property, priority } => writer.write_all(*property, *priority, value),
            Self::Variants {
                property,
                variants,
                priority,
            } => {
                for variant in variants {
                    writer.write(*variant, *property, *priority, value.clone());
                }
            }
            Self::Custom(f) => (**f)(writer, value),
        }
    }
}

impl<V> Clone for PropertyFunction<V> {
    fn clone(&self) -> Self {
        match self {
            Self::All { property, priority } => Self::All {
                property: *property,
                priority: *priority,
            },
            Self::Variants {
                property,
                variants,
                priority,
            } => Self::Variants {
                property: *property,
                variants: variants.clone(),
                priority: *priority,
            },
            Self::Custom(f) => Self::Custom(Rc::clone(f)),
        }
    }
}

impl<V> fmt::Debug for PropertyFunction<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All { property, priority } => f
                .debug_struct("All")
                .field("property", property)
                .field("priority", priority)
                .finish(),
            Self::Variants {
                property,
                variants,
                priority,
            } => f
                .debug_struct("Variants")
                .field("property", property)
                .field("variants", variants)
                .field("priority", priority)
                .finish(),
            Self::Custom(_) => f.debug_tuple("Custom").finish_non_exhaustive(),
        }
    }
}

/// Table of property columns and the functions registered per key.
///
/// Registration is expected once at startup. Looking up an unregistered key
/// yields `None`; builds skip such keys.
pub struct PropertyFunctions<V> {
    names: Vec<Box<str>>,
    by_name: HashMap<Box<str>, PropertyIndex>,
    functions: HashMap<Box<str>, PropertyFunction<V>>,
}

impl<V> Default for PropertyFunctions<V> {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            by_name: HashMap::new(),
            functions: HashMap::new(),
        }
    }
}

impl<V: Clone> PropertyFunctions<V> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a property column, returning its index.
    ///
    /// Registering an existing name returns the existing index.
    ///
    /// # Panics
    ///
    /// Panics if more than 65,535 properties are registered.
    pub fn register_property(&mut self, name: &str) -> PropertyIndex {
        if let Some(index) = self.by_name.get(name) {
            return *index;
        }
        assert!(
            self.names.len() < usize::from(u16::MAX),
            "Too many properties registered (max {})",
            u16::MAX
        );
        #[expect(clippy::cast_possible_truncation, reason = "checked above")]
        let index = PropertyIndex::new(self.names.len() as u16);
        self.names.push(Box::from(name));
        self.by_name.insert(Box::from(name), index);
        index
    }

    /// Registers the function for `key`, returning the one it replaced.
    pub fn register_function(
        &mut self,
        key: &str,
        function: PropertyFunction<V>,
    ) -> Option<PropertyFunction<V>> {
        self.functions.insert(Box::from(key), function)
    }

    /// Returns the function registered for `key`.
    #[must_use]
    pub fn function(&self, key: &str) -> Option<&PropertyFunction<V>> {
        self.functions.get(key)
    }

    /// Looks up a property column by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<PropertyIndex> {
        self.by_name.get(name).copied()
    }

    /// Returns the name of a property column.
    #[must_use]
    pub fn property_name(&self, property: PropertyIndex) -> Option<&str> {
        self.names
            .get(usize::from(property.index()))
            .map(|name| &**name)
    }

    /// Returns the number of property columns.
    #[must_use]
    #[inline]
    pub fn property_count(&self) -> usize {
        self.names.len()
    }

    /// Returns the number of keys with a registered function.
    #[must_use]
    #[inline]
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }
}

impl<V> fmt::Debug for PropertyFunctions<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyFunctions")
            .field("properties", &self.names)
            .field("functions", &self.functions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::vec;

    const WIDTH: usize = 2;

    fn grid(variants: usize) -> (Vec<Option<i32>>, Vec<u32>) {
        (vec![None; variants * WIDTH], vec![0; variants * WIDTH])
    }

    #[test]
    fn later_write_wins_at_equal_priority() {
        let (mut slots, mut priorities) = grid(1);
        let mut writer = SlotWriter::new(&mut slots, &mut priorities, 0, 4, WIDTH);
        assert!(writer.write(VariantIndex::DEFAULT, PropertyIndex::new(0), 0, 1));
        assert!(writer.write(VariantIndex::DEFAULT, PropertyIndex::new(0), 0, 2));
        assert_eq!(slots[0], Some(2));
    }

    #[test]
    fn higher_sub_priority_survives_coarser_write() {
        let (mut slots, mut priorities) = grid(2);
        let mut writer = SlotWriter::new(&mut slots, &mut priorities, 0, 4, WIDTH);
        // A variant-specific write followed by an all-variant write in the same layer.
        writer.write(VariantIndex::new(1), PropertyIndex::new(1), 1, 10);
        writer.write_all(PropertyIndex::new(1), 0, &20);
        assert_eq!(slots[1], Some(20));
        assert_eq!(slots[WIDTH + 1], Some(10));
    }

    #[test]
    fn later_layer_beats_any_sub_priority() {
        let (mut slots, mut priorities) = grid(1);
        {
            let mut first = SlotWriter::new(&mut slots, &mut priorities, 0, 4, WIDTH);
            first.write(VariantIndex::DEFAULT, PropertyIndex::new(0), 3, 1);
        }
        let mut second = SlotWriter::new(&mut slots, &mut priorities, 4, 4, WIDTH);
        assert!(second.write(VariantIndex::DEFAULT, PropertyIndex::new(0), 0, 2));
        assert_eq!(slots[0], Some(2));
    }

    #[test]
    fn sub_priority_at_stride_is_clamped_into_its_layer() {
        let (mut slots, mut priorities) = grid(1);
        {
            let mut first = SlotWriter::new(&mut slots, &mut priorities, 0, 4, WIDTH);
            assert!(first.write(VariantIndex::DEFAULT, PropertyIndex::new(0), 4, 1));
            assert!(first.write(VariantIndex::DEFAULT, PropertyIndex::new(0), 9, 2));
        }
        assert_eq!(priorities[0], 3);
        let mut second = SlotWriter::new(&mut slots, &mut priorities, 4, 4, WIDTH);
        assert!(second.write(VariantIndex::DEFAULT, PropertyIndex::new(0), 0, 3));
        assert_eq!(slots[0], Some(3));
    }

    #[test]
    fn out_of_range_writes_are_ignored() {
        let (mut slots, mut priorities) = grid(1);
        let mut writer = SlotWriter::new(&mut slots, &mut priorities, 0, 4, WIDTH);
        assert!(!writer.write(VariantIndex::new(3), PropertyIndex::new(0), 0, 1));
        assert!(!writer.write(VariantIndex::DEFAULT, PropertyIndex::new(7), 0, 1));
        assert_eq!(writer.variant_count(), 1);
        assert!(slots.iter().all(Option::is_none));
    }

    #[test]
    fn function_shapes_apply() {
        let (mut slots, mut priorities) = grid(3);
        let mut writer = SlotWriter::new(&mut slots, &mut priorities, 0, 4, WIDTH);

        PropertyFunction::all(PropertyIndex::new(0), 0).apply(&mut writer, &5);
        PropertyFunction::variants(PropertyIndex::new(1), &[VariantIndex::new(2)], 1)
            .apply(&mut writer, &6);

        assert_eq!(slots, vec![Some(5), None, Some(5), None, Some(5), Some(6)]);
    }

    #[test]
    fn custom_function_expands_shorthand() {
        let (mut slots, mut priorities) = grid(1);
        let mut writer = SlotWriter::new(&mut slots, &mut priorities, 0, 4, WIDTH);
        let both = PropertyFunction::custom(|w: &mut SlotWriter<'_, i32>, v: &i32| {
            w.write_all(PropertyIndex::new(0), 0, v);
            w.write_all(PropertyIndex::new(1), 0, &(v * 2));
        });
        both.apply(&mut writer, &3);
        assert_eq!(slots, vec![Some(3), Some(6)]);
    }

    #[test]
    fn table_registration() {
        let mut table = PropertyFunctions::<i32>::new();
        let color = table.register_property("color");
        let size = table.register_property("size");
        assert_eq!(table.register_property("color"), color);
        assert_eq!(table.property_count(), 2);
        assert_eq!(table.property("size"), Some(size));
        assert_eq!(table.property_name(size), Some("size"));
        assert_eq!(table.property("missing"), None);

        assert!(table.register_function("color", PropertyFunction::all(color, 0)).is_none());
        let replaced = table.register_function("color", PropertyFunction::all(size, 0));
        assert!(matches!(replaced, Some(PropertyFunction::All { property, .. }) if property == color));
        assert!(table.function("nope").is_none());
        assert_eq!(table.function_count(), 1);
    }

    #[test]
    #[should_panic(expected = "Too many properties registered")]
    fn property_table_is_capped_at_u16() {
        let mut table = PropertyFunctions::<i32>::new();
        for i in 0..=u32::from(u16::MAX) {
            table.register_property(&format!("p{i}"));
        }
    }

    #[test]
    fn debug_output() {
        let f = PropertyFunction::<i32>::custom(|_, _| {});
        assert_eq!(format!("{f:?}"), "Custom(..)");
        assert_eq!(format!("{:?}", PropertyIndex::new(4)), "PropertyIndex(4)");
    }
}
