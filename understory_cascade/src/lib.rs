// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Cascade: named styles with layered overrides and two-parent
//! inheritance.
//!
//! A style is a node in a [`StyleRegistry`]. It may be named by a
//! [`StyleName`] (`button`, `button[text]`) or anonymous. Each style has an
//! optional declared parent and an ordered list of [`Layer`]s mapping
//! property keys to raw values. Later layers override earlier ones.
//!
//! ## Core Concepts
//!
//! ### Building
//!
//! Building a style merges its layers into a cache with one slot per
//! `(variant, property)`. Keys are routed through [`PropertyFunction`]s, so
//! one key may write several slots (`hover_color` writes only the `hover`
//! variant, a `padding` shorthand may write four sides). Keys without a
//! function are ignored.
//!
//! Any declaration on a style marks it unbuilt. The next query rebuilds it.
//!
//! ### Resolution
//!
//! A query walks from the style through its declared parents (the "down"
//! chain). A nested style such as `button[text]` also remembers its enclosing
//! style `button` (its "left" parent), which is consulted once the down chain
//! runs out. The first cache holding the requested slot answers.
//!
//! ### Naming
//!
//! Some lookups create styles on demand:
//!
//! - `style("hover_button")` creates `hover_button` with parent `button` if
//!   `button` resolves.
//! - `child(button, "text")` creates `button[text]` whose parent is
//!   `base[text]` when `button`'s parent is `base`.
//!
//! ## Quick Start
//!
//! ```rust
//! use understory_cascade::{CascadeConfigBuilder, ParentRef, StyleName, StyleRegistry};
//!
//! let config = CascadeConfigBuilder::new()
//!     .variant("idle")
//!     .variant("hover")
//!     .build();
//! let hover = config.variant("hover").unwrap();
//!
//! let mut styles = StyleRegistry::<&str>::new(config);
//! let color = styles.register_property("color");
//!
//! let default = styles.create(StyleName::new("default"), ParentRef::None)?;
//! styles.node_mut(default)?.set_property("color", "black");
//!
//! let button = styles.create(StyleName::new("button"), "default")?;
//! styles.node_mut(button)?.set_property("hover_color", "blue");
//!
//! // Hover reads the override, idle falls back to the parent.
//! assert_eq!(styles.get_variant(button, color, hover)?, Some(&"blue"));
//! assert_eq!(styles.get(button, color)?, Some(&"black"));
//!
//! // `button[text]` inherits from `default[text]`, then from `button`.
//! let text = styles.child(button, "text")?;
//! assert_eq!(styles.resolve(text, "color", "hover")?, Some(&"blue"));
//! # Ok::<(), understory_cascade::CascadeError>(())
//! ```
//!
//! ## Snapshots
//!
//! [`StyleRegistry::backup`] captures the parent and layers of every named
//! style; [`StyleRegistry::restore`] writes them back and leaves styles
//! created in between alone.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod build;
mod config;
mod error;
mod layer;
mod name;
mod node;
mod property;
mod registry;
mod snapshot;

pub use config::{
    CascadeConfig, CascadeConfigBuilder, DEFAULT_LAYER_STRIDE, DEFAULT_SEPARATOR, DEFAULT_VARIANT,
    Prefix, VariantIndex,
};
pub use error::CascadeError;
pub use layer::Layer;
pub use name::StyleName;
pub use node::{StyleId, StyleNode};
pub use property::{PropertyFunction, PropertyFunctions, PropertyIndex, SlotWriter};
pub use registry::{ParentRef, StyleRegistry};
pub use snapshot::StyleSnapshot;
