// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors produced by naming, building, and resolving styles.

use alloc::string::String;

/// Error returned by [`StyleRegistry`](crate::StyleRegistry) operations.
///
/// Naming and build failures always reach the caller. A property that no
/// reachable layer ever set is not an error; resolution returns `None` for it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CascadeError {
    /// A referenced style name is not registered and cannot be synthesized
    /// from the separator convention or indexed lookup.
    #[error("style `{name}` does not exist")]
    NotFound {
        /// Display form of the name that failed to resolve.
        name: String,
    },
    /// Something that is not a live, named style was used where one is
    /// required.
    #[error("value assigned to `{name}` is not a style")]
    InvalidAssignment {
        /// The name (or role) the assignment targeted.
        name: String,
    },
    /// The handle predates the last [`reset`](crate::StyleRegistry::reset)
    /// or was never issued by this registry.
    #[error("style handle is stale")]
    StaleHandle,
    /// Indexed child lookup was attempted on a style that has no name.
    #[error("anonymous style cannot be indexed")]
    Anonymous,
    /// The parent links would make a style its own ancestor.
    #[error("inheritance cycle through style `{name}`")]
    Cycle {
        /// Display form of the style where the cycle was observed.
        name: String,
    },
    /// The variant tag is not part of the configuration.
    #[error("unknown variant `{tag}`")]
    UnknownVariant {
        /// The tag that was looked up.
        tag: String,
    },
    /// The property key has no registered property column.
    #[error("unknown property `{key}`")]
    UnknownProperty {
        /// The key that was looked up.
        key: String,
    },
}
