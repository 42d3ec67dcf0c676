// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structured style names.
//!
//! A [`StyleName`] is a non-empty sequence of string segments. `("button",)`
//! is a top-level style and `("button", "text")` is the `text` style nested
//! one level inside `button`. Dropping the last segment yields the
//! *enclosing* name, which is the second inheritance axis of the cascade.

use alloc::boxed::Box;
use core::fmt;

use smallvec::SmallVec;

/// Inline capacity for name segments; nesting deeper than this is rare.
const INLINE_SEGMENTS: usize = 2;

/// An ordered, non-empty sequence of name segments.
///
/// Equality, ordering and hashing are structural over the segments.
///
/// # Example
///
/// ```rust
/// use understory_cascade::StyleName;
///
/// let button = StyleName::new("button");
/// let text = button.child("text");
///
/// assert_eq!(text.depth(), 2);
/// assert_eq!(text.enclosing(), Some(button));
/// assert_eq!(text.to_string(), "button[text]");
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StyleName {
    segments: SmallVec<[Box<str>; INLINE_SEGMENTS]>,
}

impl StyleName {
    /// Creates a single-segment name.
    #[must_use]
    pub fn new(segment: &str) -> Self {
        let mut segments = SmallVec::new();
        segments.push(Box::from(segment));
        Self { segments }
    }

    /// Creates a name from its segments.
    ///
    /// Returns `None` if `segments` is empty.
    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<Box<str>>,
    {
        let segments: SmallVec<[Box<str>; INLINE_SEGMENTS]> =
            segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            None
        } else {
            Some(Self { segments })
        }
    }

    /// Returns the number of segments (always at least one).
    #[must_use]
    #[inline]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if this name has more than one segment.
    #[must_use]
    #[inline]
    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// Returns the first segment.
    #[must_use]
    #[inline]
    pub fn first(&self) -> &str {
        &self.segments[0]
    }

    /// Returns the last segment.
    #[must_use]
    #[inline]
    pub fn last(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// Returns an iterator over the segments.
    pub fn segments(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.segments.iter().map(|s| &**s)
    }

    /// Returns this name extended by one segment.
    #[must_use]
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Box::from(segment));
        Self { segments }
    }

    /// Returns the name with its last segment dropped.
    ///
    /// Returns `None` for single-segment names, which have no enclosing style.
    #[must_use]
    pub fn enclosing(&self) -> Option<Self> {
        if !self.is_nested() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }
}

impl From<&str> for StyleName {
    fn from(segment: &str) -> Self {
        Self::new(segment)
    }
}

impl fmt::Display for StyleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.first())?;
        for segment in self.segments.iter().skip(1) {
            write!(f, "[{segment}]")?;
        }
        Ok(())
    }
}

impl fmt::Debug for StyleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StyleName")
            .field(&format_args!("{self}"))
            .finish()
    }
}
