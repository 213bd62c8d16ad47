//! Half-open offset intervals over the linear model.
//!
//! A [`Range`] remembers the direction it was created with: `start` may be
//! greater than `end` to describe a backwards selection. [`Range::from`] and
//! [`Range::to`] return the bounds regardless of direction.
//!
//! ```text
//! start=1, end=4: [p a b c /p]  covers "abc"       (forward)
//! start=4, end=1: [p a b c /p]  covers "abc"       (backwards)
//! start=2, end=2: [p a|b c /p]  collapsed, a cursor
//! ```
//!
//! No validation against a document length happens here. Consumers that
//! interpret a range against a snapshot check bounds themselves.

use serde::{
  Deserialize,
  Serialize,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
  pub start: usize,
  pub end:   usize,
}

impl Range {
  pub const fn new(start: usize, end: usize) -> Self {
    Self { start, end }
  }

  /// A collapsed range at `offset`.
  pub const fn point(offset: usize) -> Self {
    Self::new(offset, offset)
  }

  /// Smallest range covering every range yielded by `ranges`.
  ///
  /// The result is backwards if the first range is backwards. Returns `None`
  /// when `ranges` is empty.
  pub fn covering(ranges: impl IntoIterator<Item = Range>) -> Option<Self> {
    let mut ranges = ranges.into_iter();
    let first = ranges.next()?;
    let backwards = first.is_backwards();
    let (from, to) = ranges.fold((first.from(), first.to()), |(from, to), range| {
      (from.min(range.from()), to.max(range.to()))
    });
    Some(if backwards {
      Self::new(to, from)
    } else {
      Self::new(from, to)
    })
  }

  /// Start of the range, regardless of direction.
  #[inline]
  #[must_use]
  pub fn from(&self) -> usize {
    self.start.min(self.end)
  }

  /// End of the range, regardless of direction.
  #[inline]
  #[must_use]
  pub fn to(&self) -> usize {
    self.start.max(self.end)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.to() - self.from()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.is_collapsed()
  }

  #[inline]
  pub fn is_collapsed(&self) -> bool {
    self.start == self.end
  }

  #[inline]
  pub fn is_backwards(&self) -> bool {
    self.start > self.end
  }

  /// Forward copy of this range.
  #[must_use]
  pub fn normalized(self) -> Self {
    Self::new(self.from(), self.to())
  }

  /// Same interval, opposite direction.
  #[must_use]
  pub fn flip(self) -> Self {
    Self::new(self.end, self.start)
  }

  /// Whether `offset` lies in `[from, to)`.
  pub fn contains_offset(&self, offset: usize) -> bool {
    offset >= self.from() && offset < self.to()
  }

  /// Whether `other` lies entirely within this range.
  pub fn contains(&self, other: &Range) -> bool {
    other.from() >= self.from() && other.to() <= self.to()
  }

  /// Shorten the range to at most `length`, keeping `start` fixed.
  #[must_use]
  pub fn truncate(self, length: usize) -> Self {
    let length = length.min(self.len());
    if self.is_backwards() {
      Self::new(self.start, self.start - length)
    } else {
      Self::new(self.start, self.start + length)
    }
  }

  /// Clamp both bounds into `bounds`, producing a forward range.
  #[must_use]
  pub fn clamp(self, bounds: Range) -> Self {
    let from = self.from().clamp(bounds.from(), bounds.to());
    let to = self.to().clamp(bounds.from(), bounds.to());
    Self::new(from, to)
  }
}

impl From<std::ops::Range<usize>> for Range {
  fn from(range: std::ops::Range<usize>) -> Self {
    Self::new(range.start, range.end)
  }
}

impl From<Range> for std::ops::Range<usize> {
  fn from(range: Range) -> Self {
    range.from()..range.to()
  }
}
