use std::fmt;

/// Scroll offsets of the view's scrollable region, in pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScrollOffset {
  pub top:  u32,
  pub left: u32,
}

impl ScrollOffset {
  pub const ORIGIN: Self = Self { top: 0, left: 0 };

  pub const fn new(top: u32, left: u32) -> Self {
    Self { top, left }
  }
}

impl fmt::Display for ScrollOffset {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {})", self.left, self.top)
  }
}

/// Where a scroll event was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOrigin {
  /// The buffer's own scrollable region.
  Scroller,
  /// A scrollable child nested inside the view (tooltips, completion list).
  Nested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollEvent {
  pub origin: ScrollOrigin,
  pub offset: ScrollOffset,
}

impl ScrollEvent {
  pub fn scroller(offset: ScrollOffset) -> Self {
    Self {
      origin: ScrollOrigin::Scroller,
      offset,
    }
  }

  pub fn nested(offset: ScrollOffset) -> Self {
    Self {
      origin: ScrollOrigin::Nested,
      offset,
    }
  }

  pub fn is_from_scroller(&self) -> bool {
    self.origin == ScrollOrigin::Scroller
  }
}
