use core::fmt;

/// Process identifier as issued by the caller.
pub type Pid = u64;

/// A contiguous `[start, start + size)` range of the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
  pub start: u64,
  pub size: u64,
}

impl Span {
  pub fn new(
    start: u64,
    size: u64,
  ) -> Self {
    Self { start, size }
  }

  /// One past the last address covered.
  pub fn end(&self) -> u64 {
    self.start + self.size
  }

  /// Last address covered. Only meaningful for `size > 0`.
  pub fn last(&self) -> u64 {
    self.end() - 1
  }
}

impl fmt::Display for Span {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "[{}:{}]", self.start, self.last())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
  Hole,
  Process(Pid),
}

/// Bookkeeping for one segment of the address space.
///
/// Regions carry no links; the ledger owns ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
  pub kind: RegionKind,
  pub span: Span,
}

impl Region {
  pub fn new(
    kind: RegionKind,
    start: u64,
    size: u64,
  ) -> Self {
    Self {
      kind,
      span: Span::new(start, size),
    }
  }

  pub fn hole(
    start: u64,
    size: u64,
  ) -> Self {
    Self::new(RegionKind::Hole, start, size)
  }

  pub fn is_hole(&self) -> bool {
    self.kind == RegionKind::Hole
  }

  pub fn owner(&self) -> Option<Pid> {
    match self.kind {
      RegionKind::Process(pid) => Some(pid),
      RegionKind::Hole => None,
    }
  }

  /// Whether `self` and `other` would have to be merged if adjacent.
  pub fn mergeable_with(
    &self,
    other: &Region,
  ) -> bool {
    self.kind == other.kind
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_span_bounds() {
    let span = Span::new(20, 30);

    assert_eq!(span.end(), 50);
    assert_eq!(span.last(), 49);
    assert_eq!(span.to_string(), "[20:49]");
  }

  #[test]
  fn test_mergeable() {
    let hole = Region::hole(0, 10);
    let other_hole = Region::hole(10, 5);
    let p1 = Region::new(RegionKind::Process(1), 15, 5);
    let p1_again = Region::new(RegionKind::Process(1), 20, 5);
    let p2 = Region::new(RegionKind::Process(2), 25, 5);

    assert!(hole.mergeable_with(&other_hole));
    assert!(p1.mergeable_with(&p1_again));
    assert!(!p1.mergeable_with(&p2));
    assert!(!hole.mergeable_with(&p1));

    assert_eq!(p2.owner(), Some(2));
    assert_eq!(hole.owner(), None);
  }
}
