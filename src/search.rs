use core::fmt;
use core::str::FromStr;

use crate::error::AllocError;
use crate::ledger::{Ledger, RegionId};

/// Hole selection policy for a fresh allocation.
///
/// ```text
///   request: 10        ┌────┬────────┬────┬──────────────┬────┬───────┐
///                      │ P1 │ 12 free│ P2 │    30 free   │ P3 │11 free│
///                      └────┴────────┴────┴──────────────┴────┴───────┘
///   FirstFit ──────────────────▲
///   BestFit  ──────────────────────────────────────────────────────▲
///   WorstFit ──────────────────────────────────▲
/// ```
///
/// All three walk the ledger once and never modify it. Ties go to the
/// lowest address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
  FirstFit,
  BestFit,
  WorstFit,
}

impl SearchMode {
  /// Maps the single-character command flag (`F`, `B`, `W`).
  pub fn from_flag(flag: char) -> Result<Self, AllocError> {
    match flag {
      'F' => Ok(SearchMode::FirstFit),
      'B' => Ok(SearchMode::BestFit),
      'W' => Ok(SearchMode::WorstFit),
      other => Err(AllocError::InvalidStrategy(other)),
    }
  }

  pub fn flag(self) -> char {
    match self {
      SearchMode::FirstFit => 'F',
      SearchMode::BestFit => 'B',
      SearchMode::WorstFit => 'W',
    }
  }

  /// Picks a hole of at least `size` units, or `None` if nothing fits.
  pub fn find_hole(
    self,
    ledger: &Ledger,
    size: u64,
  ) -> Option<RegionId> {
    let mut holes = ledger
      .iter()
      .filter(|(_, region)| region.is_hole() && region.span.size >= size)
      .map(|(id, region)| (id, region.span.size));

    match self {
      SearchMode::FirstFit => holes.next().map(|(id, _)| id),
      SearchMode::BestFit => holes
        .fold(None, |best: Option<(RegionId, u64)>, candidate| match best {
          Some((_, best_size)) if best_size <= candidate.1 => best,
          _ => Some(candidate),
        })
        .map(|(id, _)| id),
      SearchMode::WorstFit => holes
        .fold(None, |worst: Option<(RegionId, u64)>, candidate| match worst {
          Some((_, worst_size)) if worst_size >= candidate.1 => worst,
          _ => Some(candidate),
        })
        .map(|(id, _)| id),
    }
  }
}

impl TryFrom<char> for SearchMode {
  type Error = AllocError;

  fn try_from(flag: char) -> Result<Self, Self::Error> {
    SearchMode::from_flag(flag)
  }
}

impl FromStr for SearchMode {
  type Err = AllocError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
      (Some(flag), None) => SearchMode::from_flag(flag),
      (Some(flag), Some(_)) => Err(AllocError::InvalidStrategy(flag)),
      (None, _) => Err(AllocError::InvalidStrategy(' ')),
    }
  }
}

impl fmt::Display for SearchMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    let name = match self {
      SearchMode::FirstFit => "first fit",
      SearchMode::BestFit => "best fit",
      SearchMode::WorstFit => "worst fit",
    };
    f.write_str(name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::region::RegionKind;

  /// Builds `P1 | 12 | P2 | 30 | P3 | 11 | P4 | 30 | P5 | 12` and returns
  /// the ledger with the holes in address order.
  fn fragmented() -> (Ledger, Vec<RegionId>) {
    let sizes: [(u64, u64); 5] = [(1, 12), (2, 30), (3, 11), (4, 30), (5, 12)];
    let total: u64 = sizes.iter().map(|(_, gap)| 5 + gap).sum();
    let mut ledger = Ledger::new(total, None).unwrap();

    // Placeholder owners hold the gaps open until every carve is done.
    let hole = ledger.head();
    let mut gaps = Vec::new();
    for (pid, gap) in sizes {
      ledger.carve(hole, pid, 5).unwrap();
      gaps.push(ledger.carve(hole, 100 + pid, gap).unwrap());
    }
    for gap in &gaps {
      ledger.set_kind(*gap, RegionKind::Hole).unwrap();
    }

    (ledger, gaps)
  }

  #[test]
  fn test_first_fit() {
    let (ledger, holes) = fragmented();

    assert_eq!(SearchMode::FirstFit.find_hole(&ledger, 10), Some(holes[0]));
    assert_eq!(SearchMode::FirstFit.find_hole(&ledger, 13), Some(holes[1]));
    assert_eq!(SearchMode::FirstFit.find_hole(&ledger, 31), None);
  }

  #[test]
  fn test_best_fit_prefers_smallest_then_lowest() {
    let (ledger, holes) = fragmented();

    assert_eq!(SearchMode::BestFit.find_hole(&ledger, 10), Some(holes[2]));
    assert_eq!(SearchMode::BestFit.find_hole(&ledger, 12), Some(holes[0]));
    assert_eq!(SearchMode::BestFit.find_hole(&ledger, 13), Some(holes[1]));
  }

  #[test]
  fn test_worst_fit_prefers_largest_then_lowest() {
    let (ledger, holes) = fragmented();

    assert_eq!(SearchMode::WorstFit.find_hole(&ledger, 1), Some(holes[1]));
    assert_eq!(SearchMode::WorstFit.find_hole(&ledger, 30), Some(holes[1]));
    assert_eq!(SearchMode::WorstFit.find_hole(&ledger, 31), None);
  }

  #[test]
  fn test_flags() {
    assert_eq!(SearchMode::try_from('F'), Ok(SearchMode::FirstFit));
    assert_eq!("B".parse::<SearchMode>(), Ok(SearchMode::BestFit));
    assert_eq!("W".parse::<SearchMode>(), Ok(SearchMode::WorstFit));
    assert_eq!("X".parse::<SearchMode>(), Err(AllocError::InvalidStrategy('X')));
    assert_eq!("f".parse::<SearchMode>(), Err(AllocError::InvalidStrategy('f')));
    assert_eq!("FB".parse::<SearchMode>(), Err(AllocError::InvalidStrategy('F')));
    assert_eq!(SearchMode::WorstFit.flag(), 'W');
  }
}
