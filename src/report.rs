use core::fmt;

use crate::ledger;
use crate::region::{Pid, RegionKind};

/// Who occupies a reported address range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
  Process(Pid),
  Unused,
}

impl fmt::Display for Label {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      Label::Process(pid) => write!(f, "Process P{pid}"),
      Label::Unused => f.write_str("Unused"),
    }
  }
}

/// One region of the address space, with an inclusive end address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLine {
  pub start: u64,
  pub end: u64,
  pub label: Label,
}

impl fmt::Display for ReportLine {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "Addresses [{}:{}] {}", self.start, self.end, self.label)
  }
}

/// Lazy address-ordered listing of the ledger.
///
/// A clone resumes from the same position. Call
/// [`RegionAllocator::report`] again for a fresh walk.
///
/// [`RegionAllocator::report`]: crate::RegionAllocator::report
#[derive(Clone)]
pub struct Report<'a> {
  regions: ledger::Iter<'a>,
}

impl<'a> Report<'a> {
  pub(crate) fn new(regions: ledger::Iter<'a>) -> Self {
    Self { regions }
  }
}

impl Iterator for Report<'_> {
  type Item = ReportLine;

  fn next(&mut self) -> Option<Self::Item> {
    let (_, region) = self.regions.next()?;
    let label = match region.kind {
      RegionKind::Process(pid) => Label::Process(pid),
      RegionKind::Hole => Label::Unused,
    };

    Some(ReportLine {
      start: region.span.start,
      end: region.span.last(),
      label,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ledger::Ledger;

  #[test]
  fn test_lines() {
    let mut ledger = Ledger::new(100, None).unwrap();
    let hole = ledger.head();
    ledger.carve(hole, 4, 25).unwrap();

    let lines: Vec<String> = Report::new(ledger.iter()).map(|line| line.to_string()).collect();

    assert_eq!(lines, vec!["Addresses [0:24] Process P4", "Addresses [25:99] Unused"]);
  }

  #[test]
  fn test_restartable() {
    let ledger = Ledger::new(8, None).unwrap();
    let report = Report::new(ledger.iter());

    let first: Vec<ReportLine> = report.clone().collect();
    let second: Vec<ReportLine> = report.collect();

    assert_eq!(first, second);
    assert_eq!(first, vec![ReportLine { start: 0, end: 7, label: Label::Unused }]);
  }
}
