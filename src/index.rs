use std::collections::HashMap;

use crate::error::{AllocError, Result};
use crate::ledger::RegionId;
use crate::region::Pid;

/// Maps each pid to the one region it owns.
///
/// Entries are handles into the ledger, not owners: the allocator removes
/// an entry before the region it names stops being that pid's region.
#[derive(Debug, Clone, Default)]
pub struct ProcessIndex {
  entries: HashMap<Pid, RegionId>,
}

impl ProcessIndex {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn lookup(
    &self,
    pid: Pid,
  ) -> Option<RegionId> {
    self.entries.get(&pid).copied()
  }

  /// Inserts or overwrites the entry for `pid`.
  pub fn install(
    &mut self,
    pid: Pid,
    region: RegionId,
  ) -> Result<()> {
    if !self.entries.contains_key(&pid) {
      self
        .entries
        .try_reserve(1)
        .map_err(|_| AllocError::ResourceExhausted)?;
    }
    self.entries.insert(pid, region);
    Ok(())
  }

  pub fn remove(
    &mut self,
    pid: Pid,
  ) -> Result<RegionId> {
    self.entries.remove(&pid).ok_or(AllocError::ProcessUnknown(pid))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (Pid, RegionId)> + '_ {
    self.entries.iter().map(|(pid, region)| (*pid, *region))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ledger::Ledger;

  #[test]
  fn test_install_lookup_remove() {
    let mut ledger = Ledger::new(50, None).unwrap();
    let hole = ledger.head();
    let p1 = ledger.carve(hole, 1, 10).unwrap();
    let p2 = ledger.carve(hole, 2, 10).unwrap();

    let mut index = ProcessIndex::new();
    index.install(1, p1).unwrap();
    index.install(2, p1).unwrap();
    index.install(2, p2).unwrap();

    assert_eq!(index.len(), 2);
    assert_eq!(index.lookup(1), Some(p1));
    assert_eq!(index.lookup(2), Some(p2));
    assert_eq!(index.lookup(3), None);

    assert_eq!(index.remove(1), Ok(p1));
    assert_eq!(index.remove(1), Err(AllocError::ProcessUnknown(1)));
    assert_eq!(index.lookup(1), None);
  }
}
