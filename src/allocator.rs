use std::collections::HashSet;

use log::{debug, error, trace, warn};

use crate::error::{AllocError, Result};
use crate::index::ProcessIndex;
use crate::ledger::{Ledger, RegionId};
use crate::region::{Pid, RegionKind, Span};
use crate::report::Report;
use crate::search::SearchMode;

/// Address-space totals gathered in a single ledger walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
  pub total: u64,
  pub allocated: u64,
  pub free: u64,
  pub holes: usize,
  pub processes: usize,
  pub largest_hole: u64,
}

/// One allocation session: the region ledger plus the pid index over it.
///
/// Every operation either completes and leaves the ledger tiled, merged
/// and indexed, or fails and leaves it as it was.
#[derive(Debug, Clone)]
pub struct RegionAllocator {
  ledger: Ledger,
  index: ProcessIndex,
}

impl RegionAllocator {
  /// Starts a session over `[0, total_size)`, entirely free.
  pub fn new(total_size: u64) -> Result<Self> {
    Self::build(total_size, None)
  }

  /// Like [`new`](Self::new), but refuses to keep more than `max_regions`
  /// region nodes alive at once.
  pub fn with_region_limit(
    total_size: u64,
    max_regions: usize,
  ) -> Result<Self> {
    Self::build(total_size, Some(max_regions))
  }

  fn build(
    total_size: u64,
    max_regions: Option<usize>,
  ) -> Result<Self> {
    let ledger = Ledger::new(total_size, max_regions)?;
    debug!("address space [0:{}] ready", total_size - 1);

    Ok(Self {
      ledger,
      index: ProcessIndex::new(),
    })
  }

  pub fn total_size(&self) -> u64 {
    self.ledger.total_size()
  }

  /// Gives `pid` another `size` units and returns the span it now owns.
  ///
  /// A pid that already owns a region can only grow into the hole right
  /// after it; any other hole is ignored. A new pid gets the front of the
  /// hole chosen by `mode`.
  pub fn allocate(
    &mut self,
    pid: Pid,
    size: u64,
    mode: SearchMode,
  ) -> Result<Span> {
    if self.ledger.is_empty() {
      return Err(AllocError::InvalidLedger);
    }
    if size == 0 {
      return Err(AllocError::EmptyRequest);
    }

    if let Some(existing) = self.index.lookup(pid) {
      return self.extend(pid, existing, size);
    }

    let hole = mode.find_hole(&self.ledger, size).ok_or_else(|| {
      warn!("P{pid}: no hole holds {size} units ({mode})");
      AllocError::NoFit(size)
    })?;

    let carved = self.carve_logged(hole, pid, size)?;
    if let Err(err) = self.index.install(pid, carved) {
      self.ledger.restore_hole(carved)?;
      return Err(err);
    }

    let span = self.ledger.get(carved)?.span;
    debug!("P{pid} allocated {span} ({mode})");
    Ok(span)
  }

  fn extend(
    &mut self,
    pid: Pid,
    existing: RegionId,
    size: u64,
  ) -> Result<Span> {
    let hole = match self.ledger.next(existing) {
      Some(next) if self.fits(next, size) => next,
      _ => {
        warn!("P{pid}: cannot grow by {size} units in place");
        return Err(AllocError::ExtensionBlocked { pid, requested: size });
      }
    };

    let carved = self.carve_logged(hole, pid, size)?;
    if let Err(err) = self.ledger.merge(existing, carved) {
      self.ledger.restore_hole(carved)?;
      return Err(err);
    }

    let span = self.ledger.get(existing)?.span;
    debug!("P{pid} grew to {span}");
    Ok(span)
  }

  fn fits(
    &self,
    id: RegionId,
    size: u64,
  ) -> bool {
    self
      .ledger
      .get(id)
      .is_ok_and(|region| region.is_hole() && region.span.size >= size)
  }

  fn carve_logged(
    &mut self,
    hole: RegionId,
    pid: Pid,
    size: u64,
  ) -> Result<RegionId> {
    self.ledger.carve(hole, pid, size).inspect_err(|err| {
      warn!("P{pid}: carving {size} units failed: {err}");
    })
  }

  /// Frees the region owned by `pid` and returns its span.
  ///
  /// The freed space is merged with a free neighbour on either side.
  pub fn release(
    &mut self,
    pid: Pid,
  ) -> Result<Span> {
    let id = self.index.lookup(pid).ok_or(AllocError::ProcessUnknown(pid))?;
    let freed = self.ledger.get(id)?.span;

    self.index.remove(pid)?;
    self.ledger.set_kind(id, RegionKind::Hole)?;

    let mut hole = id;
    if let Some(next) = self.ledger.next(hole) {
      if self.ledger.get(next)?.is_hole() {
        hole = self.ledger.merge(hole, next)?;
      }
    }
    if let Some(prev) = self.ledger.prev(hole) {
      if self.ledger.get(prev)?.is_hole() {
        hole = self.ledger.merge(prev, hole)?;
      }
    }

    debug!("P{pid} released {freed}, free run now {}", self.ledger.get(hole)?.span);
    Ok(freed)
  }

  /// Slides every process toward address 0, keeping their order, and
  /// gathers all free space into one trailing hole.
  ///
  /// ```text
  ///   before:  │ free │ P2 │ free │ P4 │   free   │
  ///   after:   │ P2 │ P4 │          free          │
  /// ```
  ///
  /// Any error returned here means the ledger is corrupt.
  pub fn compact(&mut self) -> Result<()> {
    let mut cursor = Some(self.ledger.head());
    let mut swaps = 0usize;
    let mut merges = 0usize;

    while let Some(id) = cursor {
      if !self.ledger.get(id)?.is_hole() {
        cursor = self.ledger.next(id);
        continue;
      }

      while let Some(next) = self.ledger.next(id) {
        if self.ledger.get(next)?.is_hole() {
          break;
        }
        let moved = self.ledger.swap_with_next(id)?;
        trace!("compact: {:?} moved below hole {:?}", moved, id);
        swaps += 1;
      }

      match self.ledger.next(id) {
        Some(next) => {
          self.ledger.merge(id, next).inspect_err(|err| {
            error!("compaction hit a corrupt ledger: {err}");
          })?;
          merges += 1;
        }
        None => cursor = None,
      }
    }

    debug!("compacted: {swaps} moves, {merges} merges");
    Ok(())
  }

  /// Address-ordered listing of every region.
  pub fn report(&self) -> Report<'_> {
    Report::new(self.ledger.iter())
  }

  /// The span `pid` currently owns, if any.
  pub fn lookup(
    &self,
    pid: Pid,
  ) -> Option<Span> {
    let id = self.index.lookup(pid)?;
    self.ledger.get(id).ok().map(|region| region.span)
  }

  pub fn usage(&self) -> Usage {
    self.ledger.iter().fold(
      Usage {
        total: self.ledger.total_size(),
        ..Usage::default()
      },
      |mut usage, (_, region)| {
        match region.kind {
          RegionKind::Hole => {
            usage.free += region.span.size;
            usage.holes += 1;
            usage.largest_hole = usage.largest_hole.max(region.span.size);
          }
          RegionKind::Process(_) => {
            usage.allocated += region.span.size;
            usage.processes += 1;
          }
        }
        usage
      },
    )
  }

  /// Checks tiling, merge completeness and index coherence.
  pub fn verify(&self) -> Result<()> {
    let mut expected_start = 0u64;
    let mut previous: Option<RegionId> = None;
    let mut owners = HashSet::new();
    let mut count = 0usize;

    for (id, region) in self.ledger.iter() {
      count += 1;

      if region.span.size == 0 {
        return Err(self.violation("zero-sized region"));
      }
      if region.span.start != expected_start {
        return Err(self.violation("regions leave a gap or overlap"));
      }
      if self.ledger.prev(id) != previous {
        return Err(self.violation("back link does not match order"));
      }
      if let Some(prev) = previous {
        if self.ledger.get(prev)?.mergeable_with(region) {
          return Err(self.violation("adjacent regions should have been merged"));
        }
      }
      if let RegionKind::Process(pid) = region.kind {
        if !owners.insert(pid) {
          return Err(self.violation("process owns more than one region"));
        }
        if self.index.lookup(pid) != Some(id) {
          return Err(self.violation("index does not point at the owning region"));
        }
      }

      expected_start = region.span.end();
      previous = Some(id);
    }

    if expected_start != self.ledger.total_size() {
      return Err(self.violation("regions do not cover the address space"));
    }
    if count != self.ledger.len() {
      return Err(self.violation("unreachable live regions"));
    }
    if owners.len() != self.index.len() {
      return Err(self.violation("index holds entries for absent processes"));
    }

    Ok(())
  }

  fn violation(
    &self,
    what: &'static str,
  ) -> AllocError {
    error!("ledger check failed: {what}");
    AllocError::InvariantViolated(what)
  }
}
