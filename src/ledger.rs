//! Ordered, gapless list of regions backed by an index arena.
//!
//! ```text
//!   slots:  ┌──────────┬──────────┬──────────┬──────────┐
//!           │ 0: P1    │ 1: Hole  │ 2: free  │ 3: P2    │
//!           │ [0:19]   │ [50:99]  │ ───┐     │ [20:49]  │
//!           └──────────┴──────────┴────┼─────┴──────────┘
//!                                      └─► next free slot
//!
//!   order:  head ─► 0 ─► 3 ─► 1 ─► (end)
//! ```
//!
//! Regions refer to their neighbours by [`RegionId`], never by pointer.
//! Slots released by merges go onto a free list and are handed out again
//! before the arena grows.

use log::trace;

use crate::error::{AllocError, Result};
use crate::region::{Pid, Region, RegionKind};

/// Stable handle to a live region in a [`Ledger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(u32);

impl RegionId {
  fn slot(self) -> usize {
    self.0 as usize
  }
}

#[derive(Debug, Clone)]
struct Node {
  region: Region,
  prev: Option<RegionId>,
  next: Option<RegionId>,
}

#[derive(Debug, Clone)]
enum Slot {
  Live(Node),
  Free { next_free: Option<u32> },
}

#[derive(Debug, Clone)]
pub struct Ledger {
  slots: Vec<Slot>,
  free_head: Option<u32>,
  head: RegionId,
  total_size: u64,
  live: usize,
  max_regions: Option<usize>,
}

impl Ledger {
  /// Creates a ledger holding one hole over `[0, total_size)`.
  ///
  /// `max_regions` caps the number of live region nodes; creating a node
  /// beyond it fails with [`AllocError::ResourceExhausted`].
  pub fn new(
    total_size: u64,
    max_regions: Option<usize>,
  ) -> Result<Self> {
    if total_size == 0 {
      return Err(AllocError::InvalidLedger);
    }
    if max_regions == Some(0) {
      return Err(AllocError::ResourceExhausted);
    }

    let node = Node {
      region: Region::hole(0, total_size),
      prev: None,
      next: None,
    };

    Ok(Self {
      slots: vec![Slot::Live(node)],
      free_head: None,
      head: RegionId(0),
      total_size,
      live: 1,
      max_regions,
    })
  }

  pub fn head(&self) -> RegionId {
    self.head
  }

  pub fn total_size(&self) -> u64 {
    self.total_size
  }

  /// Number of live regions.
  pub fn len(&self) -> usize {
    self.live
  }

  pub fn is_empty(&self) -> bool {
    self.live == 0
  }

  pub fn get(
    &self,
    id: RegionId,
  ) -> Result<&Region> {
    self.node(id).map(|node| &node.region)
  }

  pub fn next(
    &self,
    id: RegionId,
  ) -> Option<RegionId> {
    self.node(id).ok().and_then(|node| node.next)
  }

  pub fn prev(
    &self,
    id: RegionId,
  ) -> Option<RegionId> {
    self.node(id).ok().and_then(|node| node.prev)
  }

  /// Walks the regions in address order.
  pub fn iter(&self) -> Iter<'_> {
    Iter {
      ledger: self,
      cursor: Some(self.head),
    }
  }

  /// Retags a region in place. The span is left untouched.
  pub fn set_kind(
    &mut self,
    id: RegionId,
    kind: RegionKind,
  ) -> Result<()> {
    self.node_mut(id)?.region.kind = kind;
    Ok(())
  }

  /// Carves `size` units off the front of `hole` into a new process region.
  ///
  /// The new region is linked directly before the hole, which shrinks in
  /// place. A hole shrunk to nothing is unlinked and its slot recycled.
  /// Nothing is modified unless the whole carve succeeds.
  pub fn carve(
    &mut self,
    hole: RegionId,
    pid: Pid,
    size: u64,
  ) -> Result<RegionId> {
    if size == 0 {
      return Err(AllocError::EmptyRequest);
    }

    let (start, available, prev) = {
      let node = self.node(hole)?;
      if !node.region.is_hole() {
        return Err(AllocError::NotAHole);
      }
      (node.region.span.start, node.region.span.size, node.prev)
    };
    if available < size {
      return Err(AllocError::HoleTooSmall { available, requested: size });
    }

    let carved = self.alloc_slot(Node {
      region: Region::new(RegionKind::Process(pid), start, size),
      prev,
      next: Some(hole),
    })?;

    match prev {
      Some(prev) => self.node_mut(prev)?.next = Some(carved),
      None => self.head = carved,
    }

    let hole_node = self.node_mut(hole)?;
    hole_node.prev = Some(carved);
    hole_node.region.span.start += size;
    hole_node.region.span.size -= size;

    if hole_node.region.span.size == 0 {
      self.unlink(hole)?;
    }

    trace!("carve P{pid} {} units at {start} ({} left in hole)", size, available - size);

    Ok(carved)
  }

  /// Turns a freshly carved region back into free space.
  ///
  /// Used to roll back a carve when the step after it fails; the address
  /// layout ends up as it was before the carve.
  pub fn restore_hole(
    &mut self,
    carved: RegionId,
  ) -> Result<()> {
    self.set_kind(carved, RegionKind::Hole)?;

    if let Some(next) = self.next(carved) {
      if self.get(next)?.is_hole() {
        self.merge(carved, next)?;
      }
    }

    Ok(())
  }

  /// Merges two neighbouring regions of the same kind and owner.
  ///
  /// Arguments may be given in either order. The lower region survives,
  /// absorbs the upper one's span, and is returned.
  pub fn merge(
    &mut self,
    a: RegionId,
    b: RegionId,
  ) -> Result<RegionId> {
    let first = *self.get(a)?;
    let second = *self.get(b)?;

    match (first.kind, second.kind) {
      (RegionKind::Hole, RegionKind::Hole) => {}
      (RegionKind::Process(left), RegionKind::Process(right)) if left != right => {
        return Err(AllocError::OwnerMismatch { left, right });
      }
      (RegionKind::Process(_), RegionKind::Process(_)) => {}
      _ => return Err(AllocError::KindMismatch),
    }

    let (lower, upper) = if self.next(a) == Some(b) {
      (a, b)
    } else if self.next(b) == Some(a) {
      (b, a)
    } else {
      return Err(AllocError::NotAdjacent);
    };

    let absorbed = self.get(upper)?.span.size;
    self.unlink(upper)?;
    self.node_mut(lower)?.region.span.size += absorbed;

    trace!("merge {:?} <- {:?} ({} units absorbed)", lower, upper, absorbed);

    Ok(lower)
  }

  /// Moves `hole` past the process region directly after it.
  ///
  /// The process takes over the hole's start address and the hole moves
  /// up by the process's size. Returns the process region.
  pub fn swap_with_next(
    &mut self,
    hole: RegionId,
  ) -> Result<RegionId> {
    let (hole_region, prev, proc_id) = {
      let node = self.node(hole)?;
      (node.region, node.prev, node.next.ok_or(AllocError::NullRegion)?)
    };
    if !hole_region.is_hole() {
      return Err(AllocError::NotAHole);
    }

    let (proc_size, after) = {
      let node = self.node(proc_id)?;
      if node.region.is_hole() {
        return Err(AllocError::KindMismatch);
      }
      (node.region.span.size, node.next)
    };

    {
      let node = self.node_mut(proc_id)?;
      node.region.span.start = hole_region.span.start;
      node.prev = prev;
      node.next = Some(hole);
    }
    {
      let node = self.node_mut(hole)?;
      node.region.span.start = hole_region.span.start + proc_size;
      node.prev = Some(proc_id);
      node.next = after;
    }

    match prev {
      Some(prev) => self.node_mut(prev)?.next = Some(proc_id),
      None => self.head = proc_id,
    }
    if let Some(after) = after {
      self.node_mut(after)?.prev = Some(hole);
    }

    Ok(proc_id)
  }

  fn node(
    &self,
    id: RegionId,
  ) -> Result<&Node> {
    match self.slots.get(id.slot()) {
      Some(Slot::Live(node)) => Ok(node),
      _ => Err(AllocError::NullRegion),
    }
  }

  fn node_mut(
    &mut self,
    id: RegionId,
  ) -> Result<&mut Node> {
    match self.slots.get_mut(id.slot()) {
      Some(Slot::Live(node)) => Ok(node),
      _ => Err(AllocError::NullRegion),
    }
  }

  fn alloc_slot(
    &mut self,
    node: Node,
  ) -> Result<RegionId> {
    if self.max_regions.is_some_and(|max| self.live >= max) {
      return Err(AllocError::ResourceExhausted);
    }

    if let Some(index) = self.free_head {
      let next_free = match self.slots[index as usize] {
        Slot::Free { next_free } => next_free,
        Slot::Live(_) => return Err(AllocError::InvariantViolated("free list points at a live slot")),
      };
      self.free_head = next_free;
      self.slots[index as usize] = Slot::Live(node);
      self.live += 1;
      trace!("reuse slot {index}");
      return Ok(RegionId(index));
    }

    let index = u32::try_from(self.slots.len()).map_err(|_| AllocError::ResourceExhausted)?;
    self
      .slots
      .try_reserve(1)
      .map_err(|_| AllocError::ResourceExhausted)?;
    self.slots.push(Slot::Live(node));
    self.live += 1;

    Ok(RegionId(index))
  }

  /// Splices `id` out of the order and recycles its slot.
  fn unlink(
    &mut self,
    id: RegionId,
  ) -> Result<()> {
    let (prev, next) = {
      let node = self.node(id)?;
      (node.prev, node.next)
    };

    match prev {
      Some(prev) => self.node_mut(prev)?.next = next,
      None => match next {
        Some(next) => self.head = next,
        None => return Err(AllocError::InvalidLedger),
      },
    }
    if let Some(next) = next {
      self.node_mut(next)?.prev = prev;
    }

    self.slots[id.slot()] = Slot::Free {
      next_free: self.free_head,
    };
    self.free_head = Some(id.0);
    self.live -= 1;

    Ok(())
  }
}

/// Address-ordered walk over a [`Ledger`].
#[derive(Clone)]
pub struct Iter<'a> {
  ledger: &'a Ledger,
  cursor: Option<RegionId>,
}

impl<'a> Iterator for Iter<'a> {
  type Item = (RegionId, &'a Region);

  fn next(&mut self) -> Option<Self::Item> {
    let id = self.cursor?;
    let node = self.ledger.node(id).ok()?;
    self.cursor = node.next;
    Some((id, &node.region))
  }
}
