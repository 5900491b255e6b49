#![cfg(test)]
//! Property tests: random request/release/compact sequences keep the ledger
//! tiled, merged and indexed after every step.

use proptest::prelude::*;

use crate::allocator::RegionAllocator;
use crate::report::{Label, ReportLine};
use crate::search::SearchMode;

const TOTAL: u64 = 256;

#[derive(Debug, Clone)]
enum Op {
  Request { pid: u64, size: u64, mode: SearchMode },
  Release { pid: u64 },
  Compact,
}

fn arb_mode() -> impl Strategy<Value = SearchMode> {
  prop_oneof![Just(SearchMode::FirstFit), Just(SearchMode::BestFit), Just(SearchMode::WorstFit)]
}

fn arb_op() -> impl Strategy<Value = Op> {
  prop_oneof![
    4 => (0u64..8, 1u64..64, arb_mode()).prop_map(|(pid, size, mode)| Op::Request { pid, size, mode }),
    2 => (0u64..8).prop_map(|pid| Op::Release { pid }),
    1 => Just(Op::Compact),
  ]
}

fn apply(
  allocator: &mut RegionAllocator,
  op: &Op,
) {
  // Refusals are fine here; only the resulting state is checked.
  let _ = match *op {
    Op::Request { pid, size, mode } => allocator.allocate(pid, size, mode).map(|_| ()),
    Op::Release { pid } => allocator.release(pid).map(|_| ()),
    Op::Compact => allocator.compact(),
  };
}

fn snapshot(allocator: &RegionAllocator) -> Vec<ReportLine> {
  allocator.report().collect()
}

proptest! {
  #[test]
  fn invariants_hold_after_every_step(ops in prop::collection::vec(arb_op(), 1..80)) {
    let mut allocator = RegionAllocator::new(TOTAL).unwrap();

    for op in &ops {
      apply(&mut allocator, op);
      prop_assert_eq!(allocator.verify(), Ok(()));

      let usage = allocator.usage();
      prop_assert_eq!(usage.allocated + usage.free, TOTAL);
    }
  }

  #[test]
  fn lookup_matches_report(ops in prop::collection::vec(arb_op(), 1..80)) {
    let mut allocator = RegionAllocator::new(TOTAL).unwrap();
    for op in &ops {
      apply(&mut allocator, op);
    }

    for pid in 0u64..8 {
      let owned: Vec<ReportLine> = allocator
        .report()
        .filter(|line| line.label == Label::Process(pid))
        .collect();
      match allocator.lookup(pid) {
        Some(span) => {
          prop_assert_eq!(owned.len(), 1);
          prop_assert_eq!((owned[0].start, owned[0].end), (span.start, span.last()));
        }
        None => prop_assert!(owned.is_empty()),
      }
    }
  }

  #[test]
  fn compaction_gathers_free_space(ops in prop::collection::vec(arb_op(), 1..80)) {
    let mut allocator = RegionAllocator::new(TOTAL).unwrap();
    for op in &ops {
      apply(&mut allocator, op);
    }

    let before = snapshot(&allocator);
    let order: Vec<Label> = before
      .iter()
      .map(|line| line.label)
      .filter(|label| *label != Label::Unused)
      .collect();
    let free_before = allocator.usage().free;

    allocator.compact().unwrap();
    let once = snapshot(&allocator);

    let holes: Vec<&ReportLine> = once.iter().filter(|line| line.label == Label::Unused).collect();
    prop_assert!(holes.len() <= 1);
    if let Some(hole) = holes.first() {
      prop_assert_eq!(hole.end, TOTAL - 1);
      prop_assert_eq!(hole.end - hole.start + 1, free_before);
    }

    let order_after: Vec<Label> = once
      .iter()
      .map(|line| line.label)
      .filter(|label| *label != Label::Unused)
      .collect();
    prop_assert_eq!(order_after, order);

    allocator.compact().unwrap();
    prop_assert_eq!(snapshot(&allocator), once);
    prop_assert_eq!(allocator.verify(), Ok(()));
  }
}
