//! # rsegalloc - A Region Allocator Simulator
//!
//! This crate models how an operating system hands out one flat address
//! space to competing processes, one contiguous region per process. No real
//! memory is touched: the allocator only keeps an ordered, gapless
//! description of which addresses are used by whom.
//!
//! ## Overview
//!
//! ```text
//!   Address Space (total_size = 100):
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                                                                      │
//!   │   ┌──────────┬────────────────┬──────────┬───────────────────────┐   │
//!   │   │    P1    │     Unused     │    P3    │        Unused         │   │
//!   │   │  [0:19]  │    [20:49]     │ [50:59]  │       [60:99]         │   │
//!   │   └──────────┴────────────────┴──────────┴───────────────────────┘   │
//!   │                                                                      │
//!   │   Ledger: regions in address order, no gaps, no overlaps.            │
//!   │   Index:  P1 ─► region 0, P3 ─► region 2                             │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rsegalloc
//!   ├── allocator  - RegionAllocator: allocate, release, compact, report
//!   ├── command    - Parser for the interactive session's text commands
//!   ├── error      - AllocError and CommandError
//!   ├── index      - ProcessIndex: pid -> region handle
//!   ├── ledger     - Arena-backed ordered region list (internal primitives)
//!   ├── region     - Region, RegionKind, Span, Pid
//!   ├── report     - Lazy address map listing
//!   └── search     - SearchMode: first, best and worst fit
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rsegalloc::{RegionAllocator, SearchMode};
//!
//! let mut allocator = RegionAllocator::new(100).unwrap();
//!
//! allocator.allocate(1, 20, SearchMode::FirstFit).unwrap();
//! allocator.allocate(2, 30, SearchMode::FirstFit).unwrap();
//! allocator.release(1).unwrap();
//! allocator.compact().unwrap();
//!
//! for line in allocator.report() {
//!   println!("{line}");
//! }
//! // Addresses [0:29] Process P2
//! // Addresses [30:99] Unused
//! ```
//!
//! ## How It Works
//!
//! A fresh request carves the process region off the front of a hole picked
//! by the [`SearchMode`]:
//!
//! ```text
//!   before:  │            Hole [20:99]            │
//!   after:   │ P2 [20:49] │     Hole [50:99]      │
//! ```
//!
//! A process that already owns a region may only grow into the hole right
//! after it. Releasing a region turns it into a hole and merges it with free
//! neighbours, so two holes are never adjacent.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: callers sharing an allocator must serialize
//!   access to it as a whole
//! - **One region per process**: growth is in place or not at all
//! - **Linear search**: every placement walks the whole ledger

mod allocator;
pub mod command;
mod error;
mod index;
pub mod ledger;
mod region;
mod report;
mod search;
mod tests_prop;

pub use allocator::{RegionAllocator, Usage};
pub use error::{AllocError, CommandError, Result};
pub use index::ProcessIndex;
pub use region::{Pid, Region, RegionKind, Span};
pub use report::{Label, Report, ReportLine};
pub use search::SearchMode;
