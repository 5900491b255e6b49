use thiserror::Error;

use crate::region::Pid;

/// Failures reported by the region allocator.
///
/// Every core operation either succeeds or returns exactly one of these.
/// The caller decides how to present them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
  #[error("address space is absent or empty")]
  InvalidLedger,

  #[error("unknown placement strategy '{0}' (expected F, B or W)")]
  InvalidStrategy(char),

  #[error("region handle does not refer to a live region")]
  NullRegion,

  #[error("region is not a hole")]
  NotAHole,

  #[error("hole too small: {available} available, {requested} requested")]
  HoleTooSmall { available: u64, requested: u64 },

  #[error("process P{0} owns no region")]
  ProcessUnknown(Pid),

  #[error("requested size must be greater than zero")]
  EmptyRequest,

  #[error("cannot merge a hole with a process region")]
  KindMismatch,

  #[error("cannot merge regions owned by P{left} and P{right}")]
  OwnerMismatch { left: Pid, right: Pid },

  #[error("regions are not adjacent")]
  NotAdjacent,

  #[error("no hole can hold {0} units")]
  NoFit(u64),

  #[error("process P{pid} cannot grow by {requested} units in place")]
  ExtensionBlocked { pid: Pid, requested: u64 },

  #[error("no storage left for a new region node")]
  ResourceExhausted,

  #[error("ledger invariant violated: {0}")]
  InvariantViolated(&'static str),
}

impl AllocError {
  /// Whether the error means the ledger itself is inconsistent.
  ///
  /// A fatal error coming out of [`compact`](crate::RegionAllocator::compact)
  /// must end the session rather than keep operating on the ledger.
  pub fn is_fatal(&self) -> bool {
    matches!(
      self,
      AllocError::KindMismatch
        | AllocError::OwnerMismatch { .. }
        | AllocError::NotAdjacent
        | AllocError::InvariantViolated(_)
    )
  }
}

pub type Result<T> = core::result::Result<T, AllocError>;

/// Failures of the command reader, before anything reaches the allocator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
  #[error("usage: {0}")]
  Usage(&'static str),

  #[error("invalid pid: {0}")]
  InvalidPid(String),

  #[error("invalid size: {0}")]
  InvalidSize(String),

  #[error("unknown command: {0}")]
  UnknownCommand(String),

  #[error(transparent)]
  Strategy(#[from] AllocError),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fatal_kinds() {
    assert!(AllocError::NotAdjacent.is_fatal());
    assert!(AllocError::KindMismatch.is_fatal());
    assert!(AllocError::OwnerMismatch { left: 1, right: 2 }.is_fatal());
    assert!(AllocError::InvariantViolated("gap").is_fatal());

    assert!(!AllocError::NoFit(10).is_fatal());
    assert!(!AllocError::ProcessUnknown(3).is_fatal());
    assert!(!AllocError::ResourceExhausted.is_fatal());
  }

  #[test]
  fn test_messages() {
    assert_eq!(
      AllocError::HoleTooSmall { available: 4, requested: 9 }.to_string(),
      "hole too small: 4 available, 9 requested"
    );
    assert_eq!(AllocError::ProcessUnknown(7).to_string(), "process P7 owns no region");
    assert_eq!(
      CommandError::from(AllocError::InvalidStrategy('Q')).to_string(),
      "unknown placement strategy 'Q' (expected F, B or W)"
    );
  }
}
