//! Text commands accepted by the interactive session.
//!
//! ```text
//!   RQ P<pid> <size> {F|B|W}   request <size> units for <pid>
//!   RL P<pid>                  release everything <pid> owns
//!   C                          compact
//!   STAT                       print the address map
//!   X                          quit
//! ```

use crate::error::CommandError;
use crate::region::Pid;
use crate::search::SearchMode;

const RQ_USAGE: &str = "RQ P<pid> <size> {F|B|W}";
const RL_USAGE: &str = "RL P<pid>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
  Request { pid: Pid, size: u64, mode: SearchMode },
  Release { pid: Pid },
  Compact,
  Stat,
  Exit,
}

impl Command {
  /// Parses one input line. Blank lines yield `Ok(None)`.
  pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
    let mut tokens = line.split_whitespace();
    let Some(name) = tokens.next() else {
      return Ok(None);
    };

    let command = match name {
      "RQ" => {
        let (Some(pid), Some(size), Some(flag)) = (tokens.next(), tokens.next(), tokens.next()) else {
          return Err(CommandError::Usage(RQ_USAGE));
        };
        let pid = parse_pid(pid)?;
        let size = parse_size(size)?;
        let mode = flag.parse::<SearchMode>()?;
        Command::Request { pid, size, mode }
      }
      "RL" => {
        let Some(pid) = tokens.next() else {
          return Err(CommandError::Usage(RL_USAGE));
        };
        Command::Release { pid: parse_pid(pid)? }
      }
      "C" => Command::Compact,
      "STAT" => Command::Stat,
      "X" | "x" => Command::Exit,
      other => return Err(CommandError::UnknownCommand(other.to_string())),
    };

    Ok(Some(command))
  }
}

/// Accepts `P12`, `p12` or `12`.
pub fn parse_pid(token: &str) -> Result<Pid, CommandError> {
  let digits = token
    .strip_prefix('P')
    .or_else(|| token.strip_prefix('p'))
    .unwrap_or(token);

  parse_decimal(digits).ok_or_else(|| CommandError::InvalidPid(token.to_string()))
}

pub fn parse_size(token: &str) -> Result<u64, CommandError> {
  parse_decimal(token).ok_or_else(|| CommandError::InvalidSize(token.to_string()))
}

fn parse_decimal(digits: &str) -> Option<u64> {
  if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  digits.parse().ok()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::AllocError;

  #[test]
  fn test_request() {
    assert_eq!(
      Command::parse("RQ P1 20 F"),
      Ok(Some(Command::Request { pid: 1, size: 20, mode: SearchMode::FirstFit }))
    );
    assert_eq!(
      Command::parse("  RQ p7   300 W \n"),
      Ok(Some(Command::Request { pid: 7, size: 300, mode: SearchMode::WorstFit }))
    );
    assert_eq!(
      Command::parse("RQ 3 0 B"),
      Ok(Some(Command::Request { pid: 3, size: 0, mode: SearchMode::BestFit }))
    );
  }

  #[test]
  fn test_request_errors() {
    assert_eq!(Command::parse("RQ P1 20"), Err(CommandError::Usage(RQ_USAGE)));
    assert_eq!(Command::parse("RQ P 20 F"), Err(CommandError::InvalidPid("P".into())));
    assert_eq!(Command::parse("RQ Px1 20 F"), Err(CommandError::InvalidPid("Px1".into())));
    assert_eq!(Command::parse("RQ P1 -4 F"), Err(CommandError::InvalidSize("-4".into())));
    assert_eq!(Command::parse("RQ P1 ten F"), Err(CommandError::InvalidSize("ten".into())));
    assert_eq!(
      Command::parse("RQ P1 10 Q"),
      Err(CommandError::Strategy(AllocError::InvalidStrategy('Q')))
    );
  }

  #[test]
  fn test_other_commands() {
    assert_eq!(Command::parse("RL P12"), Ok(Some(Command::Release { pid: 12 })));
    assert_eq!(Command::parse("RL"), Err(CommandError::Usage(RL_USAGE)));
    assert_eq!(Command::parse("C"), Ok(Some(Command::Compact)));
    assert_eq!(Command::parse("STAT"), Ok(Some(Command::Stat)));
    assert_eq!(Command::parse("x"), Ok(Some(Command::Exit)));
    assert_eq!(Command::parse("   "), Ok(None));
    assert_eq!(Command::parse("stat"), Err(CommandError::UnknownCommand("stat".into())));
  }

  #[test]
  fn test_pid_overflow() {
    assert_eq!(
      parse_pid("P99999999999999999999999"),
      Err(CommandError::InvalidPid("P99999999999999999999999".into()))
    );
  }
}
