use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{debug, error};
use rsegalloc::command::Command;
use rsegalloc::{AllocError, RegionAllocator};

/// Interactive contiguous region allocator.
#[derive(Parser)]
#[command(name = "rsegalloc", version)]
struct Options {
  /// Total size of the simulated address space.
  #[arg(value_parser = clap::value_parser!(u64).range(1..))]
  size: u64,

  /// Maximum number of regions the ledger may hold at once.
  #[arg(long, value_name = "N")]
  max_regions: Option<usize>,
}

/// Only prompt when a person is typing; scripts piped into stdin get
/// nothing but the reports on stdout.
fn stdin_is_terminal() -> bool {
  unsafe { libc::isatty(libc::STDIN_FILENO) == 1 }
}

fn print_prompt() {
  print!("allocator> ");
  let _ = io::stdout().flush();
}

fn print_report(allocator: &RegionAllocator) {
  let stdout = io::stdout();
  let mut out = stdout.lock();
  for line in allocator.report() {
    let _ = writeln!(out, "{line}");
  }

  let usage = allocator.usage();
  debug!(
    "{} of {} units allocated to {} processes, {} holes (largest {})",
    usage.allocated, usage.total, usage.processes, usage.holes, usage.largest_hole
  );
}

/// Reports a failed command. Returns `false` when the session must end.
fn report_failure(
  name: &str,
  err: AllocError,
) -> bool {
  eprintln!("{name} error: {err}");
  if err.is_fatal() {
    error!("ledger is corrupt, ending session");
    return false;
  }
  true
}

fn main() -> ExitCode {
  env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

  let options = Options::parse();

  let allocator = match options.max_regions {
    Some(max) => RegionAllocator::with_region_limit(options.size, max),
    None => RegionAllocator::new(options.size),
  };
  let mut allocator = match allocator {
    Ok(allocator) => allocator,
    Err(err) => {
      eprintln!("Failed to set up address space: {err}");
      return ExitCode::from(2);
    }
  };

  let interactive = stdin_is_terminal();
  let mut lines = io::stdin().lock().lines();

  loop {
    if interactive {
      print_prompt();
    }

    let line = match lines.next() {
      Some(Ok(line)) => line,
      Some(Err(err)) => {
        error!("failed to read command: {err}");
        return ExitCode::FAILURE;
      }
      None => break,
    };

    let command = match Command::parse(&line) {
      Ok(Some(command)) => command,
      Ok(None) => continue,
      Err(err) => {
        eprintln!("{err}");
        continue;
      }
    };

    let keep_going = match command {
      Command::Request { pid, size, mode } => match allocator.allocate(pid, size, mode) {
        Ok(_) => true,
        Err(err) => report_failure("RQ", err),
      },
      Command::Release { pid } => match allocator.release(pid) {
        Ok(_) => true,
        Err(err) => report_failure("RL", err),
      },
      Command::Compact => match allocator.compact() {
        Ok(()) => true,
        Err(err) => {
          eprintln!("C error: {err}");
          error!("compaction failed, ending session");
          false
        }
      },
      Command::Stat => {
        print_report(&allocator);
        true
      }
      Command::Exit => break,
    };

    if !keep_going {
      return ExitCode::FAILURE;
    }
  }

  ExitCode::SUCCESS
}
