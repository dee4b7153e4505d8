use std::env;
use std::fs;
use std::process::ExitCode;

use strata_parser::{Event, Parser};

/// Print every event of a YAML file with its span, resuming at the next document on errors.
fn main() -> ExitCode {
    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: dump_events <file.yaml>");
        return ExitCode::FAILURE;
    };
    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut parser = Parser::new_from_str(&source);
    let mut failed = false;
    while let Some(result) = parser.next_event() {
        match result {
            Ok((ev, span)) => {
                println!(
                    "{:>4}:{:<3} {:?}",
                    span.start.line(),
                    span.start.col() + 1,
                    ev
                );
                if ev == Event::StreamEnd {
                    break;
                }
            }
            Err(e) => {
                eprintln!("\x1B[;31m{path}: {e}\x1B[;m");
                failed = true;
                parser.recover();
            }
        }
        for diagnostic in parser.take_diagnostics() {
            eprintln!("\x1B[;33m{path}: {diagnostic}\x1B[;m");
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
