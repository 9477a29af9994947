use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::Parser as ClapParser;

use loxide::{Lox, RunStatus};

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Script to run; starts an interactive prompt when omitted.
    scripts: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args: Cli = Cli::parse();

    match args.scripts.as_slice() {
        [] => run_prompt(),

        [script] => run_file(script),

        _ => {
            eprintln!("Usage: loxide [script]");
            exit(64);
        }
    }
}

fn run_file(path: &Path) -> anyhow::Result<()> {
    let source: String = fs::read_to_string(path)?;

    let mut lox = Lox::new(io::stdout(), io::stderr());

    let status: RunStatus = lox.run(&source);

    if status != RunStatus::Ok {
        exit(status.exit_code());
    }

    Ok(())
}

fn run_prompt() -> anyhow::Result<()> {
    let mut lox = Lox::new(io::stdout(), io::stderr());

    let stdin = io::stdin();

    print!("> ");
    io::stdout().flush()?;

    for line in stdin.lock().lines() {
        // Errors never kill the session: each line starts fresh.
        lox.run(&line?);

        print!("> ");
        io::stdout().flush()?;
    }

    Ok(())
}
