use std::{fs, path::PathBuf};

use clap::{Parser, Subcommand};

use tinytalk::{run_with_limits, ExecutionLimits, Repl, TinyTalkError};

#[derive(Parser)]
#[command(author, version, about = "TinyTalk language interpreter")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a TinyTalk script file
    Run {
        script: PathBuf,
        /// Abort evaluation after this many steps
        #[arg(long)]
        max_steps: Option<u64>,
    },
    /// Start an interactive REPL session
    Repl,
    /// Evaluate a snippet of TinyTalk code
    Eval {
        source: String,
        /// Abort evaluation after this many steps
        #[arg(long)]
        max_steps: Option<u64>,
    },
}

fn main() -> Result<(), TinyTalkError> {
    let args = Args::parse();
    match args.command.unwrap_or(Command::Repl) {
        Command::Run { script, max_steps } => {
            let source = fs::read_to_string(&script)?;
            execute(&source, max_steps)
        }
        Command::Repl => {
            let mut repl = Repl::new();
            repl.run()
        }
        Command::Eval { source, max_steps } => execute(&source, max_steps),
    }
}

fn execute(source: &str, max_steps: Option<u64>) -> Result<(), TinyTalkError> {
    let outcome = run_with_limits(source, ExecutionLimits { max_steps });
    for line in &outcome.output {
        println!("{line}");
    }
    match outcome.error {
        Some(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
        None => Ok(()),
    }
}
