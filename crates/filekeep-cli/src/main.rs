// filekeep-cli: command-line frontend for filekeep-core
// Argument parsing, logging setup, result printing

mod cli;
mod output;

use clap::Parser;
use cli::{Cli, Command};
use filekeep_core::{FileKeep, logical_name};
use output::{Entry, OutputHandler, entries};
use std::io::{self, Write};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> io::Result<()> {
    let output = OutputHandler::new(cli.json);
    let keep = FileKeep::load(cli.home)?;
    log::debug!("home: {}", keep.home().display());
    let mut stdout = io::stdout();

    match cli.command {
        Command::Backend => {
            output.emit_value(&mut stdout, "backend", &keep.selection().to_string())?;
        }
        Command::Init => {
            let snapshot = keep.init_enumerate().await?;
            output.emit_entries(&mut stdout, &entries(&snapshot))?;
        }
        Command::Save { urls } => {
            let results = keep.save_all(&urls).await;
            let mut saved = Vec::new();
            let mut failed = 0usize;
            for (url, result) in urls.iter().zip(results) {
                match result {
                    Ok(handle) => {
                        let name = logical_name(url)?;
                        saved.push(Entry::new(&name, &handle));
                    }
                    Err(e) => {
                        eprintln!("[{}] {}", url, e);
                        failed += 1;
                    }
                }
            }
            output.emit_entries(&mut stdout, &saved)?;
            if failed > 0 {
                return Err(io::Error::other(format!(
                    "{} of {} save(s) failed",
                    failed,
                    urls.len()
                )));
            }
        }
        Command::Get { name, output: path } => {
            let handle = keep.get(&name).await?;
            match path {
                Some(path) => {
                    let bytes = handle.read().await?;
                    tokio::fs::write(&path, &bytes).await?;
                    log::info!("wrote {} bytes to {}", bytes.len(), path.display());
                }
                None => output.emit_value(&mut stdout, "url", &handle.url())?,
            }
        }
        Command::List => {
            // Each invocation is a fresh session, so the registry starts empty.
            keep.init_enumerate().await?;
            let snapshot = keep.list_cached()?;
            output.emit_entries(&mut stdout, &entries(&snapshot))?;
        }
    }

    stdout.flush()
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli).await
}
