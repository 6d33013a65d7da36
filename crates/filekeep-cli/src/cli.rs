//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// filekeep - fetch remote files and keep them in local storage
#[derive(Parser, Debug)]
#[command(name = "filekeep", version, about = "Fetch remote files and keep them in local storage")]
pub struct Cli {
    /// Home directory (overrides FILEKEEP_HOME)
    #[arg(long, value_name = "DIR", global = true)]
    pub home: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Print the selected storage backend
    Backend,
    /// Enumerate stored files
    Init,
    /// Fetch and store one or more URLs
    Save {
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,
    },
    /// Resolve a stored file by name
    Get {
        name: String,
        /// Write the file's bytes here instead of printing its URL
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Print the registry of known files
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("filekeep").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_save_multiple_urls() {
        let cli = parse(&["save", "https://h/a.bin", "https://h/b.bin"]);
        assert_eq!(
            cli.command,
            Command::Save {
                urls: vec!["https://h/a.bin".into(), "https://h/b.bin".into()]
            }
        );
    }

    #[test]
    fn test_save_requires_url() {
        assert!(Cli::try_parse_from(["filekeep", "save"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["list", "--json", "--home", "/tmp/fk", "-v"]);
        assert!(cli.json);
        assert!(cli.verbose);
        assert_eq!(cli.home, Some(PathBuf::from("/tmp/fk")));
        assert_eq!(cli.command, Command::List);
    }

    #[test]
    fn test_get_with_output() {
        let cli = parse(&["get", "a.bin", "-o", "out.bin"]);
        assert_eq!(
            cli.command,
            Command::Get {
                name: "a.bin".into(),
                output: Some(PathBuf::from("out.bin"))
            }
        );
    }
}
