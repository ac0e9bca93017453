//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod download;
mod library;
mod summarize;
mod tools;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use paperdigest::config::Settings;

#[derive(Parser)]
#[command(name = "paperdigest")]
#[command(about = "Download and summarize the daily Hugging Face papers")]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to ./paperdigest.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Download the papers listed for a date
    Download {
        /// Date to crawl (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Number of papers to download (0 = unlimited)
        #[arg(short = 'n', long, default_value = "0")]
        number: usize,
        /// Show the browser window
        #[arg(long)]
        no_headless: bool,
    },

    /// List date directories with downloaded papers
    Dirs,

    /// List the PDF files downloaded for a date
    Files {
        /// Date directory name
        dir: String,
    },

    /// Summarize a downloaded paper and answer follow-up questions
    Summarize {
        /// Date directory name
        dir: String,
        /// PDF file name
        file: String,
        /// Follow-up question (repeatable)
        #[arg(short, long = "ask")]
        ask: Vec<String>,
    },

    /// Check availability of text extraction tools
    Tools,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Download {
            date,
            number,
            no_headless,
        } => download::cmd_download(&settings, date, number, no_headless).await,
        Commands::Dirs => library::cmd_dirs(&settings),
        Commands::Files { dir } => library::cmd_files(&settings, &dir),
        Commands::Summarize { dir, file, ask } => {
            summarize::cmd_summarize(&settings, &dir, &file, &ask).await
        }
        Commands::Tools => tools::cmd_tools(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_args() {
        let cli = Cli::try_parse_from([
            "paperdigest",
            "-v",
            "download",
            "-d",
            "2024-03-01",
            "-n",
            "5",
            "--no-headless",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Download {
                date,
                number,
                no_headless,
            } => {
                assert_eq!(date.as_deref(), Some("2024-03-01"));
                assert_eq!(number, 5);
                assert!(no_headless);
            }
            _ => panic!("expected download"),
        }
    }

    #[test]
    fn test_download_defaults() {
        let cli = Cli::try_parse_from(["paperdigest", "download"]).unwrap();
        match cli.command {
            Commands::Download {
                date,
                number,
                no_headless,
            } => {
                assert!(date.is_none());
                assert_eq!(number, 0);
                assert!(!no_headless);
            }
            _ => panic!("expected download"),
        }
    }

    #[test]
    fn test_summarize_questions() {
        let cli = Cli::try_parse_from([
            "paperdigest",
            "summarize",
            "2024-03-01",
            "paper.pdf",
            "--ask",
            "What is new?",
            "--ask",
            "Which datasets?",
        ])
        .unwrap();
        match cli.command {
            Commands::Summarize { dir, file, ask } => {
                assert_eq!(dir, "2024-03-01");
                assert_eq!(file, "paper.pdf");
                assert_eq!(ask, vec!["What is new?", "Which datasets?"]);
            }
            _ => panic!("expected summarize"),
        }
    }
}
