//! CLI module for Hark.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Hark - searchable, citable podcast archives
///
/// Transcribes episodes into time-coded passages and answers queries with
/// hybrid (vector + lexical) retrieval.
#[derive(Parser, Debug)]
#[command(name = "hark")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "HARK_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe and index audio files
    Ingest {
        /// Audio files (or JSON transcripts with --transcript)
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Re-index even if the source is already indexed
        #[arg(short, long)]
        force: bool,

        /// Treat inputs as pre-transcribed JSON instead of audio
        #[arg(short, long)]
        transcript: bool,
    },

    /// Search indexed episodes
    Search {
        /// Search query
        query: String,

        /// Number of results (defaults to retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Print hits as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask a question and get a cited answer
    Ask {
        /// The question to ask
        question: String,

        /// Number of passages to retrieve (defaults to retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Skip language models and summarize the top passages
        #[arg(long)]
        no_generate: bool,
    },

    /// List indexed sources
    List,

    /// Remove a source from the index
    Remove {
        /// Source ID as shown by `hark list`
        source_id: String,
    },

    /// Start HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingest() {
        let cli = Cli::parse_from(["hark", "-vv", "ingest", "--force", "a.mp3", "b.wav"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ingest {
                inputs,
                force,
                transcript,
            } => {
                assert_eq!(inputs, vec!["a.mp3", "b.wav"]);
                assert!(force);
                assert!(!transcript);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_search_top_k() {
        let cli = Cli::parse_from(["hark", "search", "rust async", "-k", "3"]);
        assert!(matches!(
            cli.command,
            Commands::Search { top_k: Some(3), json: false, .. }
        ));
    }

    #[test]
    fn test_ingest_requires_input() {
        assert!(Cli::try_parse_from(["hark", "ingest"]).is_err());
    }
}
