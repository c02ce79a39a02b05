//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "unspool",
    version,
    about = "Archives a Twitter user's timeline into one markdown file per thread",
    long_about = "Unspool fetches a user's tweets from the Twitter v2 API, folds reply threads \
                  into single combined documents, and writes each thread to a markdown file. \
                  Existing files are skipped by default, so re-runs only pick up new threads."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/unspool/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Append log output to this file in addition to stderr
    #[arg(long, global = true, value_name = "FILE")]
    pub export_logs_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a user's tweets and write one markdown file per thread
    Fetch {
        /// Twitter handle to fetch, without the leading @
        username: String,

        /// Directory to write tweet files into, created if missing
        #[arg(short, long, value_name = "DIRECTORY")]
        output_directory: Option<PathBuf>,

        /// Maximum number of tweets to retrieve
        #[arg(long, value_name = "N")]
        max_results: Option<usize>,

        /// Only fetch tweets older than this tweet id
        #[arg(long, value_name = "TWEET_ID")]
        after_id: Option<String>,

        /// Only fetch tweets newer than this tweet id
        #[arg(long, value_name = "TWEET_ID")]
        since_id: Option<String>,

        /// Run the whole pipeline but do not write any file
        #[arg(long)]
        dry_run: bool,

        /// Overwrite existing files fully
        #[arg(long)]
        overwrite: bool,

        /// Rewrite only the tweet text section of existing files
        #[arg(long, conflicts_with = "overwrite")]
        overwrite_tweet_content: bool,
    },

    /// Re-fetch tweets for every user listed in an input file
    Update {
        /// File of "<username>, <tweet_id>" lines, one user per line
        #[arg(short, long, value_name = "FILE")]
        input_path: PathBuf,

        /// Whether the recorded id bounds the fetch from below or above
        #[arg(long, value_parser = ["since", "after"], default_value = "since")]
        mode: String,

        /// Directory to write tweet files into, created if missing
        #[arg(short, long, value_name = "DIRECTORY")]
        output_directory: Option<PathBuf>,

        /// Maximum number of tweets to retrieve per user
        #[arg(long, value_name = "N")]
        max_results: Option<usize>,

        /// Run the whole pipeline but do not write any file
        #[arg(long)]
        dry_run: bool,

        /// Overwrite existing files fully
        #[arg(long)]
        overwrite: bool,

        /// Rewrite only the tweet text section of existing files
        #[arg(long, conflicts_with = "overwrite")]
        overwrite_tweet_content: bool,
    },

    /// Search archived tweet files and report each user's first or last tweet id
    Search {
        /// Which end of the timeline to report
        #[arg(value_parser = ["first", "last"])]
        sort: String,

        /// Directory of archived tweet files to search
        directory: PathBuf,

        /// Only search files written for this username
        #[arg(short, long)]
        username: Option<String>,

        /// Write results as "<username>, <tweet_id>" lines to this file
        #[arg(long, value_name = "FILE")]
        export_results_path: Option<PathBuf>,
    },

    /// Export tweets from one or more users into a single CSV file
    Export {
        /// Twitter handle to export; omit to read handles from --input-file
        username: Option<String>,

        /// File of usernames, one per line
        #[arg(short, long, value_name = "FILE", required_unless_present = "username")]
        input_file: Option<PathBuf>,

        /// CSV file to write rows into
        #[arg(short, long, value_name = "FILE")]
        output_file: Option<PathBuf>,

        /// Maximum number of tweets to retrieve per user
        #[arg(long, value_name = "N")]
        max_results: Option<usize>,

        /// Only fetch tweets created on or after this date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        start_date: Option<String>,

        /// Only fetch tweets older than this tweet id
        #[arg(long, value_name = "TWEET_ID")]
        after_id: Option<String>,

        /// Only fetch tweets newer than this tweet id
        #[arg(long, value_name = "TWEET_ID")]
        since_id: Option<String>,

        /// Run the whole pipeline but do not write any file
        #[arg(long)]
        dry_run: bool,

        /// Truncate the output file and write a header row first
        #[arg(long)]
        overwrite: bool,
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

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_export_requires_username_or_input_file() {
        assert!(Cli::try_parse_from(["unspool", "export"]).is_err());
        assert!(Cli::try_parse_from(["unspool", "export", "somebody"]).is_ok());
        assert!(Cli::try_parse_from(["unspool", "export", "--input-file", "users.txt"]).is_ok());
    }

    #[test]
    fn test_overwrite_flags_conflict() {
        let result = Cli::try_parse_from([
            "unspool",
            "fetch",
            "somebody",
            "--overwrite",
            "--overwrite-tweet-content",
        ]);
        assert!(result.is_err());
    }
}
