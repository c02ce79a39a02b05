//! Single-file CSV export
//!
//! Flattens condensed threads from one or more users into
//! `date_time, handle, tweet` rows appended to a single CSV file.

use crate::error::{Result, UnspoolError};
use crate::threads::CondensedTweet;
use chrono::{NaiveDate, SecondsFormat};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Header row written in overwrite mode
pub const CSV_HEADERS: [&str; 3] = ["date_time", "handle", "tweet"];

/// Appends condensed threads as CSV rows to one output file
pub struct CsvExporter {
    path: PathBuf,
    dry_run: bool,
}

impl CsvExporter {
    pub fn new(path: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            path: path.into(),
            dry_run,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate the output file and write the header row
    pub fn write_header(&self) -> Result<()> {
        if self.dry_run {
            tracing::info!("Dry run, would write header row to {}", self.path.display());
            return Ok(());
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(CSV_HEADERS)?;
        writer.flush().map_err(|e| UnspoolError::Io {
            source: e,
            context: format!("Failed to flush CSV file: {}", self.path.display()),
        })?;
        Ok(())
    }

    /// Append one row per condensed thread
    pub fn append(&self, username: &str, tweets: &[CondensedTweet]) -> Result<()> {
        if self.dry_run {
            for tweet in tweets {
                tracing::info!(
                    "Would write to file: {}, {}, {}",
                    tweet.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                    username,
                    tweet.text
                );
            }
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| UnspoolError::Io {
                source: e,
                context: format!("Failed to open CSV file: {}", self.path.display()),
            })?;
        let mut writer = csv::Writer::from_writer(file);

        for tweet in tweets {
            writer.write_record([
                tweet
                    .created_at
                    .to_rfc3339_opts(SecondsFormat::Secs, true)
                    .as_str(),
                username,
                tweet.text.as_str(),
            ])?;
        }

        writer.flush().map_err(|e| UnspoolError::Io {
            source: e,
            context: format!("Failed to flush CSV file: {}", self.path.display()),
        })?;
        Ok(())
    }
}

/// Convert a `YYYY-MM-DD` date into the RFC 3339 start-of-day instant the
/// timeline endpoint expects for `start_time`
pub fn start_time_from_date(date: &str) -> Result<String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| format!("{}T00:00:00Z", date))
        .map_err(|_| {
            UnspoolError::Config(format!(
                "--start-date must be formatted YYYY-MM-DD, got '{}'",
                date
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_time_from_date() {
        assert_eq!(
            start_time_from_date("2023-04-01").unwrap(),
            "2023-04-01T00:00:00Z"
        );
        assert!(start_time_from_date("04/01/2023").is_err());
        assert!(start_time_from_date("2023-13-99").is_err());
    }
}
