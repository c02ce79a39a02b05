//! Search across an archive directory
//!
//! Archived files are named `<timestamp> - <username> - <title>.md`, so the
//! directory itself is the index: file names give the per-user timeline and
//! the metadata section inside each file carries the tweet id.

use crate::error::{Result, UnspoolError};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const FILE_NAME_PATTERN: &str = r"^(?P<timestamp>.+) - (?P<username>\w+) - (?P<title>.*)\.md$";
const TWEET_ID_PATTERN: &str = r"Tweet ID: (?P<tweet_id>\d+)";

/// Which end of a user's archived timeline to report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSort {
    First,
    Last,
}

/// The file an id was found in, and the id itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub path: PathBuf,
    pub tweet_id: String,
}

/// Scans archive directories for usernames and tweet ids
pub struct ArchiveSearcher {
    file_name: Regex,
    tweet_id: Regex,
}

impl ArchiveSearcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            file_name: Regex::new(FILE_NAME_PATTERN)?,
            tweet_id: Regex::new(TWEET_ID_PATTERN)?,
        })
    }

    /// Every username with at least one archived file, sorted
    /// case-insensitively
    pub fn usernames_in(&self, directory: &Path) -> Result<Vec<String>> {
        let mut seen = BTreeSet::new();
        for name in self.archived_file_names(directory)? {
            if let Some(captures) = self.file_name.captures(&name) {
                seen.insert(captures["username"].to_string());
            }
        }

        let mut names: Vec<String> = seen.into_iter().collect();
        names.sort_by_key(|name| name.to_lowercase());
        tracing::debug!("Usernames: {:?}", names);
        Ok(names)
    }

    /// The tweet id recorded in the chronologically first or last archived
    /// file for a username. `None` when the user has no archived files or
    /// the picked file carries no id.
    pub fn find_tweet_id(
        &self,
        directory: &Path,
        username: &str,
        sort: SearchSort,
    ) -> Result<Option<SearchHit>> {
        let mut files = self.files_for(directory, username)?;
        files.sort_by_key(|(timestamp, _)| *timestamp);

        let picked = match sort {
            SearchSort::First => files.first(),
            SearchSort::Last => files.last(),
        };
        let Some((_, path)) = picked else {
            return Ok(None);
        };

        tracing::debug!("Found file: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| UnspoolError::Io {
            source: e,
            context: format!("Failed to read tweet file: {}", path.display()),
        })?;

        match self.tweet_id.captures(&content) {
            Some(captures) => Ok(Some(SearchHit {
                path: path.clone(),
                tweet_id: captures["tweet_id"].to_string(),
            })),
            None => {
                tracing::warn!("Could not find \"Tweet ID\" in {}", path.display());
                Ok(None)
            }
        }
    }

    /// Archived files for one username, each paired with the timestamp
    /// parsed from its name. Files whose timestamp does not parse are
    /// skipped.
    fn files_for(&self, directory: &Path, username: &str) -> Result<Vec<(DateTime<Utc>, PathBuf)>> {
        let mut files = Vec::new();

        for name in self.archived_file_names(directory)? {
            let Some(captures) = self.file_name.captures(&name) else {
                continue;
            };
            if &captures["username"] != username {
                continue;
            }

            match DateTime::parse_from_rfc3339(&captures["timestamp"]) {
                Ok(timestamp) => {
                    files.push((timestamp.with_timezone(&Utc), directory.join(&name)));
                }
                Err(_) => {
                    tracing::debug!("Skipping file with unparsable timestamp: {}", name);
                }
            }
        }

        Ok(files)
    }

    fn archived_file_names(&self, directory: &Path) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(directory).map_err(|e| UnspoolError::Io {
            source: e,
            context: format!("Failed to read archive directory: {}", directory.display()),
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| UnspoolError::Io {
                source: e,
                context: "Failed to read directory entry".to_string(),
            })?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn archive_file(dir: &Path, name: &str, tweet_id: &str) {
        let body = format!(
            "### Tweet\nsome text\n\n### Metadata\nTweet ID: {}\nCreated At: x\n\n### Related\n\n",
            tweet_id
        );
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_usernames_are_discovered_and_sorted() {
        let temp_dir = TempDir::new().unwrap();
        archive_file(temp_dir.path(), "2023-04-01T10:00:00Z - zoe - a.md", "1");
        archive_file(temp_dir.path(), "2023-04-02T10:00:00Z - Alice - b.md", "2");
        archive_file(temp_dir.path(), "2023-04-03T10:00:00Z - Alice - c.md", "3");
        std::fs::write(temp_dir.path().join("notes.txt"), "not an archive file").unwrap();

        let searcher = ArchiveSearcher::new().unwrap();
        let names = searcher.usernames_in(temp_dir.path()).unwrap();
        assert_eq!(names, vec!["Alice".to_string(), "zoe".to_string()]);
    }

    #[test]
    fn test_first_and_last_pick_by_timestamp() {
        let temp_dir = TempDir::new().unwrap();
        archive_file(temp_dir.path(), "2023-04-02T10:00:00Z - alice - mid.md", "20");
        archive_file(temp_dir.path(), "2023-04-01T10:00:00Z - alice - old.md", "10");
        archive_file(temp_dir.path(), "2023-04-03T10:00:00Z - alice - new.md", "30");

        let searcher = ArchiveSearcher::new().unwrap();
        let first = searcher
            .find_tweet_id(temp_dir.path(), "alice", SearchSort::First)
            .unwrap()
            .unwrap();
        let last = searcher
            .find_tweet_id(temp_dir.path(), "alice", SearchSort::Last)
            .unwrap()
            .unwrap();

        assert_eq!(first.tweet_id, "10");
        assert_eq!(last.tweet_id, "30");
    }

    #[test]
    fn test_unknown_user_yields_none() {
        let temp_dir = TempDir::new().unwrap();
        archive_file(temp_dir.path(), "2023-04-01T10:00:00Z - alice - a.md", "1");

        let searcher = ArchiveSearcher::new().unwrap();
        let hit = searcher
            .find_tweet_id(temp_dir.path(), "bob", SearchSort::Last)
            .unwrap();
        assert!(hit.is_none());
    }

    #[test]
    fn test_file_without_tweet_id_yields_none() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("2023-04-01T10:00:00Z - alice - a.md"),
            "### Tweet\ntext\n\n### Metadata\nnothing useful\n\n### Related\n\n",
        )
        .unwrap();

        let searcher = ArchiveSearcher::new().unwrap();
        let hit = searcher
            .find_tweet_id(temp_dir.path(), "alice", SearchSort::First)
            .unwrap();
        assert!(hit.is_none());
    }
}
