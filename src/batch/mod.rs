//! Batch update input
//!
//! The update command reads a file of `<username>, <tweet_id>` lines, the
//! exact format the search command exports.

use crate::error::{Result, UnspoolError};
use std::path::Path;

/// One line of an update input file: a username and the last archived
/// tweet id for that user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEntry {
    pub username: String,
    pub tweet_id: String,
}

/// Read `<username>, <tweet_id>` lines. All whitespace is stripped; blank
/// lines and lines missing either field are skipped with a warning.
pub fn read_update_entries(path: &Path) -> Result<Vec<UpdateEntry>> {
    tracing::debug!("Reading from input file...");
    let content = std::fs::read_to_string(path).map_err(|e| UnspoolError::Io {
        source: e,
        context: format!("Failed to read input file: {}", path.display()),
    })?;

    let mut entries = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let stripped: String = line.chars().filter(|c| !c.is_whitespace()).collect();
        if stripped.is_empty() {
            continue;
        }

        let mut parts = stripped.splitn(2, ',');
        match (parts.next(), parts.next()) {
            (Some(username), Some(tweet_id)) if !username.is_empty() && !tweet_id.is_empty() => {
                tracing::debug!("{}, {}", username, tweet_id);
                entries.push(UpdateEntry {
                    username: username.to_string(),
                    tweet_id: tweet_id.to_string(),
                });
            }
            _ => {
                tracing::warn!(
                    "Skipping malformed line {} in {}: {:?}",
                    number + 1,
                    path.display(),
                    line
                );
            }
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn input_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_reads_username_id_pairs() {
        let file = input_file("alice, 100\nbob,200\n");
        let entries = read_update_entries(file.path()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0],
            UpdateEntry {
                username: "alice".to_string(),
                tweet_id: "100".to_string(),
            }
        );
        assert_eq!(entries[1].username, "bob");
    }

    #[test]
    fn test_whitespace_is_stripped() {
        let file = input_file("  alice ,  100  \n");
        let entries = read_update_entries(file.path()).unwrap();
        assert_eq!(entries[0].username, "alice");
        assert_eq!(entries[0].tweet_id, "100");
    }

    #[test]
    fn test_blank_and_malformed_lines_are_skipped() {
        let file = input_file("alice, 100\n\njust-a-name\n, 300\nbob, 200\n");
        let entries = read_update_entries(file.path()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].username, "alice");
        assert_eq!(entries[1].username, "bob");
    }
}
