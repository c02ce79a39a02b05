//! Tweet archive files
//!
//! Renders condensed threads to the fixed three-section markdown layout and
//! reconciles them against whatever is already on disk. The layout has to
//! stay byte-stable across runs so the content-only overwrite path can
//! splice new text into files written by earlier versions of the archive.

use crate::error::{Result, UnspoolError};
use crate::threads::CondensedTweet;
use chrono::SecondsFormat;
use std::path::{Path, PathBuf};

pub mod search;

const TWEET_MARKER: &str = "### Tweet\n";
const METADATA_MARKER: &str = "### Metadata\n";
const RELATED_MARKER: &str = "### Related\n";

/// How an existing file at the target path is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Leave existing files alone
    #[default]
    SkipExisting,
    /// Rewrite the whole file
    Overwrite,
    /// Rewrite only the tweet text section, keeping the metadata and
    /// related sections exactly as found
    OverwriteTweetContent,
}

/// What happened to one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// An existing file was left untouched
    Skipped,
    /// A new file was created
    Written,
    /// An existing file was fully rewritten
    Overwritten,
    /// Only the tweet text section of an existing file was replaced
    Merged,
}

/// Writes condensed threads into an archive directory
pub struct ArchiveWriter {
    directory: PathBuf,
    policy: WritePolicy,
    dry_run: bool,
    title_max_chars: usize,
}

impl ArchiveWriter {
    pub fn new(
        directory: impl Into<PathBuf>,
        policy: WritePolicy,
        dry_run: bool,
        title_max_chars: usize,
    ) -> Self {
        Self {
            directory: directory.into(),
            policy,
            dry_run,
            title_max_chars,
        }
    }

    /// Write one document, reconciling it against any existing file under
    /// the active policy. In dry-run mode every step runs except the final
    /// filesystem write.
    pub fn write(&self, username: &str, tweet: &CondensedTweet) -> Result<WriteOutcome> {
        let path = self.directory.join(self.file_name(username, tweet));
        let exists = path.exists();

        match (self.policy, exists) {
            (WritePolicy::SkipExisting, true) => {
                tracing::debug!(
                    "Skipping file because it already exists: {}",
                    path.display()
                );
                Ok(WriteOutcome::Skipped)
            }
            (WritePolicy::OverwriteTweetContent, true) => self.merge_tweet_content(&path, tweet),
            (_, exists) => {
                if exists {
                    tracing::debug!("Overwriting file: {}", path.display());
                } else {
                    tracing::debug!("Writing to file: {}", path.display());
                }

                let body = render_document(tweet);
                if self.dry_run {
                    tracing::info!(
                        "Dry run, would write {} bytes to {}",
                        body.len(),
                        path.display()
                    );
                } else {
                    std::fs::write(&path, body).map_err(|e| UnspoolError::Io {
                        source: e,
                        context: format!("Failed to write tweet file: {}", path.display()),
                    })?;
                }

                Ok(if exists {
                    WriteOutcome::Overwritten
                } else {
                    WriteOutcome::Written
                })
            }
        }
    }

    /// File name for a document: `<timestamp> - <username> - <title>.md`.
    /// Deterministic and lossy, so two threads sharing a timestamp, author,
    /// and sanitized title prefix land on the same path and fall under the
    /// active policy.
    pub fn file_name(&self, username: &str, tweet: &CondensedTweet) -> String {
        format!(
            "{} - {} - {}.md",
            tweet
                .created_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            username,
            sanitize_title(&tweet.text, self.title_max_chars)
        )
    }

    fn merge_tweet_content(&self, path: &Path, tweet: &CondensedTweet) -> Result<WriteOutcome> {
        let previous = std::fs::read_to_string(path).map_err(|e| UnspoolError::Io {
            source: e,
            context: format!("Failed to read tweet file: {}", path.display()),
        })?;

        let Some(sections) = TweetFileSections::parse(&previous) else {
            tracing::warn!(
                "Could not replace tweet content, file does not match the expected layout: {}",
                path.display()
            );
            return Ok(WriteOutcome::Skipped);
        };

        let replacement = format!("{}\n\n", tweet.text);
        tracing::debug!(
            "Replacing tweet content (previous/new): {}/{}",
            sections.content.len(),
            replacement.len()
        );

        let updated = sections.rebuild(&replacement);
        if self.dry_run {
            tracing::info!(
                "Dry run, would replace tweet content in {}",
                path.display()
            );
        } else {
            std::fs::write(path, updated).map_err(|e| UnspoolError::Io {
                source: e,
                context: format!("Failed to write tweet file: {}", path.display()),
            })?;
        }

        Ok(WriteOutcome::Merged)
    }
}

/// The three fixed sections of an archived tweet file, borrowed from the
/// file body. `content` and `metadata` keep their trailing blank lines so a
/// rebuild reproduces the untouched sections byte for byte.
#[derive(Debug, PartialEq, Eq)]
pub struct TweetFileSections<'a> {
    pub content: &'a str,
    pub metadata: &'a str,
    pub related: &'a str,
}

impl<'a> TweetFileSections<'a> {
    /// Locate the three section markers in order. Returns `None` when any
    /// marker is missing, instead of guessing at a partial layout.
    pub fn parse(body: &'a str) -> Option<Self> {
        let content_start = body.find(TWEET_MARKER)? + TWEET_MARKER.len();
        let metadata_offset = body[content_start..].find(METADATA_MARKER)?;
        let content = &body[content_start..content_start + metadata_offset];

        let metadata_start = content_start + metadata_offset + METADATA_MARKER.len();
        let related_offset = body[metadata_start..].find(RELATED_MARKER)?;
        let metadata = &body[metadata_start..metadata_start + related_offset];

        let related = &body[metadata_start + related_offset + RELATED_MARKER.len()..];

        Some(Self {
            content,
            metadata,
            related,
        })
    }

    /// Reassemble the file with a new content section, leaving the metadata
    /// and related sections untouched.
    pub fn rebuild(&self, content: &str) -> String {
        format!(
            "{}{}{}{}{}{}",
            TWEET_MARKER, content, METADATA_MARKER, self.metadata, RELATED_MARKER, self.related
        )
    }
}

/// Render the full document body: tweet text plus metadata footer
pub fn render_document(tweet: &CondensedTweet) -> String {
    format!(
        "### Tweet\n{}\n\n### Metadata\nTweet ID: {}\nCreated At: {}\nImpressions: {}\nLikes: {}\nReplies: {}\nRetweets: {}\nQuotes: {}\n\n### Related\n\n",
        tweet.text,
        tweet.id,
        tweet.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        tweet.metrics.impression_count,
        tweet.metrics.like_count,
        tweet.metrics.reply_count,
        tweet.metrics.retweet_count,
        tweet.metrics.quote_count,
    )
}

/// First `max_chars` characters of the text with everything except ASCII
/// letters, digits, and whitespace stripped, and newlines removed.
pub fn sanitize_title(text: &str, max_chars: usize) -> String {
    text.chars()
        .take(max_chars)
        .filter(|c| c.is_ascii_alphanumeric() || (c.is_whitespace() && *c != '\n'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TweetMetrics;
    use chrono::{TimeZone, Utc};

    fn condensed(text: &str) -> CondensedTweet {
        CondensedTweet {
            id: "1450000000000000001".to_string(),
            created_at: Utc.with_ymd_and_hms(2023, 4, 1, 10, 30, 0).unwrap(),
            text: text.to_string(),
            in_reply_to_user_id: None,
            metrics: TweetMetrics {
                retweet_count: 2,
                reply_count: 3,
                like_count: 10,
                quote_count: 1,
                impression_count: 500,
            },
        }
    }

    #[test]
    fn test_render_document_layout() {
        let body = render_document(&condensed("hello world"));
        assert_eq!(
            body,
            "### Tweet\nhello world\n\n### Metadata\nTweet ID: 1450000000000000001\nCreated At: 2023-04-01T10:30:00Z\nImpressions: 500\nLikes: 10\nReplies: 3\nRetweets: 2\nQuotes: 1\n\n### Related\n\n"
        );
    }

    #[test]
    fn test_sections_roundtrip() {
        let body = render_document(&condensed("original text"));
        let sections = TweetFileSections::parse(&body).unwrap();

        assert_eq!(sections.content, "original text\n\n");
        assert!(sections.metadata.starts_with("Tweet ID: "));
        assert_eq!(sections.related, "\n");

        // Rebuilding with the same content reproduces the file exactly
        assert_eq!(sections.rebuild(sections.content), body);
    }

    #[test]
    fn test_rebuild_preserves_edited_sections() {
        let body = "### Tweet\nold text\n\n### Metadata\nTweet ID: 42\nhand-edited: yes\n\n### Related\n- [a link](https://example.com)\n";
        let sections = TweetFileSections::parse(body).unwrap();
        let updated = sections.rebuild("new text\n\n");

        assert_eq!(
            updated,
            "### Tweet\nnew text\n\n### Metadata\nTweet ID: 42\nhand-edited: yes\n\n### Related\n- [a link](https://example.com)\n"
        );
    }

    #[test]
    fn test_parse_rejects_missing_markers() {
        assert!(TweetFileSections::parse("### Tweet\nno metadata here").is_none());
        assert!(TweetFileSections::parse("").is_none());
        assert!(
            TweetFileSections::parse("### Tweet\ntext\n\n### Metadata\nTweet ID: 1\n").is_none()
        );
    }

    #[test]
    fn test_sanitize_title_strips_and_truncates() {
        assert_eq!(sanitize_title("Hello, world! #42", 75), "Hello world 42");
        assert_eq!(sanitize_title("line one\nline two", 75), "line oneline two");
        assert_eq!(sanitize_title("abcdef", 3), "abc");
        // Truncation happens before stripping
        assert_eq!(sanitize_title("a!!!!b", 4), "a");
    }

    #[test]
    fn test_file_name_derivation() {
        let writer = ArchiveWriter::new("/tmp", WritePolicy::SkipExisting, false, 75);
        let name = writer.file_name("alice", &condensed("A thread: part one"));
        assert_eq!(name, "2023-04-01T10:30:00Z - alice - A thread part one.md");
    }
}
