//! Thread reconstruction
//!
//! Collapses a fetched batch of tweets into one combined document per
//! thread: each tweet that is not a reply becomes a root, and the text of
//! its reply chain is folded in, in chain order.

use crate::api::{Tweet, TweetMetrics};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::{HashMap, HashSet};

/// How reply text is joined onto the root tweet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyJoin {
    /// Horizontal rule plus the reply's timestamp, used for archive files
    Annotated,
    /// Bare blank line, used for CSV export
    Plain,
}

/// One thread root with all fetched reply text folded in
#[derive(Debug, Clone)]
pub struct CondensedTweet {
    /// Id of the root tweet
    pub id: String,
    /// Creation time of the root tweet
    pub created_at: DateTime<Utc>,
    /// Root text followed by reply texts in chain order
    pub text: String,
    /// Carried from the root so callers can drop replies to other users
    pub in_reply_to_user_id: Option<String>,
    /// Engagement counters of the root tweet
    pub metrics: TweetMetrics,
}

/// Index over a fetched batch: tweet id -> tweet, plus the inverse of the
/// reply edges (referenced tweet id -> id of the tweet replying to it).
/// Built in one pass and read-only afterwards.
pub struct ThreadIndex {
    tweets: HashMap<String, Tweet>,
    reply_of: HashMap<String, String>,
    roots: Vec<String>,
}

impl ThreadIndex {
    /// Build the index. Tweets with no referenced tweet become roots, in
    /// input order. A reply contributes only its first referenced tweet,
    /// and a later reply to the same tweet replaces the tracked pointer.
    pub fn build(tweets: Vec<Tweet>) -> Self {
        let mut by_id = HashMap::with_capacity(tweets.len());
        let mut reply_of = HashMap::new();
        let mut roots = Vec::new();

        for tweet in tweets {
            match tweet.referenced_tweets.first() {
                None => roots.push(tweet.id.clone()),
                Some(referenced) => {
                    reply_of.insert(referenced.id.clone(), tweet.id.clone());
                }
            }
            by_id.insert(tweet.id.clone(), tweet);
        }

        Self {
            tweets: by_id,
            reply_of,
            roots,
        }
    }

    /// Ids of the thread roots, in input order
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    fn get(&self, id: &str) -> Option<&Tweet> {
        self.tweets.get(id)
    }

    fn reply_to(&self, id: &str) -> Option<&String> {
        self.reply_of.get(id)
    }
}

/// Condense a flat batch of tweets into one document per thread root.
///
/// The reply chain of each root is walked until the pointer runs out or the
/// pointed-to tweet was not fetched (a reply outside the pagination window
/// ends the chain early; that is not an error). A visited set guards the
/// walk against malformed reply graphs.
pub fn condense(tweets: Vec<Tweet>, join: ReplyJoin) -> Vec<CondensedTweet> {
    let index = ThreadIndex::build(tweets);
    let mut condensed = Vec::with_capacity(index.roots().len());

    for root_id in index.roots() {
        let root = index.get(root_id).expect("root ids come from the index");
        let mut text = root.text.clone();

        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(root_id);

        let mut next = index.reply_to(root_id);
        while let Some(reply_id) = next {
            if !visited.insert(reply_id) {
                tracing::warn!(
                    "Reply chain for tweet {} loops back to {}; stopping",
                    root_id,
                    reply_id
                );
                break;
            }

            let Some(reply) = index.get(reply_id) else {
                tracing::debug!(
                    "Reply tweet {} was not fetched; ending thread for {}",
                    reply_id,
                    root_id
                );
                break;
            };

            tracing::debug!(
                "Combining base tweet {} with text from reply tweet {}",
                root_id,
                reply.id
            );
            text.push_str(&join_text(join, reply));

            next = index.reply_to(reply_id);
        }

        condensed.push(CondensedTweet {
            id: root.id.clone(),
            created_at: root.created_at,
            text,
            in_reply_to_user_id: root.in_reply_to_user_id.clone(),
            metrics: root.public_metrics.clone(),
        });
    }

    condensed
}

fn join_text(join: ReplyJoin, reply: &Tweet) -> String {
    match join {
        ReplyJoin::Annotated => format!(
            "\n\n---\n\nReplied At: {}\n\n{}",
            reply.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            reply.text
        ),
        ReplyJoin::Plain => format!("\n\n{}", reply.text),
    }
}
