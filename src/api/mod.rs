//! Twitter v2 API client
//!
//! One blocking, authenticated request per call; pagination is driven by
//! the caller through the [`PageSource`] seam. No retries.

use crate::error::{Result, UnspoolError};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

mod paginator;

pub use paginator::collect_bounded;

/// Tweet fields requested on every timeline call
const TWEET_FIELDS: &str = "created_at,in_reply_to_user_id,public_metrics";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A single tweet as returned by the timeline endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub in_reply_to_user_id: Option<String>,
    #[serde(default)]
    pub referenced_tweets: Vec<TweetRef>,
    #[serde(default)]
    pub public_metrics: TweetMetrics,
}

/// A reference from one tweet to another (replied_to, quoted, ...)
#[derive(Debug, Clone, Deserialize)]
pub struct TweetRef {
    #[serde(rename = "type")]
    pub ref_type: String,
    pub id: String,
}

/// Engagement counters attached to a tweet
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TweetMetrics {
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub quote_count: u64,
    #[serde(default)]
    pub impression_count: u64,
}

/// The user record behind a handle
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
}

/// One page of a user's timeline
#[derive(Debug, Clone)]
pub struct TimelinePage {
    pub tweets: Vec<Tweet>,
    pub next_token: Option<String>,
    pub result_count: usize,
}

/// Bounds applied to a timeline fetch
#[derive(Debug, Clone, Default)]
pub struct TimelineQuery {
    /// Tweets per request; the platform caps this at 100
    pub page_size: usize,
    /// Only tweets created at or after this RFC 3339 instant
    pub start_time: Option<String>,
    /// Only tweets newer than this id
    pub since_id: Option<String>,
    /// Only tweets older than this id
    pub until_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    data: Option<UserProfile>,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    data: Vec<Tweet>,
    #[serde(default)]
    meta: TimelineMeta,
}

#[derive(Debug, Default, Deserialize)]
struct TimelineMeta {
    #[serde(default)]
    result_count: usize,
    #[serde(default)]
    next_token: Option<String>,
}

/// Blocking client for the Twitter v2 API
pub struct ApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client that sends the bearer token on every request
    pub fn new(base_url: &str, bearer_token: &str) -> Result<Self> {
        use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", bearer_token))
            .map_err(|_| UnspoolError::Config("Bearer token is not a valid header value".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| UnspoolError::Transport {
                source: e,
                context: "Failed to build HTTP client".to_string(),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a handle to its user record
    pub fn lookup_user(&self, username: &str) -> Result<UserProfile> {
        let endpoint = format!("{}/users/by/username/{}", self.base_url, username);
        tracing::debug!("Fetching user: {}", username);

        let response = self
            .http
            .get(&endpoint)
            .send()
            .map_err(|e| UnspoolError::Transport {
                source: e,
                context: format!("Failed to fetch user {}", username),
            })?;

        if !response.status().is_success() {
            return Err(UnspoolError::ApiStatus {
                status: response.status().as_u16(),
                endpoint,
            });
        }

        let body: UserResponse = response.json().map_err(|e| UnspoolError::Transport {
            source: e,
            context: format!("Failed to decode user response for {}", username),
        })?;

        let user = body.data.ok_or_else(|| UnspoolError::UserNotFound {
            username: username.to_string(),
        })?;

        tracing::debug!("Fetched user {} with id {}", user.username, user.id);
        Ok(user)
    }

    /// Fetch one page of a user's timeline. Exactly one network call.
    pub fn fetch_timeline_page(
        &self,
        user_id: &str,
        query: &TimelineQuery,
        cursor: Option<&str>,
    ) -> Result<TimelinePage> {
        let endpoint = format!("{}/users/{}/tweets", self.base_url, user_id);

        let mut params: Vec<(&str, String)> = vec![
            ("tweet.fields", TWEET_FIELDS.to_string()),
            ("max_results", query.page_size.to_string()),
            ("exclude", "retweets".to_string()),
            ("expansions", "referenced_tweets.id".to_string()),
        ];
        if let Some(start_time) = &query.start_time {
            params.push(("start_time", start_time.clone()));
        }
        if let Some(until_id) = &query.until_id {
            params.push(("until_id", until_id.clone()));
        }
        if let Some(since_id) = &query.since_id {
            params.push(("since_id", since_id.clone()));
        }
        if let Some(token) = cursor {
            params.push(("pagination_token", token.to_string()));
        }

        tracing::debug!("Fetching tweets for user with id {}", user_id);

        let response = self
            .http
            .get(&endpoint)
            .query(&params)
            .send()
            .map_err(|e| UnspoolError::Transport {
                source: e,
                context: format!("Failed to fetch tweets for user {}", user_id),
            })?;

        if !response.status().is_success() {
            return Err(UnspoolError::ApiStatus {
                status: response.status().as_u16(),
                endpoint,
            });
        }

        let body: TimelineResponse = response.json().map_err(|e| UnspoolError::Transport {
            source: e,
            context: format!("Failed to decode timeline response for user {}", user_id),
        })?;

        tracing::debug!("Fetched {} tweets", body.meta.result_count);

        Ok(TimelinePage {
            tweets: body.data,
            next_token: body.meta.next_token,
            result_count: body.meta.result_count,
        })
    }

    /// A [`PageSource`] over one user's timeline with fixed bounds
    pub fn user_timeline<'a>(&'a self, user_id: &str, query: &'a TimelineQuery) -> UserTimeline<'a> {
        UserTimeline {
            client: self,
            user_id: user_id.to_string(),
            query,
        }
    }
}

/// Anything the paginator can pull timeline pages from
pub trait PageSource {
    fn fetch_page(&mut self, cursor: Option<&str>) -> Result<TimelinePage>;
}

/// Live timeline source backed by [`ApiClient`]
pub struct UserTimeline<'a> {
    client: &'a ApiClient,
    user_id: String,
    query: &'a TimelineQuery,
}

impl PageSource for UserTimeline<'_> {
    fn fetch_page(&mut self, cursor: Option<&str>) -> Result<TimelinePage> {
        self.client
            .fetch_timeline_page(&self.user_id, self.query, cursor)
    }
}
