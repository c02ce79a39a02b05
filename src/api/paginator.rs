//! Bounded pagination over a tweet timeline

use crate::api::{PageSource, Tweet};
use crate::error::Result;

/// Collect tweets from successive pages until `max_results` have accumulated
/// or no continuation token remains, then truncate to exactly `max_results`.
///
/// A `max_results` of zero returns an empty sequence without touching the
/// source. An empty first page is a valid "no tweets for this user" result,
/// not an error.
pub fn collect_bounded<S: PageSource>(source: &mut S, max_results: usize) -> Result<Vec<Tweet>> {
    if max_results == 0 {
        return Ok(Vec::new());
    }

    let mut tweets: Vec<Tweet> = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = source.fetch_page(cursor.as_deref())?;

        if page.result_count == 0 && tweets.is_empty() {
            return Ok(tweets);
        }

        tweets.extend(page.tweets);
        cursor = page.next_token;
        tracing::debug!("Pagination token is {:?}", cursor);

        if cursor.is_none() || tweets.len() >= max_results {
            break;
        }
    }

    tweets.truncate(max_results);
    Ok(tweets)
}
