use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::twitter_client::api;
use crate::twitter_client::error::TwitterError;
use crate::twitter_client::merge::{enrich_all, EnrichedTweet, IncludesIndex};
use crate::twitter_client::request::RequestExecutor;
use crate::twitter_client::{search_url, tweet_url};

/// Hard ceiling on accumulated replies, regardless of what the caller asks.
const MAX_THREAD_TWEETS: usize = 200;
const DEFAULT_THREAD_TWEETS: usize = 100;
/// Recent search accepts 10..=100 results per page.
const PAGE_FLOOR: usize = 10;
const PAGE_CEILING: usize = 100;
/// Recent search only covers the last 7 days.
const SEARCH_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Serialize)]
pub struct ThreadResult {
    /// Seed plus discovered replies, ascending by creation time.
    pub tweets: Vec<EnrichedTweet>,
    /// Present when the seed predates the recent-search window.
    pub warning: Option<String>,
}

/// Reconstructs a conversation from its seed tweet: fetch the seed, then
/// page through a conversation-scoped recent search, deduplicating as pages
/// arrive, and finally order everything chronologically.
pub(crate) struct ThreadBuilder<'a> {
    executor: &'a RequestExecutor,
    base_url: &'a Url,
}

impl<'a> ThreadBuilder<'a> {
    pub(crate) fn new(executor: &'a RequestExecutor, base_url: &'a Url) -> Self {
        Self { executor, base_url }
    }

    /// A page may push the reply count past the cap; halting happens on the
    /// next round, so callers get "at least cap" rather than "exactly cap".
    pub(crate) async fn build(
        &self,
        tweet_id: &str,
        max_results: Option<u32>,
    ) -> Result<ThreadResult, TwitterError> {
        let cap = (max_results.map(|n| n as usize))
            .unwrap_or(DEFAULT_THREAD_TWEETS)
            .min(MAX_THREAD_TWEETS);

        let api::Response { data, includes, .. } = self
            .executor
            .get::<api::Response<api::Tweet>>(tweet_url(self.base_url, tweet_id)?)
            .await?;
        let seed = data.ok_or(TwitterError::MissingData("tweet"))?;

        let seed_id = seed.id.clone();
        let conversation_id = seed.conversation_id.clone().unwrap_or_else(|| seed_id.clone());
        let warning = staleness_warning(seed.created_at, Utc::now());

        let seed_enriched = IncludesIndex::new(includes.as_ref()).enrich(seed);

        let query = format!("conversation_id:{conversation_id}");
        let mut seen: HashSet<String> = HashSet::from([seed_id]);
        let mut replies: Vec<EnrichedTweet> = Vec::new();
        let mut next_token: Option<String> = None;

        while replies.len() < cap {
            let page_size = (cap - replies.len()).clamp(PAGE_FLOOR, PAGE_CEILING);
            let url = search_url(self.base_url, &query, page_size as u32, next_token.as_deref())?;
            let page = self
                .executor
                .get::<api::Response<Vec<api::Tweet>>>(url)
                .await?;

            let page_tweets = enrich_all(page.data, page.includes.as_ref());
            debug!(
                conversation_id = %conversation_id,
                page_len = page_tweets.len(),
                accumulated = replies.len(),
                "thread page fetched"
            );
            if page_tweets.is_empty() {
                break;
            }
            for tweet in page_tweets {
                if seen.insert(tweet.tweet.id.clone()) {
                    replies.push(tweet);
                }
            }

            next_token = page.meta.and_then(|meta| meta.next_token);
            if next_token.is_none() {
                break;
            }
        }

        let mut tweets = Vec::with_capacity(1 + replies.len());
        tweets.push(seed_enriched);
        tweets.extend(replies);
        sort_chronological(&mut tweets);

        Ok(ThreadResult { tweets, warning })
    }
}

fn staleness_warning(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<String> {
    let created_at = created_at?;
    if now - created_at > Duration::days(SEARCH_WINDOW_DAYS) {
        Some(format!(
            "Tweet is older than {SEARCH_WINDOW_DAYS} days; recent search cannot \
             guarantee the full conversation was found."
        ))
    } else {
        None
    }
}

/// Stable chronological order: timestamped tweets are sorted non-decreasing
/// among themselves, while tweets without a timestamp keep the slots they
/// were inserted at, neither pushed to the front nor the back.
fn sort_chronological(tweets: &mut Vec<EnrichedTweet>) {
    let mut dated: Vec<(DateTime<Utc>, usize)> = tweets
        .iter()
        .enumerate()
        .filter_map(|(i, e)| e.tweet.created_at.map(|ts| (ts, i)))
        .collect();
    let slots: Vec<usize> = dated.iter().map(|&(_, i)| i).collect();
    dated.sort_by_key(|&(ts, _)| ts);

    let mut buf: Vec<Option<EnrichedTweet>> = tweets.drain(..).map(Some).collect();
    let picked: Vec<EnrichedTweet> = dated
        .iter()
        .map(|&(_, i)| buf[i].take().unwrap())
        .collect();
    for (slot, tweet) in slots.into_iter().zip(picked) {
        buf[slot] = Some(tweet);
    }
    tweets.extend(buf.into_iter().flatten());
}
