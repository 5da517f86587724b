pub mod api;
pub mod error;
pub mod merge;
pub mod request;
pub mod thread;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use url::Url;

use crate::twitter_client::error::TwitterError;
use crate::twitter_client::merge::{enrich_all, EnrichedTweet, IncludesIndex};
use crate::twitter_client::request::{RequestExecutor, RetryConfig};
use crate::twitter_client::thread::{ThreadBuilder, ThreadResult};
use crate::twitter_client::transport::{HttpsTransport, Transport};

const DEFAULT_BASE_URL: &str = "https://api.twitter.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);
/// List endpoints accept at most this many results per request.
const MAX_PAGE_RESULTS: u32 = 100;
const DEFAULT_PAGE_RESULTS: u32 = 10;

const TWEET_FIELDS: &str =
    "id,text,author_id,conversation_id,created_at,referenced_tweets,public_metrics";
const EXPANSIONS: &str = "author_id,referenced_tweets.id";
const USER_FIELDS: &str =
    "id,name,username,description,created_at,profile_image_url,verified,public_metrics";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub bearer_token: String,
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl ClientConfig {
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self {
            bearer_token: bearer_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TimelineResult {
    pub user: api::User,
    pub tweets: Vec<EnrichedTweet>,
}

#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub query: String,
    pub tweets: Vec<EnrichedTweet>,
    pub result_count: u64,
}

#[derive(Debug, Serialize)]
pub struct RepliesResult {
    pub tweet: EnrichedTweet,
    pub replies: Vec<EnrichedTweet>,
    pub result_count: u64,
}

/// Read-only client for the Twitter v2 API. Holds only static configuration,
/// so concurrent calls on one instance are safe; each operation is a plain
/// sequential pipeline of suspending calls.
pub struct TwitterClient {
    executor: RequestExecutor,
    base_url: Url,
}

impl TwitterClient {
    pub fn new(config: ClientConfig) -> Result<Self, TwitterError> {
        Self::with_transport(config, Arc::new(HttpsTransport::new()))
    }

    /// Build a client over a caller-supplied transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, TwitterError> {
        let base_url = Url::parse(&config.base_url)?;
        let executor = RequestExecutor::new(
            transport,
            config.bearer_token,
            config.timeout,
            config.retry,
        );
        Ok(Self { executor, base_url })
    }

    /// Fetch one tweet by id, with author and first reference resolved.
    pub async fn get_tweet(&self, tweet_id: &str) -> Result<EnrichedTweet, TwitterError> {
        let api::Response { data, includes, .. } = self
            .executor
            .get::<api::Response<api::Tweet>>(tweet_url(&self.base_url, tweet_id)?)
            .await?;
        let tweet = data.ok_or(TwitterError::MissingData("tweet"))?;
        Ok(IncludesIndex::new(includes.as_ref()).enrich(tweet))
    }

    /// Reconstruct the conversation a tweet belongs to. `max_results` is
    /// capped at 200; see `ThreadBuilder::build` for the halting rule.
    pub async fn get_thread(
        &self,
        tweet_id: &str,
        max_results: Option<u32>,
    ) -> Result<ThreadResult, TwitterError> {
        ThreadBuilder::new(&self.executor, &self.base_url)
            .build(tweet_id, max_results)
            .await
    }

    /// Recent tweets from a user, looked up by handle. Two sequential calls:
    /// the timeline endpoint needs the resolved user id.
    pub async fn get_timeline(
        &self,
        username: &str,
        max_results: Option<u32>,
    ) -> Result<TimelineResult, TwitterError> {
        let user = self.lookup_user(username).await?;
        let url = user_tweets_url(&self.base_url, &user.id, page_size(max_results))?;
        let api::Response { data, includes, .. } = self
            .executor
            .get::<api::Response<Vec<api::Tweet>>>(url)
            .await?;
        let tweets = enrich_all(data, includes.as_ref());
        Ok(TimelineResult { user, tweets })
    }

    /// Recent search with the literal query string.
    pub async fn search(
        &self,
        query: &str,
        max_results: Option<u32>,
    ) -> Result<SearchResult, TwitterError> {
        let url = search_url(&self.base_url, query, page_size(max_results), None)?;
        let api::Response { data, includes, meta } = self
            .executor
            .get::<api::Response<Vec<api::Tweet>>>(url)
            .await?;
        let tweets = enrich_all(data, includes.as_ref());
        let result_count = meta.and_then(|m| m.result_count).unwrap_or(0);
        Ok(SearchResult {
            query: query.to_string(),
            tweets,
            result_count,
        })
    }

    /// Look up a user profile by handle.
    pub async fn get_user(&self, username: &str) -> Result<api::User, TwitterError> {
        self.lookup_user(username).await
    }

    /// Direct replies to a tweet: fetch the target for context, then search
    /// its conversation for tweets replying to it.
    pub async fn get_replies(
        &self,
        tweet_id: &str,
        max_results: Option<u32>,
    ) -> Result<RepliesResult, TwitterError> {
        let api::Response { data, includes, .. } = self
            .executor
            .get::<api::Response<api::Tweet>>(tweet_url(&self.base_url, tweet_id)?)
            .await?;
        let original = data.ok_or(TwitterError::MissingData("tweet"))?;
        let conversation_id = original
            .conversation_id
            .clone()
            .unwrap_or_else(|| original.id.clone());
        let original = IncludesIndex::new(includes.as_ref()).enrich(original);

        let query = format!("conversation_id:{conversation_id} in_reply_to_tweet_id:{tweet_id}");
        let url = search_url(&self.base_url, &query, page_size(max_results), None)?;
        let api::Response { data, includes, meta } = self
            .executor
            .get::<api::Response<Vec<api::Tweet>>>(url)
            .await?;
        let replies = enrich_all(data, includes.as_ref());
        let result_count = meta.and_then(|m| m.result_count).unwrap_or(0);
        Ok(RepliesResult {
            tweet: original,
            replies,
            result_count,
        })
    }

    async fn lookup_user(&self, username: &str) -> Result<api::User, TwitterError> {
        let api::Response { data, .. } = self
            .executor
            .get::<api::Response<api::User>>(user_by_username_url(&self.base_url, username)?)
            .await?;
        data.ok_or(TwitterError::MissingData("user"))
    }
}

fn page_size(max_results: Option<u32>) -> u32 {
    max_results.unwrap_or(DEFAULT_PAGE_RESULTS).min(MAX_PAGE_RESULTS)
}

fn append_tweet_params(url: &mut Url) {
    url.query_pairs_mut()
        .append_pair("tweet.fields", TWEET_FIELDS)
        .append_pair("expansions", EXPANSIONS)
        .append_pair("user.fields", USER_FIELDS);
}

pub(crate) fn tweet_url(base: &Url, tweet_id: &str) -> Result<Url, TwitterError> {
    let mut url = base.join(&format!("/2/tweets/{tweet_id}"))?;
    append_tweet_params(&mut url);
    Ok(url)
}

pub(crate) fn search_url(
    base: &Url,
    query: &str,
    max_results: u32,
    next_token: Option<&str>,
) -> Result<Url, TwitterError> {
    let mut url = base.join("/2/tweets/search/recent")?;
    url.query_pairs_mut()
        .append_pair("query", query)
        .append_pair("max_results", &max_results.to_string());
    append_tweet_params(&mut url);
    if let Some(token) = next_token {
        url.query_pairs_mut().append_pair("next_token", token);
    }
    Ok(url)
}

fn user_by_username_url(base: &Url, username: &str) -> Result<Url, TwitterError> {
    let mut url = base.join(&format!("/2/users/by/username/{username}"))?;
    url.query_pairs_mut().append_pair("user.fields", USER_FIELDS);
    Ok(url)
}

fn user_tweets_url(base: &Url, user_id: &str, max_results: u32) -> Result<Url, TwitterError> {
    let mut url = base.join(&format!("/2/users/{user_id}/tweets"))?;
    url.query_pairs_mut()
        .append_pair("max_results", &max_results.to_string());
    append_tweet_params(&mut url);
    Ok(url)
}
