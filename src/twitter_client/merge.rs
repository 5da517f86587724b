use std::collections::HashMap;

use serde::Serialize;

use crate::twitter_client::api;

/// A tweet with its author and first referenced tweet resolved from the
/// response's `includes`. Both stay `None` when unresolvable.
#[derive(Clone, Debug, Serialize)]
pub struct EnrichedTweet {
    pub tweet: api::Tweet,
    pub author: Option<api::User>,
    pub referenced: Option<api::Tweet>,
}

/// O(1) lookups over one response's side-loaded objects. Built once per
/// response and shared across every tweet in it; never mutates the includes.
pub struct IncludesIndex<'a> {
    users: HashMap<&'a str, &'a api::User>,
    tweets: HashMap<&'a str, &'a api::Tweet>,
}

impl<'a> IncludesIndex<'a> {
    pub fn new(includes: Option<&'a api::Includes>) -> Self {
        let (users, tweets) = match includes {
            Some(includes) => (
                includes
                    .users
                    .iter()
                    .map(|user| (user.id.as_str(), user))
                    .collect(),
                includes
                    .tweets
                    .iter()
                    .map(|tweet| (tweet.id.as_str(), tweet))
                    .collect(),
            ),
            None => (HashMap::new(), HashMap::new()),
        };
        Self { users, tweets }
    }

    pub fn enrich(&self, tweet: api::Tweet) -> EnrichedTweet {
        let author = tweet
            .author_id
            .as_deref()
            .and_then(|id| self.users.get(id))
            .map(|&user| user.clone());
        // Only the first typed reference is resolved.
        let referenced = tweet
            .referenced_tweets
            .as_ref()
            .and_then(|refs| refs.first())
            .and_then(|r| self.tweets.get(r.id.as_str()))
            .map(|&t| t.clone());
        EnrichedTweet {
            tweet,
            author,
            referenced,
        }
    }
}

/// Enrich a whole list response. Absent `data` means zero items, same as an
/// empty list; one index serves the entire page.
pub fn enrich_all(
    data: Option<Vec<api::Tweet>>,
    includes: Option<&api::Includes>,
) -> Vec<EnrichedTweet> {
    let index = IncludesIndex::new(includes);
    data.unwrap_or_default()
        .into_iter()
        .map(|tweet| index.enrich(tweet))
        .collect()
}
