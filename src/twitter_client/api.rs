use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Standard v2 response envelope. `data` is absent on empty list responses
/// as well as on some error responses, so it is always optional.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Response<Data> {
    pub data: Option<Data>,
    pub includes: Option<Includes>,
    pub meta: Option<Meta>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Meta {
    pub next_token: Option<String>,
    pub result_count: Option<u64>,
    pub newest_id: Option<String>,
    pub oldest_id: Option<String>,
}

/// Side-loaded expansion objects. Never authoritative on their own; only
/// used to resolve references on the primary data.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Includes {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub tweets: Vec<Tweet>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub profile_image_url: Option<String>,
    pub verified: Option<bool>,
    pub public_metrics: Option<UserPublicMetrics>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserPublicMetrics {
    pub followers_count: u64,
    pub following_count: u64,
    pub tweet_count: u64,
    pub listed_count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    pub author_id: Option<String>,
    pub conversation_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub referenced_tweets: Option<Vec<TweetReference>>,
    pub public_metrics: Option<PublicMetrics>,
}

/// Typed reference to another tweet ("replied_to", "quoted", "retweeted").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TweetReference {
    pub r#type: String,
    pub id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublicMetrics {
    pub retweet_count: u64,
    pub reply_count: u64,
    pub like_count: u64,
    pub quote_count: u64,
    pub bookmark_count: Option<u64>,
    pub impression_count: Option<u64>,
}

/// Error body shape. The API sends either a problem document with `detail`
/// or a list of structured errors carrying `message` fields.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub title: Option<String>,
    pub detail: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub message: Option<String>,
}
