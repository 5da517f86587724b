//! Read-only client for the Twitter v2 API: single tweets, conversation
//! threads, user timelines, recent search, profiles, and replies.
//!
//! The network seam is the injectable [`twitter_client::transport::Transport`]
//! trait; everything above it (retry, rate-limit observation, includes
//! denormalization, thread reconstruction) is plain testable logic.

pub mod twitter_client;

pub use twitter_client::{ClientConfig, TwitterClient};
