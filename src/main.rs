use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use serde::Serialize;
use std::env;
use twitter_fetch::{ClientConfig, TwitterClient};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a single tweet by id
    Tweet { id: String },
    /// Reconstruct the conversation thread containing a tweet
    Thread {
        id: String,
        #[arg(short, long)]
        max_results: Option<u32>,
    },
    /// Recent tweets from a user
    Timeline {
        username: String,
        #[arg(short, long)]
        max_results: Option<u32>,
    },
    /// Search recent tweets
    Search {
        query: String,
        #[arg(short, long)]
        max_results: Option<u32>,
    },
    /// Look up a user profile
    User { username: String },
    /// Direct replies to a tweet
    Replies {
        id: String,
        #[arg(short, long)]
        max_results: Option<u32>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "twitter_fetch=info".into()),
        )
        .init();

    let args = Args::parse();

    dotenv().ok();
    let bearer_token =
        env::var("TWITTER_BEARER_TOKEN").context("TWITTER_BEARER_TOKEN is not set")?;
    let client = TwitterClient::new(ClientConfig::new(bearer_token))?;

    match args.command {
        Command::Tweet { id } => print_json(&client.get_tweet(&id).await?),
        Command::Thread { id, max_results } => {
            print_json(&client.get_thread(&id, max_results).await?)
        }
        Command::Timeline {
            username,
            max_results,
        } => print_json(&client.get_timeline(&username, max_results).await?),
        Command::Search { query, max_results } => {
            print_json(&client.search(&query, max_results).await?)
        }
        Command::User { username } => print_json(&client.get_user(&username).await?),
        Command::Replies { id, max_results } => {
            print_json(&client.get_replies(&id, max_results).await?)
        }
    }
}
