#[macro_use]
extern crate log;

use std::{path::PathBuf, process, sync::Arc};

use chrono::Utc;
use clap::{Parser, Subcommand};
use streamline::{
    api::{
        auth::Credentials,
        niche::{NicheOptions, TimeFrame, VideoType},
    },
    client::{ApiClient, ApiError},
    config::{Config, ConfigError},
    models::{ContentType, SelectedChannel, Video},
    poller::{PollOutcome, Poller},
    sort::{sort_by_key, SortOption},
    state::{AppState, StateError},
    storage::{FileStorage, StorageError},
    transport::TransportError,
    util::{format_count, format_score, time_ago, watch_url, HttpClient},
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Transport(#[from] TransportError),
    #[error("{}", .0.message())]
    Api(#[from] ApiError),
    #[error("{0}")]
    State(#[from] StateError),
    #[error("could not access local state: {0}")]
    Storage(#[from] StorageError),
    #[error("no channel selected; add a channel first")]
    NoChannelSelected,
    #[error("stopped waiting for results: {0}")]
    Poll(String),
}

impl CliError {
    fn message(&self) -> String {
        match self {
            CliError::State(StateError::Api(e)) => e.message(),
            other => other.to_string(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "streamline", version, about = "Streamline YouTube analytics from the terminal")]
struct Cli {
    #[arg(long, env = "STREAMLINE_API_URL")]
    base_url: Option<String>,

    /// Where the selected channel and last results are kept
    #[arg(long, env = "STREAMLINE_STATE_FILE", default_value = ".streamline/state.json")]
    state_file: PathBuf,

    #[arg(long, env = "STREAMLINE_COOKIE_FILE", default_value = ".streamline/cookies.json")]
    cookie_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        email: String,
        #[arg(long, env = "STREAMLINE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Me,
    /// List connected channels, marking the selected one
    Channels,
    Select {
        channel_id: String,
    },
    /// Uploads of the selected channel
    Videos {
        #[arg(long, default_value = "recent")]
        sort: String,
        #[arg(long)]
        shorts: bool,
    },
    Outliers {
        #[arg(long, default_value = "outlier")]
        sort: String,
        /// Keep polling while the backend is still computing outliers
        #[arg(long)]
        wait: bool,
    },
    Niche {
        query: String,
        #[arg(long, default_value = "last_month")]
        time_frame: TimeFrame,
        #[arg(long)]
        shorts: bool,
    },
    Titles {
        idea: String,
    },
    Collections,
}

type Client = Arc<ApiClient<HttpClient>>;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{}", e.message());
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = Config::from_env()?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    let storage = Arc::new(FileStorage::open(&cli.state_file)?);
    config.state_file = Some(cli.state_file);
    config.cookie_file = Some(cli.cookie_file);

    let client = Arc::new(ApiClient::new(HttpClient::new(&config)?));
    let state = AppState::new(storage);

    let result = dispatch(cli.command, &client, &state, &config).await;
    // renewals and logins rotate cookies even when the command itself failed
    let saved = client.transport().save_cookies();
    result?;
    saved?;
    Ok(())
}

async fn dispatch(
    command: Command,
    client: &Client,
    state: &AppState,
    config: &Config,
) -> Result<(), CliError> {
    match command {
        Command::Login { email, password } => {
            client.login(&Credentials::new(email, password)).await?;
            if let Some(user) = state.session.check(client).await {
                println!("Logged in as {}", user.email);
            }
            if let Some(channel) = state.channels.sync(client).await? {
                println!("Selected channel: {}", channel.title);
            }
        }
        Command::Logout => {
            state.logout(client).await?;
            println!("Logged out");
        }
        Command::Me => {
            let user = client.me().await?;
            println!("{} ({})", user.email, user.auth_provider);
        }
        Command::Channels => {
            let selected = state.channels.sync(client).await?;
            for channel in state.channels.channels() {
                let marker = match &selected {
                    Some(s) if s.channel_id == channel.channel_id => '*',
                    _ => ' ',
                };
                println!(
                    "{} {}  {}  {}",
                    marker,
                    channel.channel_id,
                    channel.channel_title,
                    channel.handle.as_deref().unwrap_or("")
                );
            }
        }
        Command::Select { channel_id } => {
            state.channels.sync(client).await?;
            let channel = state.channels.select(&channel_id)?;
            println!("Selected channel: {}", channel.title);
        }
        Command::Videos { sort, shorts } => {
            let channel = selected_channel(client, state).await?;
            let content_type = if shorts {
                ContentType::Shorts
            } else {
                ContentType::Longform
            };
            let page = client
                .channel_videos(&channel.channel_id, None, Some(content_type))
                .await?;
            print_videos(&sorted(&page.videos, &sort));
        }
        Command::Outliers { sort, wait } => {
            let channel = selected_channel(client, state).await?;
            let videos = if wait {
                let poller = Poller::from_config(config);
                match client.poll_outliers(&poller, &channel.channel_id).join().await {
                    PollOutcome::Ready(videos) => videos,
                    PollOutcome::Failed(reason) => return Err(CliError::Poll(reason)),
                    PollOutcome::Exhausted { .. } | PollOutcome::Stopped => Vec::new(),
                }
            } else {
                client.outliers(&channel.channel_id).await?
            };
            if videos.is_empty() {
                println!("No outliers found.");
            }
            print_videos(&sorted(&videos, &sort));
        }
        Command::Niche {
            query,
            time_frame,
            shorts,
        } => {
            let options = NicheOptions {
                time_frame,
                video_type: if shorts {
                    VideoType::Shorts
                } else {
                    VideoType::Longform
                },
            };
            let results = client.search_niche(&query, options).await?;
            state.results.save_niche(query.trim(), &results)?;
            for channel in &results {
                println!(
                    "{:>6.2}  {:>12} subs  {}",
                    channel.score,
                    format_count(channel.subscriber_count),
                    channel.channel_title
                );
            }
        }
        Command::Titles { idea } => {
            let channel = selected_channel(client, state).await?;
            let titles = client.generate_titles(&idea, &channel.channel_id).await?;
            state
                .results
                .save_titles(&channel.channel_id, idea.trim(), &titles)?;
            for (i, title) in titles.iter().enumerate() {
                println!("{:>2}. {}", i + 1, title);
            }
        }
        Command::Collections => {
            for collection in client.collections().await? {
                println!(
                    "{}  {} ({} videos)",
                    collection.collection_id,
                    collection.name,
                    collection.videos.len()
                );
            }
        }
    }
    Ok(())
}

async fn selected_channel(client: &Client, state: &AppState) -> Result<SelectedChannel, CliError> {
    state
        .channels
        .sync(client)
        .await?
        .ok_or(CliError::NoChannelSelected)
}

fn sorted(videos: &[Video], key: &str) -> Vec<Video> {
    if key.parse::<SortOption>().is_err() {
        warn!("Unknown sort option {:?}, keeping server order", key);
    }
    sort_by_key(videos, key)
}

fn print_videos(videos: &[Video]) {
    let now = Utc::now();
    for video in videos {
        let age = video
            .published_at
            .map(|p| time_ago(p, now))
            .unwrap_or_default();
        let score = video.outlier_score.map(format_score).unwrap_or_default();
        println!(
            "{:>12} views  {:>6}  {:<14}  {}  {}",
            format_count(video.view_count.unwrap_or(0)),
            score,
            age,
            video.title,
            watch_url(&video.video_id)
        );
    }
}
