//! # streamline
//!
//! Client library for the Streamline YouTube analytics API. It covers what a
//! front end needs besides rendering: the authenticated HTTP client with CSRF
//! and single-flight session renewal, typed endpoint wrappers, the selected
//! channel and session state, client-side sorting and bounded polling of
//! results the backend computes lazily.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use streamline::{
//!     api::auth::Credentials,
//!     client::ApiClient,
//!     config::Config,
//!     sort::{sort_videos, SortOption},
//!     state::AppState,
//!     storage::MemoryStorage,
//!     util::HttpClient,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let client = ApiClient::new(HttpClient::new(&config)?);
//!     let state = AppState::new(Arc::new(MemoryStorage::new()));
//!
//!     client
//!         .login(&Credentials::new("me@example.com", "hunter22"))
//!         .await?;
//!     state.session.check(&client).await;
//!
//!     // Picks the previously selected channel when it is still connected
//!     if let Some(channel) = state.channels.sync(&client).await? {
//!         let page = client.channel_videos(&channel.channel_id, None, None).await?;
//!         for video in sort_videos(&page.videos, SortOption::Views) {
//!             println!("{}", video.title);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! A 401 from any endpoint other than login or signup triggers one
//! `POST /auth/refresh-token`; requests failing while it is in flight wait
//! for it and are retried once it succeeds.

#![forbid(unsafe_code)]
#[macro_use]
extern crate log;

pub mod api;
pub mod client;
pub mod config;
pub mod csrf;
pub mod models;
pub mod poller;
pub mod renewal;
pub mod sort;
pub mod state;
pub mod storage;
pub mod tracker;
pub mod transport;
pub mod util;

#[cfg(test)]
mod testing;
