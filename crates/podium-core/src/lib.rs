//! # podium-core
//!
//! Client SDK for the Podium leaderboard service.
//!
//! This crate provides:
//! - A durable score-submission pipeline: failed posts are journaled to a
//!   newline-delimited JSON log and replayed with exponential backoff,
//!   surviving process restarts
//! - Stateless score listing queries (all / player / nearby / with-player)
//! - Transport and account seams for embedding and for tests

pub mod account;
pub mod client;
pub mod config;
pub mod error;
pub mod network;
pub mod queue;
pub mod record;
pub mod retry;
pub mod submission;

pub use account::{AccountProvider, StaticAccount};
pub use client::{LeaderboardClient, QueryOptions, SubmitOptions};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use network::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
pub use queue::FailedQueue;
pub use record::{ScorePage, ScoreRecord};
pub use retry::Backoff;
pub use submission::ScoreSubmission;
