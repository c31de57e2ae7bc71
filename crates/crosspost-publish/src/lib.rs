//! Publishing for crosspost.
//!
//! This crate provides:
//! - The `Publisher` capability implemented once per destination platform
//! - HTTP clients for Twitter/X, TikTok, Facebook and YouTube
//! - The `Dispatcher`, which fans one publish request out to many platforms
//!   concurrently and reports every outcome without failing fast

pub mod config;
mod dispatcher;
mod error;
pub mod platforms;
mod publisher;

pub use config::PublishersConfig;
pub use dispatcher::{Dispatcher, PLATFORM_UNAVAILABLE};
pub use error::{ConfigError, DispatchError, PublishError};
pub use publisher::{PublishedPost, Publisher, PublisherRegistry};
