//! Core library for the `wxfeed` CLI.
//!
//! This crate defines:
//! - The weather feed parser and the record it produces
//! - Percent-directive output templates
//! - The HTTP feed client and output sinks
//! - The per-location run loop and on-disk configuration
//!
//! It is used by `wxfeed-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod format;
pub mod model;
pub mod output;
pub mod run;

pub use client::{FeedClient, FeedSource};
pub use config::{Config, Overrides, RunConfig};
pub use error::{ConfigError, FetchError, ParseError, RunError};
pub use format::{DateFormatSpec, FormatSpec};
pub use model::{Units, WeatherRecord};
pub use output::{LineSink, Output};
pub use run::{RunSummary, run};
