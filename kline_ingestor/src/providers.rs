//! Market data source abstraction.
//!
//! This module defines the [`MarketDataClient`] trait, the single seam between the
//! harvesting engine and an exchange. The engine never speaks HTTP itself: it is
//! handed a client (usually an `Arc<dyn MarketDataClient>`) and only calls the two
//! operations below.
//!
//! The trait is designed for async usage and supports dynamic dispatch, so tests
//! can swap in a stub and the binary can pick the concrete exchange at runtime.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use kline_ingestor::models::{category::Category, kline::RawKline};
//! use kline_ingestor::providers::{KlineRequest, MarketDataClient, ProviderError};
//!
//! struct Quiet;
//!
//! #[async_trait]
//! impl MarketDataClient for Quiet {
//!     async fn get_klines(&self, _request: &KlineRequest) -> Result<Vec<RawKline>, ProviderError> {
//!         Ok(vec![])
//!     }
//!
//!     async fn list_symbols(&self, _category: Category) -> Result<Vec<String>, ProviderError> {
//!         Ok(vec!["BTCUSDT".to_string()])
//!     }
//! }
//! ```

pub mod bybit_rest;

use std::path::PathBuf;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::{category::Category, interval::KlineInterval, kline::RawKline};

/// Parameters of one kline page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlineRequest {
    pub category: Category,
    pub symbol: String,
    pub interval: KlineInterval,
    /// Inclusive lower bound, ms since epoch.
    pub start: i64,
    /// Upper bound, ms since epoch. `None` asks for an open-ended page.
    pub end: Option<i64>,
    /// Maximum number of rows the exchange may return.
    pub limit: u32,
}

/// Capability to read kline data from an exchange.
///
/// Implementations handle transport, authentication and pacing. Callers are
/// responsible for choosing `start`/`end` so that one page stays below `limit`
/// rows.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Fetches one page of raw klines.
    ///
    /// Rows are returned in exchange order, untouched.
    async fn get_klines(&self, request: &KlineRequest) -> Result<Vec<RawKline>, ProviderError>;

    /// Lists every tradable symbol in `category`.
    async fn list_symbols(&self, category: Category) -> Result<Vec<String>, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// API key contains invalid characters.
    #[snafu(display("Invalid API key format: {source}"))]
    InvalidApiKey {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to read credentials file {}: {source}", path.display()))]
    CredentialsFile {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Credentials file {} is not valid JSON credentials: {source}", path.display()))]
    CredentialsFormat {
        path: PathBuf,
        source: serde_json::Error,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `MarketDataClient` implementation.
///
/// Every variant is treated as transient by the harvester and retried.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The exchange answered with a failure status or a non-zero return code.
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },

    /// The exchange refused the request because of its rate limit.
    #[snafu(display("Rate limited: {message}"))]
    RateLimited {
        message: String,
        backtrace: Backtrace,
    },

    /// The payload did not have the expected shape.
    #[snafu(display("Malformed response: {message}"))]
    Malformed {
        message: String,
        backtrace: Backtrace,
    },
}

impl ProviderError {
    pub fn is_rate_limited(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. } => true,
            ProviderError::Reqwest { source, .. } => {
                source.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS)
            }
            _ => false,
        }
    }
}
