use thiserror::Error;

use shared_utils::config::ConfigError;

use crate::providers::{ProviderError, ProviderInitError};

/// The unified error type for the `kline_ingestor` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An error originating from a data provider (e.g., API error, transport).
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The provider could not be constructed.
    #[error("Provider initialization failed: {0}")]
    Init(#[from] ProviderInitError),

    /// An error related to configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// User-supplied input (symbols, dates, overrides) that cannot be used.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A generic I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// An error from the Polars library.
    #[cfg(feature = "dataframe")]
    #[error("Polars operation failed")]
    Polars(#[from] polars::prelude::PolarsError),
}
