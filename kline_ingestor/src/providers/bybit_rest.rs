//! Bybit v5 market-data REST client.

pub mod credentials;
pub mod params;
pub mod provider;
pub mod response;

pub use credentials::BybitCredentials;
pub use provider::{BybitProvider, BybitSettings, DEFAULT_BASE_URL};
