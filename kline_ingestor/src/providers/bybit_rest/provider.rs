use std::{num::NonZeroU32, time::Duration};

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use nonzero_ext::nonzero;
use reqwest::{header, Client, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use snafu::ResultExt;
use tracing::debug;

use crate::{
    models::{category::Category, kline::RawKline},
    providers::{
        bybit_rest::{
            credentials::BybitCredentials,
            params::{construct_params, ticker_params},
            response::{BybitResponse, KlineResult, TickerResult},
        },
        ApiSnafu, ClientBuildSnafu, InvalidApiKeySnafu, KlineRequest, MarketDataClient,
        ProviderError, ProviderInitError, RateLimitedSnafu, ReqwestSnafu,
    },
};

pub const DEFAULT_BASE_URL: &str = "https://api.bybit.com";

const KLINE_PATH: &str = "/v5/market/kline";
const TICKERS_PATH: &str = "/v5/market/tickers";
const API_KEY_HEADER: &str = "X-BAPI-API-KEY";

/// Connection settings for [`BybitProvider`].
#[derive(Debug, Clone)]
pub struct BybitSettings {
    pub base_url: String,
    /// Client-side pacing shared by every request made through one provider.
    pub requests_per_second: NonZeroU32,
    pub timeout: Duration,
}

impl Default for BybitSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            requests_per_second: nonzero!(10u32),
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct BybitProvider {
    client: Client,
    base_url: String,
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl BybitProvider {
    /// Creates a new Bybit provider.
    ///
    /// Credentials are optional; when given, the API key is sent with every
    /// request.
    pub fn new(
        settings: BybitSettings,
        credentials: Option<&BybitCredentials>,
    ) -> Result<Self, ProviderInitError> {
        let mut headers = header::HeaderMap::new();
        if let Some(creds) = credentials {
            headers.insert(
                API_KEY_HEADER,
                header::HeaderValue::from_str(creds.api_key().expose_secret())
                    .context(InvalidApiKeySnafu)?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::direct(Quota::per_second(settings.requests_per_second)),
        })
    }

    /// Provider against the public endpoint with default pacing and no key.
    pub fn public() -> Result<Self, ProviderInitError> {
        Self::new(BybitSettings::default(), None)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ProviderError> {
        self.limiter.until_ready().await;

        let url = format!("{}{path}", self.base_url);
        debug!(%url, ?query, "GET");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return RateLimitedSnafu {
                message: format!("HTTP {status}"),
            }
            .fail();
        }
        if !status.is_success() {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return ApiSnafu {
                message: format!("HTTP {status}: {error_msg}"),
            }
            .fail();
        }

        let envelope = response
            .json::<BybitResponse<T>>()
            .await
            .context(ReqwestSnafu)?;
        envelope.into_result()
    }
}

#[async_trait]
impl MarketDataClient for BybitProvider {
    async fn get_klines(&self, request: &KlineRequest) -> Result<Vec<RawKline>, ProviderError> {
        let query = construct_params(request);
        let result: KlineResult = self.get(KLINE_PATH, &query).await?;
        Ok(result.list)
    }

    async fn list_symbols(&self, category: Category) -> Result<Vec<String>, ProviderError> {
        let query = ticker_params(category);
        let result: TickerResult = self.get(TICKERS_PATH, &query).await?;
        Ok(result.list.into_iter().map(|ticker| ticker.symbol).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let settings = BybitSettings {
            base_url: "https://api-testnet.bybit.com/".into(),
            ..BybitSettings::default()
        };
        let provider = BybitProvider::new(settings, None).unwrap();
        assert_eq!(provider.base_url, "https://api-testnet.bybit.com");
    }

    #[test]
    fn rejects_api_key_that_is_not_a_header_value() {
        let creds = BybitCredentials::new("bad\nkey");
        let err = BybitProvider::new(BybitSettings::default(), Some(&creds))
            .err()
            .unwrap();
        assert!(matches!(err, ProviderInitError::InvalidApiKey { .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let settings = BybitSettings {
            base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_millis(500),
            ..BybitSettings::default()
        };
        let provider = BybitProvider::new(settings, None).unwrap();
        let err = provider.list_symbols(Category::Linear).await.unwrap_err();
        assert!(matches!(err, ProviderError::Reqwest { .. }));
    }
}
