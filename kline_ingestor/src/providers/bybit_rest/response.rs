use serde::Deserialize;

use crate::{
    models::kline::RawKline,
    providers::{ApiSnafu, MalformedSnafu, ProviderError, RateLimitedSnafu},
};

/// Return codes the exchange uses for rate-limit rejections.
const RATE_LIMIT_CODES: [i64; 2] = [10006, 10018];

/// Common envelope around every v5 response.
///
/// Failed calls still come back with HTTP 200 and a non-zero `retCode`; their
/// `result` is usually an empty object.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BybitResponse<T> {
    pub ret_code: i64,
    #[serde(default)]
    pub ret_msg: String,
    pub result: Option<T>,
}

impl<T> BybitResponse<T> {
    pub fn into_result(self) -> Result<T, ProviderError> {
        match self.ret_code {
            0 => self.result.ok_or_else(|| {
                MalformedSnafu {
                    message: "response has retCode 0 but no result",
                }
                .build()
            }),
            code if RATE_LIMIT_CODES.contains(&code) => RateLimitedSnafu {
                message: format!("{code}: {}", self.ret_msg),
            }
            .fail(),
            code => ApiSnafu {
                message: format!("{code}: {}", self.ret_msg),
            }
            .fail(),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct KlineResult {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub category: String,
    /// Newest first: `[startTime, open, high, low, close, volume, turnover]`.
    #[serde(default)]
    pub list: Vec<RawKline>,
}

#[derive(Deserialize, Debug)]
pub struct Ticker {
    pub symbol: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct TickerResult {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub list: Vec<Ticker>,
}
