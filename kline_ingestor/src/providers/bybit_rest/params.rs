use crate::{models::category::Category, providers::KlineRequest};

/// Query string for `GET /v5/market/kline`.
///
/// `end` is only sent when the request is bounded.
pub fn construct_params(request: &KlineRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("category", request.category.as_str().to_string()),
        ("symbol", request.symbol.clone()),
        ("interval", request.interval.code()),
        ("start", request.start.to_string()),
    ];
    if let Some(end) = request.end {
        params.push(("end", end.to_string()));
    }
    params.push(("limit", request.limit.to_string()));
    params
}

/// Query string for `GET /v5/market/tickers`.
pub fn ticker_params(category: Category) -> Vec<(&'static str, String)> {
    vec![("category", category.as_str().to_string())]
}
