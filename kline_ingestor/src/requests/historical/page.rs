use crate::{
    models::series::SymbolSeries,
    providers::{KlineRequest, MalformedSnafu, MarketDataClient, ProviderError},
};

/// Fetches one page and normalizes it into a sorted [`SymbolSeries`].
///
/// The caller picks `start`/`end` so the page stays below `limit` rows;
/// oversized windows are not detected here. Provider failures are returned
/// unchanged and a row of the wrong shape becomes [`ProviderError::Malformed`].
pub async fn fetch_page(
    client: &dyn MarketDataClient,
    request: &KlineRequest,
) -> Result<SymbolSeries, ProviderError> {
    let raw = client.get_klines(request).await?;
    SymbolSeries::from_raw(request.symbol.as_str(), &raw).map_err(|e| {
        MalformedSnafu {
            message: format!("{} kline row: {e}", request.symbol),
        }
        .build()
    })
}
