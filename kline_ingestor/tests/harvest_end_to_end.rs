use std::{
    collections::HashMap,
    num::NonZeroUsize,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kline_ingestor::{
    models::{
        category::Category,
        interval::KlineInterval,
        kline::{KlineField, RawKline},
        windows::TimeWindowList,
    },
    providers::{ApiSnafu, KlineRequest, MarketDataClient, ProviderError},
    requests::historical::{RetryPolicy, SymbolOutcome},
    run, HarvestConfig, KlineHarvester,
};
use nonzero_ext::nonzero;

const MINUTE: i64 = 60_000;

/// BTCUSDT echoes each window's bounds, so adjacent pages share a boundary row.
/// ETHUSDT answers with two candles 5 and 6 minutes into each window.
/// BADUSDT always fails. Anything else has no data.
#[derive(Default)]
struct StubExchange {
    calls: Mutex<HashMap<String, usize>>,
}

fn raw(open_time: i64, close: &str) -> RawKline {
    vec![
        open_time.to_string(),
        "100".into(),
        "110".into(),
        "90".into(),
        close.into(),
        "7".into(),
        "700".into(),
    ]
}

#[async_trait]
impl MarketDataClient for StubExchange {
    async fn get_klines(&self, request: &KlineRequest) -> Result<Vec<RawKline>, ProviderError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(request.symbol.clone())
            .or_default() += 1;

        let end = request.end.unwrap_or(request.start);
        match request.symbol.as_str() {
            // newest first, like the exchange
            "BTCUSDT" => Ok(vec![
                raw(end, &format!("btc-{end}")),
                raw(request.start, &format!("btc-{}", request.start)),
            ]),
            "ETHUSDT" => {
                let (a, b) = (request.start + 5 * MINUTE, request.start + 6 * MINUTE);
                Ok(vec![raw(b, &format!("eth-{b}")), raw(a, &format!("eth-{a}"))])
            }
            "BADUSDT" => ApiSnafu {
                message: "10001: params error",
            }
            .fail(),
            _ => Ok(vec![]),
        }
    }

    async fn list_symbols(&self, _category: Category) -> Result<Vec<String>, ProviderError> {
        Ok(vec!["BTCUSDT".into(), "ETHUSDT".into()])
    }
}

fn ts(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap()
}

fn fast_config(concurrency: NonZeroUsize) -> HarvestConfig {
    HarvestConfig {
        category: Category::Linear,
        interval: KlineInterval::MINUTE,
        concurrency,
        retry: RetryPolicy {
            max_attempts: nonzero!(3u32),
            delay: Duration::ZERO,
        },
        stagger: Duration::ZERO,
        ..HarvestConfig::default()
    }
}

fn three_windows() -> TimeWindowList {
    TimeWindowList::from_stamps(vec![0, 10 * MINUTE, 20 * MINUTE])
}

#[tokio::test]
async fn run_outer_joins_two_symbols() {
    let client = Arc::new(StubExchange::default());
    let table = run(
        client.clone(),
        vec!["BTCUSDT".into(), "ETHUSDT".into()],
        KlineInterval::MINUTE,
        three_windows(),
        Category::Linear,
        nonzero!(2usize),
    )
    .await;

    let expected_minutes = [0, 5, 6, 10, 15, 16, 20];
    let expected_index: Vec<_> = expected_minutes.iter().map(|m| ts(m * MINUTE)).collect();
    assert_eq!(table.index(), expected_index.as_slice());

    let btc = table.column(KlineField::Close, "BTCUSDT").unwrap();
    let btc_present: Vec<bool> = btc.iter().map(Option::is_some).collect();
    assert_eq!(btc_present, vec![true, false, false, true, false, false, true]);
    assert_eq!(btc[3], Some("btc-600000"));

    let eth = table.column(KlineField::Close, "ETHUSDT").unwrap();
    let eth_present: Vec<bool> = eth.iter().map(Option::is_some).collect();
    assert_eq!(eth_present, vec![false, true, true, false, true, true, false]);

    let names = table.column_names();
    assert!(names.contains(&"Close_BTCUSDT".to_string()));
    assert!(names.contains(&"Close_ETHUSDT".to_string()));
    assert!(names.contains(&"Asset volume_ETHUSDT".to_string()));

    // one request per window pair, no symbol handled twice
    let calls = client.calls.lock().unwrap();
    assert_eq!(calls.get("BTCUSDT"), Some(&2));
    assert_eq!(calls.get("ETHUSDT"), Some(&2));
}

#[tokio::test]
async fn shared_boundary_candle_appears_once() {
    let harvester = KlineHarvester::new(Arc::new(StubExchange::default()), fast_config(nonzero!(1usize)));
    let harvest = harvester
        .harvest(vec!["BTCUSDT".into()], three_windows())
        .await;

    // pages [0, 10] and [10, 20] both return minute 10
    assert_eq!(harvest.table.index(), &[ts(0), ts(10 * MINUTE), ts(20 * MINUTE)]);
    assert_eq!(
        harvest.report.get("BTCUSDT"),
        Some(&SymbolOutcome::Extracted { rows: 3, attempts: 1 })
    );
}

#[tokio::test]
async fn failures_and_empty_symbols_do_not_abort_the_batch() {
    let client = Arc::new(StubExchange::default());
    let harvester = KlineHarvester::new(client.clone(), fast_config(nonzero!(3usize)));
    let symbols = vec![
        "BTCUSDT".to_string(),
        "BADUSDT".to_string(),
        "NEWUSDT".to_string(),
        "ETHUSDT".to_string(),
    ];

    let harvest = harvester.harvest(symbols, three_windows()).await;

    let mut in_table: Vec<&str> = harvest.table.symbols().collect();
    in_table.sort_unstable();
    assert_eq!(in_table, vec!["BTCUSDT", "ETHUSDT"]);

    let report = &harvest.report;
    assert_eq!(report.len(), 4);
    assert_eq!(report.extracted(), 2);
    assert_eq!(report.no_data(), 1);
    assert_eq!(report.failed_symbols(), vec!["BADUSDT"]);
    match report.get("BADUSDT") {
        Some(SymbolOutcome::Failed { attempts, last_error }) => {
            assert_eq!(*attempts, 3);
            assert!(last_error.contains("params error"));
        }
        other => panic!("expected BADUSDT to fail, got {other:?}"),
    }
    // each failed pass stops at the first window
    assert_eq!(client.calls.lock().unwrap().get("BADUSDT"), Some(&3));
}

#[tokio::test]
async fn every_symbol_failing_gives_an_empty_table() {
    let harvester = KlineHarvester::new(Arc::new(StubExchange::default()), fast_config(nonzero!(4usize)));
    let harvest = harvester
        .harvest(vec!["BADUSDT".into()], three_windows())
        .await;

    assert!(harvest.table.is_empty());
    assert_eq!(harvest.table.symbol_count(), 0);
    assert_eq!(harvest.report.failed(), 1);
}

#[tokio::test]
async fn single_window_uses_one_open_ended_page() {
    let client = Arc::new(StubExchange::default());
    let harvester = KlineHarvester::new(client.clone(), fast_config(nonzero!(2usize)));
    let harvest = harvester
        .harvest(vec!["ETHUSDT".into()], TimeWindowList::from_stamps(vec![0]))
        .await;

    assert_eq!(harvest.table.index(), &[ts(5 * MINUTE), ts(6 * MINUTE)]);
    assert_eq!(client.calls.lock().unwrap().get("ETHUSDT"), Some(&1));
}

#[tokio::test]
async fn more_workers_than_symbols() {
    let harvester = KlineHarvester::new(Arc::new(StubExchange::default()), fast_config(nonzero!(50usize)));
    let harvest = harvester
        .harvest(vec!["BTCUSDT".into(), "ETHUSDT".into()], three_windows())
        .await;

    assert_eq!(harvest.table.symbol_count(), 2);
    assert_eq!(harvest.table.len(), 7);
    assert!(harvest.report.all_succeeded());
}
