use std::fmt;

use indexmap::IndexMap;

/// What happened to one symbol during a harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolOutcome {
    /// At least one candle was collected.
    Extracted { rows: usize, attempts: u32 },
    /// Every request succeeded but the exchange had no candles in range.
    NoData { attempts: u32 },
    /// The retry budget ran out. `last_error` is the final failure.
    Failed { attempts: u32, last_error: String },
}

impl SymbolOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            SymbolOutcome::Extracted { attempts, .. }
            | SymbolOutcome::NoData { attempts }
            | SymbolOutcome::Failed { attempts, .. } => *attempts,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SymbolOutcome::Failed { .. })
    }
}

/// Per-symbol outcomes of a harvest, in completion order.
///
/// The merged table cannot tell "no candles" from "gave up"; this can.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    outcomes: IndexMap<String, SymbolOutcome>,
}

impl HarvestReport {
    pub fn record(&mut self, symbol: impl Into<String>, outcome: SymbolOutcome) {
        self.outcomes.insert(symbol.into(), outcome);
    }

    pub fn extend(&mut self, other: HarvestReport) {
        self.outcomes.extend(other.outcomes);
    }

    pub fn get(&self, symbol: &str) -> Option<&SymbolOutcome> {
        self.outcomes.get(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SymbolOutcome)> {
        self.outcomes.iter().map(|(s, o)| (s.as_str(), o))
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn extracted(&self) -> usize {
        self.count(|o| matches!(o, SymbolOutcome::Extracted { .. }))
    }

    pub fn no_data(&self) -> usize {
        self.count(|o| matches!(o, SymbolOutcome::NoData { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(SymbolOutcome::is_failed)
    }

    pub fn failed_symbols(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, o)| o.is_failed())
            .map(|(s, _)| s)
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&SymbolOutcome) -> bool) -> usize {
        self.outcomes.values().filter(|&o| pred(o)).count()
    }
}

impl fmt::Display for HarvestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} symbols: {} extracted, {} without data, {} failed",
            self.len(),
            self.extracted(),
            self.no_data(),
            self.failed()
        )
    }
}
