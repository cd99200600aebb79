use derive_more::{Constructor, Display, From, Into};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

use crate::domain::errors::{ChartError, ChartResult};

/// Milliseconds since the Unix epoch (UTC)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into, Constructor, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn from_millis(value: u64) -> Self {
        Self(value)
    }
}

/// Ticker key, trimmed and upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[display(fmt = "{}", _0)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(raw: &str) -> ChartResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ChartError::EmptySymbol);
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    pub fn value(&self) -> &str {
        &self.0
    }

    /// Parse a comma or whitespace separated list, skipping blanks and repeats.
    pub fn parse_list(raw: &str) -> Vec<Symbol> {
        let mut out: Vec<Symbol> = Vec::new();
        for part in raw.split(|c: char| c == ',' || c.is_whitespace()) {
            if let Ok(symbol) = Symbol::new(part) {
                if !out.contains(&symbol) {
                    out.push(symbol);
                }
            }
        }
        out
    }
}

impl FromStr for Symbol {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::new(s)
    }
}

/// Selectable window length in bars
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, StrumDisplay, EnumIter, EnumString, AsRefStr, Serialize,
    Deserialize,
)]
pub enum WindowBars {
    #[strum(serialize = "30")]
    #[serde(rename = "30")]
    Thirty,
    #[default]
    #[strum(serialize = "90")]
    #[serde(rename = "90")]
    Ninety,
    #[strum(serialize = "180")]
    #[serde(rename = "180")]
    OneEighty,
    #[strum(serialize = "252")]
    #[serde(rename = "252")]
    TradingYear,
    #[strum(serialize = "max")]
    #[serde(rename = "max")]
    Max,
}

impl WindowBars {
    /// Bar count, or `None` for the whole series
    pub fn bars(&self) -> Option<usize> {
        match self {
            Self::Thirty => Some(30),
            Self::Ninety => Some(90),
            Self::OneEighty => Some(180),
            Self::TradingYear => Some(252),
            Self::Max => None,
        }
    }

    pub fn parse(raw: &str) -> ChartResult<Self> {
        Self::from_str(raw.trim()).map_err(|_| ChartError::UnknownWindow(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn symbol_is_normalized() {
        assert_eq!(Symbol::new("  msft ").unwrap().value(), "MSFT");
        assert_eq!(Symbol::new("   "), Err(ChartError::EmptySymbol));
    }

    #[test]
    fn symbol_list_skips_blanks_and_duplicates() {
        let list = Symbol::parse_list("qqq, spy ,, QQQ  iwm");
        let names: Vec<&str> = list.iter().map(|s| s.value()).collect();
        assert_eq!(names, vec!["QQQ", "SPY", "IWM"]);
    }

    #[test]
    fn window_round_trips_through_strings() {
        for window in WindowBars::iter() {
            assert_eq!(WindowBars::parse(window.as_ref()).unwrap(), window);
        }
        assert_eq!(WindowBars::Max.bars(), None);
        assert!(matches!(WindowBars::parse("45"), Err(ChartError::UnknownWindow(_))));
    }
}
