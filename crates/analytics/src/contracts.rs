use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dollar value of a one-point move, per futures symbol.
///
/// Used to turn a stop distance into dollar risk. Symbols without an entry fall
/// back to `default_value` (1, i.e. the price move is already in dollars).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointValueTable {
    values: BTreeMap<String, Decimal>,
    default_value: Decimal,
}

impl PointValueTable {
    /// The built-in CME contracts the journal knows about.
    pub fn standard() -> Self {
        let values = [
            ("NQ", 20),
            ("ES", 50),
            ("MNQ", 2),
            ("MES", 5),
            ("GC", 100),
            ("MGC", 10),
        ]
        .into_iter()
        .map(|(symbol, value)| (symbol.to_string(), Decimal::from(value)))
        .collect();

        Self {
            values,
            default_value: Decimal::ONE,
        }
    }

    /// Returns the point value for `symbol`, or the default for unknown symbols.
    pub fn point_value(&self, symbol: &str) -> Decimal {
        self.values.get(symbol).copied().unwrap_or(self.default_value)
    }

    /// Adds or replaces a symbol, returning the previous value if there was one.
    pub fn insert(&mut self, symbol: impl Into<String>, point_value: Decimal) -> Option<Decimal> {
        self.values.insert(symbol.into(), point_value)
    }

    /// Applies a batch of overrides on top of the current table.
    pub fn with_overrides<I, S>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: Into<String>,
    {
        for (symbol, value) in overrides {
            self.insert(symbol, value);
        }
        self
    }

    pub fn default_value(&self) -> Decimal {
        self.default_value
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.values.iter().map(|(symbol, value)| (symbol.as_str(), *value))
    }
}

impl Default for PointValueTable {
    fn default() -> Self {
        Self::standard()
    }
}
