use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One point of the cumulative P&L curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// The trade's date string, as written in the journal.
    pub date: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownPoint {
    pub date: String,
    /// Distance below the running peak. Always zero or negative.
    pub drawdown: Decimal,
}

/// Drawdown series plus its headline numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownReport {
    pub series: Vec<DrawdownPoint>,
    pub max_drawdown: Decimal,
    pub current_drawdown: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPnl {
    /// Calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub pnl: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPnl {
    /// Calendar month, `YYYY-MM`.
    pub month: String,
    pub pnl: Decimal,
    pub count: usize,
}

/// Per-setup breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupStats {
    pub setup: String,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub pnl: Decimal,
    pub win_total: Decimal,
    pub loss_total: Decimal,
    pub win_rate: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplianceStats {
    /// Percentage of all trades marked as having followed the plan.
    pub followed_rate: Decimal,
    /// Net P&L of trades marked as plan violations.
    pub violation_cost: Decimal,
}

impl Default for ComplianceStats {
    fn default() -> Self {
        Self {
            followed_rate: Decimal::ZERO,
            violation_cost: Decimal::ZERO,
        }
    }
}

/// Gross profit divided by gross loss.
///
/// A bare ratio can't express "no losing trades" without an infinity, which does
/// not survive JSON. The two degenerate cases get their own variants instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProfitFactor {
    Ratio(Decimal),
    /// Winners exist but there are no losses.
    NoLosses,
    /// Neither wins nor losses.
    Undefined,
}

impl ProfitFactor {
    /// The finite ratio, if there is one.
    pub fn ratio(&self) -> Option<Decimal> {
        match self {
            ProfitFactor::Ratio(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfitFactor::Ratio(value) => write!(f, "{:.2}", value),
            ProfitFactor::NoLosses => write!(f, "no losses"),
            ProfitFactor::Undefined => write!(f, "n/a"),
        }
    }
}

/// Headline statistics for a set of trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    // I. Trade counts
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,

    // II. Profitability
    pub net_pnl: Decimal,
    pub win_rate_pct: Decimal,
    pub average_win: Decimal,
    pub average_loss: Decimal,
    pub profit_factor: ProfitFactor,
    pub expectancy: Decimal,
    pub expectancy_per_r: Option<Decimal>, // None when no trade has stop/size data

    // III. Risk
    pub max_drawdown: Decimal,
    pub current_drawdown: Decimal,

    // IV. Discipline
    pub compliance: ComplianceStats,
}

impl PerformanceReport {
    /// Creates a zeroed-out report, which is also the report for an empty journal.
    pub fn new() -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            net_pnl: Decimal::ZERO,
            win_rate_pct: Decimal::ZERO,
            average_win: Decimal::ZERO,
            average_loss: Decimal::ZERO,
            profit_factor: ProfitFactor::Undefined,
            expectancy: Decimal::ZERO,
            expectancy_per_r: None,
            max_drawdown: Decimal::ZERO,
            current_drawdown: Decimal::ZERO,
            compliance: ComplianceStats::default(),
        }
    }
}

impl Default for PerformanceReport {
    fn default() -> Self {
        Self::new()
    }
}
