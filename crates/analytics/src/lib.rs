//! # Trade Journal Analytics Engine
//!
//! This crate turns a journal's trade records into performance statistics and
//! time series. It is the numeric half of every report the journal shows.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** No I/O and no knowledge of storage. It depends only on `core-types`.
//! - **Stateless Calculation:** The `AnalyticsEngine` holds nothing but the contract
//!   point-value table. Every statistic is recomputed from the full input slice, and
//!   the input is never mutated.
//! - **Graceful Degradation:** Partial records are excluded or defaulted, never
//!   rejected. Nothing in this crate returns an error.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: All statistics, aggregations and series.
//! - `PerformanceReport` and friends: The result structs.
//! - `PointValueTable`: Dollar value per point, per futures symbol.
//! - `build_equity_curve_svg`: A minimal line chart of an equity curve.

// Declare the modules that constitute this crate.
pub mod chart;
pub mod contracts;
pub mod engine;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use chart::{EMPTY_CHART_PLACEHOLDER, build_equity_curve_svg};
pub use contracts::PointValueTable;
pub use engine::AnalyticsEngine;
pub use report::{
    ComplianceStats, DailyPnl, DrawdownPoint, DrawdownReport, EquityPoint, MonthlyPnl,
    PerformanceReport, ProfitFactor, SetupStats,
};
