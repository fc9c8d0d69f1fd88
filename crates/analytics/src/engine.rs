use crate::contracts::PointValueTable;
use crate::report::{
    ComplianceStats, DailyPnl, DrawdownPoint, DrawdownReport, EquityPoint, MonthlyPnl,
    PerformanceReport, ProfitFactor, SetupStats,
};
use chrono::{DateTime, FixedOffset};
use core_types::TradeRecord;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// A stateless calculator for deriving performance statistics from journal trades.
///
/// Every method takes the trades as an unordered slice and never mutates it.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    point_values: PointValueTable,
}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_point_values(point_values: PointValueTable) -> Self {
        Self { point_values }
    }

    pub fn point_values(&self) -> &PointValueTable {
        &self.point_values
    }

    /// Computes the headline report in one pass over the helpers below.
    pub fn summarize(&self, trades: &[TradeRecord]) -> PerformanceReport {
        let mut report = PerformanceReport::new();
        if trades.is_empty() {
            return report;
        }

        report.total_trades = trades.len();
        report.winning_trades = trades.iter().filter(|t| t.is_win()).count();
        report.losing_trades = trades.iter().filter(|t| t.is_loss()).count();
        report.net_pnl = total(trades.iter().map(TradeRecord::realized_pnl));
        report.win_rate_pct = self.win_rate(trades);
        report.average_win = self.average_win(trades);
        report.average_loss = self.average_loss(trades);
        report.profit_factor = self.profit_factor(trades);
        report.expectancy = self.expectancy(trades);
        report.expectancy_per_r = self.expectancy_per_r(trades);

        let drawdown = self.drawdown_series(trades);
        report.max_drawdown = drawdown.max_drawdown;
        report.current_drawdown = drawdown.current_drawdown;

        report.compliance = self.compliance_stats(trades);

        tracing::debug!(
            trades = report.total_trades,
            dated = drawdown.series.len(),
            net_pnl = %report.net_pnl,
            "Computed performance report."
        );
        report
    }

    /// Returns the dated trades in chronological order.
    ///
    /// Trades with a missing or unreadable date are left out. The sort is stable,
    /// so trades sharing a timestamp keep their input order.
    pub fn normalize_trades<'a>(&self, trades: &'a [TradeRecord]) -> Vec<&'a TradeRecord> {
        dated_trades(trades).into_iter().map(|(_, trade)| trade).collect()
    }

    /// Running cumulative P&L, one point per dated trade.
    pub fn equity_curve(&self, trades: &[TradeRecord]) -> Vec<EquityPoint> {
        let mut cumulative = Decimal::ZERO;
        self.normalize_trades(trades)
            .into_iter()
            .map(|trade| {
                cumulative = cumulative.saturating_add(trade.realized_pnl());
                EquityPoint {
                    date: trade.date.clone().unwrap_or_default(),
                    value: cumulative,
                }
            })
            .collect()
    }

    /// Drawdown from the running equity peak.
    ///
    /// The peak starts at zero rather than at the first point, so a journal that
    /// opens with a loss is already in drawdown.
    pub fn drawdown_series(&self, trades: &[TradeRecord]) -> DrawdownReport {
        let mut peak = Decimal::ZERO;
        let mut max_drawdown = Decimal::ZERO;

        let series: Vec<DrawdownPoint> = self
            .equity_curve(trades)
            .into_iter()
            .map(|point| {
                peak = peak.max(point.value);
                let drawdown = point.value.saturating_sub(peak);
                max_drawdown = max_drawdown.min(drawdown);
                DrawdownPoint {
                    date: point.date,
                    drawdown,
                }
            })
            .collect();

        let current_drawdown = series.last().map_or(Decimal::ZERO, |point| point.drawdown);
        DrawdownReport {
            series,
            max_drawdown,
            current_drawdown,
        }
    }

    /// Percentage of trades with positive P&L. Breakeven trades count in the denominator.
    pub fn win_rate(&self, trades: &[TradeRecord]) -> Decimal {
        let wins = trades.iter().filter(|t| t.is_win()).count();
        percentage(wins, trades.len())
    }

    pub fn average_win(&self, trades: &[TradeRecord]) -> Decimal {
        mean(trades.iter().filter(|t| t.is_win()).map(TradeRecord::realized_pnl))
    }

    /// Mean size of a losing trade, as a positive number.
    pub fn average_loss(&self, trades: &[TradeRecord]) -> Decimal {
        mean(trades.iter().filter(|t| t.is_loss()).map(|t| t.realized_pnl().abs()))
    }

    pub fn profit_factor(&self, trades: &[TradeRecord]) -> ProfitFactor {
        let gross_profit = total(trades.iter().filter(|t| t.is_win()).map(TradeRecord::realized_pnl));
        let gross_loss = total(trades.iter().filter(|t| t.is_loss()).map(|t| t.realized_pnl().abs()));

        if gross_loss.is_zero() {
            if gross_profit > Decimal::ZERO {
                ProfitFactor::NoLosses
            } else {
                ProfitFactor::Undefined
            }
        } else {
            ProfitFactor::Ratio(gross_profit.checked_div(gross_loss).unwrap_or(Decimal::MAX))
        }
    }

    /// Expected P&L per trade: `p(win) * avg_win - p(not win) * avg_loss`.
    pub fn expectancy(&self, trades: &[TradeRecord]) -> Decimal {
        if trades.is_empty() {
            return Decimal::ZERO;
        }
        let rate = self.win_rate(trades) / Decimal::ONE_HUNDRED;
        rate * self.average_win(trades) - (Decimal::ONE - rate) * self.average_loss(trades)
    }

    /// Mean R-multiple over trades that carry entry, stop and size.
    ///
    /// Returns `None` when no trade qualifies, which is not the same thing as an
    /// expectancy of zero. A trade whose R-multiple overflows does not qualify.
    pub fn expectancy_per_r(&self, trades: &[TradeRecord]) -> Option<Decimal> {
        let r_multiples: Vec<Decimal> = trades
            .iter()
            .filter_map(|trade| {
                let risk = self.dollar_risk(trade)?;
                trade.realized_pnl().checked_div(risk)
            })
            .collect();

        if r_multiples.is_empty() {
            return None;
        }
        Some(mean(r_multiples))
    }

    /// Dollar risk of a trade: stop distance × point value × size.
    ///
    /// `None` if any input is missing or zero, or the resulting risk is zero or
    /// does not fit in a `Decimal`.
    pub fn dollar_risk(&self, trade: &TradeRecord) -> Option<Decimal> {
        let entry = trade.entry.filter(|v| !v.is_zero())?;
        let stop_loss = trade.stop_loss.filter(|v| !v.is_zero())?;
        let quantity = trade.quantity.filter(|v| !v.is_zero())?;
        let point_value = self.point_values.point_value(trade.symbol.as_deref().unwrap_or_default());

        let risk = entry
            .checked_sub(stop_loss)?
            .abs()
            .checked_mul(point_value)?
            .checked_mul(quantity.abs())?;
        (!risk.is_zero()).then_some(risk)
    }

    /// P&L and trade count per calendar day, ascending.
    pub fn daily_aggregation(&self, trades: &[TradeRecord]) -> Vec<DailyPnl> {
        bucket_by(trades, "%Y-%m-%d")
            .into_iter()
            .map(|(date, (pnl, count))| DailyPnl { date, pnl, count })
            .collect()
    }

    /// P&L and trade count per calendar month, ascending.
    pub fn monthly_aggregation(&self, trades: &[TradeRecord]) -> Vec<MonthlyPnl> {
        bucket_by(trades, "%Y-%m")
            .into_iter()
            .map(|(month, (pnl, count))| MonthlyPnl { month, pnl, count })
            .collect()
    }

    /// Statistics per setup tag, best total P&L first.
    ///
    /// Setups with equal P&L are ordered by name.
    pub fn setup_performance(&self, trades: &[TradeRecord]) -> Vec<SetupStats> {
        let mut groups: BTreeMap<&str, SetupStats> = BTreeMap::new();

        for trade in trades {
            let setup = trade.setup_label();
            let stats = groups.entry(setup).or_insert_with(|| SetupStats {
                setup: setup.to_string(),
                trades: 0,
                wins: 0,
                losses: 0,
                pnl: Decimal::ZERO,
                win_total: Decimal::ZERO,
                loss_total: Decimal::ZERO,
                win_rate: Decimal::ZERO,
                avg_win: Decimal::ZERO,
                avg_loss: Decimal::ZERO,
            });

            let pnl = trade.realized_pnl();
            stats.trades += 1;
            stats.pnl = stats.pnl.saturating_add(pnl);
            if pnl > Decimal::ZERO {
                stats.wins += 1;
                stats.win_total = stats.win_total.saturating_add(pnl);
            } else if pnl < Decimal::ZERO {
                stats.losses += 1;
                stats.loss_total = stats.loss_total.saturating_add(pnl.abs());
            }
        }

        let mut result: Vec<SetupStats> = groups
            .into_values()
            .map(|mut stats| {
                stats.win_rate = percentage(stats.wins, stats.trades);
                stats.avg_win = ratio(stats.win_total, stats.wins);
                stats.avg_loss = ratio(stats.loss_total, stats.losses);
                stats
            })
            .collect();

        result.sort_by(|a, b| b.pnl.cmp(&a.pnl));
        result
    }

    /// Plan-adherence rate over all trades, and what the violations cost.
    pub fn compliance_stats(&self, trades: &[TradeRecord]) -> ComplianceStats {
        if trades.is_empty() {
            return ComplianceStats::default();
        }

        let followed = trades
            .iter()
            .filter(|t| t.followed_plan.as_ref().is_some_and(|p| p.is_followed()))
            .count();
        let violation_cost = total(
            trades
                .iter()
                .filter(|t| t.followed_plan.as_ref().is_some_and(|p| p.is_violated()))
                .map(TradeRecord::realized_pnl),
        );

        ComplianceStats {
            followed_rate: percentage(followed, trades.len()),
            violation_cost,
        }
    }
}

/// Pairs each dated trade with its parsed timestamp, sorted chronologically.
fn dated_trades(trades: &[TradeRecord]) -> Vec<(DateTime<FixedOffset>, &TradeRecord)> {
    let mut dated: Vec<_> = trades
        .iter()
        .filter_map(|trade| trade.timestamp().map(|ts| (ts, trade)))
        .collect();
    dated.sort_by_key(|(ts, _)| *ts);
    dated
}

/// Sums P&L and counts trades per calendar key.
///
/// The key is formatted in the timestamp's own offset, i.e. the calendar the
/// trade was written in. The host timezone never enters into it.
fn bucket_by(trades: &[TradeRecord], format: &str) -> BTreeMap<String, (Decimal, usize)> {
    let mut buckets: BTreeMap<String, (Decimal, usize)> = BTreeMap::new();
    for trade in trades {
        let Some(ts) = trade.timestamp() else {
            continue;
        };
        let bucket = buckets.entry(ts.format(format).to_string()).or_insert((Decimal::ZERO, 0));
        bucket.0 = bucket.0.saturating_add(trade.realized_pnl());
        bucket.1 += 1;
    }
    tracing::trace!(buckets = buckets.len(), format, "Aggregated trades into calendar buckets.");
    buckets
}

fn percentage(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole)
}

fn ratio(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    total / Decimal::from(count)
}

/// Sums P&L values, pinning at `Decimal::MAX`/`MIN` instead of overflowing.
fn total(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}

fn mean(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    let (sum, count) = values
        .into_iter()
        .fold((Decimal::ZERO, 0usize), |(sum, count), value| (sum.saturating_add(value), count + 1));
    ratio(sum, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::PlanAdherence;
    use rust_decimal_macros::dec;

    fn trade(id: &str, date: Option<&str>, pnl: Decimal) -> TradeRecord {
        let mut trade = TradeRecord::new(id);
        trade.date = date.map(str::to_string);
        trade.pnl = Some(pnl);
        trade
    }

    fn sample_journal() -> Vec<TradeRecord> {
        vec![
            trade("c", Some("2024-01-03T10:00:00Z"), dec!(-150)),
            trade("a", Some("2024-01-01T10:00:00Z"), dec!(100)),
            trade("x", None, dec!(40)),
            trade("b", Some("2024-01-02T10:00:00Z"), dec!(-50)),
            trade("d", Some("2024-01-04T10:00:00Z"), dec!(300)),
        ]
    }

    #[test]
    fn normalize_drops_undated_and_sorts_without_touching_input() {
        let engine = AnalyticsEngine::new();
        let journal = sample_journal();
        let ordered: Vec<&str> = engine.normalize_trades(&journal).iter().map(|t| t.id.as_str()).collect();

        assert_eq!(ordered, vec!["a", "b", "c", "d"]);
        assert_eq!(journal[0].id, "c");
    }

    #[test]
    fn normalize_orders_by_instant_across_offsets() {
        let engine = AnalyticsEngine::new();
        let journal = vec![
            trade("late", Some("2024-01-01T10:00:00Z"), dec!(1)),
            trade("early", Some("2024-01-01T06:00:00-03:00"), dec!(1)),
        ];
        let ordered: Vec<&str> = engine.normalize_trades(&journal).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ordered, vec!["early", "late"]);
    }

    #[test]
    fn equity_curve_accumulates_in_date_order() {
        let engine = AnalyticsEngine::new();
        let curve = engine.equity_curve(&sample_journal());

        let values: Vec<Decimal> = curve.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![dec!(100), dec!(50), dec!(-100), dec!(200)]);
        assert_eq!(curve[0].date, "2024-01-01T10:00:00Z");
    }

    #[test]
    fn equity_curve_ends_at_total_dated_pnl() {
        let engine = AnalyticsEngine::new();
        let journal: Vec<TradeRecord> = (0..30)
            .map(|i| {
                let pnl = Decimal::from((i * 37) % 23) - dec!(11);
                trade(&i.to_string(), Some(&format!("2024-02-{:02}T12:00:00Z", (i % 28) + 1)), pnl)
            })
            .collect();

        let curve = engine.equity_curve(&journal);
        let total: Decimal = journal.iter().map(TradeRecord::realized_pnl).sum();
        assert_eq!(curve.len(), journal.len());
        assert_eq!(curve.last().unwrap().value, total);
    }

    #[test]
    fn drawdown_tracks_peak_from_zero() {
        let engine = AnalyticsEngine::new();
        let report = engine.drawdown_series(&sample_journal());

        let drawdowns: Vec<Decimal> = report.series.iter().map(|p| p.drawdown).collect();
        assert_eq!(drawdowns, vec![dec!(0), dec!(-50), dec!(-200), dec!(0)]);
        assert_eq!(report.max_drawdown, dec!(-200));
        assert_eq!(report.current_drawdown, Decimal::ZERO);
    }

    #[test]
    fn drawdown_of_a_losing_start_counts_from_zero() {
        let engine = AnalyticsEngine::new();
        let report = engine.drawdown_series(&[trade("a", Some("2024-01-01"), dec!(-25))]);
        assert_eq!(report.max_drawdown, dec!(-25));
        assert_eq!(report.current_drawdown, dec!(-25));
        assert!(report.series.iter().all(|p| p.drawdown <= Decimal::ZERO));
    }

    #[test]
    fn empty_journal_is_all_zeroes() {
        let engine = AnalyticsEngine::new();
        let report = engine.drawdown_series(&[]);
        assert!(report.series.is_empty());
        assert_eq!(report.max_drawdown, Decimal::ZERO);
        assert_eq!(report.current_drawdown, Decimal::ZERO);

        assert_eq!(engine.win_rate(&[]), Decimal::ZERO);
        assert_eq!(engine.expectancy(&[]), Decimal::ZERO);
        assert_eq!(engine.profit_factor(&[]), ProfitFactor::Undefined);
        assert_eq!(engine.expectancy_per_r(&[]), None);
        assert_eq!(engine.compliance_stats(&[]), ComplianceStats::default());
        assert_eq!(engine.summarize(&[]), PerformanceReport::new());
    }

    #[test]
    fn win_rate_counts_breakeven_in_denominator() {
        let engine = AnalyticsEngine::new();
        let journal = vec![
            trade("a", None, dec!(10)),
            trade("b", None, dec!(0)),
            trade("c", None, dec!(-5)),
            TradeRecord::new("d"),
        ];
        assert_eq!(engine.win_rate(&journal), dec!(25));
    }

    #[test]
    fn averages_and_profit_factor() {
        let engine = AnalyticsEngine::new();
        let journal = vec![
            trade("a", None, dec!(100)),
            trade("b", None, dec!(-50)),
        ];

        assert_eq!(engine.average_win(&journal), dec!(100));
        assert_eq!(engine.average_loss(&journal), dec!(50));
        assert_eq!(engine.profit_factor(&journal), ProfitFactor::Ratio(dec!(2)));
        assert_eq!(engine.expectancy(&journal), dec!(25));
    }

    #[test]
    fn profit_factor_without_losses() {
        let engine = AnalyticsEngine::new();
        assert_eq!(engine.profit_factor(&[trade("a", None, dec!(100))]), ProfitFactor::NoLosses);
        assert_eq!(engine.profit_factor(&[trade("a", None, dec!(0))]), ProfitFactor::Undefined);
    }

    #[test]
    fn expectancy_per_r_uses_point_values() {
        let engine = AnalyticsEngine::new();
        let mut es = trade("es", None, dec!(1000));
        es.symbol = Some("ES".to_string());
        es.entry = Some(dec!(100));
        es.stop_loss = Some(dec!(90));
        es.quantity = Some(dec!(2));

        assert_eq!(engine.dollar_risk(&es), Some(dec!(1000)));
        assert_eq!(engine.expectancy_per_r(&[es.clone()]), Some(dec!(1)));

        let mut unknown = trade("u", None, dec!(-5));
        unknown.symbol = Some("XYZ".to_string());
        unknown.entry = Some(dec!(20));
        unknown.stop_loss = Some(dec!(25));
        unknown.quantity = Some(dec!(1));

        // (1 + -1) / 2
        assert_eq!(engine.expectancy_per_r(&[es, unknown]), Some(dec!(0)));
    }

    #[test]
    fn expectancy_per_r_is_unavailable_without_risk_data() {
        let engine = AnalyticsEngine::new();
        let mut no_stop = trade("a", None, dec!(100));
        no_stop.entry = Some(dec!(100));
        no_stop.quantity = Some(dec!(1));

        let mut flat_stop = no_stop.clone();
        flat_stop.stop_loss = Some(dec!(100));

        let mut zero_quantity = flat_stop.clone();
        zero_quantity.stop_loss = Some(dec!(95));
        zero_quantity.quantity = Some(dec!(0));

        assert_eq!(engine.expectancy_per_r(&[no_stop, flat_stop, zero_quantity]), None);
    }

    #[test]
    fn custom_point_values_feed_risk() {
        let table = PointValueTable::standard().with_overrides([("CL", dec!(1000))]);
        let engine = AnalyticsEngine::with_point_values(table);

        let mut cl = trade("cl", None, dec!(500));
        cl.symbol = Some("CL".to_string());
        cl.entry = Some(dec!(75.50));
        cl.stop_loss = Some(dec!(75.25));
        cl.quantity = Some(dec!(1));

        assert_eq!(engine.dollar_risk(&cl), Some(dec!(250)));
        assert_eq!(engine.expectancy_per_r(&[cl]), Some(dec!(2)));
    }

    #[test]
    fn daily_buckets_use_the_literal_calendar_day() {
        let engine = AnalyticsEngine::new();
        let journal = vec![
            trade("b", Some("2024-01-02T23:30:00-05:00"), dec!(5)),
            trade("a1", Some("2024-01-01T10:00:00Z"), dec!(100)),
            trade("a2", Some("2024-01-01T15:00:00Z"), dec!(-40)),
            trade("x", None, dec!(1000)),
        ];

        let daily = engine.daily_aggregation(&journal);
        assert_eq!(
            daily,
            vec![
                DailyPnl { date: "2024-01-01".to_string(), pnl: dec!(60), count: 2 },
                DailyPnl { date: "2024-01-02".to_string(), pnl: dec!(5), count: 1 },
            ]
        );
    }

    #[test]
    fn monthly_buckets_share_the_daily_calendar() {
        let engine = AnalyticsEngine::new();
        let journal = vec![
            trade("feb", Some("2024-02-01T01:00:00+02:00"), dec!(10)),
            trade("jan-late", Some("2024-01-31T22:00:00-08:00"), dec!(-20)),
            trade("jan", Some("2024-01-15"), dec!(50)),
            trade("dec", Some("2023-12-29T09:30:00"), dec!(7)),
        ];

        let monthly = engine.monthly_aggregation(&journal);
        assert_eq!(
            monthly,
            vec![
                MonthlyPnl { month: "2023-12".to_string(), pnl: dec!(7), count: 1 },
                MonthlyPnl { month: "2024-01".to_string(), pnl: dec!(30), count: 2 },
                MonthlyPnl { month: "2024-02".to_string(), pnl: dec!(10), count: 1 },
            ]
        );
    }

    #[test]
    fn setup_performance_groups_and_sorts_by_pnl() {
        let engine = AnalyticsEngine::new();
        let mut journal = vec![
            trade("1", None, dec!(100)),
            trade("2", None, dec!(-40)),
            trade("3", None, dec!(70)),
            trade("4", None, dec!(-10)),
            trade("5", None, dec!(0)),
        ];
        journal[0].setup = Some("ORB".to_string());
        journal[1].setup = Some("ORB".to_string());
        journal[2].setup = Some("VWAP".to_string());
        journal[3].setup = Some(String::new());

        let stats = engine.setup_performance(&journal);
        let order: Vec<&str> = stats.iter().map(|s| s.setup.as_str()).collect();
        assert_eq!(order, vec!["VWAP", "ORB", "Unknown"]);

        let orb = &stats[1];
        assert_eq!((orb.trades, orb.wins, orb.losses), (2, 1, 1));
        assert_eq!(orb.pnl, dec!(60));
        assert_eq!(orb.win_rate, dec!(50));
        assert_eq!(orb.avg_win, dec!(100));
        assert_eq!(orb.avg_loss, dec!(40));

        let unknown = &stats[2];
        assert_eq!((unknown.trades, unknown.wins, unknown.losses), (2, 0, 1));
        assert_eq!(unknown.avg_win, Decimal::ZERO);
    }

    #[test]
    fn setup_ties_are_ordered_by_name() {
        let engine = AnalyticsEngine::new();
        let mut journal = vec![trade("1", None, dec!(10)), trade("2", None, dec!(10))];
        journal[0].setup = Some("Zeta".to_string());
        journal[1].setup = Some("Alpha".to_string());

        let order: Vec<String> = engine.setup_performance(&journal).into_iter().map(|s| s.setup).collect();
        assert_eq!(order, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn compliance_rate_uses_every_trade() {
        let engine = AnalyticsEngine::new();
        let mut journal = vec![
            trade("1", None, dec!(50)),
            trade("2", None, dec!(-80)),
            trade("3", None, dec!(-20)),
            trade("4", None, dec!(30)),
        ];
        journal[0].followed_plan = Some(PlanAdherence::Yes);
        journal[1].followed_plan = Some(PlanAdherence::No);
        journal[2].followed_plan = Some(PlanAdherence::No);
        journal[3].followed_plan = Some(PlanAdherence::Other("maybe".to_string()));

        let stats = engine.compliance_stats(&journal);
        assert_eq!(stats.followed_rate, dec!(25));
        assert_eq!(stats.violation_cost, dec!(-100));
    }

    #[test]
    fn unreadable_dates_leave_the_series_but_not_the_statistics() {
        let engine = AnalyticsEngine::new();
        let mut journal = vec![
            trade("dated", Some("2024-03-04T15:00:00Z"), dec!(-20)),
            trade("vague", Some("yesterday"), dec!(80)),
        ];
        journal[0].setup = Some("ORB".to_string());
        journal[0].followed_plan = Some(PlanAdherence::No);
        journal[1].setup = Some("Gap".to_string());
        journal[1].followed_plan = Some(PlanAdherence::Yes);

        let curve = engine.equity_curve(&journal);
        assert_eq!(curve.len(), 1);
        assert_eq!(curve[0].value, dec!(-20));
        assert_eq!(engine.daily_aggregation(&journal).len(), 1);
        let monthly = engine.monthly_aggregation(&journal);
        assert_eq!(monthly.len(), 1);
        assert_eq!((monthly[0].pnl, monthly[0].count), (dec!(-20), 1));

        assert_eq!(engine.win_rate(&journal), dec!(50));
        let setups: Vec<String> = engine.setup_performance(&journal).into_iter().map(|s| s.setup).collect();
        assert_eq!(setups, vec!["Gap", "ORB"]);
        let compliance = engine.compliance_stats(&journal);
        assert_eq!(compliance.followed_rate, dec!(50));
        assert_eq!(compliance.violation_cost, dec!(-20));
    }

    #[test]
    fn overflowing_r_multiple_is_skipped() {
        let engine = AnalyticsEngine::new();
        let mut huge = trade("huge", None, Decimal::from_i128_with_scale(1_000_000_000_000_000_000_000_000, 0));
        huge.symbol = Some("XYZ".to_string());
        huge.entry = Some(dec!(1.0000000001));
        huge.stop_loss = Some(dec!(1));
        huge.quantity = Some(dec!(1));

        assert_eq!(engine.dollar_risk(&huge), Some(dec!(0.0000000001)));
        assert_eq!(engine.expectancy_per_r(&[huge.clone()]), None);

        let mut normal = trade("normal", None, dec!(200));
        normal.symbol = Some("ES".to_string());
        normal.entry = Some(dec!(100));
        normal.stop_loss = Some(dec!(98));
        normal.quantity = Some(dec!(1));
        assert_eq!(engine.expectancy_per_r(&[huge, normal]), Some(dec!(2)));
    }

    #[test]
    fn overflowing_risk_is_unavailable() {
        let engine = AnalyticsEngine::new();
        let mut wide = trade("wide", None, dec!(10));
        wide.symbol = Some("ES".to_string());
        wide.entry = Some(Decimal::MAX);
        wide.stop_loss = Some(dec!(1));
        wide.quantity = Some(dec!(3));
        assert_eq!(engine.dollar_risk(&wide), None);

        wide.stop_loss = Some(Decimal::MIN);
        assert_eq!(engine.dollar_risk(&wide), None);
    }

    #[test]
    fn extreme_pnl_saturates_instead_of_panicking() {
        let engine = AnalyticsEngine::new();
        let journal = vec![
            trade("a", Some("2024-01-01"), Decimal::MAX),
            trade("b", Some("2024-01-02"), Decimal::MAX),
            trade("c", Some("2024-01-03"), dec!(-1)),
        ];

        let report = engine.summarize(&journal);
        assert_eq!(report.net_pnl, Decimal::MAX - dec!(1));
        assert_eq!(report.profit_factor, ProfitFactor::Ratio(Decimal::MAX));
        assert_eq!(engine.equity_curve(&journal)[1].value, Decimal::MAX);
        assert_eq!(engine.daily_aggregation(&journal).len(), 3);
        assert_eq!(engine.setup_performance(&journal)[0].pnl, Decimal::MAX - dec!(1));

        let lopsided = vec![trade("w", None, Decimal::MAX), trade("l", None, dec!(-0.5))];
        assert_eq!(engine.profit_factor(&lopsided), ProfitFactor::Ratio(Decimal::MAX));
    }

    #[test]
    fn summarize_collects_headline_numbers() {
        let engine = AnalyticsEngine::new();
        let report = engine.summarize(&sample_journal());

        assert_eq!(report.total_trades, 5);
        assert_eq!(report.winning_trades, 3);
        assert_eq!(report.losing_trades, 2);
        assert_eq!(report.net_pnl, dec!(240));
        assert_eq!(report.win_rate_pct, dec!(60));
        assert_eq!(report.profit_factor, ProfitFactor::Ratio(dec!(2.2)));
        assert_eq!(report.max_drawdown, dec!(-200));
        assert_eq!(report.expectancy_per_r, None);
    }
}
