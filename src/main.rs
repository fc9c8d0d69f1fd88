use analytics::{AnalyticsEngine, PerformanceReport, PointValueTable, build_equity_curve_svg};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::Config;
use core_types::TradeRecord;
use export::{EncryptedPayload, ExportOptions, TradeExporter};
use rust_decimal::Decimal;
use std::path::PathBuf;
use storage::{JsonFileStore, TradeStore};

mod logging;

/// The main entry point for the trade journal.
#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; TRADELOG_* variables may come from the shell.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = configuration::load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let _log_guard = logging::init(&config.logging)?;

    let journal_path = cli.journal.unwrap_or_else(|| config.journal.path.clone());
    tracing::debug!(journal = %journal_path.display(), "Opening journal.");
    let store = JsonFileStore::new(journal_path);

    match cli.command {
        Commands::Report(args) => handle_report(args, &config, &store).await,
        Commands::Chart(args) => handle_chart(args, &config, &store).await,
        Commands::Export(args) => handle_export(args, &config, &store).await,
        Commands::Import(args) => handle_import(args, &config, &store).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A personal trading journal: performance reports and encrypted backups.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Journal file to use instead of `journal.path` from the configuration.
    #[arg(long, global = true)]
    journal: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print performance statistics for the journal.
    Report(ReportArgs),
    /// Render the equity curve as an SVG file.
    Chart(ChartArgs),
    /// Write an encrypted backup of the journal's trades.
    Export(ExportArgs),
    /// Restore trades from an encrypted backup.
    Import(ImportArgs),
}

#[derive(Parser)]
struct ReportArgs {
    /// Only include trades from this account.
    #[arg(long)]
    account: Option<String>,

    /// Also print the per-day breakdown.
    #[arg(long)]
    daily: bool,
}

#[derive(Parser)]
struct ChartArgs {
    /// Where to write the SVG.
    #[arg(long, short)]
    output: PathBuf,

    /// Only include trades from this account.
    #[arg(long)]
    account: Option<String>,
}

#[derive(Parser)]
struct ExportArgs {
    /// Where to write the encrypted backup.
    #[arg(long, short)]
    output: PathBuf,

    /// Only export trades from this account.
    #[arg(long)]
    account: Option<String>,

    #[arg(long, env = "TRADELOG_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Parser)]
struct ImportArgs {
    /// The encrypted backup to read.
    #[arg(long, short)]
    input: PathBuf,

    /// Replace every existing trade with the imported ones.
    #[arg(long)]
    replace: bool,

    #[arg(long, env = "TRADELOG_PASSWORD", hide_env_values = true)]
    password: String,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_report(args: ReportArgs, config: &Config, store: &JsonFileStore) -> Result<()> {
    let trades = load_trades(store, args.account.as_deref()).await?;
    let engine = build_engine(config);

    let report = engine.summarize(&trades);
    println!("{}", summary_table(&report));

    let setups = engine.setup_performance(&trades);
    if !setups.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Setup", "Trades", "Win Rate %", "Net P&L", "Avg Win", "Avg Loss"]);
        for stats in setups {
            table.add_row(vec![
                stats.setup,
                stats.trades.to_string(),
                format!("{:.1}", stats.win_rate),
                money(stats.pnl),
                money(stats.avg_win),
                money(stats.avg_loss),
            ]);
        }
        println!("\n{table}");
    }

    let months = engine.monthly_aggregation(&trades);
    if !months.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Month", "Trades", "Net P&L"]);
        for month in months {
            table.add_row(vec![month.month, month.count.to_string(), money(month.pnl)]);
        }
        println!("\n{table}");
    }

    if args.daily {
        let mut table = Table::new();
        table.set_header(vec!["Day", "Trades", "Net P&L"]);
        for day in engine.daily_aggregation(&trades) {
            table.add_row(vec![day.date, day.count.to_string(), money(day.pnl)]);
        }
        println!("\n{table}");
    }

    Ok(())
}

async fn handle_chart(args: ChartArgs, config: &Config, store: &JsonFileStore) -> Result<()> {
    let trades = load_trades(store, args.account.as_deref()).await?;
    let curve = build_engine(config).equity_curve(&trades);
    let svg = build_equity_curve_svg(&curve, config.chart.width, config.chart.height);

    tokio::fs::write(&args.output, svg)
        .await
        .with_context(|| format!("Failed to write chart to {}", args.output.display()))?;
    println!("Wrote equity curve ({} points) to {}", curve.len(), args.output.display());
    Ok(())
}

async fn handle_export(args: ExportArgs, config: &Config, store: &JsonFileStore) -> Result<()> {
    let trades = load_trades(store, args.account.as_deref()).await?;
    let exporter = build_exporter(config)?;

    let payload = exporter.export(&trades, &args.password).await?;
    tokio::fs::write(&args.output, payload.to_json()?)
        .await
        .with_context(|| format!("Failed to write backup to {}", args.output.display()))?;

    store
        .save_setting("lastExport", serde_json::json!(Utc::now().to_rfc3339()))
        .await?;
    println!("Exported {} trades to {}", trades.len(), args.output.display());
    Ok(())
}

async fn handle_import(args: ImportArgs, config: &Config, store: &JsonFileStore) -> Result<()> {
    let raw = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("Failed to read backup {}", args.input.display()))?;
    let payload = EncryptedPayload::from_json(&raw)?;

    let conversion = build_exporter(config)?.import(&payload, &args.password).await?;
    for skipped in &conversion.skipped {
        eprintln!(
            "Skipped image '{}' on trade {}: {}",
            skipped.name, skipped.trade_id, skipped.reason
        );
    }

    let imported = conversion.trades.len();
    if args.replace {
        store.replace_trades(conversion.trades).await?;
    } else {
        store.save_trades_bulk(conversion.trades).await?;
    }
    println!("Imported {imported} trades from {}", args.input.display());
    Ok(())
}

// ==============================================================================
// Helpers
// ==============================================================================

async fn load_trades(store: &JsonFileStore, account: Option<&str>) -> Result<Vec<TradeRecord>> {
    let trades = match account {
        Some(account) => store.get_trades_by_account(account).await?,
        None => store.get_all_trades().await?,
    };
    Ok(trades)
}

fn build_engine(config: &Config) -> AnalyticsEngine {
    let point_values =
        PointValueTable::standard().with_overrides(config.analytics.point_value_overrides());
    AnalyticsEngine::with_point_values(point_values)
}

fn build_exporter(config: &Config) -> Result<TradeExporter> {
    let exporter = TradeExporter::new(ExportOptions {
        kdf_iterations: config.export.kdf_iterations,
        strict_images: config.export.strict_images,
    })?;
    Ok(exporter)
}

fn summary_table(report: &PerformanceReport) -> Table {
    let expectancy_per_r = report
        .expectancy_per_r
        .map(|r| format!("{r:.2}R"))
        .unwrap_or_else(|| "n/a".to_string());

    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Total Trades".to_string(), report.total_trades.to_string()]);
    table.add_row(vec!["Winning / Losing".to_string(), format!("{} / {}", report.winning_trades, report.losing_trades)]);
    table.add_row(vec!["Net P&L".to_string(), money(report.net_pnl)]);
    table.add_row(vec!["Win Rate %".to_string(), format!("{:.1}", report.win_rate_pct)]);
    table.add_row(vec!["Average Win".to_string(), money(report.average_win)]);
    table.add_row(vec!["Average Loss".to_string(), money(report.average_loss)]);
    table.add_row(vec!["Profit Factor".to_string(), report.profit_factor.to_string()]);
    table.add_row(vec!["Expectancy".to_string(), money(report.expectancy)]);
    table.add_row(vec!["Expectancy per R".to_string(), expectancy_per_r]);
    table.add_row(vec!["Max Drawdown".to_string(), money(report.max_drawdown)]);
    table.add_row(vec!["Current Drawdown".to_string(), money(report.current_drawdown)]);
    table.add_row(vec!["Plan Followed %".to_string(), format!("{:.1}", report.compliance.followed_rate)]);
    table.add_row(vec!["Cost of Violations".to_string(), money(report.compliance.violation_cost)]);
    table
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}
