//! CLI argument definitions for stockdesk.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Stock market research from the terminal.
///
/// Fetch quotes, historical bars, news, financial statements and market
/// status from multiple upstream providers behind one interface.
#[derive(Debug, Parser)]
#[command(
    name = "stockdesk",
    author,
    version,
    about = "Pluggable stock market data CLI"
)]
pub struct Cli {
    /// Provider strategy (auto, polygon, yfinance, hybrid).
    ///
    /// Overrides the STOCKDESK_PROVIDER environment variable.
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text tables for terminal display.
    Text,
    /// Comma-separated rows with a header line.
    Csv,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the latest quote(s) for one or more tickers.
    ///
    /// One ticker fails loudly; several tickers are best-effort and
    /// failed tickers are omitted from the output.
    Quote(QuoteArgs),

    /// Compare several tickers side by side, one column each.
    Compare(CompareArgs),

    /// Fetch historical OHLCV bars for a date range.
    History(HistoryArgs),

    /// Fetch recent news, for one ticker or market-wide.
    News(NewsArgs),

    /// Fetch quarterly financial statements.
    Financials(FinancialsArgs),

    /// Show whether the market is currently open.
    Status,

    /// Probe the selected provider and report its health.
    Health,

    /// Fetch quotes for every ticker in a watchlist file.
    Watchlist(WatchlistArgs),

    /// Morning brief: market status, major-stock quotes and headlines.
    Brief(BriefArgs),
}

/// Arguments for the `quote` command.
#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// One or more tickers (e.g. AAPL MSFT GOOGL).
    #[arg(required = true, num_args = 1..)]
    pub tickers: Vec<String>,
}

/// Arguments for the `compare` command.
#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Two or more tickers to compare.
    #[arg(required = true, num_args = 2..)]
    pub tickers: Vec<String>,
}

/// Arguments for the `history` command.
#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Ticker to fetch bars for.
    pub ticker: String,

    /// Range start, RFC3339 or YYYY-MM-DD.
    #[arg(long)]
    pub start: String,

    /// Range end, RFC3339 or YYYY-MM-DD.
    #[arg(long)]
    pub end: String,

    /// Bar interval (1m, 5m, 15m, 30m, 1h, 1d, 1wk, 1mo).
    #[arg(long, default_value = "1d")]
    pub timeframe: String,
}

/// Arguments for the `news` command.
#[derive(Debug, Args)]
pub struct NewsArgs {
    /// Ticker to fetch news for; omit for market-wide headlines.
    pub ticker: Option<String>,

    /// Maximum number of articles (1-100).
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

/// Arguments for the `financials` command.
#[derive(Debug, Args)]
pub struct FinancialsArgs {
    /// Ticker to fetch statements for.
    pub ticker: String,

    /// Number of reporting periods (1-20).
    #[arg(long, default_value_t = 4)]
    pub limit: usize,
}

/// Arguments for the `watchlist` command.
#[derive(Debug, Args)]
pub struct WatchlistArgs {
    /// Path to a JSON watchlist file.
    pub path: std::path::PathBuf,
}

/// Arguments for the `brief` command.
#[derive(Debug, Args)]
pub struct BriefArgs {
    /// Tickers to cover; defaults to a handful of large-cap names.
    #[arg(num_args = 0..)]
    pub tickers: Vec<String>,

    /// Number of headlines to include.
    #[arg(long, default_value_t = 3)]
    pub news_limit: usize,
}
