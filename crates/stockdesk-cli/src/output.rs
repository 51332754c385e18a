//! Rendering of domain records as aligned text tables or CSV rows.

use stockdesk_core::{FinancialData, HealthReport, MarketStatus, NewsArticle, Ohlcv, Quote};

use crate::cli::OutputFormat;

/// Column-aligned table builder for text output.
struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new<T: Into<String>>(header: Vec<T>) -> Self {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn render(&self) -> String {
        let mut widths: Vec<usize> = self.header.iter().map(|cell| cell.len()).collect();
        for row in &self.rows {
            for (index, cell) in row.iter().enumerate() {
                if cell.len() > widths[index] {
                    widths[index] = cell.len();
                }
            }
        }

        let mut out = String::new();
        render_row(&mut out, &self.header, &widths);
        render_row(
            &mut out,
            &widths.iter().map(|width| "-".repeat(*width)).collect::<Vec<_>>(),
            &widths,
        );
        for row in &self.rows {
            render_row(&mut out, row, &widths);
        }
        out
    }

    fn render_csv(&self) -> String {
        let mut out = String::new();
        out.push_str(
            &self
                .header
                .iter()
                .map(|cell| csv_escape(cell))
                .collect::<Vec<_>>()
                .join(","),
        );
        out.push('\n');
        for row in &self.rows {
            out.push_str(
                &row.iter()
                    .map(|cell| csv_escape(cell))
                    .collect::<Vec<_>>()
                    .join(","),
            );
            out.push('\n');
        }
        out
    }

    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => self.render(),
            OutputFormat::Csv => self.render_csv(),
        }
    }
}

fn render_row(out: &mut String, row: &[String], widths: &[usize]) {
    let line = row
        .iter()
        .enumerate()
        .map(|(index, cell)| format!("{cell:<width$}", width = widths[index]))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

fn csv_escape(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_owned()
    }
}

fn opt_price(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

fn opt_u64(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn opt_money(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.0}")).unwrap_or_default()
}

pub fn render_quotes(quotes: &[Quote], format: OutputFormat) -> String {
    let mut table = Table::new(vec![
        "ticker", "price", "change", "change_%", "volume", "prev_close", "time", "provider",
    ]);
    for quote in quotes {
        table.push(vec![
            quote.ticker.to_string(),
            format!("{:.2}", quote.price),
            opt_price(quote.change),
            quote
                .change_percent
                .map(|v| format!("{v:.2}"))
                .unwrap_or_default(),
            opt_u64(quote.volume),
            opt_price(quote.previous_close),
            quote.timestamp.to_string(),
            quote.provider.to_string(),
        ]);
    }
    table.format(format)
}

/// Quotes pivoted into one column per ticker, one row per metric.
pub fn render_compare(quotes: &[Quote], format: OutputFormat) -> String {
    let mut header = vec![String::from("metric")];
    header.extend(quotes.iter().map(|quote| quote.ticker.to_string()));
    let mut table = Table::new(header);

    table.push(metric_row("price", quotes, |quote| {
        format!("{:.2}", quote.price)
    }));
    table.push(metric_row("change", quotes, |quote| opt_price(quote.change)));
    table.push(metric_row("change_%", quotes, |quote| {
        quote
            .change_percent
            .map(|v| format!("{v:.2}"))
            .unwrap_or_default()
    }));
    table.push(metric_row("volume", quotes, |quote| opt_u64(quote.volume)));
    table.push(metric_row("provider", quotes, |quote| {
        quote.provider.to_string()
    }));
    table.format(format)
}

fn metric_row(metric: &str, quotes: &[Quote], cell: impl Fn(&Quote) -> String) -> Vec<String> {
    let mut row = vec![metric.to_owned()];
    row.extend(quotes.iter().map(cell));
    row
}

pub fn render_bars(bars: &[Ohlcv], format: OutputFormat) -> String {
    let mut table = Table::new(vec![
        "time", "open", "high", "low", "close", "volume", "ticker", "provider",
    ]);
    for bar in bars {
        table.push(vec![
            bar.timestamp.to_string(),
            format!("{:.2}", bar.open),
            format!("{:.2}", bar.high),
            format!("{:.2}", bar.low),
            format!("{:.2}", bar.close),
            bar.volume.to_string(),
            bar.ticker.to_string(),
            bar.provider.to_string(),
        ]);
    }
    table.format(format)
}

pub fn render_news(articles: &[NewsArticle], format: OutputFormat) -> String {
    let mut table = Table::new(vec!["published", "title", "source", "url", "provider"]);
    for article in articles {
        table.push(vec![
            article.published_at.to_string(),
            article.title.clone(),
            article.source.clone().unwrap_or_default(),
            article.url.clone(),
            article.provider.to_string(),
        ]);
    }
    table.format(format)
}

pub fn render_financials(periods: &[FinancialData], format: OutputFormat) -> String {
    let mut table = Table::new(vec![
        "period",
        "fiscal",
        "revenue",
        "net_income",
        "eps",
        "total_assets",
        "op_cash_flow",
        "provider",
    ]);
    for period in periods {
        table.push(vec![
            period.period_end.to_string(),
            format!("{} {}", period.fiscal_year, period.fiscal_period),
            opt_money(period.revenue),
            opt_money(period.net_income),
            period
                .earnings_per_share
                .map(|v| format!("{v:.2}"))
                .unwrap_or_default(),
            opt_money(period.total_assets),
            opt_money(period.operating_cash_flow),
            period.provider.to_string(),
        ]);
    }
    table.format(format)
}

pub fn render_status(status: &MarketStatus, format: OutputFormat) -> String {
    let mut table = Table::new(vec!["market", "server_time", "provider"]);
    table.push(vec![
        if status.is_open { "open" } else { "closed" }.to_owned(),
        status
            .server_time
            .map(|time| time.to_string())
            .unwrap_or_default(),
        status.provider.to_string(),
    ]);
    table.format(format)
}

pub fn render_health(report: &HealthReport, format: OutputFormat) -> String {
    let mut table = Table::new(vec!["check", "ok", "latency_ms", "error"]);
    for (name, check) in [
        ("quote", &report.quote_check),
        ("market_status", &report.market_status_check),
    ] {
        table.push(vec![
            name.to_owned(),
            check.ok.to_string(),
            check.latency_ms.to_string(),
            check.error.clone().unwrap_or_default(),
        ]);
    }

    let summary = format!("provider {} is {:?}\n", report.provider, report.state);
    match format {
        OutputFormat::Text => format!("{summary}{}", table.render()),
        OutputFormat::Csv => table.render_csv(),
    }
}
