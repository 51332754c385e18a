use stockdesk_core::{
    validate_ticker, HistoricalDataRequest, StockDataProvider, Timeframe, UtcDateTime,
};

use crate::cli::{HistoryArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn run(
    args: &HistoryArgs,
    provider: &dyn StockDataProvider,
    format: OutputFormat,
) -> Result<(), CliError> {
    let ticker = validate_ticker(&args.ticker)?;
    let timeframe: Timeframe = args.timeframe.parse()?;
    let request = HistoricalDataRequest::new(
        ticker,
        parse_datetime(&args.start)?,
        parse_datetime(&args.end)?,
        timeframe,
    )?;

    let bars = provider.get_historical(&request).await?;
    if bars.is_empty() {
        eprintln!("no bars for {} in the requested range", request.ticker);
    }
    print!("{}", output::render_bars(&bars, format));
    Ok(())
}

/// Accept a bare date as shorthand for midnight UTC.
fn parse_datetime(raw: &str) -> Result<UtcDateTime, CliError> {
    let trimmed = raw.trim();
    if trimmed.len() == 10 {
        return Ok(UtcDateTime::parse(&format!("{trimmed}T00:00:00Z"))?);
    }
    Ok(UtcDateTime::parse(trimmed)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_date_means_midnight_utc() {
        let parsed = parse_datetime("2024-06-03").expect("date");
        assert_eq!(parsed.to_string(), "2024-06-03T00:00:00Z");
    }

    #[test]
    fn rfc3339_passes_through() {
        let parsed = parse_datetime("2024-06-03T15:30:00Z").expect("datetime");
        assert_eq!(parsed.to_string(), "2024-06-03T15:30:00Z");
    }
}
