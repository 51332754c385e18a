use stockdesk_core::{validate_tickers, NewsRequest, StockDataProvider};

use crate::cli::{BriefArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Large-cap names covered when no tickers are given.
const DEFAULT_TICKERS: [&str; 5] = ["NVDA", "MSFT", "GOOGL", "META", "AMZN"];

pub async fn run(
    args: &BriefArgs,
    provider: &dyn StockDataProvider,
    format: OutputFormat,
) -> Result<(), CliError> {
    let tickers = brief_tickers(&args.tickers);
    let requested = validate_tickers(&tickers)?;

    let status = provider.get_market_status().await?;
    print!("{}", output::render_status(&status, format));

    let mut by_ticker = provider.get_quotes(&tickers).await?;
    let mut quotes = Vec::with_capacity(requested.len());
    for ticker in &requested {
        match by_ticker.remove(ticker) {
            Some(quote) => quotes.push(quote),
            None => eprintln!("warning: no quote for {ticker}"),
        }
    }
    print!("{}", output::render_quotes(&quotes, format));

    // Headlines for the lead ticker round out the brief.
    if let Some(lead) = requested.first() {
        let request = NewsRequest::new(Some(lead.clone()), args.news_limit)?;
        let articles = provider.get_news(&request).await?;
        print!("{}", output::render_news(&articles, format));
    }

    Ok(())
}

fn brief_tickers(overrides: &[String]) -> Vec<String> {
    if overrides.is_empty() {
        DEFAULT_TICKERS.iter().map(|t| (*t).to_owned()).collect()
    } else {
        overrides.to_vec()
    }
}
