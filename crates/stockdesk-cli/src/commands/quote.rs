use stockdesk_core::{validate_tickers, StockDataProvider};

use crate::cli::{OutputFormat, QuoteArgs};
use crate::error::CliError;
use crate::output;

pub async fn run(
    args: &QuoteArgs,
    provider: &dyn StockDataProvider,
    format: OutputFormat,
) -> Result<(), CliError> {
    if let [ticker] = args.tickers.as_slice() {
        let quote = provider.get_quote(ticker).await?;
        print!("{}", output::render_quotes(&[quote], format));
        return Ok(());
    }

    let requested = validate_tickers(&args.tickers)?;
    let mut by_ticker = provider.get_quotes(&args.tickers).await?;

    // Preserve the input order; report omissions on stderr.
    let mut quotes = Vec::with_capacity(requested.len());
    for ticker in requested {
        match by_ticker.remove(&ticker) {
            Some(quote) => quotes.push(quote),
            None => eprintln!("warning: no quote for {ticker}"),
        }
    }

    print!("{}", output::render_quotes(&quotes, format));
    Ok(())
}
