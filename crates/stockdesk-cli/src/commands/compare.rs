use stockdesk_core::{validate_tickers, StockDataProvider};

use crate::cli::{CompareArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn run(
    args: &CompareArgs,
    provider: &dyn StockDataProvider,
    format: OutputFormat,
) -> Result<(), CliError> {
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
    if quotes.is_empty() {
        eprintln!("nothing to compare");
    }

    print!("{}", output::render_compare(&quotes, format));
    Ok(())
}
