use stockdesk_core::{validate_tickers, StockDataProvider};

use crate::cli::{OutputFormat, WatchlistArgs};
use crate::error::CliError;
use crate::output;
use crate::watchlist;

pub async fn run(
    args: &WatchlistArgs,
    provider: &dyn StockDataProvider,
    format: OutputFormat,
) -> Result<(), CliError> {
    let watchlist = watchlist::load(&args.path)?;
    if let Some(name) = &watchlist.name {
        eprintln!("watchlist: {name}");
    }

    let requested = validate_tickers(&watchlist.tickers)?;
    let mut by_ticker = provider.get_quotes(&watchlist.tickers).await?;

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
