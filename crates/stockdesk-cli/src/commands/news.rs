use stockdesk_core::{validate_ticker, NewsRequest, StockDataProvider};

use crate::cli::{NewsArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn run(
    args: &NewsArgs,
    provider: &dyn StockDataProvider,
    format: OutputFormat,
) -> Result<(), CliError> {
    let ticker = args
        .ticker
        .as_deref()
        .map(validate_ticker)
        .transpose()?;
    let request = NewsRequest::new(ticker, args.limit)?;

    let articles = provider.get_news(&request).await?;
    if articles.is_empty() {
        eprintln!("no articles found");
    }
    print!("{}", output::render_news(&articles, format));
    Ok(())
}
