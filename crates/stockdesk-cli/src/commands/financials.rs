use stockdesk_core::{validate_ticker, FinancialsRequest, StockDataProvider};

use crate::cli::{FinancialsArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn run(
    args: &FinancialsArgs,
    provider: &dyn StockDataProvider,
    format: OutputFormat,
) -> Result<(), CliError> {
    let ticker = validate_ticker(&args.ticker)?;
    let request = FinancialsRequest::new(ticker, args.limit)?;

    let periods = provider.get_financials(&request).await?;
    if periods.is_empty() {
        eprintln!("no financial statements for {}", request.ticker);
    }
    print!("{}", output::render_financials(&periods, format));
    Ok(())
}
