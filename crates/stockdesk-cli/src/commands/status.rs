use stockdesk_core::StockDataProvider;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::output;

pub async fn run(provider: &dyn StockDataProvider, format: OutputFormat) -> Result<(), CliError> {
    let status = provider.get_market_status().await?;
    print!("{}", output::render_status(&status, format));
    Ok(())
}
