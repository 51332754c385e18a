use stockdesk_core::{check_provider, StockDataProvider};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::output;

pub async fn run(provider: &dyn StockDataProvider, format: OutputFormat) -> Result<(), CliError> {
    let report = check_provider(provider).await;
    print!("{}", output::render_health(&report, format));
    Ok(())
}
