//! Command dispatch. Each command fetches through the provider trait and
//! renders through `output`.

mod brief;
mod compare;
mod financials;
mod health;
mod history;
mod news;
mod quote;
mod status;
mod watchlist;

use stockdesk_core::StockDataProvider;

use crate::cli::{Command, OutputFormat};
use crate::error::CliError;

pub async fn run(
    command: &Command,
    provider: &dyn StockDataProvider,
    format: OutputFormat,
) -> Result<(), CliError> {
    match command {
        Command::Quote(args) => quote::run(args, provider, format).await,
        Command::Compare(args) => compare::run(args, provider, format).await,
        Command::History(args) => history::run(args, provider, format).await,
        Command::News(args) => news::run(args, provider, format).await,
        Command::Financials(args) => financials::run(args, provider, format).await,
        Command::Status => status::run(provider, format).await,
        Command::Health => health::run(provider, format).await,
        Command::Watchlist(args) => watchlist::run(args, provider, format).await,
        Command::Brief(args) => brief::run(args, provider, format).await,
    }
}
