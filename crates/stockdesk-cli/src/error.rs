use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] stockdesk_core::ValidationError),

    #[error(transparent)]
    Provider(#[from] stockdesk_core::ProviderError),

    #[error("watchlist error: {0}")]
    Watchlist(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Provider(_) => 3,
            Self::Watchlist(_) | Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}
