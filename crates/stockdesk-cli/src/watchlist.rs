//! Static JSON watchlist files.
//!
//! Two shapes are accepted: an object `{"name": ..., "tickers": [...]}`
//! and a bare array of ticker strings.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CliError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watchlist {
    #[serde(default)]
    pub name: Option<String>,
    pub tickers: Vec<String>,
}

pub fn load(path: &Path) -> Result<Watchlist, CliError> {
    let raw = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;

    let watchlist: Watchlist = if value.is_array() {
        Watchlist {
            name: None,
            tickers: serde_json::from_value(value)?,
        }
    } else {
        serde_json::from_value(value)?
    };

    if watchlist.tickers.is_empty() {
        return Err(CliError::Watchlist(format!(
            "watchlist '{}' contains no tickers",
            path.display()
        )));
    }
    Ok(watchlist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn loads_object_shape() {
        let file = write_temp(r#"{"name": "tech", "tickers": ["AAPL", "MSFT"]}"#);
        let watchlist = load(file.path()).expect("watchlist");
        assert_eq!(watchlist.name.as_deref(), Some("tech"));
        assert_eq!(watchlist.tickers, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn loads_bare_array_shape() {
        let file = write_temp(r#"["NVDA", "TSLA"]"#);
        let watchlist = load(file.path()).expect("watchlist");
        assert_eq!(watchlist.name, None);
        assert_eq!(watchlist.tickers, vec!["NVDA", "TSLA"]);
    }

    #[test]
    fn empty_watchlist_is_an_error() {
        let file = write_temp(r#"{"tickers": []}"#);
        let err = load(file.path()).expect_err("must fail");
        assert!(matches!(err, CliError::Watchlist(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load(Path::new("/nonexistent/watchlist.json")).expect_err("must fail");
        assert!(matches!(err, CliError::Io(_)));
    }
}
