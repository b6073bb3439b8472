//! Command-line front end: one module per provider

use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use searchhub::transport::ReqwestTransport;
use searchhub_core::SearchError;
use serde::Serialize;

use crate::prelude::{println, *};

pub mod docbase;
pub mod github;
pub mod qiita;
pub mod slack;
pub mod zenn;

/// Build the shared HTTP transport from the global options
pub fn transport(global: &crate::Global) -> Result<Arc<ReqwestTransport>> {
    let transport = ReqwestTransport::new(Duration::from_secs(global.timeout))
        .map_err(|e| eyre!("{}", e))?;
    Ok(Arc::new(transport))
}

/// Spinner shown on stderr while pages are fetched
pub fn spinner(message: impl Into<String>) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .map_err(|e| eyre!("Invalid spinner template: {}", e))?,
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| eyre!("Failed to serialize output: {}", e))?;
    println!("{}", json);
    Ok(())
}

/// Unwrap a search outcome, printing the error as JSON first under `--json`
pub fn outcome<T>(result: std::result::Result<T, SearchError>, json: bool) -> Result<T> {
    match result {
        Ok(data) => Ok(data),
        Err(err) => {
            if json {
                print_json(&err)?;
            }
            Err(err.into())
        }
    }
}

/// `Found N item(s) (of M total):` line above a result table
pub fn print_summary(noun: &str, shown: usize, total: u64) {
    let total_info = if total > shown as u64 {
        format!(" (of {} total)", total)
    } else {
        String::new()
    };
    println!(
        "\nFound {} {}(s){}:\n",
        shown.to_string().bold(),
        noun,
        total_info
    );
}

/// Shorten `text` to `max` characters on a char boundary, flattening newlines
pub fn truncate(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

/// Leading `YYYY-MM-DD` of an ISO timestamp
pub fn short_date(timestamp: &str) -> &str {
    timestamp.get(..10).unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate("日本語のタイトルです", 6), "日本語...");
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("two\nlines", 20), "two lines");
    }

    #[test]
    fn test_short_date() {
        assert_eq!(short_date("2024-05-01T10:00:00Z"), "2024-05-01");
        assert_eq!(short_date("n/a"), "n/a");
    }
}
