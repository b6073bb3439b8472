use chrono::NaiveDate;
use colored::Colorize;
use searchhub::qiita::QiitaAdapter;
use searchhub_core::qiita::{ArticleFilters, ArticleSearchParams, DEFAULT_BASE_URL};

use super::{outcome, print_json, print_summary, short_date, spinner, transport, truncate};
use crate::prelude::{println, *};

#[derive(Debug, Clone, clap::Args)]
pub struct SearchOptions {
    /// Search keywords
    #[arg(value_name = "KEYWORD", default_value = "")]
    pub keyword: String,

    /// Tag name (can be repeated)
    #[arg(long, short = 't')]
    pub tag: Vec<String>,

    /// Author's user id
    #[arg(long)]
    pub user: Option<String>,

    /// Text that must appear in the title
    #[arg(long)]
    pub title: Option<String>,

    /// Created on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub created_from: Option<NaiveDate>,

    /// Created on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub created_to: Option<NaiveDate>,

    /// Minimum number of stocks
    #[arg(long)]
    pub min_stocks: Option<u32>,

    /// Qiita base URL (overrides QIITA_BASE_URL env var)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Qiita access token (overrides QIITA_TOKEN env var)
    #[arg(long)]
    pub token: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Qiita configuration from environment variables
#[derive(Debug, Clone)]
pub struct QiitaConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl QiitaConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("QIITA_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            token: std::env::var("QIITA_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn with_overrides(mut self, base_url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(token) = token {
            self.token = Some(token);
        }
        self
    }
}

pub async fn run(options: SearchOptions, global: crate::Global) -> Result<()> {
    let config = QiitaConfig::from_env().with_overrides(options.base_url.clone(), options.token.clone());

    if global.verbose {
        println!("Qiita Base URL: {}", config.base_url);
        println!();
    }

    let adapter = QiitaAdapter::new(transport(&global)?).with_base_url(config.base_url);
    let params = ArticleSearchParams {
        token: config.token,
        keyword: options.keyword,
        filters: ArticleFilters {
            tags: options.tag,
            user: options.user,
            title: options.title,
            created_from: options.created_from,
            created_to: options.created_to,
            min_stocks: options.min_stocks,
        },
    };

    let spinner = spinner("Searching Qiita...")?;
    let result = adapter.search(&params).await;
    spinner.finish_and_clear();
    let data = outcome(result, options.json)?;

    if options.json {
        return print_json(&data);
    }

    print_summary("article", data.len(), data.total_count);
    if data.is_empty() {
        println!("No articles found.");
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "Title".bold().cyan(),
        "User".bold().cyan(),
        "Tags".bold().cyan(),
        "Likes".bold().cyan(),
        "Stocks".bold().cyan(),
        "Created".bold().cyan(),
        "URL".bold().cyan()
    ]);

    for article in &data.items {
        table.add_row(prettytable::row![
            truncate(&article.title, 50).bright_white(),
            article.user.as_deref().unwrap_or("-").bright_magenta(),
            truncate(&article.tags.join(", "), 30),
            article.likes_count.to_string().bright_yellow(),
            article.stocks_count,
            short_date(&article.created_at),
            article.url.cyan()
        ]);
    }

    table.printstd();
    Ok(())
}
