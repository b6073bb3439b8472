use chrono::NaiveDate;
use colored::Colorize;
use searchhub::zenn::ZennAdapter;
use searchhub_core::zenn::{ArticleType, ZennFilters, ZennSearchParams, DEFAULT_BASE_URL};

use super::{outcome, print_json, print_summary, short_date, spinner, transport, truncate};
use crate::prelude::{println, *};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum TypeArg {
    Tech,
    Idea,
}

impl From<TypeArg> for ArticleType {
    fn from(t: TypeArg) -> Self {
        match t {
            TypeArg::Tech => ArticleType::Tech,
            TypeArg::Idea => ArticleType::Idea,
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct SearchOptions {
    /// Text that must appear in the title (case-insensitive)
    #[arg(value_name = "KEYWORD", default_value = "")]
    pub keyword: String,

    /// Only articles by this user
    #[arg(long)]
    pub username: Option<String>,

    #[arg(long = "type", value_enum)]
    pub article_type: Option<TypeArg>,

    /// Minimum liked count
    #[arg(long)]
    pub min_likes: Option<u64>,

    /// Published on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub published_from: Option<NaiveDate>,

    /// Published on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub published_to: Option<NaiveDate>,

    /// Zenn base URL (overrides ZENN_BASE_URL env var)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: SearchOptions, global: crate::Global) -> Result<()> {
    let base_url = options
        .base_url
        .clone()
        .or_else(|| std::env::var("ZENN_BASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    if global.verbose {
        println!("Zenn Base URL: {}", base_url);
        println!();
    }

    let adapter = ZennAdapter::new(transport(&global)?).with_base_url(base_url);
    let params = ZennSearchParams {
        keyword: options.keyword,
        filters: ZennFilters {
            username: options.username,
            article_type: options.article_type.map(Into::into),
            min_likes: options.min_likes,
            published_from: options.published_from,
            published_to: options.published_to,
        },
    };

    let spinner = spinner("Listing Zenn articles...")?;
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
        "".bold().cyan(),
        "Title".bold().cyan(),
        "Type".bold().cyan(),
        "User".bold().cyan(),
        "Likes".bold().cyan(),
        "Published".bold().cyan(),
        "URL".bold().cyan()
    ]);

    for article in &data.items {
        table.add_row(prettytable::row![
            article.emoji.as_deref().unwrap_or(""),
            truncate(&article.title, 50).bright_white(),
            article.article_type.as_deref().unwrap_or("-"),
            article.username.as_deref().unwrap_or("-").bright_magenta(),
            article.liked_count.to_string().bright_yellow(),
            article.published_at.as_deref().map(short_date).unwrap_or("-"),
            article.url.cyan()
        ]);
    }

    table.printstd();
    Ok(())
}
