use chrono::NaiveDate;
use colored::Colorize;
use searchhub::docbase::DocbaseAdapter;
use searchhub_core::docbase::{PostFilters, PostSearchParams, DEFAULT_API_URL};

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

    /// Author's user name
    #[arg(long)]
    pub author: Option<String>,

    /// Group name
    #[arg(long)]
    pub group: Option<String>,

    /// Created on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub created_from: Option<NaiveDate>,

    /// Created on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub created_to: Option<NaiveDate>,

    /// Team sub-domain (overrides DOCBASE_DOMAIN env var)
    #[arg(long)]
    pub domain: Option<String>,

    /// DocBase API base URL (overrides DOCBASE_API_URL env var)
    #[arg(long)]
    pub api_url: Option<String>,

    /// DocBase access token (overrides DOCBASE_TOKEN env var)
    #[arg(long)]
    pub token: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// DocBase configuration from environment variables
///
/// Missing values are left blank here; the adapter rejects a blank domain or
/// token with a validation error before sending anything.
#[derive(Debug, Clone)]
pub struct DocbaseConfig {
    pub api_url: String,
    pub domain: String,
    pub token: String,
}

impl DocbaseConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("DOCBASE_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            domain: std::env::var("DOCBASE_DOMAIN").unwrap_or_default(),
            token: std::env::var("DOCBASE_TOKEN").unwrap_or_default(),
        }
    }

    pub fn with_overrides(
        mut self,
        api_url: Option<String>,
        domain: Option<String>,
        token: Option<String>,
    ) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if let Some(domain) = domain {
            self.domain = domain;
        }
        if let Some(token) = token {
            self.token = token;
        }
        self
    }
}

pub async fn run(options: SearchOptions, global: crate::Global) -> Result<()> {
    let config = DocbaseConfig::from_env().with_overrides(
        options.api_url.clone(),
        options.domain.clone(),
        options.token.clone(),
    );

    if global.verbose {
        println!("DocBase API Base: {} (team: {})", config.api_url, config.domain);
        println!();
    }

    let adapter = DocbaseAdapter::new(transport(&global)?).with_base_url(config.api_url);
    let params = PostSearchParams {
        token: config.token,
        domain: config.domain,
        keyword: options.keyword,
        filters: PostFilters {
            tags: options.tag,
            author: options.author,
            group: options.group,
            created_from: options.created_from,
            created_to: options.created_to,
        },
    };

    let spinner = spinner("Searching DocBase...")?;
    let result = adapter.search(&params).await;
    spinner.finish_and_clear();
    let data = outcome(result, options.json)?;

    if options.json {
        return print_json(&data);
    }

    print_summary("post", data.len(), data.total_count);
    if data.is_empty() {
        println!("No posts found.");
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "ID".bold().cyan(),
        "Title".bold().cyan(),
        "Author".bold().cyan(),
        "Tags".bold().cyan(),
        "Groups".bold().cyan(),
        "Created".bold().cyan()
    ]);

    for post in &data.items {
        let title = if post.draft {
            format!("{} (draft)", truncate(&post.title, 50)).bright_black()
        } else {
            truncate(&post.title, 60).bright_white()
        };
        table.add_row(prettytable::row![
            post.id.to_string().bright_yellow(),
            title,
            post.author.as_deref().unwrap_or("-").bright_magenta(),
            truncate(&post.tags.join(", "), 30),
            truncate(&post.groups.join(", "), 30),
            short_date(&post.created_at)
        ]);
    }

    table.printstd();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_overrides() {
        let config = DocbaseConfig {
            api_url: DEFAULT_API_URL.to_string(),
            domain: String::new(),
            token: "env".to_string(),
        };

        let config = config.with_overrides(None, Some("acme".to_string()), None);

        assert_eq!(config.domain, "acme");
        assert_eq!(config.token, "env");
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
