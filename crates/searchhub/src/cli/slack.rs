use chrono::NaiveDate;
use colored::Colorize;
use searchhub::slack::SlackAdapter;
use searchhub_core::slack::{MessageFilters, MessageSearchParams, ThreadedSearch, DEFAULT_API_URL};

use super::{outcome, print_json, print_summary, spinner, transport, truncate};
use crate::prelude::{println, *};

#[derive(Debug, Clone, clap::Args)]
pub struct SearchOptions {
    /// Search keywords
    #[arg(value_name = "KEYWORD", default_value = "")]
    pub keyword: String,

    /// Channel name, with or without `#` (can be repeated)
    #[arg(long, short = 'c')]
    pub channel: Vec<String>,

    /// Author's user name, with or without `@`
    #[arg(long)]
    pub from: Option<String>,

    /// Only messages after this date (YYYY-MM-DD)
    #[arg(long)]
    pub after: Option<NaiveDate>,

    /// Only messages before this date (YYYY-MM-DD)
    #[arg(long)]
    pub before: Option<NaiveDate>,

    /// Also fetch the full thread of every matching threaded message
    #[arg(long)]
    pub threads: bool,

    /// Slack Web API base URL (overrides SLACK_API_URL env var)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Slack user token (overrides SLACK_TOKEN env var)
    #[arg(long)]
    pub token: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Slack configuration from environment variables
#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub api_url: String,
    pub token: String,
}

impl SlackConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_url: std::env::var("SLACK_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            token: std::env::var("SLACK_TOKEN").unwrap_or_default(),
        })
    }

    pub fn with_overrides(mut self, api_url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if let Some(token) = token {
            self.token = token;
        }
        self
    }

    /// Fail early when no token came from either source
    pub fn require_token(self) -> Result<Self> {
        if self.token.trim().is_empty() {
            return Err(eyre!(
                "SLACK_TOKEN environment variable not set and no --token given"
            ));
        }
        Ok(self)
    }
}

pub async fn run(options: SearchOptions, global: crate::Global) -> Result<()> {
    let config = SlackConfig::from_env()?
        .with_overrides(options.api_url.clone(), options.token.clone())
        .require_token()?;

    if global.verbose {
        println!("Slack API Base: {}", config.api_url);
        println!();
    }

    let adapter = SlackAdapter::new(transport(&global)?).with_base_url(config.api_url);
    let params = MessageSearchParams {
        token: config.token,
        keyword: options.keyword,
        filters: MessageFilters {
            channels: options.channel,
            from: options.from,
            after: options.after,
            before: options.before,
        },
    };

    let spinner = spinner("Searching Slack...")?;
    let result = if options.threads {
        adapter.search_with_threads(&params).await
    } else {
        adapter.search(&params).await.map(|aggregate| ThreadedSearch {
            aggregate,
            threads: Vec::new(),
        })
    };
    spinner.finish_and_clear();
    let data = outcome(result, options.json)?;

    if options.json {
        return if options.threads {
            print_json(&data)
        } else {
            print_json(&data.aggregate)
        };
    }

    let messages = &data.aggregate;
    print_summary("message", messages.len(), messages.total_count);
    if messages.is_empty() {
        println!("No messages found.");
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "Channel".bold().cyan(),
        "User".bold().cyan(),
        "Text".bold().cyan(),
        "Thread".bold().cyan(),
        "Link".bold().cyan()
    ]);

    for message in &messages.items {
        let channel = message
            .channel_name
            .as_deref()
            .map(|name| format!("#{name}"))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(prettytable::row![
            channel.bright_green(),
            message
                .username
                .as_deref()
                .or(message.user.as_deref())
                .unwrap_or("-")
                .bright_magenta(),
            truncate(&message.text, 60).bright_white(),
            if message.thread_ts.is_some() { "yes" } else { "" },
            message.permalink.as_deref().unwrap_or("-").cyan()
        ]);
    }

    table.printstd();

    for thread in &data.threads {
        println!(
            "\n{} {} ({} message(s))",
            "Thread".bold().cyan(),
            thread.thread_ts.bright_yellow(),
            thread.messages.len()
        );
        for reply in &thread.messages {
            println!(
                "  {} {}",
                format!("[{}]", reply.user.as_deref().unwrap_or("-")).bright_magenta(),
                truncate(&reply.text, 100)
            );
        }
    }

    Ok(())
}
