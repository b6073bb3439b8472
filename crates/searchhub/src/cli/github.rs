use chrono::NaiveDate;
use colored::Colorize;
use searchhub::github::GithubAdapter;
use searchhub_core::github::discussions::{DiscussionFilters, DiscussionSearchParams};
use searchhub_core::github::issues::{
    IssueFilters, IssueKind, IssueSearchParams, IssueSort, IssueState, SortOrder,
};
use searchhub_core::github::DEFAULT_API_URL;

use super::{outcome, print_json, print_summary, short_date, spinner, transport, truncate};
use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "github")]
#[command(about = "GitHub issue, pull request and discussion search")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,

    /// GitHub API base URL (overrides GITHUB_API_URL env var)
    #[clap(long, global = true)]
    pub api_url: Option<String>,

    /// GitHub token (overrides GITHUB_TOKEN env var)
    #[clap(long, global = true)]
    pub token: Option<String>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Search issues and pull requests
    #[clap(name = "issues")]
    Issues(IssueOptions),

    /// Search discussions
    #[clap(name = "discussions")]
    Discussions(DiscussionOptions),
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StateArg {
    Open,
    Closed,
}

impl From<StateArg> for IssueState {
    fn from(s: StateArg) -> Self {
        match s {
            StateArg::Open => IssueState::Open,
            StateArg::Closed => IssueState::Closed,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum KindArg {
    Issue,
    Pr,
}

impl From<KindArg> for IssueKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Issue => IssueKind::Issue,
            KindArg::Pr => IssueKind::Pr,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SortArg {
    Comments,
    Reactions,
    Created,
    Updated,
}

impl From<SortArg> for IssueSort {
    fn from(s: SortArg) -> Self {
        match s {
            SortArg::Comments => IssueSort::Comments,
            SortArg::Reactions => IssueSort::Reactions,
            SortArg::Created => IssueSort::Created,
            SortArg::Updated => IssueSort::Updated,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(o: OrderArg) -> Self {
        match o {
            OrderArg::Asc => SortOrder::Asc,
            OrderArg::Desc => SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct IssueOptions {
    /// Search keyword, matched as a phrase
    #[arg(value_name = "KEYWORD", default_value = "")]
    pub keyword: String,

    /// Restrict to a repository in owner/name format (can be repeated)
    #[arg(long, short = 'r')]
    pub repo: Vec<String>,

    #[arg(long)]
    pub author: Option<String>,

    #[arg(long)]
    pub assignee: Option<String>,

    /// Label name (can be repeated)
    #[arg(long)]
    pub label: Vec<String>,

    #[arg(long, value_enum)]
    pub state: Option<StateArg>,

    /// Only issues or only pull requests
    #[arg(long = "type", value_enum)]
    pub kind: Option<KindArg>,

    /// Created on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub created_from: Option<NaiveDate>,

    /// Created on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub created_to: Option<NaiveDate>,

    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,

    #[arg(long, value_enum)]
    pub order: Option<OrderArg>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, clap::Args)]
pub struct DiscussionOptions {
    /// Search keyword, matched as a phrase
    #[arg(value_name = "KEYWORD", default_value = "")]
    pub keyword: String,

    /// Restrict to a repository in owner/name format (can be repeated)
    #[arg(long, short = 'r')]
    pub repo: Vec<String>,

    #[arg(long)]
    pub author: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// Only answered discussions
    #[arg(long, conflicts_with = "unanswered")]
    pub answered: bool,

    /// Only unanswered discussions
    #[arg(long)]
    pub unanswered: bool,

    /// Created on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub created_from: Option<NaiveDate>,

    /// Created on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub created_to: Option<NaiveDate>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// GitHub configuration from environment variables
#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub api_url: String,
    pub token: Option<String>,
}

impl GithubConfig {
    /// Load configuration from environment variables
    ///
    /// `GITHUB_TOKEN` is optional; unauthenticated search works with a lower
    /// rate limit.
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            token: std::env::var("GITHUB_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
        }
    }

    /// Apply CLI overrides to the configuration
    pub fn with_overrides(mut self, api_url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if let Some(token) = token {
            self.token = Some(token);
        }
        self
    }
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let config = GithubConfig::from_env().with_overrides(app.api_url, app.token);

    if global.verbose {
        println!("GitHub API Base: {}", config.api_url);
        println!();
    }

    let adapter = GithubAdapter::new(transport(&global)?).with_base_url(config.api_url.clone());

    match app.command {
        Commands::Issues(options) => issues(&adapter, config, options).await,
        Commands::Discussions(options) => discussions(&adapter, config, options).await,
    }
}

async fn issues(adapter: &GithubAdapter, config: GithubConfig, options: IssueOptions) -> Result<()> {
    let params = IssueSearchParams {
        token: config.token,
        keyword: options.keyword,
        filters: IssueFilters {
            repositories: options.repo,
            author: options.author,
            assignee: options.assignee,
            labels: options.label,
            state: options.state.map(Into::into),
            kind: options.kind.map(Into::into),
            created_from: options.created_from,
            created_to: options.created_to,
        },
        sort: options.sort.map(Into::into),
        order: options.order.map(Into::into),
    };

    let spinner = spinner("Searching GitHub issues...")?;
    let result = adapter.search_issues(&params).await;
    spinner.finish_and_clear();
    let data = outcome(result, options.json)?;

    if options.json {
        return print_json(&data);
    }

    print_summary("issue", data.len(), data.total_count);
    if data.is_empty() {
        println!("No issues found.");
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "#".bold().cyan(),
        "Repository".bold().cyan(),
        "Title".bold().cyan(),
        "State".bold().cyan(),
        "Author".bold().cyan(),
        "Comments".bold().cyan(),
        "Created".bold().cyan()
    ]);

    for issue in &data.items {
        let state = match (issue.state.as_str(), issue.is_pull_request) {
            ("open", true) => "open PR".green(),
            ("open", false) => "open".green(),
            (state, true) => format!("{state} PR").bright_black(),
            (state, false) => state.bright_black(),
        };
        table.add_row(prettytable::row![
            issue.number.to_string().bright_yellow(),
            issue.repository.as_deref().unwrap_or("-"),
            truncate(&issue.title, 60).bright_white(),
            state,
            issue.author.as_deref().unwrap_or("-").bright_magenta(),
            issue.comments,
            short_date(&issue.created_at)
        ]);
    }

    table.printstd();
    Ok(())
}

async fn discussions(
    adapter: &GithubAdapter,
    config: GithubConfig,
    options: DiscussionOptions,
) -> Result<()> {
    let answered = match (options.answered, options.unanswered) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let params = DiscussionSearchParams {
        token: config.token,
        keyword: options.keyword,
        filters: DiscussionFilters {
            repositories: options.repo,
            author: options.author,
            category: options.category,
            answered,
            created_from: options.created_from,
            created_to: options.created_to,
        },
    };

    let spinner = spinner("Searching GitHub discussions...")?;
    let result = adapter.search_discussions(&params).await;
    spinner.finish_and_clear();
    let data = outcome(result, options.json)?;

    if options.json {
        return print_json(&data);
    }

    print_summary("discussion", data.len(), data.total_count);
    if let Some(searchhub_core::ProviderMeta::RateLimit {
        remaining,
        limit,
        reset_at,
    }) = &data.provider_meta
    {
        println!(
            "{}\n",
            format!("Rate limit: {remaining}/{limit} remaining, resets at {reset_at}").bright_black()
        );
    }
    if data.is_empty() {
        println!("No discussions found.");
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "#".bold().cyan(),
        "Repository".bold().cyan(),
        "Title".bold().cyan(),
        "Category".bold().cyan(),
        "Answered".bold().cyan(),
        "Author".bold().cyan(),
        "Created".bold().cyan()
    ]);

    for discussion in &data.items {
        let answered = if discussion.answered {
            "yes".green()
        } else {
            "no".bright_black()
        };
        table.add_row(prettytable::row![
            discussion.number.to_string().bright_yellow(),
            discussion.repository.as_deref().unwrap_or("-"),
            truncate(&discussion.title, 60).bright_white(),
            discussion.category.as_deref().unwrap_or("-"),
            answered,
            discussion.author.as_deref().unwrap_or("-").bright_magenta(),
            short_date(&discussion.created_at)
        ]);
    }

    table.printstd();
    Ok(())
}
