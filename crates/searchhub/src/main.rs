use crate::prelude::*;
use clap::Parser;

mod cli;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Search GitHub, Qiita, Zenn, Slack and DocBase from the command line"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// HTTP timeout in seconds for each request
    #[clap(long, env = "SEARCHHUB_TIMEOUT", global = true, default_value = "30")]
    timeout: u64,

    /// Whether to display additional information.
    #[clap(long, env = "SEARCHHUB_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// GitHub issue, pull request and discussion search
    Github(crate::cli::github::App),

    /// Qiita article search
    Qiita(crate::cli::qiita::SearchOptions),

    /// Zenn article search (filters applied locally)
    Zenn(crate::cli::zenn::SearchOptions),

    /// Slack message search
    Slack(crate::cli::slack::SearchOptions),

    /// DocBase post search
    Docbase(crate::cli::docbase::SearchOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Github(sub_app) => crate::cli::github::run(sub_app, app.global).await,
        SubCommands::Qiita(options) => crate::cli::qiita::run(options, app.global).await,
        SubCommands::Zenn(options) => crate::cli::zenn::run(options, app.global).await,
        SubCommands::Slack(options) => crate::cli::slack::run(options, app.global).await,
        SubCommands::Docbase(options) => crate::cli::docbase::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
