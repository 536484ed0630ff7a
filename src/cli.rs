//! Command-line surface: the interactive view plus scriptable `search` and
//! `login` commands.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use thiserror::Error;

use crate::auth::{AccessToken, AuthError, IdentityClient};
use crate::config::{Config, ConfigError};
use crate::logging::{self, LogTarget};
use crate::model::{
    Order, Recency, ResultId, ResultType, SearchPage, SearchParams, VideoDefinition,
    VideoDuration, watch_url,
};
use crate::ready::{ReadyError, Readiness};
use crate::search::{ApiError, SearchBackend, SearchQuery};
use crate::ui::{App, tui};

const NO_TERMINAL: &str = "the interactive view requires a terminal; \
    use `tubesearch search <TERM>` instead";

#[derive(Parser, Debug)]
#[command(
    name = "tubesearch",
    version,
    about = "Search YouTube from the terminal",
    long_about = "Search YouTube from the terminal.\n\n\
        Exit codes: 0 ok, 1 unexpected failure, 2 usage or no terminal, 3 configuration, \
        4 sign-in, 5 search."
)]
pub struct Cli {
    /// Config file (default: platform config dir, tubesearch/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debug logging for this crate
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive search view (default)
    Tui,
    /// Fetch one page of results and print it
    Search(SearchArgs),
    /// Sign in with Google
    Login {
        /// Print the access token to stdout
        #[arg(long)]
        print_token: bool,
    },
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search term
    pub term: String,

    #[arg(long, value_name = "N")]
    pub max_results: Option<u32>,

    #[arg(long, value_enum)]
    pub order: Option<Order>,

    #[arg(long = "type", value_enum)]
    pub result_type: Option<ResultType>,

    #[arg(long, value_enum)]
    pub duration: Option<VideoDuration>,

    #[arg(long, value_enum)]
    pub definition: Option<VideoDefinition>,

    /// Two-letter region code
    #[arg(long, value_name = "CC")]
    pub region: Option<String>,

    #[arg(long, value_enum)]
    pub recency: Option<Recency>,

    /// Cursor printed by a previous search
    #[arg(long, value_name = "TOKEN")]
    pub page_token: Option<String>,

    /// Use this token instead of signing in
    #[arg(long, env = "TUBESEARCH_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Print the page as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchArgs {
    /// Overlay the flags that were given onto `params`.
    fn apply(&self, mut params: SearchParams) -> SearchParams {
        params.term = self.term.clone();
        if let Some(max) = self.max_results {
            params.max_results = max;
        }
        if let Some(order) = self.order {
            params.order = order;
        }
        if let Some(result_type) = self.result_type {
            params.result_type = result_type;
        }
        if let Some(duration) = self.duration {
            params.duration = duration;
        }
        if let Some(definition) = self.definition {
            params.definition = definition;
        }
        if let Some(region) = &self.region {
            params.region_code = region.to_ascii_uppercase();
        }
        if let Some(recency) = self.recency {
            params.recency = recency;
        }
        params
    }
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Search(#[from] ApiError),

    #[error("{0}")]
    Unavailable(#[from] ReadyError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(_) => 2,
            CliError::Config(_) => 3,
            CliError::Auth(_) => 4,
            CliError::Search(_) | CliError::Unavailable(_) => 5,
            CliError::Other(_) => 1,
        }
    }
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            // Checked before logging so nothing is written when refusing.
            if !std::io::stdout().is_terminal() || !std::io::stdin().is_terminal() {
                return Err(CliError::Usage(NO_TERMINAL.to_string()));
            }
            let _guard = logging::init(LogTarget::File, cli.verbose)?;
            let config = Config::load(cli.config.as_deref())?;
            run_tui(&config)
        }
        Commands::Search(args) => {
            logging::init(LogTarget::Stderr, cli.verbose)?;
            let config = Config::load(cli.config.as_deref())?;
            run_search(&config, args).await
        }
        Commands::Login { print_token } => {
            logging::init(LogTarget::Stderr, cli.verbose)?;
            let config = Config::load(cli.config.as_deref())?;
            run_login(&config, print_token).await
        }
    }
}

fn run_tui(config: &Config) -> Result<(), CliError> {
    let readiness = Readiness::spawn(config);
    let app = App::new(config.default_params(), readiness);

    tracing::info!("starting interactive view");
    let mut terminal = ratatui::init();
    let result = tui::run(&mut terminal, app);
    ratatui::restore();
    Ok(result?)
}

async fn run_search(config: &Config, args: SearchArgs) -> Result<(), CliError> {
    let mut readiness = Readiness::spawn(config);

    let token = match &args.access_token {
        Some(secret) => AccessToken::external(secret.clone()),
        None => {
            let identity = readiness
                .identity
                .wait()
                .await
                .map_err(|_| AuthError::NotReady)?;
            sign_in(&identity).await?
        }
    };
    let api = readiness.api.wait().await?;

    let params = args.apply(config.default_params());
    let mut query = SearchQuery::from_params(&params, Utc::now());
    if let Some(page_token) = &args.page_token {
        query = query.with_page_token(page_token.clone());
    }
    let page = api.search(&token, &query).await?;
    readiness.shutdown();

    if args.json {
        let json = serde_json::to_string_pretty(&page).context("Failed to encode results")?;
        println!("{json}");
    } else {
        print_page(&page);
    }
    Ok(())
}

async fn run_login(config: &Config, print_token: bool) -> Result<(), CliError> {
    let identity = IdentityClient::init(config).await?;
    let token = sign_in(&identity).await?;
    if print_token {
        println!("{}", token.secret());
    } else {
        let until = token.expires_at.with_timezone(&chrono::Local);
        eprintln!(
            "{} signed in until {}",
            "✓".green().bold(),
            until.format("%H:%M")
        );
    }
    Ok(())
}

/// Browser sign-in with the consent URL echoed for headless sessions.
async fn sign_in(identity: &IdentityClient) -> Result<AccessToken, AuthError> {
    let pending = identity.begin().await?;
    eprintln!(
        "{} Sign in with Google in your browser. If it did not open, visit:\n  {}",
        "→".cyan().bold(),
        pending.url()
    );
    if let Err(e) = open::that_detached(pending.url()) {
        tracing::warn!(error = %e, "could not open browser");
    }
    pending.finish().await
}

fn print_page(page: &SearchPage) {
    print!("{}", format_page(page));
}

/// Human-readable listing of one page, one block per result.
fn format_page(page: &SearchPage) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    if page.items.is_empty() {
        let _ = writeln!(out, "{}", "No results".dimmed());
    }
    for (idx, item) in page.items.iter().enumerate() {
        let kind = item
            .id
            .as_ref()
            .map_or("item", ResultId::kind_label);
        let _ = writeln!(
            out,
            "{} {} {}",
            format!("{:>2}.", idx + 1).dimmed(),
            item.title.bold(),
            format!("[{kind}]").cyan()
        );
        let _ = writeln!(out, "    {}", item.channel_title.green());
        if !item.description.is_empty() {
            let _ = writeln!(out, "    {}", truncate(&item.description, 100));
        }
        let _ = writeln!(out, "    {}", watch_url(item).blue().underline());
        if let Some(thumb) = &item.thumbnail_url {
            let _ = writeln!(out, "    {} {}", "thumbnail:".dimmed(), thumb.dimmed());
        }
    }
    if let Some(prev) = &page.prev_page_token {
        let _ = writeln!(out, "{} --page-token {prev}", "prev:".dimmed());
    }
    if let Some(next) = &page.next_page_token {
        let _ = writeln!(out, "{} --page-token {next}", "next:".dimmed());
    }
    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_flags_override_defaults() {
        let cli = Cli::parse_from([
            "tubesearch",
            "search",
            "lofi",
            "--order",
            "viewCount",
            "--type",
            "playlist",
            "--region",
            "de",
            "--recency",
            "week",
        ]);
        let Some(Commands::Search(args)) = cli.command else {
            panic!("expected search command");
        };
        let params = args.apply(SearchParams::default());
        assert_eq!(params.term, "lofi");
        assert_eq!(params.order, Order::ViewCount);
        assert_eq!(params.result_type, ResultType::Playlist);
        assert_eq!(params.region_code, "DE");
        assert_eq!(params.recency, Recency::Week);
        assert_eq!(params.max_results, 12);
    }

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::parse_from(["tubesearch", "-v"]);
        assert!(cli.command.is_none());
        assert!(cli.verbose);
    }

    #[test]
    fn exit_codes_by_category() {
        assert_eq!(CliError::Usage("x".into()).exit_code(), 2);
        assert_eq!(CliError::Config(ConfigError::Missing("X")).exit_code(), 3);
        assert_eq!(CliError::Auth(AuthError::Denied("no".into())).exit_code(), 4);
        assert_eq!(
            CliError::Search(ApiError::Decode("bad".into())).exit_code(),
            5
        );
        let other = CliError::Other(anyhow::anyhow!("log dir unwritable"));
        assert_eq!(other.exit_code(), 1);
        let help = <Cli as clap::CommandFactory>::command()
            .get_long_about()
            .map(ToString::to_string)
            .unwrap_or_default();
        for code in ["0 ok", "1 unexpected failure", "2 usage", "3 configuration"] {
            assert!(help.contains(code), "missing {code} in {help}");
        }
    }

    #[test]
    fn listing_shows_links_thumbnails_and_cursors() {
        use crate::model::ResultItem;

        let page = SearchPage {
            items: vec![ResultItem {
                id: Some(ResultId::Video("abc123".into())),
                title: "Lofi mix".into(),
                description: String::new(),
                thumbnail_url: Some("https://i.ytimg.com/vi/abc123/mqdefault.jpg".into()),
                channel_title: "Beats".into(),
            }],
            next_page_token: Some("CAUQAA".into()),
            prev_page_token: None,
        };
        let text = format_page(&page);
        assert!(text.contains("Lofi mix"));
        assert!(text.contains("https://www.youtube.com/watch?v=abc123"));
        assert!(text.contains("https://i.ytimg.com/vi/abc123/mqdefault.jpg"));
        assert!(text.contains("--page-token CAUQAA"));
        assert!(!text.contains("prev:"));
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate("héllo", 10), "héllo");
        assert_eq!(truncate("héllo wörld", 5), "héll…");
    }
}
