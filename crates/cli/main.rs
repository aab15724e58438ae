use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use hltb_core::config::default_config_path;
use hltb_core::monitoring::{init_metrics_from_env, init_tracing, init_tracing_quiet};
use hltb_core::{HltbClient, ScraperConfig, SearchModifier, SearchQuery};

mod output;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ModifierArg {
    None,
    OnlyDlc,
    OnlyMods,
    OnlyHacks,
    HideDlc,
}

impl From<ModifierArg> for SearchModifier {
    fn from(m: ModifierArg) -> Self {
        match m {
            ModifierArg::None => SearchModifier::None,
            ModifierArg::OnlyDlc => SearchModifier::IsolateDlc,
            ModifierArg::OnlyMods => SearchModifier::IsolateMods,
            ModifierArg::OnlyHacks => SearchModifier::IsolateHacks,
            ModifierArg::HideDlc => SearchModifier::HideDlc,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "hltb", version, about = "Game completion times from HowLongToBeat")]
struct Cli {
    /// Config file (default: $HLTB_CONFIG_DIR/config.toml or the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the site root
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Output format: json or table
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search games by name
    Search {
        /// Game name
        term: Vec<String>,

        #[arg(long, value_enum, default_value_t = ModifierArg::None)]
        modifier: ModifierArg,

        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Maximum results to print
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Resolve a game's title by its numeric id
    Title { id: u64 },
}

fn load_config(cli: &Cli) -> Result<ScraperConfig> {
    let path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = ScraperConfig::load_or_default(&path)
        .with_context(|| format!("load config from {}", path.display()))?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = ScraperConfig::with_base_url(base_url.as_str()).base_url;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_seconds = timeout;
    }
    config.validate()?;
    Ok(config)
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.format == OutputFormat::Json {
        init_tracing_quiet();
    } else {
        init_tracing();
    }
    init_metrics_from_env()?;

    let config = load_config(&cli)?;

    match &cli.command {
        Command::Search {
            term,
            modifier,
            page,
            limit,
        } => {
            let query = SearchQuery::new(&term.join(" "))?
                .with_modifier((*modifier).into())
                .with_page(*page);
            let client = HltbClient::new(config).context("build http client")?;
            let results = client
                .search_until(&query, interrupted())
                .await
                .with_context(|| format!("search for \"{}\"", query.term()))?;
            match cli.format {
                OutputFormat::Json => output::print_pretty_json(&results, *limit),
                OutputFormat::Table => output::print_table(&results, *limit),
            }
        }
        Command::Title { id } => {
            let client = HltbClient::new(config).context("build http client")?;
            let title = client
                .get_title_until(*id, interrupted())
                .await
                .with_context(|| format!("fetch title for game {id}"))?;
            match (cli.format, title) {
                (OutputFormat::Json, title) => {
                    println!("{}", serde_json::json!({ "id": id, "title": title }))
                }
                (OutputFormat::Table, Some(title)) => println!("{title}"),
                (OutputFormat::Table, None) => println!("No title found."),
            }
        }
    }
    Ok(())
}
