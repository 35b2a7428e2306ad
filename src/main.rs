use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use owo_colors::OwoColorize;
use research_aggregator::config::{find_config_file, load_config};
use research_aggregator::models::{Query, SearchPage};
use research_aggregator::pipeline::SearchService;
use research_aggregator::server::run_server;
use research_aggregator::sources::SourceRegistry;
use research_aggregator::ui::{self, Spinner};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Research Aggregator - Search many scholarly metadata services at once
#[derive(Parser, Debug)]
#[command(name = "research-aggregator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search many scholarly metadata services at once and merge the results", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Per-source request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides the config file)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Search every enabled source and print one page of merged results
    #[command(alias = "s")]
    Search {
        /// Search query string
        query: String,

        /// Page number (1-based)
        #[arg(long, short, default_value_t = 1)]
        page: usize,

        /// Results per page (default: from config)
        #[arg(long)]
        page_size: Option<usize>,

        /// Include abstracts where the source provides them
        #[arg(long)]
        abstracts: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Auto)]
        output: OutputFormat,

        /// Only query these sources (repeatable, e.g. --source arxiv --source pubmed)
        #[arg(long, short)]
        source: Vec<String>,
    },

    /// List the sources that would be queried
    Sources,

    /// Print the effective configuration as TOML (API keys masked)
    Config,

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config_path = cli.config.clone().or_else(find_config_file);
    if let Some(path) = &config_path {
        tracing::debug!("Using config file: {}", path.display());
    }

    let mut config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load config from environment".to_string(),
    })?;

    if let Some(timeout) = cli.timeout {
        config.http.timeout_secs = timeout;
    }

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            let service = SearchService::from_config(&config)?;
            run_server(&config, service).await?;
        }

        Commands::Search {
            query,
            page,
            page_size,
            abstracts,
            output,
            source,
        } => {
            let mut registry = SourceRegistry::from_config(&config)?;
            if !source.is_empty() {
                registry = registry.restricted_to(&source)?;
            }
            let service = SearchService::new(registry);

            let search_query = Query::new(query.as_str())
                .page(page)
                .page_size(page_size.unwrap_or(config.search.page_size))
                .include_abstract(abstracts);

            let spinner = (ui::is_terminal() && !cli.quiet).then(|| {
                Spinner::new(&format!(
                    "Searching {} sources for \"{}\"",
                    service.registry().len(),
                    query
                ))
            });

            let started = Instant::now();
            let result = service.search(&search_query).await;

            let results = match result {
                Ok(results) => {
                    if let Some(spinner) = &spinner {
                        spinner.clear();
                    }
                    results
                }
                Err(e) => {
                    if let Some(spinner) = &spinner {
                        spinner.finish_with_error(&e.to_string());
                    }
                    return Err(e.into());
                }
            };

            let format = resolve_format(output);
            if format == OutputFormat::Table && !cli.quiet {
                ui::print_search_header(
                    &query,
                    results.results.len(),
                    results.total_results,
                    page,
                    started.elapsed(),
                );
            }
            output_page(&results, format)?;
        }

        Commands::Sources => {
            let registry = SourceRegistry::from_config(&config)?;
            ui::print_section("Sources");
            for source in registry.all() {
                println!(
                    "  {} {:<12} {}",
                    ui::source_icon(source.id()),
                    source.id().green(),
                    source.name()
                );
            }
            println!();
            println!(
                "{} {} sources enabled",
                ui::status_icon(ui::Status::Success).green(),
                registry.len()
            );
        }

        Commands::Config => {
            print!("{}", config.redacted().to_toml()?);
        }

        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Initialize tracing based on verbosity
///
/// `RUST_LOG` wins when set. Logs go to stderr so JSON results on stdout
/// stay machine-readable.
fn init_tracing(cli: &Cli) {
    let base = match &cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => base,
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "research_aggregator={},tower_http={}",
            level, level
        ))
    });

    let json_layer = cli.log_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!cli.log_json).then(|| {
        tracing_subscriber::fmt::layer().with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

fn resolve_format(format: OutputFormat) -> OutputFormat {
    if format == OutputFormat::Auto {
        if ui::is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    }
}

fn output_page(page: &SearchPage, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Auto => {
            println!("{}", serde_json::to_string_pretty(page)?);
        }
        OutputFormat::Plain => {
            for record in &page.results {
                println!("{} - {} ({})", record.title, record.authors, record.source);
                if !record.journal.is_empty() || !record.year.is_empty() {
                    println!("  {} {}", record.journal, record.year);
                }
                if !record.doi.is_empty() {
                    println!("  DOI: {}", record.doi);
                }
                println!("  URL: {}", record.link);
                if let Some(text) = record.r#abstract.as_deref().filter(|t| !t.is_empty()) {
                    println!("  {}", text);
                }
                println!();
            }
        }
        OutputFormat::Table => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Title", "Authors", "Journal", "Year", "Source", "Link"]);

            for record in &page.results {
                table.add_row(vec![
                    Cell::new(ui::truncate_with_ellipsis(&record.title, 50))
                        .add_attribute(Attribute::Bold),
                    Cell::new(ui::truncate_with_ellipsis(&record.authors, 30)),
                    Cell::new(ui::truncate_with_ellipsis(&record.journal, 25)),
                    Cell::new(&record.year),
                    Cell::new(format!("{} {}", ui::source_icon(&record.source), record.source)),
                    Cell::new(&record.link),
                ]);
            }
            println!("{table}");
        }
    }

    Ok(())
}
