//! # eventscout CLI
//!
//! Command-line entry point for the event extraction pipeline.
//!
//! - `run`: scrape every category, then merge (the default)
//! - `scrape`: scrape only, optionally restricted with `--only`
//! - `merge`: rebuild the unified artifact from existing category artifacts
//! - `links`: list the detail-page links inside each category's listing
//!
//! Individual categories may fail without failing the process; only a
//! configuration problem exits with an error.

mod telemetry;

use clap::{Args, Parser, Subcommand};
use eventscout::{
    category::CategoryTable,
    config::{DEFAULT_CONFIG_PATH, ScraperConfig},
    extractor::SchemaExtractor,
    fetch::HttpFetcher,
    merge::Merger,
    model::{self, LlmProvider},
    pipeline::{self, Orchestrator, RunReport},
    storage,
};
use rig::completion::CompletionModel;
use std::path::PathBuf;
use tracing::{error, info, instrument};

#[derive(Parser, Debug)]
#[command(author, version, about = "Extracts structured event listings from CosmoCaixa pages", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Export spans over OTLP
    #[arg(long, global = true)]
    otlp: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape every category and merge the results
    Run,

    /// Scrape categories without merging
    Scrape(ScrapeArgs),

    /// Merge existing category artifacts
    Merge,

    /// Collect detail-page links from each category listing
    Links(LinksArgs),
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Only scrape these categories (repeatable)
    #[arg(short, long)]
    only: Vec<String>,
}

#[derive(Args, Debug)]
struct LinksArgs {
    /// Keep links starting with this prefix
    #[arg(short, long, default_value = "https://cosmocaixa.org/es/p/")]
    prefix: String,

    /// Where to write the links map
    #[arg(short, long, default_value = "urls.json")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _otel = telemetry::init_tracing_subscriber(cli.otlp)?;

    let config = ScraperConfig::load(&cli.config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let table = config.category_table()?;
            scrape_command(&config, &table).await?;
            merge_command(&config).await?;
        }
        Commands::Scrape(args) => {
            let mut table = config.category_table()?;
            if !args.only.is_empty() {
                table = table.select(&args.only)?;
            }
            scrape_command(&config, &table).await?;
        }
        Commands::Merge => {
            merge_command(&config).await?;
        }
        Commands::Links(args) => {
            links_command(&config, args).await?;
        }
    }

    Ok(())
}

#[instrument(skip_all)]
async fn scrape_command(config: &ScraperConfig, table: &CategoryTable) -> anyhow::Result<RunReport> {
    let fetcher = HttpFetcher::new(config.fetch_config()?)?;
    let api_key = config.llm_api_key()?;
    let requests_per_minute = config.requests_per_minute()?;
    let extractor_config = config.extractor_config()?;

    info!("Extracting with {:?} model {}", config.llm_provider, config.llm_name);
    let report = match config.llm_provider {
        LlmProvider::OpenAi => {
            let model = model::openai(api_key, &config.llm_name, requests_per_minute);
            run_jobs(config, table, fetcher, SchemaExtractor::new(model, extractor_config)).await
        }
        LlmProvider::Gemini => {
            let model = model::gemini(api_key, &config.llm_name, requests_per_minute);
            run_jobs(config, table, fetcher, SchemaExtractor::new(model, extractor_config)).await
        }
    };

    print!("{}", report);
    println!(
        "{} of {} categories extracted, {} events",
        report.successes().count(),
        report.len(),
        report.total_records()
    );
    Ok(report)
}

async fn run_jobs<C>(
    config: &ScraperConfig,
    table: &CategoryTable,
    fetcher: HttpFetcher,
    extractor: SchemaExtractor<C>,
) -> RunReport
where
    C: CompletionModel + 'static,
{
    Orchestrator::new(fetcher, extractor, config.output_dir.clone())
        .with_concurrency(config.concurrency(table.len()))
        .run(table)
        .await
}

#[instrument(skip_all)]
async fn merge_command(config: &ScraperConfig) -> anyhow::Result<()> {
    let table = config.category_table()?;
    let merger = Merger::from_table(&table, &config.output_dir, &config.merge_order()?);

    match merger.merge_to(&config.merged_path).await {
        Ok(count) => println!("Merged {} events into {}", count, config.merged_path.display()),
        Err(e) => error!("Could not write merged events: {}", e),
    }

    Ok(())
}

#[instrument(skip(config))]
async fn links_command(config: &ScraperConfig, args: LinksArgs) -> anyhow::Result<()> {
    let table = config.category_table()?;
    let fetcher = HttpFetcher::new(config.fetch_config()?)?;

    let links = pipeline::discover_links(&fetcher, &table, &args.prefix).await;
    for (category, urls) in &links {
        match urls {
            Some(urls) => println!("{}: {} links", category, urls.len()),
            None => println!("{}: fetch failed", category),
        }
    }

    match storage::write_json(&args.output, &links).await {
        Ok(()) => println!("Saved links to {}", args.output.display()),
        Err(e) => error!("Could not write links: {}", e),
    }

    Ok(())
}
