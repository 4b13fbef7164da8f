//! # kb-crawler CLI
//!
//! Command-line front end for the crawler and the site scrapers.
//!
//! ## Subcommands
//!
//! - `crawl`: keyword-guided crawl from a settings file, storing chunks
//! - `scrape`: run a site scraper and write one file per document
//! - `chunk`: clean and chunk a local HTML or Markdown file, printing JSON

mod telemetry;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use kb_crawler::config::CrawlSettings;
use kb_crawler::crawler::storage::StorageConfig;
use kb_crawler::crawler::{
    CrawlSummary, Crawler, CrawlerConfig, DocumentStore, Fetcher, JsonLinesStore, XmlStore,
    body_html, clean_markdown, html_to_markdown,
};
use kb_crawler::processor::{ChunkOptions, chunk_text};
use kb_crawler::sites::{
    AprScraper, Document, DocumentFormat, RppaScraper, SiteScraper, min_text_len, save_documents,
    split_by_headers, tag_issue,
};
use tracing::{info, instrument};

const USER_AGENT: &str = "kb-crawler/0.1";

#[derive(Parser)]
#[command(author, version, about = "Keyword-guided web crawler for building knowledge bases", long_about = None)]
struct Cli {
    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl from a seed URL, following keyword-matching links
    Crawl(CrawlArgs),

    /// Scrape the air passenger rights sites into documents grouped by issue
    Scrape(ScrapeArgs),

    /// Clean and chunk a local HTML or Markdown file
    Chunk(ChunkArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StoreFormat {
    /// One XML file per page
    Xml,
    /// One JSON record per chunk, appended to a single file
    Jsonl,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Site {
    /// airpassengerrights.ca practical guides
    Apr,
    /// rppa-appr.ca passenger rights pages
    Rppa,
    /// Both sites
    All,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Md,
    Json,
}

impl From<OutputFormat> for DocumentFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Md => DocumentFormat::Markdown,
            OutputFormat::Json => DocumentFormat::Json,
        }
    }
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Settings file (YAML, or JSON with a .json extension)
    #[arg(short, long, default_value = "crawl.yaml")]
    config: PathBuf,

    /// Override the seed URL
    #[arg(short, long)]
    url: Option<String>,

    /// Override the keywords (comma-separated)
    #[arg(short, long)]
    keywords: Option<String>,

    /// Where to store chunks (a directory for xml, a file for jsonl)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Storage format
    #[arg(short, long, value_enum, default_value = "jsonl")]
    format: StoreFormat,

    /// Maximum number of pages to crawl
    #[arg(short = 'p', long)]
    max_pages: Option<u32>,

    /// Rate limit in milliseconds
    #[arg(short, long)]
    rate: Option<u64>,
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Seed URLs; defaults to each site's built-in list
    seeds: Vec<String>,

    /// Which site to scrape
    #[arg(long, value_enum, default_value = "all")]
    site: Site,

    /// How many links deep to follow from each seed; defaults per site
    #[arg(short = 'd', long)]
    max_depth: Option<usize>,

    /// Drop documents with this many characters or fewer
    #[arg(short, long, default_value = "40")]
    min_chars: usize,

    /// Split documents into one per section heading
    #[arg(short, long)]
    split_headers: bool,

    /// Output directory
    #[arg(short, long, default_value = "documents")]
    out: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "md")]
    format: OutputFormat,

    /// Rate limit in milliseconds
    #[arg(short, long, default_value = "500")]
    rate: u64,
}

#[derive(Args, Debug)]
struct ChunkArgs {
    /// File to chunk; treated as HTML when it has an .html or .htm extension
    #[arg(required = true)]
    file: PathBuf,

    /// Chunk size in characters
    #[arg(short, long, default_value = "1000")]
    chunk_size: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _otel = telemetry::init_tracing_subscriber(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Crawl(args) => crawl_command(args).await?,
        Commands::Scrape(args) => scrape_command(args).await?,
        Commands::Chunk(args) => chunk_command(args).await?,
    }

    Ok(())
}

#[instrument]
async fn crawl_command(args: CrawlArgs) -> anyhow::Result<()> {
    let mut settings = CrawlSettings::load(&args.config)
        .await
        .with_context(|| format!("loading {}", args.config.display()))?;

    if let Some(url) = args.url {
        settings.initial_url = url;
    }
    if let Some(keywords) = args.keywords {
        settings.query_keywords = keywords
            .split(',')
            .map(|keyword| keyword.trim().to_string())
            .filter(|keyword| !keyword.is_empty())
            .collect();
    }
    if let Some(output) = args.output {
        settings.output = Some(output);
    }
    if args.max_pages.is_some() {
        settings.max_pages = args.max_pages;
    }
    if let Some(rate) = args.rate {
        settings.rate_limit_ms = rate;
    }

    let config = CrawlerConfig::builder()
        .max_pages(settings.max_pages)
        .rate_limit_ms(settings.rate_limit_ms)
        .user_agent(USER_AGENT)
        .build();

    println!(
        "Crawling {} for {:?}...",
        settings.initial_url, settings.query_keywords
    );

    let summary = match args.format {
        StoreFormat::Xml => {
            let store = match &settings.output {
                Some(dir) => XmlStore::with_config(StorageConfig {
                    base_path: dir.clone(),
                }),
                None => XmlStore::default(),
            };
            crawl_into(&config, store, &settings).await?
        }
        StoreFormat::Jsonl => {
            let path = settings
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from("chunks.jsonl"));
            let store = JsonLinesStore::open(path).await?;
            crawl_into(&config, store, &settings).await?
        }
    };

    println!(
        "Crawled {} pages ({} failed), stored {} chunks, discovered {} URLs",
        summary.pages_processed,
        summary.pages_failed,
        summary.chunks_stored,
        summary.urls_discovered
    );
    if summary.budget_exhausted {
        println!("Stopped at the page budget with URLs left to crawl");
    }

    Ok(())
}

async fn crawl_into<S: DocumentStore>(
    config: &CrawlerConfig,
    store: S,
    settings: &CrawlSettings,
) -> anyhow::Result<CrawlSummary> {
    let mut crawler = Crawler::from_config(config, store, settings.query_keywords.clone())?
        .with_chunk_options(ChunkOptions::with_max_chunk_size(settings.max_chunk_size));

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("[{elapsed_precise}] {spinner} {msg}")
            .unwrap(),
    );
    spinner.set_message(format!("Crawling {}", settings.initial_url));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = crawler.run(&settings.initial_url).await;
    spinner.finish_and_clear();

    Ok(result?)
}

#[instrument]
async fn scrape_command(args: ScrapeArgs) -> anyhow::Result<()> {
    if !args.seeds.is_empty() && args.site == Site::All {
        anyhow::bail!("Seeds can only be given together with --site apr or --site rppa");
    }

    let config = CrawlerConfig::builder()
        .rate_limit_ms(args.rate)
        .user_agent(USER_AGENT)
        .build();
    let fetcher = Fetcher::new(&config)?;

    let mut documents = Vec::new();
    if matches!(args.site, Site::Apr | Site::All) {
        let mut scraper = AprScraper::new(fetcher.clone());
        if args.max_depth.is_some() {
            scraper = scraper.with_max_depth(args.max_depth);
        }
        let seeds = seeds_or(&args.seeds, AprScraper::default_seeds);
        documents.extend(scrape_site(&scraper, &seeds).await?);
    }
    if matches!(args.site, Site::Rppa | Site::All) {
        let mut scraper = RppaScraper::new(fetcher.clone());
        if args.max_depth.is_some() {
            scraper = scraper.with_max_depth(args.max_depth);
        }
        let seeds = seeds_or(&args.seeds, RppaScraper::default_seeds);
        documents.extend(scrape_site(&scraper, &seeds).await?);
    }

    if args.split_headers {
        documents = documents.into_iter().flat_map(split_by_headers).collect();
    }
    let documents: Vec<Document> = documents
        .into_iter()
        .filter_map(|doc| min_text_len(doc, args.min_chars))
        .filter_map(tag_issue)
        .collect();

    let written = save_documents(&documents, &args.out, args.format.into()).await?;
    println!(
        "Saved {} documents to {}",
        written.len(),
        args.out.display()
    );

    Ok(())
}

fn seeds_or(seeds: &[String], defaults: fn() -> Vec<String>) -> Vec<String> {
    if seeds.is_empty() {
        defaults()
    } else {
        seeds.to_vec()
    }
}

async fn scrape_site(scraper: &impl SiteScraper, seeds: &[String]) -> anyhow::Result<Vec<Document>> {
    println!("Scraping {} seeds...", seeds.len());
    Ok(scraper.scrape(seeds).await?)
}

#[instrument]
async fn chunk_command(args: ChunkArgs) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;

    let is_html = args
        .file
        .extension()
        .is_some_and(|ext| ext == "html" || ext == "htm");
    let markdown = if is_html {
        html_to_markdown(&body_html(&contents)?)
    } else {
        contents
    };

    let cleaned = clean_markdown(&markdown);
    let chunks = chunk_text(&cleaned, &ChunkOptions::with_max_chunk_size(args.chunk_size));
    info!("Split {} into {} chunks", args.file.display(), chunks.len());

    println!("{}", serde_json::to_string_pretty(&chunks)?);
    Ok(())
}
