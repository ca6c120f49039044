use docs_taxonomy::browser::BrowserFetcher;
use docs_taxonomy::cli::{Cli, Commands, FetchMode};
use docs_taxonomy::config::Config;
use docs_taxonomy::crawler::{CrawlError, CrawlerConfig, DocsCrawler};
use docs_taxonomy::export::{self, export_to_jsonl};
use docs_taxonomy::logging::init_logging_in_data_dir;
use docs_taxonomy::metadata::TitleRules;
use docs_taxonomy::network::{FetchError, Fetcher, HttpClient};
use docs_taxonomy::server::{self, AppState};
use docs_taxonomy::store::LinkStore;
use docs_taxonomy::taxonomy::{Taxonomy, TaxonomyError};
use docs_taxonomy::url_utils::normalize_url_for_cli;
use docs_taxonomy::viewer::{self, ViewerOptions};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MainError {
    #[error("Crawler error: {0}")]
    Crawler(#[from] CrawlError),

    #[error("Fetcher error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Taxonomy error: {0}")]
    Taxonomy(#[from] TaxonomyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Export error: {0}")]
    Export(String),
}

struct CrawlArgs {
    base_url: String,
    max_depth: u32,
    max_pages: usize,
    workers: usize,
    delay_ms: u64,
    timeout: u64,
    user_agent: String,
    mode: FetchMode,
    browser_bin: String,
    output: String,
    taxonomy_only: bool,
    export_jsonl: bool,
    checkpoint_interval: usize,
    checkpoint: Option<String>,
    resume: bool,
    seed_sections: Vec<String>,
    title_suffix: Option<String>,
    generic_title: Option<String>,
    data_dir: String,
}

fn build_fetcher(args: &CrawlArgs) -> Result<Arc<dyn Fetcher>, FetchError> {
    let fetcher: Arc<dyn Fetcher> = match args.mode {
        FetchMode::Http => Arc::new(HttpClient::new(args.user_agent.clone(), args.timeout)?),
        FetchMode::Browser => Arc::new(BrowserFetcher::new(
            &args.browser_bin,
            args.user_agent.clone(),
            args.timeout,
        )),
    };
    Ok(fetcher)
}

fn build_crawler_config(args: &CrawlArgs) -> CrawlerConfig {
    let checkpoint_path = args
        .checkpoint
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(&args.data_dir).join(Config::DEFAULT_CHECKPOINT_FILE));

    CrawlerConfig {
        base_url: normalize_url_for_cli(&args.base_url),
        max_depth: args.max_depth,
        max_pages: args.max_pages,
        workers: args.workers,
        delay_ms: args.delay_ms,
        checkpoint_interval: args.checkpoint_interval,
        checkpoint_path: Some(checkpoint_path),
        title_rules: TitleRules {
            site_suffix: args.title_suffix.clone(),
            generic_title: args.generic_title.clone(),
        },
        seed_sections: args.seed_sections.clone(),
    }
}

/// Ctrl+C asks the crawler to stop; the crawl loop drains in-flight pages, checkpoints
/// and returns normally so results are still written.
fn setup_signal_handler(crawler: DocsCrawler) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nReceived Ctrl+C, finishing in-flight pages and saving results...");
            crawler.stop();
        }
    })
}

async fn run_crawl_command(args: CrawlArgs) -> Result<(), MainError> {
    init_logging_in_data_dir(&args.data_dir).map_err(|e| MainError::Logging(e.to_string()))?;

    let config = build_crawler_config(&args);
    println!(
        "Crawling {} ({} mode, {} workers, max depth {}, max pages {})",
        config.base_url,
        match args.mode {
            FetchMode::Http => "http",
            FetchMode::Browser => "browser",
        },
        config.workers,
        config.max_depth,
        config.max_pages
    );

    let fetcher = build_fetcher(&args)?;
    let crawler = DocsCrawler::new(config, fetcher)?;
    let signal_handler = setup_signal_handler(crawler.clone());

    let outcome = if args.resume {
        crawler.resume().await?
    } else {
        crawler.crawl().await?
    };
    signal_handler.abort();

    let taxonomy = Taxonomy::from_outcome(&outcome, crawler.config());
    let output = Path::new(&args.output);
    let saved = export::save_results(output, &taxonomy, &outcome.pages, args.taxonomy_only)?;

    if args.export_jsonl {
        let path = output.with_extension("jsonl");
        let mut writer = BufWriter::new(File::create(&path)?);
        export_to_jsonl(outcome.pages.values(), &mut writer)
            .map_err(|e| MainError::Export(e.to_string()))?;
        writer.flush()?;
        println!("Exported to: {}", path.display());
    }

    println!(
        "Crawled {} pages ({} failed, max depth {}) in {}s",
        outcome.total_pages(),
        outcome.failed_pages(),
        outcome.max_depth_reached(),
        outcome.duration_secs
    );
    println!("Taxonomy: {}", saved.taxonomy_only.display());
    if let Some(full) = &saved.full {
        println!("Full results: {}", full.display());
    }

    println!("\nSections found:");
    for section in taxonomy.summary() {
        println!(
            "  - {}: {} pages, {} subsections",
            section.name, section.total_pages, section.subsections
        );
    }

    Ok(())
}

fn run_render_command(
    taxonomy: String,
    output: String,
    title: String,
    storage_server: Option<String>,
) -> Result<(), MainError> {
    let taxonomy = Taxonomy::load(Path::new(&taxonomy))?;
    let options = ViewerOptions {
        title,
        storage_server,
    };
    viewer::write_html(Path::new(&output), &taxonomy, &options)?;
    println!("Generated {} ({} pages)", output, taxonomy.page_count());
    Ok(())
}

async fn run_serve_command(bind: String, data_file: String) -> Result<(), MainError> {
    init_logging_in_data_dir(Config::DEFAULT_DATA_DIR).map_err(|e| MainError::Logging(e.to_string()))?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    let state = AppState::new(LinkStore::new(data_file));
    server::serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Received Ctrl+C, shutting down annotation server");
    })
    .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), MainError> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Crawl {
            base_url,
            max_depth,
            max_pages,
            workers,
            delay_ms,
            timeout,
            user_agent,
            mode,
            browser_bin,
            output,
            taxonomy_only,
            export_jsonl,
            checkpoint_interval,
            checkpoint,
            resume,
            seed_sections,
            title_suffix,
            generic_title,
            data_dir,
        } => {
            run_crawl_command(CrawlArgs {
                base_url,
                max_depth,
                max_pages,
                workers,
                delay_ms,
                timeout,
                user_agent,
                mode,
                browser_bin,
                output,
                taxonomy_only,
                export_jsonl,
                checkpoint_interval,
                checkpoint,
                resume,
                seed_sections,
                title_suffix,
                generic_title,
                data_dir,
            })
            .await?;
        }

        Commands::Render {
            taxonomy,
            output,
            title,
            storage_server,
        } => {
            run_render_command(taxonomy, output, title, storage_server)?;
        }

        Commands::Serve { bind, data_file } => {
            run_serve_command(bind, data_file).await?;
        }
    }

    Ok(())
}
