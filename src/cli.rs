use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;

/// CLI entry point so users can crawl, render and serve from the command line.
/// Exit codes: 0=success, 2=invalid arguments, 1=runtime error
#[derive(Parser, Debug)]
#[command(name = "docs_taxonomy")]
#[command(about = "Crawl a documentation site into a section taxonomy and browse it as HTML")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// How pages are fetched
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchMode {
    /// Plain HTTP GET
    Http,
    /// Headless browser, for sites that build their navigation in JavaScript
    Browser,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl the documentation tree and write the taxonomy JSON.
    Crawl {
        #[arg(
            short,
            long,
            default_value = Config::DEFAULT_BASE_URL,
            help = "Documentation root; only pages below this path are crawled"
        )]
        base_url: String,

        #[arg(long, default_value_t = Config::DEFAULT_MAX_DEPTH, help = "Maximum link depth from the base URL")]
        max_depth: u32,

        #[arg(long, default_value_t = Config::DEFAULT_MAX_PAGES, help = "Stop after this many pages")]
        max_pages: usize,

        #[arg(short, long, default_value_t = Config::DEFAULT_WORKERS, help = "Concurrent fetches")]
        workers: usize,

        #[arg(long, default_value_t = Config::DEFAULT_DELAY_MS, help = "Delay between requests in milliseconds")]
        delay_ms: u64,

        #[arg(short, long, default_value_t = Config::REQUEST_TIMEOUT_SECS, help = "Request timeout in seconds")]
        timeout: u64,

        #[arg(
            short,
            long,
            default_value = Config::DEFAULT_USER_AGENT,
            help = "User agent string for requests"
        )]
        user_agent: String,

        #[arg(long, value_enum, default_value_t = FetchMode::Http, help = "Page fetching strategy")]
        mode: FetchMode,

        #[arg(
            long,
            default_value = Config::DEFAULT_BROWSER_BIN,
            help = "Chromium-compatible binary used in browser mode"
        )]
        browser_bin: String,

        #[arg(
            short,
            long,
            default_value = Config::DEFAULT_TAXONOMY_FILE,
            help = "Full results file; the taxonomy goes to <stem>_taxonomy_only.json"
        )]
        output: String,

        #[arg(long, help = "Only write the taxonomy file")]
        taxonomy_only: bool,

        #[arg(long, help = "Also export every page as JSONL next to the output")]
        export_jsonl: bool,

        #[arg(long, default_value_t = Config::CHECKPOINT_INTERVAL, help = "Pages between checkpoints (0 disables)")]
        checkpoint_interval: usize,

        #[arg(long, help = "Checkpoint file (default: <data-dir>/crawl_checkpoint.json)")]
        checkpoint: Option<String>,

        #[arg(long, help = "Resume from the checkpoint file")]
        resume: bool,

        #[arg(long = "seed-section", help = "Section slug to queue at depth 1 (repeatable)")]
        seed_sections: Vec<String>,

        #[arg(long, help = "Site name stripped from page titles, e.g. \"Dynatrace Docs\"")]
        title_suffix: Option<String>,

        #[arg(long, help = "Site-wide title that should fall back to the page heading")]
        generic_title: Option<String>,

        #[arg(
            short,
            long,
            default_value = Config::DEFAULT_DATA_DIR,
            help = "Directory for logs and checkpoints"
        )]
        data_dir: String,
    },

    /// Render a taxonomy JSON file into a static HTML viewer.
    Render {
        #[arg(
            long,
            default_value = Config::DEFAULT_TAXONOMY_ONLY_FILE,
            help = "Taxonomy JSON file, or a full results file from crawl"
        )]
        taxonomy: String,

        #[arg(short, long, default_value = Config::DEFAULT_HTML_FILE, help = "Output HTML file")]
        output: String,

        #[arg(long, default_value = crate::viewer::DEFAULT_TITLE, help = "Page heading")]
        title: String,

        #[arg(long, help = "Annotation server URL; links stay in localStorage when unset")]
        storage_server: Option<String>,
    },

    /// Run the annotation server the viewer can store internal links in.
    Serve {
        #[arg(short, long, default_value = Config::DEFAULT_BIND, help = "Address to listen on")]
        bind: String,

        #[arg(long, default_value = Config::DEFAULT_STORE_FILE, help = "JSON file holding the links")]
        data_file: String,
    },
}

impl Cli {
    /// Parse CLI arguments so the rest of the program can rely on structured options.
    /// On error, clap prints help and exits with code 2 (usage error).
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
