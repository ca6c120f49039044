// Global configuration constants - single source of truth

pub struct Config;

impl Config {
    // Crawl defaults
    pub const DEFAULT_BASE_URL: &'static str = "https://docs.dynatrace.com/docs";
    pub const DEFAULT_MAX_DEPTH: u32 = 50;
    pub const DEFAULT_MAX_PAGES: usize = 5000;
    pub const DEFAULT_DELAY_MS: u64 = 2000;
    pub const DEFAULT_WORKERS: usize = 1;
    pub const CHECKPOINT_INTERVAL: usize = 50;
    pub const PROGRESS_INTERVAL: usize = 10;
    pub const DEFAULT_USER_AGENT: &'static str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36 DocsTaxonomy/0.1";

    // Link filtering
    pub const MAX_PATH_SEGMENTS: usize = 15;
    pub const DESCRIPTION_MAX_CHARS: usize = 500;
    pub const DESCRIPTION_MIN_CHARS: usize = 10;

    // HTTP/Network config
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    pub const MAX_CONTENT_SIZE: usize = 10 * 1024 * 1024; // 10MB
    pub const MAX_RETRIES: u32 = 2;
    pub const RETRY_BACKOFF_MS: u64 = 500;
    pub const MAX_REDIRECTS: usize = 5;

    // Headless browser
    pub const DEFAULT_BROWSER_BIN: &'static str = "chromium";
    pub const BROWSER_VIRTUAL_TIME_MS: u64 = 5000;

    // Output files
    pub const DEFAULT_DATA_DIR: &'static str = "./data";
    pub const DEFAULT_TAXONOMY_FILE: &'static str = "docs_taxonomy.json";
    pub const DEFAULT_TAXONOMY_ONLY_FILE: &'static str = "docs_taxonomy_taxonomy_only.json";
    pub const DEFAULT_HTML_FILE: &'static str = "docs_hierarchy.html";
    pub const DEFAULT_CHECKPOINT_FILE: &'static str = "crawl_checkpoint.json";

    // Annotation server
    pub const DEFAULT_BIND: &'static str = "127.0.0.1:5000";
    pub const DEFAULT_STORE_FILE: &'static str = "stored_links.json";
    pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
}
