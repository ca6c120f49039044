pub mod browser;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod crawler;
pub mod export;
pub mod frontier;
pub mod logging;
pub mod metadata;
pub mod models;
pub mod network;
pub mod parser;
pub mod server;
pub mod store;
pub mod taxonomy;
pub mod url_utils;
pub mod viewer;

// Re-export main types for library usage
pub use browser::BrowserFetcher;
pub use checkpoint::Checkpoint;
pub use crawler::{CrawlError, CrawlOutcome, CrawlerConfig, DocsCrawler};
pub use frontier::{Frontier, FrontierStats, QueuedUrl};
pub use metadata::{PageInfo, TitleRules};
pub use models::{DocPage, FailedPage};
pub use network::{FetchError, FetchResult, Fetcher, HttpClient};
pub use parser::{extract_doc_links, extract_links};
pub use store::{InternalLink, LinkMap, LinkStore, StoreError};
pub use taxonomy::{Section, Subsection, Taxonomy, TaxonomyError, TaxonomyMetadata};
pub use url_utils::DocsScope;
pub use viewer::{build_html, ViewerOptions};
