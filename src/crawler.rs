use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio::time::{sleep, Duration};

use crate::checkpoint::Checkpoint;
use crate::config::Config;
use crate::frontier::{Frontier, QueuedUrl};
use crate::metadata::{PageInfo, TitleRules};
use crate::models::{DocPage, FailedPage};
use crate::network::{FetchError, FetchResult, Fetcher};
use crate::parser;
use crate::url_utils::{self, DocsScope};

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("Invalid base URL {url}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Checkpoint belongs to {found}, not {expected}")]
    CheckpointMismatch { expected: String, found: String },
}

#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub base_url: String,
    pub max_depth: u32,
    pub max_pages: usize,
    /// Concurrent fetches; 1 keeps the crawl strictly sequential
    pub workers: usize,
    /// Pause before each dispatch after the first
    pub delay_ms: u64,
    pub checkpoint_interval: usize,
    pub checkpoint_path: Option<PathBuf>,
    pub title_rules: TitleRules,
    /// Section slugs queued at depth 1 next to the base URL
    pub seed_sections: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: Config::DEFAULT_BASE_URL.to_string(),
            max_depth: Config::DEFAULT_MAX_DEPTH,
            max_pages: Config::DEFAULT_MAX_PAGES,
            workers: Config::DEFAULT_WORKERS,
            delay_ms: Config::DEFAULT_DELAY_MS,
            checkpoint_interval: Config::CHECKPOINT_INTERVAL,
            checkpoint_path: None,
            title_rules: TitleRules::default(),
            seed_sections: Vec::new(),
        }
    }
}

/// Everything a finished (or interrupted) crawl produced
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    pub base_url: String,
    pub fetch_mode: String,
    pub pages: BTreeMap<String, DocPage>,
    pub failed: Vec<FailedPage>,
    pub duration_secs: u64,
}

impl CrawlOutcome {
    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn failed_pages(&self) -> usize {
        self.failed.len()
    }

    pub fn max_depth_reached(&self) -> u32 {
        self.pages.values().map(|p| p.depth).max().unwrap_or(0)
    }
}

/// Result from handling one URL
struct PageResult {
    queued: QueuedUrl,
    result: Result<DocPage, FetchError>,
}

/// Breadth-first documentation crawler.
///
/// The frontier and the collected pages live on the driving task; fetches fan out to
/// at most `workers` spawned tasks.
#[derive(Clone)]
pub struct DocsCrawler {
    config: CrawlerConfig,
    scope: DocsScope,
    fetcher: Arc<dyn Fetcher>,
    running: Arc<Mutex<bool>>,
}

impl DocsCrawler {
    pub fn new(config: CrawlerConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self, CrawlError> {
        let scope = DocsScope::new(&config.base_url).map_err(|source| CrawlError::InvalidBaseUrl {
            url: config.base_url.clone(),
            source,
        })?;

        Ok(Self {
            config,
            scope,
            fetcher,
            running: Arc::new(Mutex::new(false)),
        })
    }

    pub fn scope(&self) -> &DocsScope {
        &self.scope
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Ask a running crawl to wind down after the fetches already in flight.
    pub fn stop(&self) {
        *self.running.lock() = false;
    }

    pub fn is_running(&self) -> bool {
        *self.running.lock()
    }

    /// Crawl from the base URL (and any seed sections).
    pub async fn crawl(&self) -> Result<CrawlOutcome, CrawlError> {
        let mut frontier = Frontier::new(self.config.max_depth);
        let base = self.scope.base_url().to_string();
        frontier.push(&base, 0, None);
        for section in &self.config.seed_sections {
            let section = section.trim_matches('/');
            if section.is_empty() {
                continue;
            }
            frontier.push(&format!("{}/{}", base, section), 1, Some(base.clone()));
        }

        self.run(frontier, CrawlOutcome::default()).await
    }

    /// Continue a crawl from the configured checkpoint file.
    pub async fn resume(&self) -> Result<CrawlOutcome, CrawlError> {
        let path = match &self.config.checkpoint_path {
            Some(path) if path.is_file() => path,
            _ => {
                tracing::warn!("No checkpoint to resume from, starting a fresh crawl");
                return self.crawl().await;
            }
        };

        let checkpoint = Checkpoint::load(path)?;
        if checkpoint.base_url != self.scope.base_url() {
            return Err(CrawlError::CheckpointMismatch {
                expected: self.scope.base_url().to_string(),
                found: checkpoint.base_url,
            });
        }

        tracing::info!(
            pages = checkpoint.pages.len(),
            queued = checkpoint.frontier.queue.len(),
            "Resuming crawl from {}",
            path.display()
        );

        let outcome = CrawlOutcome {
            pages: checkpoint
                .pages
                .into_iter()
                .map(|p| (p.url.clone(), p))
                .collect(),
            failed: checkpoint.failed,
            ..CrawlOutcome::default()
        };
        let frontier = Frontier::restore(checkpoint.frontier, self.config.max_depth);
        self.run(frontier, outcome).await
    }

    // Core crawl loop that schedules work, tracks progress, and handles shutdown
    async fn run(
        &self,
        mut frontier: Frontier,
        mut outcome: CrawlOutcome,
    ) -> Result<CrawlOutcome, CrawlError> {
        let start = Instant::now();
        *self.running.lock() = true;

        outcome.base_url = self.scope.base_url().to_string();
        outcome.fetch_mode = self.fetcher.name().to_string();

        tracing::info!(
            base_url = %outcome.base_url,
            mode = %outcome.fetch_mode,
            max_depth = self.config.max_depth,
            max_pages = self.config.max_pages,
            workers = self.config.workers,
            "Starting crawl"
        );

        let max_concurrent = self.config.workers.max(1);
        let mut in_flight: JoinSet<PageResult> = JoinSet::new();
        // dispatched but not yet recorded, in dispatch order
        let mut fetching: Vec<QueuedUrl> = Vec::new();
        let mut dispatched = 0usize;
        let mut last_checkpoint = outcome.total_pages();

        loop {
            if !self.is_running() {
                tracing::info!("Stop requested, draining {} in-flight fetches", in_flight.len());
                break;
            }

            // Phase 1: fill worker pool
            while in_flight.len() < max_concurrent
                && outcome.total_pages() + in_flight.len() < self.config.max_pages
                && self.is_running()
            {
                let Some(next) = frontier.pop() else {
                    break;
                };

                if dispatched > 0 && self.config.delay_ms > 0 {
                    sleep(Duration::from_millis(self.config.delay_ms)).await;
                }
                dispatched += 1;
                fetching.push(next.clone());

                let task = self.clone();
                in_flight.spawn(async move { task.process_url(next).await });
            }

            // Phase 2: collect one completed task; an empty set means we are done
            let Some(joined) = in_flight.join_next().await else {
                break;
            };

            let recorded = match joined {
                Ok(done) => {
                    fetching.retain(|q| q.url != done.queued.url);
                    self.record(done, &mut frontier, &mut outcome)
                }
                Err(e) => {
                    tracing::error!("Task join error: {}", e);
                    false
                }
            };
            if !recorded {
                continue;
            }

            let pages = outcome.total_pages();
            if pages % Config::PROGRESS_INTERVAL == 0 {
                let rate = pages as f64 / start.elapsed().as_secs_f64().max(1.0) * 60.0;
                tracing::info!(
                    "Progress: {} pages ({:.1}/min), {} failed | {}",
                    pages,
                    rate,
                    outcome.failed_pages(),
                    frontier.stats()
                );
            }

            if self.config.checkpoint_interval > 0
                && pages >= last_checkpoint + self.config.checkpoint_interval
            {
                self.write_checkpoint(&frontier, &fetching, &outcome);
                last_checkpoint = pages;
            }
        }

        // Drain any tasks that are still running; their children are still queued for a resume
        while let Some(joined) = in_flight.join_next().await {
            if let Ok(done) = joined {
                fetching.retain(|q| q.url != done.queued.url);
                self.record(done, &mut frontier, &mut outcome);
            }
        }

        self.write_checkpoint(&frontier, &fetching, &outcome);
        *self.running.lock() = false;

        outcome.duration_secs += start.elapsed().as_secs();
        tracing::info!(
            "Crawl completed. Pages: {}, Failed: {}, Max depth: {}",
            outcome.total_pages(),
            outcome.failed_pages(),
            outcome.max_depth_reached()
        );

        Ok(outcome)
    }

    /// Fold one finished fetch into the outcome. Returns whether a page was added.
    fn record(&self, done: PageResult, frontier: &mut Frontier, outcome: &mut CrawlOutcome) -> bool {
        match done.result {
            Ok(page) => {
                let added = frontier.add_links(page.children.iter().cloned(), page.depth + 1, &page.url);
                tracing::info!(
                    "[Depth {}] Page {}: {} ({} links, {} new)",
                    page.depth,
                    outcome.total_pages() + 1,
                    page.title,
                    page.children.len(),
                    added
                );
                outcome.pages.insert(page.url.clone(), page);
                true
            }
            Err(e) => {
                tracing::warn!(url = %done.queued.url, error = %e, "Failed to crawl page");
                outcome.failed.push(FailedPage {
                    url: done.queued.url,
                    depth: done.queued.depth,
                    error: e.to_string(),
                });
                false
            }
        }
    }

    /// Fetch one URL and turn it into a page
    async fn process_url(&self, queued: QueuedUrl) -> PageResult {
        let result = match self.fetcher.fetch(&queued.url).await {
            Ok(fetched) => self.build_page(&queued, fetched),
            Err(e) => Err(e),
        };
        PageResult { queued, result }
    }

    fn build_page(&self, queued: &QueuedUrl, fetched: FetchResult) -> Result<DocPage, FetchError> {
        if let Some(ct) = fetched.content_type.as_deref() {
            if !url_utils::is_html_content_type(ct) {
                return Err(FetchError::BodyError(format!("unsupported content type {}", ct)));
            }
        }
        Ok(page_from_html(
            queued,
            &fetched.content,
            &fetched.final_url,
            &self.scope,
            &self.config.title_rules,
        ))
    }

    fn write_checkpoint(&self, frontier: &Frontier, fetching: &[QueuedUrl], outcome: &CrawlOutcome) {
        let Some(path) = &self.config.checkpoint_path else {
            return;
        };
        let checkpoint = Checkpoint::capture(self.scope.base_url(), frontier, fetching, outcome);
        match checkpoint.save(path) {
            Ok(()) => tracing::info!("Checkpoint saved at {} pages", outcome.total_pages()),
            Err(e) => tracing::error!("Failed to save checkpoint: {}", e),
        }
    }
}

/// Assemble a page record from rendered HTML.
///
/// Links are resolved against `resolve_base` (the post-redirect URL) but the page is
/// keyed and located by the URL it was queued under.
pub fn page_from_html(
    queued: &QueuedUrl,
    html: &str,
    resolve_base: &str,
    scope: &DocsScope,
    rules: &TitleRules,
) -> DocPage {
    let info = PageInfo::extract(html, rules);
    let children = parser::extract_doc_links(html, resolve_base, scope);

    let mut page = DocPage::new(queued.url.clone(), queued.depth, queued.parent_url.clone());
    page.title = info.title;
    page.description = info.description;
    page.meta_description = info.meta_description;
    page.breadcrumbs = info.breadcrumbs;
    page.h1_heading = info.h1_heading;
    page.h2_headings = info.h2_headings;
    page.children = children;
    page.set_location(scope.section_path(&queued.url));
    page
}
