//! JavaScript-rendering fetcher.
//!
//! Single-page documentation sites ship an empty shell and build their navigation in the
//! browser, so a plain GET sees no links. `BrowserFetcher` drives a headless Chromium-family
//! binary in `--dump-dom` mode and hands back the DOM after scripts have run.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::Config;
use crate::network::{FetchError, FetchResult, Fetcher};

#[derive(Debug, Clone)]
pub struct BrowserFetcher {
    binary: PathBuf,
    user_agent: String,
    timeout_duration: Duration,
    virtual_time_ms: u64,
    max_content_size: usize,
}

impl BrowserFetcher {
    pub fn new(binary: impl Into<PathBuf>, user_agent: String, timeout_secs: u64) -> Self {
        Self {
            binary: binary.into(),
            user_agent,
            timeout_duration: Duration::from_secs(timeout_secs),
            virtual_time_ms: Config::BROWSER_VIRTUAL_TIME_MS,
            max_content_size: Config::MAX_CONTENT_SIZE,
        }
    }

    /// How long the page's timers may run before the DOM is dumped.
    pub fn with_virtual_time(mut self, virtual_time_ms: u64) -> Self {
        self.virtual_time_ms = virtual_time_ms;
        self
    }

    pub fn args(&self, url: &str) -> Vec<String> {
        vec![
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--window-size=1920,1080".to_string(),
            format!("--user-agent={}", self.user_agent),
            format!("--virtual-time-budget={}", self.virtual_time_ms),
            "--dump-dom".to_string(),
            url.to_string(),
        ]
    }
}

#[async_trait]
impl Fetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let child = Command::new(&self.binary)
            .args(self.args(url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                FetchError::Browser(format!("failed to launch {}: {}", self.binary.display(), e))
            })?;

        let output = timeout(self.timeout_duration, child.wait_with_output())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let first_line = stderr.lines().next().unwrap_or_default().to_string();
            return Err(FetchError::Browser(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                first_line
            )));
        }

        if output.stdout.len() > self.max_content_size {
            return Err(FetchError::ContentTooLarge(
                output.stdout.len(),
                self.max_content_size,
            ));
        }

        let content = String::from_utf8_lossy(&output.stdout).into_owned();
        if content.trim().is_empty() {
            return Err(FetchError::BodyError("browser returned an empty document".to_string()));
        }

        Ok(FetchResult {
            final_url: url.to_string(),
            content,
            status_code: 200,
            content_type: Some("text/html".to_string()),
        })
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}
