//! URL utilities for consistent crawling behavior across modules.

use url::Url;

use crate::config::Config;

/// Substrings that mark a link as non-content (editors, print views, downloads).
const UNWANTED_PATTERNS: &[&str] = &[
    "?", "#", "/edit", "/print", "/download", "javascript:", "mailto:",
];

const DISALLOWED_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".ico", ".css", ".js", ".json",
    ".xml", ".zip", ".mp4", ".mov", ".mp3", ".wav", ".tar", ".gz", ".tgz", ".7z", ".exe",
];

/// The part of the web a crawl is allowed to touch: one host and one path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsScope {
    base_url: String,
    host: String,
    port: Option<u16>,
    path_prefix: String,
}

impl DocsScope {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        let normalized = normalize_url(base_url);
        let parsed = Url::parse(&normalized)?;
        let host = parsed
            .host_str()
            .ok_or(url::ParseError::EmptyHost)?
            .to_string();

        Ok(Self {
            host,
            port: parsed.port(),
            path_prefix: parsed.path().trim_end_matches('/').to_string(),
            base_url: normalized,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// Check if URL belongs to the documentation tree being crawled.
    pub fn is_docs_url(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(_) => return false,
        };

        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }
        if parsed.host_str() != Some(self.host.as_str()) || parsed.port() != self.port {
            return false;
        }
        if !path_has_prefix(parsed.path(), &self.path_prefix) {
            return false;
        }

        if UNWANTED_PATTERNS.iter().any(|p| url.contains(p)) {
            return false;
        }

        let path_depth = parsed.path().split('/').filter(|s| !s.is_empty()).count();
        if path_depth > Config::MAX_PATH_SEGMENTS {
            return false;
        }

        let path = parsed.path().to_ascii_lowercase();
        !DISALLOWED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
    }

    /// Path segments of `url` below the base prefix.
    pub fn relative_segments(&self, url: &str) -> Vec<String> {
        let path = match Url::parse(url) {
            Ok(u) => u.path().to_string(),
            Err(_) => return Vec::new(),
        };
        let rest = path.strip_prefix(&self.path_prefix).unwrap_or(&path);
        rest.split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }

    /// Section and subsection slugs for a page. Pages at the base itself land in `root`.
    pub fn section_path(&self, url: &str) -> (String, String) {
        let segments = self.relative_segments(url);
        let section = segments
            .first()
            .cloned()
            .unwrap_or_else(|| "root".to_string());
        let subsection = segments.get(1).cloned().unwrap_or_default();
        (section, subsection)
    }
}

/// `/docs` matches `/docs` and `/docs/x` but not `/docsearch`.
fn path_has_prefix(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

pub fn extract_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_string()))
}

/// Canonical form used for the visited-set: no query, no fragment, no trailing slash.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    match Url::parse(trimmed) {
        Ok(parsed) => {
            let mut out = format!("{}://", parsed.scheme());
            if let Some(host) = parsed.host_str() {
                out.push_str(&host.to_ascii_lowercase());
            }
            if let Some(port) = parsed.port() {
                out.push_str(&format!(":{}", port));
            }
            out.push_str(parsed.path().trim_end_matches('/'));
            out
        }
        Err(_) => match trimmed.find('#') {
            Some(pos) => trimmed[..pos].to_string(),
            None => trimmed.to_string(),
        },
    }
}

pub fn convert_to_absolute_url(link: &str, base_url: &str) -> Result<String, String> {
    let base = Url::parse(base_url).map_err(|e| e.to_string())?;
    let absolute_url = base.join(link).map_err(|e| e.to_string())?;
    Ok(absolute_url.to_string())
}

/// "ingest-from" -> "Ingest From"
pub fn slug_to_title(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Add https:// prefix for bare domains (CLI convenience).
pub fn normalize_url_for_cli(url: &str) -> String {
    let trimmed = url.trim();

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.to_string();
    }

    format!("https://{}", trimmed)
}

pub fn is_html_content_type(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    lower.starts_with("text/html") || lower.starts_with("application/xhtml+xml")
}
