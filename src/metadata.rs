//! Page information extraction from rendered documentation HTML.
//!
//! Documentation sites rarely agree on markup, so every field is looked up through an
//! ordered list of selectors and the first non-empty match wins:
//! - title: `<title>` (site suffix removed), then headings and title-ish classes
//! - description: meta description, then lead/intro blocks, then the first real paragraph
//! - headings and breadcrumbs for the full results file

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::config::Config;

const TITLE_FALLBACK_SELECTORS: &[&str] = &[
    "h1",
    ".page-title",
    ".title",
    "[data-testid=\"title\"]",
    ".content h1",
    "main h1",
    "article h1",
];

const DESCRIPTION_SELECTORS: &[&str] = &[
    ".lead",
    ".description",
    ".page-description",
    ".intro",
    ".summary",
    ".content > p",
    "main > p",
    "article > p",
    ".markdown > p",
    "p",
];

const BREADCRUMB_SELECTORS: &[&str] = &[
    ".breadcrumb a",
    ".breadcrumbs a",
    "[data-testid=\"breadcrumb\"] a",
    "nav[aria-label=\"breadcrumb\"] a",
    ".page-breadcrumbs a",
    "[aria-label=\"Breadcrumb\"] a",
];

/// Information extracted from one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PageInfo {
    pub title: String,
    pub description: String,
    pub meta_description: String,
    pub breadcrumbs: Vec<String>,
    pub h1_heading: String,
    pub h2_headings: Vec<String>,
}

/// Site-specific knobs for title cleanup.
#[derive(Debug, Clone, Default)]
pub struct TitleRules {
    /// Suffix appended to every `<title>`, e.g. "Dynatrace Docs". Matched after
    /// a dash or em-dash separator.
    pub site_suffix: Option<String>,
    /// Generic site title that carries no page information.
    pub generic_title: Option<String>,
}

impl PageInfo {
    /// Extract page information from an HTML document
    pub fn extract(html: &str, rules: &TitleRules) -> Self {
        let document = Html::parse_document(html);

        let meta_description = meta_content(&document, "description").unwrap_or_default();
        let description = if meta_description.is_empty() {
            extract_description(&document)
        } else {
            truncate_chars(&meta_description, Config::DESCRIPTION_MAX_CHARS)
        };

        Self {
            title: extract_title(&document, rules),
            description,
            meta_description,
            breadcrumbs: extract_breadcrumbs(&document),
            h1_heading: first_text(&document, "h1").unwrap_or_default(),
            h2_headings: all_text(&document, "h2"),
        }
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .map(element_text)
        .find(|s| !s.is_empty())
}

fn all_text(document: &Html, selector: &str) -> Vec<String> {
    match Selector::parse(selector) {
        Ok(selector) => document
            .select(&selector)
            .map(element_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn meta_content(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!("meta[name=\"{}\"]", name)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
}

fn extract_title(document: &Html, rules: &TitleRules) -> String {
    if let Some(raw) = first_text(document, "title") {
        let title = strip_site_suffix(&raw, rules.site_suffix.as_deref());
        let generic = rules
            .generic_title
            .as_deref()
            .is_some_and(|g| g.eq_ignore_ascii_case(&title));
        if !title.is_empty() && !generic {
            return title;
        }
    }

    TITLE_FALLBACK_SELECTORS
        .iter()
        .find_map(|sel| first_text(document, sel))
        .unwrap_or_else(|| "Untitled Page".to_string())
}

/// "Logs — Dynatrace Docs" -> "Logs"
pub fn strip_site_suffix(title: &str, suffix: Option<&str>) -> String {
    let title = title.trim();
    let suffix = match suffix {
        Some(s) if !s.trim().is_empty() => s.trim(),
        _ => return title.to_string(),
    };

    let head = match title.strip_suffix(suffix) {
        Some(head) => head.trim_end(),
        None => return title.to_string(),
    };
    ['—', '–', '-', '|']
        .iter()
        .find_map(|sep| head.strip_suffix(*sep))
        .map(|stripped| stripped.trim_end().to_string())
        .unwrap_or_else(|| title.to_string())
}

fn extract_description(document: &Html) -> String {
    DESCRIPTION_SELECTORS
        .iter()
        .filter_map(|sel| Selector::parse(sel).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .map(element_text)
                .find(|text| text.chars().count() > Config::DESCRIPTION_MIN_CHARS)
        })
        .map(|text| truncate_chars(&text, Config::DESCRIPTION_MAX_CHARS))
        .unwrap_or_else(|| "No description available".to_string())
}

fn extract_breadcrumbs(document: &Html) -> Vec<String> {
    BREADCRUMB_SELECTORS
        .iter()
        .map(|sel| all_text(document, sel))
        .find(|crumbs| !crumbs.is_empty())
        .unwrap_or_default()
}

/// Cut to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> TitleRules {
        TitleRules {
            site_suffix: Some("Dynatrace Docs".to_string()),
            generic_title: Some("Dynatrace Documentation".to_string()),
        }
    }

    #[test]
    fn test_title_suffix_removed() {
        let html = "<html><head><title>Log Monitoring — Dynatrace Docs</title></head></html>";
        let info = PageInfo::extract(html, &rules());
        assert_eq!(info.title, "Log Monitoring");

        let html = "<title>Log Monitoring - Dynatrace Docs</title>";
        assert_eq!(PageInfo::extract(html, &rules()).title, "Log Monitoring");
    }

    #[test]
    fn test_generic_title_falls_back_to_h1() {
        let html = "<title>Dynatrace Documentation</title><body><h1> Getting   started </h1></body>";
        let info = PageInfo::extract(html, &rules());
        assert_eq!(info.title, "Getting started");
        assert_eq!(info.h1_heading, "Getting started");
    }

    #[test]
    fn test_untitled_page() {
        let info = PageInfo::extract("<html><body><p>x</p></body></html>", &TitleRules::default());
        assert_eq!(info.title, "Untitled Page");
        assert_eq!(info.description, "No description available");
    }

    #[test]
    fn test_meta_description_preferred() {
        let html = r#"<head><meta name="description" content=" Short summary. "></head>
            <body><p class="lead">A much longer lead paragraph here.</p></body>"#;
        let info = PageInfo::extract(html, &TitleRules::default());
        assert_eq!(info.meta_description, "Short summary.");
        assert_eq!(info.description, "Short summary.");
    }

    #[test]
    fn test_description_skips_short_paragraphs() {
        let html = "<body><p>Tiny</p><p>This paragraph is long enough to describe the page.</p></body>";
        let info = PageInfo::extract(html, &TitleRules::default());
        assert_eq!(info.description, "This paragraph is long enough to describe the page.");
    }

    #[test]
    fn test_description_truncated_on_char_boundary() {
        let long = "é".repeat(600);
        let html = format!("<body><p class=\"lead\">{}</p></body>", long);
        let info = PageInfo::extract(&html, &TitleRules::default());
        assert_eq!(info.description.chars().count(), 500);
    }

    #[test]
    fn test_headings_and_breadcrumbs() {
        let html = r#"<body>
            <nav aria-label="breadcrumb"><a href="/docs">Docs</a><a href="/docs/observe">Observe</a></nav>
            <h1>Logs</h1><h2>Setup</h2><h2>Query</h2>
        </body>"#;
        let info = PageInfo::extract(html, &TitleRules::default());
        assert_eq!(info.breadcrumbs, vec!["Docs", "Observe"]);
        assert_eq!(info.h2_headings, vec!["Setup", "Query"]);
    }

    #[test]
    fn test_strip_site_suffix_without_separator_is_noop() {
        assert_eq!(
            strip_site_suffix("About Dynatrace Docs", Some("Dynatrace Docs")),
            "About Dynatrace Docs"
        );
        assert_eq!(strip_site_suffix("  Plain  ", None), "Plain");
    }
}
