use scraper::{Html, Selector};
use std::collections::HashSet;

use crate::url_utils::{self, DocsScope};

const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:", "file:"];

/// Extract all hyperlink URLs from HTML content
///
/// # Arguments
/// * `html_body` - The HTML content as a string
///
/// # Returns
/// Every trimmed href of an `<a>` tag in document order, minus non-navigational schemes
///
/// # Examples
/// ```
/// use docs_taxonomy::parser::extract_links;
///
/// let html = r#"<html><body><a href="/docs/observe">Observe</a></body></html>"#;
/// let links = extract_links(html);
/// assert_eq!(links, vec!["/docs/observe"]);
/// ```
pub fn extract_links(html_body: &str) -> Vec<String> {
    let document = Html::parse_document(html_body);
    links_in(&document)
}

fn links_in(document: &Html) -> Vec<String> {
    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .filter(|href| {
            let lower = href.to_ascii_lowercase();
            !SKIPPED_SCHEMES.iter().any(|s| lower.starts_with(s))
        })
        .map(str::to_string)
        .collect()
}

/// Resolve, normalize and scope-filter the links of a page.
///
/// Relative links are joined against `page_url`, fragments and queries are dropped,
/// anything outside `scope` is discarded and duplicates collapse to their first occurrence.
pub fn extract_doc_links(html_body: &str, page_url: &str, scope: &DocsScope) -> Vec<String> {
    let document = Html::parse_document(html_body);
    resolve_doc_links(links_in(&document), page_url, scope)
}

pub(crate) fn resolve_doc_links(
    raw_links: Vec<String>,
    page_url: &str,
    scope: &DocsScope,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for link in raw_links {
        let absolute = match url_utils::convert_to_absolute_url(&link, page_url) {
            Ok(url) => url,
            Err(_) => continue,
        };
        let normalized = url_utils::normalize_url(&absolute);
        if !scope.is_docs_url(&normalized) {
            continue;
        }
        if seen.insert(normalized.clone()) {
            out.push(normalized);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> DocsScope {
        DocsScope::new("https://docs.example.com/docs").unwrap()
    }

    #[test]
    fn test_extract_absolute_and_relative_links() {
        let html = r##"<html><body>
            <a href="https://docs.example.com/docs/observe">Observe</a>
            <a href="/docs/manage">Manage</a>
            <a href="../parent">Parent</a>
            <a href="#section">Anchor</a>
        </body></html>"##;

        let links = extract_links(html);
        assert_eq!(
            links,
            vec![
                "https://docs.example.com/docs/observe",
                "/docs/manage",
                "../parent",
                "#section",
            ]
        );
    }

    #[test]
    fn test_skips_non_navigational_schemes() {
        let html = r#"<a href="javascript:void(0)">js</a><a href="mailto:a@b.c">mail</a>
            <a href="tel:123">tel</a><a href="  ">blank</a><a href=" /docs/x ">ok</a>"#;
        assert_eq!(extract_links(html), vec!["/docs/x"]);
    }

    #[test]
    fn test_no_links_present() {
        let html = "<html><body><h1>No Links Here</h1><p>Just text.</p></body></html>";
        assert!(extract_links(html).is_empty());
        assert!(extract_links("").is_empty());
    }

    #[test]
    fn test_malformed_html() {
        let html = "<html><body><a href=\"/docs/a\">A<div>Unclosed<a href=\"/docs/b\">B</body>";
        assert_eq!(extract_links(html), vec!["/docs/a", "/docs/b"]);
    }

    #[test]
    fn test_extract_links_keeps_duplicates() {
        let html = r#"<a href="/docs/a">1</a><a href="/docs/a">2</a>"#;
        assert_eq!(extract_links(html).len(), 2);
    }

    #[test]
    fn test_doc_links_resolve_filter_and_dedupe() {
        let html = r##"<nav>
            <a href="/docs/observe/">Observe</a>
            <a href="/docs/observe#top">Observe again</a>
            <a href="logs">Relative</a>
            <a href="https://elsewhere.com/docs/x">External</a>
            <a href="/blog/post">Off prefix</a>
            <a href="/docs/search?q=1">Query</a>
            <a href="/docs/file.pdf">Binary</a>
        </nav>"##;

        let links = extract_doc_links(html, "https://docs.example.com/docs/observe/", &scope());
        assert_eq!(
            links,
            vec![
                "https://docs.example.com/docs/observe",
                "https://docs.example.com/docs/observe/logs",
                "https://docs.example.com/docs/search",
            ]
        );
    }

    #[test]
    fn test_doc_links_self_reference_survives() {
        // Cycles are the traversal's problem; the extractor reports what the page links to.
        let html = r#"<a href="/docs/a">self</a>"#;
        let links = extract_doc_links(html, "https://docs.example.com/docs/a", &scope());
        assert_eq!(links, vec!["https://docs.example.com/docs/a"]);
    }
}
