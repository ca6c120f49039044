use serde::{Deserialize, Serialize};

/// Represents a crawled documentation page.
/// This struct contains everything the taxonomy and the full results file need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocPage {
    /// Normalized URL of the page
    pub url: String,

    /// Page title with the site suffix removed
    pub title: String,

    /// Lead paragraph or meta description
    pub description: String,

    /// Raw `<meta name="description">` content, empty when absent
    #[serde(default)]
    pub meta_description: String,

    /// Breadcrumb trail text, outermost first
    #[serde(default)]
    pub breadcrumbs: Vec<String>,

    /// First path segment below the docs prefix (`root` for the landing page)
    pub section: String,

    /// Second path segment below the docs prefix, empty when the page sits directly in a section
    #[serde(default)]
    pub subsection: String,

    /// Depth level from the starting URL
    pub depth: u32,

    /// Page that led the crawler here (None for seeds)
    pub parent_url: Option<String>,

    /// In-scope links found on this page
    #[serde(default)]
    pub children: Vec<String>,

    #[serde(default)]
    pub h1_heading: String,

    #[serde(default)]
    pub h2_headings: Vec<String>,
}

impl DocPage {
    /// Create a page with placeholder text; callers fill in extracted content.
    pub fn new(url: String, depth: u32, parent_url: Option<String>) -> Self {
        Self {
            url,
            title: "Untitled Page".to_string(),
            description: "No description available".to_string(),
            meta_description: String::new(),
            breadcrumbs: Vec::new(),
            section: "root".to_string(),
            subsection: String::new(),
            depth,
            parent_url,
            children: Vec::new(),
            h1_heading: String::new(),
            h2_headings: Vec::new(),
        }
    }

    /// Set the section/subsection pair derived from the URL
    pub fn set_location(&mut self, (section, subsection): (String, String)) {
        self.section = section;
        self.subsection = subsection;
    }
}

/// A page the crawler gave up on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedPage {
    pub url: String,
    pub depth: u32,
    pub error: String,
}
