//! Section → subsection → page tree built from crawl results.
//!
//! Every map is a `BTreeMap` and every page list is sorted by URL, so the same set of
//! pages always serializes to byte-identical JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::crawler::{CrawlOutcome, CrawlerConfig};
use crate::models::DocPage;
use crate::url_utils::slug_to_title;

#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    #[error("Taxonomy file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid taxonomy JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub metadata: TaxonomyMetadata,
    pub structure: BTreeMap<String, Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyMetadata {
    pub base_url: String,
    pub total_pages: usize,
    pub failed_pages: usize,
    pub max_depth: u32,
    #[serde(default)]
    pub fetch_mode: String,
    pub crawl_timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub pages: Vec<PageEntry>,
    #[serde(default)]
    pub subsections: BTreeMap<String, Subsection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subsection {
    pub title: String,
    #[serde(default)]
    pub pages: Vec<PageEntry>,
}

/// The slice of a `DocPage` the viewer needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEntry {
    pub url: String,
    pub title: String,
    pub description: String,
    pub depth: u32,
    #[serde(default)]
    pub breadcrumbs: Vec<String>,
    #[serde(default)]
    pub h1_heading: String,
    #[serde(default)]
    pub h2_headings: Vec<String>,
}

impl From<&DocPage> for PageEntry {
    fn from(page: &DocPage) -> Self {
        Self {
            url: page.url.clone(),
            title: page.title.clone(),
            description: page.description.clone(),
            depth: page.depth,
            breadcrumbs: page.breadcrumbs.clone(),
            h1_heading: page.h1_heading.clone(),
            h2_headings: page.h2_headings.clone(),
        }
    }
}

/// Per-section counts printed after a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSummary {
    pub name: String,
    pub total_pages: usize,
    pub subsections: usize,
}

impl Section {
    fn new(slug: &str) -> Self {
        Self {
            title: slug_to_title(slug),
            pages: Vec::new(),
            subsections: BTreeMap::new(),
        }
    }

    /// Direct pages plus every subsection's pages
    pub fn page_count(&self) -> usize {
        self.pages.len() + self.subsections.values().map(|s| s.pages.len()).sum::<usize>()
    }
}

/// `load` accepts the taxonomy-only file or the full results file wrapping it
#[derive(Deserialize)]
#[serde(untagged)]
enum TaxonomyFile {
    Bare(Taxonomy),
    FullResults { taxonomy: Taxonomy },
}

impl Taxonomy {
    /// Group pages by their section and subsection slugs.
    pub fn build<'a, I>(pages: I, metadata: TaxonomyMetadata) -> Self
    where
        I: IntoIterator<Item = &'a DocPage>,
    {
        let mut structure: BTreeMap<String, Section> = BTreeMap::new();

        for page in pages {
            let section = structure
                .entry(page.section.clone())
                .or_insert_with(|| Section::new(&page.section));

            if page.subsection.is_empty() {
                section.pages.push(PageEntry::from(page));
            } else {
                section
                    .subsections
                    .entry(page.subsection.clone())
                    .or_insert_with(|| Subsection {
                        title: slug_to_title(&page.subsection),
                        pages: Vec::new(),
                    })
                    .pages
                    .push(PageEntry::from(page));
            }
        }

        for section in structure.values_mut() {
            section.pages.sort_by(|a, b| a.url.cmp(&b.url));
            for sub in section.subsections.values_mut() {
                sub.pages.sort_by(|a, b| a.url.cmp(&b.url));
            }
        }

        Self {
            metadata,
            structure,
        }
    }

    /// Build from a finished crawl, stamping the current local time.
    pub fn from_outcome(outcome: &CrawlOutcome, config: &CrawlerConfig) -> Self {
        let metadata = TaxonomyMetadata {
            base_url: config.base_url.clone(),
            total_pages: outcome.total_pages(),
            failed_pages: outcome.failed_pages(),
            max_depth: config.max_depth,
            fetch_mode: outcome.fetch_mode.clone(),
            crawl_timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        Self::build(outcome.pages.values(), metadata)
    }

    pub fn summary(&self) -> Vec<SectionSummary> {
        self.structure
            .iter()
            .map(|(name, section)| SectionSummary {
                name: name.clone(),
                total_pages: section.page_count(),
                subsections: section.subsections.len(),
            })
            .collect()
    }

    pub fn page_count(&self) -> usize {
        self.structure.values().map(Section::page_count).sum()
    }

    pub fn load(path: &Path) -> Result<Self, TaxonomyError> {
        if !path.is_file() {
            return Err(TaxonomyError::NotFound(path.display().to_string()));
        }
        let data = fs::read_to_string(path)?;
        let file: TaxonomyFile = serde_json::from_str(&data)?;
        Ok(match file {
            TaxonomyFile::Bare(taxonomy) => taxonomy,
            TaxonomyFile::FullResults { taxonomy } => taxonomy,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), TaxonomyError> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String, TaxonomyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
