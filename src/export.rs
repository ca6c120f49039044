use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::DocPage;
use crate::taxonomy::{Taxonomy, TaxonomyError};

/// Full results file: the taxonomy plus every page record keyed by URL
#[derive(Debug, Serialize)]
pub struct FullResults<'a> {
    pub taxonomy: &'a Taxonomy,
    pub all_pages: &'a BTreeMap<String, DocPage>,
}

/// Files written by `save_results`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFiles {
    pub taxonomy_only: PathBuf,
    pub full: Option<PathBuf>,
}

/// `docs/out.json` -> `docs/out_taxonomy_only.json`
pub fn taxonomy_only_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "taxonomy".to_string());
    output.with_file_name(format!("{}_taxonomy_only.json", stem))
}

/// Always writes the taxonomy-only file; the full results go to `output` unless
/// `taxonomy_only` is set.
pub fn save_results(
    output: &Path,
    taxonomy: &Taxonomy,
    pages: &BTreeMap<String, DocPage>,
    taxonomy_only: bool,
) -> Result<SavedFiles, TaxonomyError> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let taxonomy_path = taxonomy_only_path(output);
    taxonomy.save(&taxonomy_path)?;
    tracing::info!("Taxonomy saved to {}", taxonomy_path.display());

    if taxonomy_only {
        return Ok(SavedFiles {
            taxonomy_only: taxonomy_path,
            full: None,
        });
    }

    let mut writer = BufWriter::new(File::create(output)?);
    serde_json::to_writer_pretty(
        &mut writer,
        &FullResults {
            taxonomy,
            all_pages: pages,
        },
    )?;
    writer.flush()?;
    tracing::info!("Complete results saved to {}", output.display());

    Ok(SavedFiles {
        taxonomy_only: taxonomy_path,
        full: Some(output.to_path_buf()),
    })
}

/// Export pages to JSONL format
/// Each page is written as a single line of JSON followed by a newline
///
/// # Arguments
/// * `pages` - An iterator of pages to export
/// * `writer` - A writer implementing std::io::Write to write the JSONL data to
///
/// # Errors
/// Returns an error if JSON serialization or writing fails
pub fn export_to_jsonl<'a, W: Write, I: IntoIterator<Item = &'a DocPage>>(
    pages: I,
    writer: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    for page in pages {
        serde_json::to_writer(&mut *writer, page)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
