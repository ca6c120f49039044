//! File-backed annotation store.
//!
//! One JSON object maps a documentation page URL to the internal links a user attached
//! to it. The file is re-read on every request so hand edits show up immediately.
//! Entries are kept as raw JSON: a value that is not a valid link list survives every
//! write to other keys and is only interpreted when its own page is asked for.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub type LinkMap = serde_json::Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A user-supplied link attached to one documentation page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredLink")]
pub struct InternalLink {
    pub url: String,
    pub name: String,
    pub description: String,
}

impl InternalLink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: String::new(),
            description: String::new(),
        }
    }
}

/// Older viewers stored bare URL strings
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredLink {
    Legacy(String),
    Full {
        url: String,
        #[serde(default, deserialize_with = "null_as_empty")]
        name: String,
        #[serde(default, deserialize_with = "null_as_empty")]
        description: String,
    },
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<StoredLink> for InternalLink {
    fn from(stored: StoredLink) -> Self {
        match stored {
            StoredLink::Legacy(url) => InternalLink::new(url),
            StoredLink::Full {
                url,
                name,
                description,
            } => InternalLink {
                url,
                name,
                description,
            },
        }
    }
}

/// Interpret one stored entry, skipping list items that are not links.
pub fn links_from_value(value: &Value) -> Vec<InternalLink> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}

/// `null` and `[]` mean "no links"; such entries are not kept in the file.
fn is_empty_entry(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[derive(Debug)]
pub struct LinkStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LinkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whole map; a missing file, or one that is not a JSON object, reads as empty.
    pub fn read_all(&self) -> LinkMap {
        if !self.path.is_file() {
            return LinkMap::new();
        }
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Cannot read store {}: {}", self.path.display(), e);
                return LinkMap::new();
            }
        };
        match serde_json::from_str::<Value>(&data) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                tracing::warn!("Ignoring store {}: top level is not an object", self.path.display());
                LinkMap::new()
            }
            Err(e) => {
                tracing::warn!("Ignoring corrupt store {}: {}", self.path.display(), e);
                LinkMap::new()
            }
        }
    }

    /// Raw entry for one page, `[]` when absent.
    pub fn entry(&self, page_url: &str) -> Value {
        self.read_all()
            .remove(page_url)
            .unwrap_or_else(|| Value::Array(Vec::new()))
    }

    pub fn links_for(&self, page_url: &str) -> Vec<InternalLink> {
        links_from_value(&self.entry(page_url))
    }

    /// Replace the links of one page. An empty list drops the entry.
    pub fn save_links(&self, page_url: &str, links: &[InternalLink]) -> Result<(), StoreError> {
        self.save_entry(page_url, serde_json::to_value(links)?)
    }

    /// Replace one page's entry with any JSON value, leaving every other key untouched.
    pub fn save_entry(&self, page_url: &str, value: Value) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut all = self.read_all();
        if is_empty_entry(&value) {
            all.remove(page_url);
        } else {
            all.insert(page_url.to_string(), value);
        }
        self.write(&all)
    }

    pub fn save_all(&self, all: &LinkMap) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        self.write(all)
    }

    fn write(&self, all: &LinkMap) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(all)?)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(entries = all.len(), "Store written to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn link(url: &str, name: &str) -> InternalLink {
        InternalLink {
            url: url.to_string(),
            name: name.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = LinkStore::new(dir.path().join("stored_links.json"));
        assert!(store.read_all().is_empty());
        assert!(store.links_for("https://d.test/docs").is_empty());
        assert_eq!(store.entry("https://d.test/docs"), json!([]));
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stored_links.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(LinkStore::new(path.clone()).read_all().is_empty());

        fs::write(&path, "[1, 2]").unwrap();
        assert!(LinkStore::new(path).read_all().is_empty());
    }

    #[test]
    fn test_save_and_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = LinkStore::new(dir.path().join("stored_links.json"));
        let page = "https://d.test/docs/observe";

        store.save_links(page, &[link("https://wiki/a", "A")]).unwrap();
        assert_eq!(store.links_for(page), vec![link("https://wiki/a", "A")]);

        store
            .save_links(page, &[link("https://wiki/b", "B"), link("https://wiki/c", "")])
            .unwrap();
        let links = store.links_for(page);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "https://wiki/b");

        store.save_links(page, &[]).unwrap();
        assert!(!store.read_all().contains_key(page));
    }

    #[test]
    fn test_save_all_replaces_everything() {
        let dir = TempDir::new().unwrap();
        let store = LinkStore::new(dir.path().join("stored_links.json"));
        store.save_links("https://d.test/docs/a", &[link("x", "")]).unwrap();

        let mut replacement = LinkMap::new();
        replacement.insert(
            "https://d.test/docs/b".to_string(),
            json!([{"url": "y", "name": "Y", "description": ""}]),
        );
        store.save_all(&replacement).unwrap();
        assert_eq!(store.read_all(), replacement);
    }

    #[test]
    fn test_legacy_string_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stored_links.json");
        fs::write(
            &path,
            r#"{"https://d.test/docs/a": ["https://wiki/old", {"url": "https://wiki/new", "name": "New"}]}"#,
        )
        .unwrap();

        let links = LinkStore::new(path).links_for("https://d.test/docs/a");
        assert_eq!(
            links,
            vec![InternalLink::new("https://wiki/old"), link("https://wiki/new", "New")]
        );
    }

    #[test]
    fn test_mixed_shape_file_keeps_other_pages() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stored_links.json");
        fs::write(
            &path,
            r#"{
                "https://d/docs/a": [{"url": "https://wiki/a", "name": "A", "description": ""}],
                "https://d/docs/b": [{"url": "https://wiki/b", "name": null}, 42, {"name": "no url"}],
                "https://d/docs/notes": "free text"
            }"#,
        )
        .unwrap();
        let store = LinkStore::new(path.clone());

        assert_eq!(store.read_all().len(), 3);
        assert_eq!(store.links_for("https://d/docs/a"), vec![link("https://wiki/a", "A")]);
        assert_eq!(store.links_for("https://d/docs/b"), vec![InternalLink::new("https://wiki/b")]);
        assert!(store.links_for("https://d/docs/notes").is_empty());

        store.save_links("https://d/docs/c", &[InternalLink::new("https://wiki/c")]).unwrap();

        let on_disk: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["https://d/docs/a"][0]["name"], "A");
        assert_eq!(on_disk["https://d/docs/b"][1], 42);
        assert_eq!(on_disk["https://d/docs/notes"], "free text");
        assert_eq!(on_disk["https://d/docs/c"][0]["url"], "https://wiki/c");
    }

    #[test]
    fn test_save_entry_keeps_any_json_value() {
        let dir = TempDir::new().unwrap();
        let store = LinkStore::new(dir.path().join("stored_links.json"));
        let page = "https://d.test/docs/observe";

        store.save_entry(page, json!({"pinned": true})).unwrap();
        assert_eq!(store.entry(page), json!({"pinned": true}));
        assert!(store.links_for(page).is_empty());

        store.save_entry(page, Value::Null).unwrap();
        assert!(!store.read_all().contains_key(page));
    }

    #[test]
    fn test_concurrent_writers_keep_file_valid() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(LinkStore::new(dir.path().join("stored_links.json")));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .save_links(&format!("https://d.test/docs/{}", i), &[link("x", "")])
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.read_all().len(), 8);
    }
}
