//! Static HTML viewer for a taxonomy.
//!
//! The generated page is self-contained: styles, the taxonomy JSON and the rendering
//! script are all inline. Internal links are kept in `localStorage` under
//! `internal-<page url>`, or on an annotation server when one is configured.

use std::path::Path;

use crate::taxonomy::{Taxonomy, TaxonomyError};

pub const DEFAULT_TITLE: &str = "Documentation Hierarchy";

#[derive(Debug, Clone)]
pub struct ViewerOptions {
    pub title: String,
    /// Base URL of the annotation server, e.g. `http://127.0.0.1:5000`
    pub storage_server: Option<String>,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            storage_server: None,
        }
    }
}

const TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>__TITLE__</title>
<style>
 body { font-family: Arial, sans-serif; margin: 1.5em; }
 ul { list-style: none; padding-left: 1em; }
 li { margin: 4px 0; }
 .internal-link-list { margin-left: 1.5em; }
 summary { cursor: pointer; font-weight: bold; }
 .count { color: #888; font-weight: normal; }
 button { margin-left: 4px; }
 .description { color: #555; margin-left: 4px; }
 .meta { color: #666; font-size: 0.9em; }
</style>
</head>
<body>
<h1>__TITLE__</h1>
<p class="meta" id="meta"></p>
<div id="tree"></div>
<script id="taxonomy-data" type="application/json">__TAXONOMY_DATA__</script>
<script>
const STORAGE_SERVER = __STORAGE_SERVER__;
const data = JSON.parse(document.getElementById('taxonomy-data').textContent);

function upgrade(stored) {
  if (!Array.isArray(stored)) return [];
  return stored
    .map(l => typeof l === 'string' ? {url: l} : l)
    .filter(l => l && typeof l.url === 'string')
    .map(l => ({url: l.url, name: l.name || '', description: l.description || ''}));
}

async function loadLinks(url) {
  if (STORAGE_SERVER) {
    try {
      const resp = await fetch(STORAGE_SERVER + '/links/' + encodeURIComponent(url));
      return upgrade(await resp.json());
    } catch (err) {
      console.error('failed to load links', err);
      return [];
    }
  }
  const key = 'internal-' + url;
  const raw = JSON.parse(localStorage.getItem(key) || '[]');
  const links = upgrade(raw);
  if (raw.length && typeof raw[0] === 'string') {
    localStorage.setItem(key, JSON.stringify(links));
  }
  return links;
}

async function saveLinks(url, links) {
  if (STORAGE_SERVER) {
    try {
      await fetch(STORAGE_SERVER + '/links/' + encodeURIComponent(url), {
        method: 'POST',
        headers: {'Content-Type': 'application/json'},
        body: JSON.stringify(links)
      });
    } catch (err) {
      console.error('failed to save links', err);
    }
    return;
  }
  const key = 'internal-' + url;
  if (links.length) {
    localStorage.setItem(key, JSON.stringify(links));
  } else {
    localStorage.removeItem(key);
  }
}

function pageCount(section) {
  let n = (section.pages || []).length;
  Object.values(section.subsections || {}).forEach(sub => { n += (sub.pages || []).length; });
  return n;
}

function createPage(pg) {
  const li = document.createElement('li');
  const row = document.createElement('div');
  const a = document.createElement('a');
  a.href = pg.url;
  a.target = '_blank';
  a.textContent = pg.title;
  const desc = document.createElement('span');
  desc.className = 'description';
  desc.textContent = ' - ' + pg.description;
  row.appendChild(a);
  row.appendChild(desc);
  const links = document.createElement('ul');
  links.className = 'internal-link-list';
  links.dataset.url = pg.url;
  li.appendChild(row);
  li.appendChild(links);
  return li;
}

function createSection(section) {
  const details = document.createElement('details');
  const summary = document.createElement('summary');
  summary.textContent = section.title + ' ';
  const count = document.createElement('span');
  count.className = 'count';
  count.textContent = '(' + pageCount(section) + ')';
  summary.appendChild(count);
  details.appendChild(summary);
  const ul = document.createElement('ul');
  (section.pages || []).forEach(pg => ul.appendChild(createPage(pg)));
  Object.values(section.subsections || {}).forEach(sub => {
    const li = document.createElement('li');
    li.appendChild(createSection(sub));
    ul.appendChild(li);
  });
  details.appendChild(ul);
  return details;
}

async function renderLinks(ul) {
  const stored = await loadLinks(ul.dataset.url);
  ul.innerHTML = '';
  stored.forEach((link, idx) => {
    const li = document.createElement('li');
    const a = document.createElement('a');
    a.href = link.url;
    a.target = '_blank';
    a.textContent = link.name || ('internal ' + (idx + 1));
    li.appendChild(a);
    if (link.description) {
      const desc = document.createElement('span');
      desc.className = 'description';
      desc.textContent = '- ' + link.description;
      li.appendChild(desc);
    }
    ['edit', 'delete'].forEach(action => {
      const btn = document.createElement('button');
      btn.className = action + '-link';
      btn.dataset.index = idx;
      btn.textContent = action;
      li.appendChild(btn);
    });
    ul.appendChild(li);
  });
  const addLi = document.createElement('li');
  const add = document.createElement('button');
  add.className = 'add-link';
  add.textContent = 'add internal link';
  addLi.appendChild(add);
  ul.appendChild(addLi);
}

function refreshLinks() {
  document.querySelectorAll('.internal-link-list').forEach(ul => renderLinks(ul));
}

function promptLink(current) {
  const url = prompt('Enter internal link URL:', current.url);
  if (url === null) return null;
  if (!url) return {remove: true};
  const name = prompt('Enter link name (optional):', current.name || '') || '';
  const description = prompt('Enter link description (optional):', current.description || '') || '';
  return {link: {url: url, name: name, description: description}};
}

document.body.addEventListener('click', async ev => {
  const ul = ev.target.closest('.internal-link-list');
  if (!ul) return;
  const url = ul.dataset.url;
  const stored = await loadLinks(url);
  const idx = parseInt(ev.target.dataset.index, 10);

  if (ev.target.classList.contains('add-link')) {
    const result = promptLink({url: '', name: '', description: ''});
    if (!result || !result.link) return;
    stored.push(result.link);
  } else if (ev.target.classList.contains('edit-link')) {
    const result = promptLink(stored[idx] || {url: '', name: '', description: ''});
    if (!result) return;
    if (result.link) {
      stored[idx] = result.link;
    } else {
      stored.splice(idx, 1);
    }
  } else if (ev.target.classList.contains('delete-link')) {
    stored.splice(idx, 1);
  } else {
    return;
  }
  await saveLinks(url, stored);
  renderLinks(ul);
});

const meta = data.metadata || {};
document.getElementById('meta').textContent =
  (meta.base_url || '') + ' | ' + (meta.total_pages || 0) + ' pages | crawled ' + (meta.crawl_timestamp || 'unknown');
const container = document.getElementById('tree');
Object.values(data.structure || {}).forEach(sec => container.appendChild(createSection(sec)));
refreshLinks();
</script>
</body>
</html>
"#;

/// Keep embedded JSON from closing or re-opening the surrounding `<script>` element.
/// Markup characters only occur inside JSON strings, where the `\u` escapes decode back.
fn escape_script_json(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render the viewer document for `taxonomy`.
pub fn build_html(taxonomy: &Taxonomy, options: &ViewerOptions) -> Result<String, TaxonomyError> {
    let data = escape_script_json(&serde_json::to_string(taxonomy)?);

    let server = match options
        .storage_server
        .as_deref()
        .map(|s| s.trim().trim_end_matches('/'))
    {
        Some(s) if !s.is_empty() => escape_script_json(&serde_json::to_string(s)?),
        _ => "null".to_string(),
    };

    // Data goes in last so its contents are never scanned for placeholders
    Ok(TEMPLATE
        .replace("__TITLE__", &escape_html(&options.title))
        .replace("__STORAGE_SERVER__", &server)
        .replace("__TAXONOMY_DATA__", &data))
}

pub fn write_html(path: &Path, taxonomy: &Taxonomy, options: &ViewerOptions) -> Result<(), TaxonomyError> {
    let html = build_html(taxonomy, options)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, html)?;
    tracing::info!("Generated {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocPage;
    use crate::taxonomy::TaxonomyMetadata;

    fn taxonomy(title: &str) -> Taxonomy {
        let mut page = DocPage::new("https://d.test/docs/observe".to_string(), 1, None);
        page.title = title.to_string();
        page.set_location(("observe".to_string(), String::new()));
        Taxonomy::build(
            [&page],
            TaxonomyMetadata {
                base_url: "https://d.test/docs".to_string(),
                total_pages: 1,
                failed_pages: 0,
                max_depth: 50,
                fetch_mode: "http".to_string(),
                crawl_timestamp: "2024-01-01 00:00:00".to_string(),
            },
        )
    }

    fn embedded_json(html: &str) -> &str {
        let start = html
            .find(r#"<script id="taxonomy-data" type="application/json">"#)
            .unwrap();
        let rest = &html[start..];
        let open_end = rest.find('>').unwrap() + 1;
        let close = rest.find("</script>").unwrap();
        &rest[open_end..close]
    }

    #[test]
    fn test_embeds_parseable_taxonomy() {
        let tax = taxonomy("Observe");
        let html = build_html(&tax, &ViewerOptions::default()).unwrap();
        assert!(html.starts_with("<!doctype html>"));
        assert!(html.contains("<title>Documentation Hierarchy</title>"));

        let parsed: Taxonomy = serde_json::from_str(embedded_json(&html)).unwrap();
        assert_eq!(parsed, tax);
    }

    #[test]
    fn test_script_close_in_data_is_escaped() {
        let tax = taxonomy("Evil </script><script>alert(1)</script>");
        let html = build_html(&tax, &ViewerOptions::default()).unwrap();

        let json = embedded_json(&html);
        assert!(!json.contains('<'));
        let parsed: Taxonomy = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.structure["observe"].pages[0].title, tax.structure["observe"].pages[0].title);
    }

    #[test]
    fn test_comment_open_in_data_is_escaped() {
        let title = "Tricky <!--<script> & more";
        let html = build_html(&taxonomy(title), &ViewerOptions::default()).unwrap();

        let json = embedded_json(&html);
        assert!(!json.contains("<!--"));
        assert!(!json.contains("<script"));
        assert!(json.contains("\\u003c!--"));
        let parsed: Taxonomy = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.structure["observe"].pages[0].title, title);
    }

    #[test]
    fn test_local_storage_backend_by_default() {
        let html = build_html(&taxonomy("Observe"), &ViewerOptions::default()).unwrap();
        assert!(html.contains("const STORAGE_SERVER = null;"));
        assert!(html.contains("'internal-' + url"));
    }

    #[test]
    fn test_storage_server_backend() {
        let options = ViewerOptions {
            title: "Docs & <Links>".to_string(),
            storage_server: Some("http://127.0.0.1:5000/".to_string()),
        };
        let html = build_html(&taxonomy("Observe"), &options).unwrap();
        assert!(html.contains(r#"const STORAGE_SERVER = "http://127.0.0.1:5000";"#));
        assert!(html.contains("<title>Docs &amp; &lt;Links&gt;</title>"));

        let blank = ViewerOptions {
            storage_server: Some("  ".to_string()),
            ..ViewerOptions::default()
        };
        assert!(build_html(&taxonomy("Observe"), &blank)
            .unwrap()
            .contains("const STORAGE_SERVER = null;"));
    }

    #[test]
    fn test_placeholder_text_in_data_left_alone() {
        let html = build_html(&taxonomy("__TITLE__ and __STORAGE_SERVER__"), &ViewerOptions::default()).unwrap();
        let parsed: Taxonomy = serde_json::from_str(embedded_json(&html)).unwrap();
        assert_eq!(
            parsed.structure["observe"].pages[0].title,
            "__TITLE__ and __STORAGE_SERVER__"
        );
    }

    #[test]
    fn test_write_html() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("docs_hierarchy.html");
        write_html(&path, &taxonomy("Observe"), &ViewerOptions::default()).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("taxonomy-data"));
    }
}
