use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use docs_taxonomy::frontier::Frontier;
use docs_taxonomy::metadata::{PageInfo, TitleRules};
use docs_taxonomy::models::DocPage;
use docs_taxonomy::parser::extract_doc_links;
use docs_taxonomy::taxonomy::{Taxonomy, TaxonomyMetadata};
use docs_taxonomy::url_utils::DocsScope;

const SECTIONS: &[&str] = &["observe", "manage", "secure", "ingest-from", "analyze-explore-automate"];

// Navigation-heavy page similar to a docs sidebar
fn sidebar_page(links: usize) -> String {
    let mut html = String::from(
        "<html><head><title>Logs - Example Docs</title>\
         <meta name=\"description\" content=\"Log monitoring overview.\"></head><body><nav>",
    );
    for i in 0..links {
        let section = SECTIONS[i % SECTIONS.len()];
        html.push_str(&format!(
            "<a href=\"/docs/{}/topic-{}/page-{}#anchor\">Page {}</a>",
            section,
            i % 17,
            i,
            i
        ));
        if i % 10 == 0 {
            html.push_str("<a href=\"https://external.example.org/x\">ext</a>");
        }
    }
    html.push_str("</nav><h1>Logs</h1><h2>Setup</h2><p>Collect and analyze logs from every host.</p></body></html>");
    html
}

fn synthetic_pages(count: usize) -> Vec<DocPage> {
    (0..count)
        .map(|i| {
            let section = SECTIONS[i % SECTIONS.len()];
            let sub = if i % 3 == 0 { String::new() } else { format!("topic-{}", i % 17) };
            let url = if sub.is_empty() {
                format!("https://docs.example.com/docs/{}/page-{}", section, i)
            } else {
                format!("https://docs.example.com/docs/{}/{}/page-{}", section, sub, i)
            };
            let mut page = DocPage::new(url, (i % 5) as u32, None);
            page.set_location((section.to_string(), sub));
            page
        })
        .collect()
}

fn bench_link_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("link_extraction");
    let scope = DocsScope::new("https://docs.example.com/docs").unwrap();

    for links in [50, 500, 2000] {
        let html = sidebar_page(links);
        group.throughput(Throughput::Bytes(html.len() as u64));
        group.bench_with_input(BenchmarkId::new("extract_doc_links", links), &html, |b, html| {
            b.iter(|| {
                black_box(extract_doc_links(
                    black_box(html),
                    "https://docs.example.com/docs/observe/logs",
                    &scope,
                ))
            });
        });
    }

    group.finish();
}

fn bench_page_info(c: &mut Criterion) {
    let html = sidebar_page(500);
    let rules = TitleRules {
        site_suffix: Some("Example Docs".to_string()),
        generic_title: None,
    };
    c.bench_function("page_info_extract", |b| {
        b.iter(|| black_box(PageInfo::extract(black_box(&html), &rules)))
    });
}

fn bench_frontier(c: &mut Criterion) {
    let mut group = c.benchmark_group("frontier");

    for count in [1000, 10000] {
        let urls: Vec<String> = (0..count)
            .map(|i| format!("https://docs.example.com/docs/section-{}/page-{}/", i % 50, i))
            .collect();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("push_pop", count), &urls, |b, urls| {
            b.iter(|| {
                let mut frontier = Frontier::new(50);
                // every URL twice: the second pass only hits the dedupe path
                frontier.add_links(urls.iter().cloned(), 1, "https://docs.example.com/docs");
                frontier.add_links(urls.iter().cloned(), 2, "https://docs.example.com/docs");
                while let Some(next) = frontier.pop() {
                    black_box(next);
                }
            });
        });
    }

    group.finish();
}

fn bench_taxonomy_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("taxonomy_build");

    for count in [500, 5000] {
        let pages = synthetic_pages(count);
        let metadata = TaxonomyMetadata {
            base_url: "https://docs.example.com/docs".to_string(),
            total_pages: count,
            failed_pages: 0,
            max_depth: 50,
            fetch_mode: "http".to_string(),
            crawl_timestamp: "2024-01-01 00:00:00".to_string(),
        };
        group.bench_with_input(BenchmarkId::new("build", count), &pages, |b, pages| {
            b.iter(|| black_box(Taxonomy::build(pages, metadata.clone())));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_link_extraction,
    bench_page_info,
    bench_frontier,
    bench_taxonomy_build
);
criterion_main!(benches);
