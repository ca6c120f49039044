use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

use crate::url_utils;

/// A URL waiting to be crawled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedUrl {
    pub url: String,
    pub depth: u32,
    pub parent_url: Option<String>,
}

impl QueuedUrl {
    pub fn new(url: String, depth: u32, parent_url: Option<String>) -> Self {
        Self {
            url,
            depth,
            parent_url,
        }
    }
}

/// Breadth-first work queue guarded by a visited-set.
///
/// Every URL is normalized on the way in. A URL is admitted at most once over the
/// lifetime of the frontier, which is what keeps cyclic link graphs finite.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<QueuedUrl>,
    /// URLs handed out by `pop`
    visited: HashSet<String>,
    /// URLs currently sitting in `queue`
    queued: HashSet<String>,
    max_depth: u32,
}

/// Serializable form of the frontier used by checkpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrontierSnapshot {
    pub visited_urls: Vec<String>,
    pub queue: Vec<QueuedUrl>,
}

impl Frontier {
    pub fn new(max_depth: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            visited: HashSet::new(),
            queued: HashSet::new(),
            max_depth,
        }
    }

    /// Queue a URL unless it is too deep, already visited or already waiting.
    /// Returns whether the URL was added.
    pub fn push(&mut self, url: &str, depth: u32, parent_url: Option<String>) -> bool {
        if depth > self.max_depth {
            return false;
        }

        let normalized = url_utils::normalize_url(url);
        if self.visited.contains(&normalized) || self.queued.contains(&normalized) {
            return false;
        }

        self.queued.insert(normalized.clone());
        self.queue.push_back(QueuedUrl::new(normalized, depth, parent_url));
        true
    }

    /// Add newly discovered URLs to the frontier
    pub fn add_links<I>(&mut self, links: I, depth: u32, parent_url: &str) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        links
            .into_iter()
            .filter(|link| self.push(link, depth, Some(parent_url.to_string())))
            .count()
    }

    /// Take the next URL in breadth-first order and mark it visited.
    pub fn pop(&mut self) -> Option<QueuedUrl> {
        let next = self.queue.pop_front()?;
        self.queued.remove(&next.url);
        self.visited.insert(next.url.clone());
        Some(next)
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(&url_utils::normalize_url(url))
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn stats(&self) -> FrontierStats {
        FrontierStats {
            visited: self.visited.len(),
            queued: self.queue.len(),
        }
    }

    pub fn snapshot(&self) -> FrontierSnapshot {
        self.snapshot_with_in_flight(&[])
    }

    /// Snapshot in which URLs still being fetched count as not yet visited. They go
    /// back to the head of the queue so a resume fetches them again.
    pub fn snapshot_with_in_flight(&self, in_flight: &[QueuedUrl]) -> FrontierSnapshot {
        let pending: HashSet<&str> = in_flight.iter().map(|q| q.url.as_str()).collect();
        let mut visited_urls: Vec<String> = self
            .visited
            .iter()
            .filter(|url| !pending.contains(url.as_str()))
            .cloned()
            .collect();
        visited_urls.sort();

        let queue = in_flight
            .iter()
            .cloned()
            .chain(self.queue.iter().cloned())
            .collect();
        FrontierSnapshot { visited_urls, queue }
    }

    /// Rebuild a frontier from a checkpoint. Queue entries that were already visited are dropped.
    pub fn restore(snapshot: FrontierSnapshot, max_depth: u32) -> Self {
        let mut frontier = Self::new(max_depth);
        frontier.visited = snapshot.visited_urls.into_iter().collect();
        for item in snapshot.queue {
            frontier.push(&item.url, item.depth, item.parent_url);
        }
        frontier
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierStats {
    pub visited: usize,
    pub queued: usize,
}

impl std::fmt::Display for FrontierStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frontier: {} visited, {} queued", self.visited, self.queued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bfs_order() {
        let mut frontier = Frontier::new(10);
        assert!(frontier.push("https://d.com/docs", 0, None));
        frontier.add_links(
            vec!["https://d.com/docs/a".to_string(), "https://d.com/docs/b".to_string()],
            1,
            "https://d.com/docs",
        );

        assert_eq!(frontier.pop().unwrap().url, "https://d.com/docs");
        let a = frontier.pop().unwrap();
        assert_eq!(a.url, "https://d.com/docs/a");
        assert_eq!(a.depth, 1);
        assert_eq!(a.parent_url.as_deref(), Some("https://d.com/docs"));
        assert_eq!(frontier.pop().unwrap().url, "https://d.com/docs/b");
        assert!(frontier.pop().is_none());
    }

    #[test]
    fn test_duplicates_and_cycles_rejected() {
        let mut frontier = Frontier::new(10);
        assert!(frontier.push("https://d.com/docs/a", 0, None));
        // already queued, differs only by trailing slash and fragment
        assert!(!frontier.push("https://d.com/docs/a/#x", 0, None));

        frontier.pop();
        // a -> b -> a cycle
        assert!(frontier.push("https://d.com/docs/b", 1, Some("https://d.com/docs/a".into())));
        frontier.pop();
        assert!(!frontier.push("https://d.com/docs/a", 2, Some("https://d.com/docs/b".into())));
        assert!(frontier.is_empty());
        assert!(frontier.is_visited("https://d.com/docs/a/"));
    }

    #[test]
    fn test_depth_limit() {
        let mut frontier = Frontier::new(1);
        assert!(frontier.push("https://d.com/docs/a", 1, None));
        assert!(!frontier.push("https://d.com/docs/b", 2, None));
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_snapshot_requeues_in_flight_urls() {
        let mut frontier = Frontier::new(5);
        frontier.push("https://d.com/docs", 0, None);
        frontier.pop();
        frontier.add_links(
            vec!["https://d.com/docs/slow".to_string(), "https://d.com/docs/b".to_string()],
            1,
            "https://d.com/docs",
        );
        let slow = frontier.pop().unwrap();

        let snap = frontier.snapshot_with_in_flight(std::slice::from_ref(&slow));
        assert_eq!(snap.visited_urls, vec!["https://d.com/docs"]);
        let queued: Vec<&str> = snap.queue.iter().map(|q| q.url.as_str()).collect();
        assert_eq!(queued, vec!["https://d.com/docs/slow", "https://d.com/docs/b"]);

        let mut restored = Frontier::restore(snap, 5);
        assert_eq!(restored.pop().unwrap(), slow);
        assert!(frontier.is_visited("https://d.com/docs/slow"));
    }

    #[test]
    fn test_snapshot_restore() {
        let mut frontier = Frontier::new(5);
        frontier.push("https://d.com/docs", 0, None);
        frontier.pop();
        frontier.push("https://d.com/docs/a", 1, Some("https://d.com/docs".into()));

        let snap = frontier.snapshot();
        assert_eq!(snap.visited_urls, vec!["https://d.com/docs"]);
        assert_eq!(snap.queue.len(), 1);

        let mut restored = Frontier::restore(snap, 5);
        assert!(restored.is_visited("https://d.com/docs"));
        assert!(!restored.push("https://d.com/docs", 0, None));
        assert_eq!(restored.pop().unwrap().url, "https://d.com/docs/a");
    }

    #[test]
    fn test_stats_display() {
        let mut frontier = Frontier::new(5);
        frontier.push("https://d.com/docs", 0, None);
        frontier.push("https://d.com/docs/a", 1, None);
        frontier.pop();
        let stats = frontier.stats();
        assert_eq!(stats, FrontierStats { visited: 1, queued: 1 });
        assert_eq!(stats.to_string(), "Frontier: 1 visited, 1 queued");
    }
}
