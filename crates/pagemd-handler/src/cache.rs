//! In-memory Markdown cache with TTL and build-id invalidation.

use std::time::{Duration, Instant};

use dashmap::DashMap;

struct CacheEntry {
    markdown: String,
    /// Absent when the entry never expires by time.
    expires_at: Option<Instant>,
    /// Build identifier the entry was rendered under, if known.
    build_id: Option<String>,
}

/// Concurrent cache of rendered Markdown, keyed by normalized page path.
///
/// Entries are evicted lazily: an expired or build-mismatched entry is
/// removed on the lookup that discovers it.
#[derive(Default)]
pub struct MarkdownCache {
    entries: DashMap<String, CacheEntry>,
}

impl MarkdownCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a cached render for `path` under the given build. Returns
    /// `None` (and drops the entry) when it has expired or was rendered
    /// under a different build.
    pub fn get(&self, path: &str, build_id: Option<&str>) -> Option<String> {
        let stale = {
            let entry = self.entries.get(path)?;
            let expired = entry
                .expires_at
                .is_some_and(|deadline| Instant::now() >= deadline);
            // An entry without a build id stays valid under any build.
            let build_changed = entry
                .build_id
                .as_deref()
                .is_some_and(|id| Some(id) != build_id);
            if !expired && !build_changed {
                return Some(entry.markdown.clone());
            }
            true
        };
        // The read guard is released before removal to avoid deadlocking
        // on the shard lock.
        if stale {
            self.entries.remove(path);
        }
        None
    }

    /// Stores a rendered page. A `ttl_secs` of `None` caches until the
    /// build id changes (or forever, when no build id is used).
    pub fn put(
        &self,
        path: &str,
        markdown: String,
        ttl_secs: Option<u64>,
        build_id: Option<&str>,
    ) {
        let entry = CacheEntry {
            markdown,
            expires_at: ttl_secs.map(|secs| Instant::now() + Duration::from_secs(secs)),
            build_id: build_id.map(|id| id.to_string()),
        };
        self.entries.insert(path.to_string(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
