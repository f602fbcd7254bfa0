use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, RwLock},
};

use anyhow::{anyhow, Context, Result};

/// Read-only access to pack resources by pack-relative path, e.g.
/// "geo/county.json", "stats/tur1/county.tsv", "api/tur1/uat/CJ.json".
pub trait DataSource: Send + Sync {
    fn get(&self, rel: &str) -> Result<Arc<[u8]>>;
    fn has(&self, rel: &str) -> bool;
}

/// Simple disk-based pack rooted at a directory.
pub struct DiskSource {
    root: PathBuf,
}

impl DiskSource {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    fn full(&self, rel: &str) -> PathBuf { self.root.join(rel) }
}

impl DataSource for DiskSource {
    fn get(&self, rel: &str) -> Result<Arc<[u8]>> {
        let path = self.full(rel);
        let bytes = std::fs::read(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Arc::from(bytes))
    }

    fn has(&self, rel: &str) -> bool { self.full(rel).exists() }
}

/// Simple in-memory pack.
/// Entries may be added or removed while the source is shared; tests use this
/// to model a live endpoint whose payload changes between poll ticks.
#[derive(Default)]
pub struct MemSource {
    files: RwLock<HashMap<String, Arc<[u8]>>>,
}

impl MemSource {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&self, rel: &str, bytes: impl Into<Vec<u8>>) {
        self.files
            .write()
            .expect("mem source lock poisoned")
            .insert(rel.to_string(), Arc::from(bytes.into()));
    }

    pub fn remove(&self, rel: &str) {
        self.files.write().expect("mem source lock poisoned").remove(rel);
    }
}

impl DataSource for MemSource {
    fn get(&self, rel: &str) -> Result<Arc<[u8]>> {
        self.files
            .read()
            .expect("mem source lock poisoned")
            .get(rel)
            .cloned()
            .ok_or_else(|| anyhow!("missing pack file: {rel}"))
    }

    fn has(&self, rel: &str) -> bool {
        self.files.read().expect("mem source lock poisoned").contains_key(rel)
    }
}

/// Remote pack behind an HTTP base URL. Paths map 1:1 onto URL suffixes.
pub struct HttpSource {
    base: String,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn url(&self, rel: &str) -> String { format!("{}/{}", self.base, rel) }
}

impl DataSource for HttpSource {
    fn get(&self, rel: &str) -> Result<Arc<[u8]>> {
        let url = self.url(rel);
        let response = self.client.get(&url).send()
            .with_context(|| format!("request failed: {url}"))?
            .error_for_status()
            .with_context(|| format!("request rejected: {url}"))?;
        let bytes = response.bytes()
            .with_context(|| format!("failed to read body: {url}"))?;
        Ok(Arc::from(bytes.to_vec()))
    }

    fn has(&self, rel: &str) -> bool {
        self.client
            .head(self.url(rel))
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

/// Pack-relative paths for every remote resource the pipeline reads.
pub(crate) mod endpoint {
    use crate::region::RegionLevel;

    fn scope(location: Option<&str>) -> String {
        location.map(|l| format!("{l}/")).unwrap_or_default()
    }

    /// "geo/county.json" or, parent-scoped, "geo/uat/CJ.json".
    pub(crate) fn geometry(level: RegionLevel, parent: Option<&str>) -> String {
        match parent {
            Some(parent) => format!("geo/{}/{}.json", level.as_str(), parent),
            None => format!("geo/{}.json", level.as_str()),
        }
    }

    /// Companion dataset tried when the primary geometry file is missing.
    pub(crate) fn geometry_fallback(level: RegionLevel, parent: Option<&str>) -> String {
        match parent {
            Some(parent) => format!("geo/{}/{}.fallback.json", level.as_str(), parent),
            None => format!("geo/{}.fallback.json", level.as_str()),
        }
    }

    /// Raw per-polling-station rows for a preloaded round.
    pub(crate) fn tabular(round: &str, location: Option<&str>) -> String {
        format!("stats/{round}/{}county.tsv", scope(location))
    }

    /// Per-region summaries (registered voters and metadata).
    pub(crate) fn summary(round: &str, location: Option<&str>) -> String {
        format!("api/{round}/{}summary.json", scope(location))
    }

    /// Sub-county records for one county.
    pub(crate) fn subcounty(round: &str, parent: &str) -> String {
        format!("api/{round}/uat/{parent}.json")
    }

    /// Live county-level records, re-fetched on every poll tick.
    pub(crate) fn live(round: &str, location: Option<&str>) -> String {
        format!("live/{round}/{}county.json", scope(location))
    }

    /// Live sub-county records for one county.
    pub(crate) fn live_subcounty(round: &str, parent: &str) -> String {
        format!("live/{round}/uat/{parent}.json")
    }
}
