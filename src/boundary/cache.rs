use std::{
    fmt,
    sync::{Arc, Mutex},
};

use ahash::AHashMap;
use log::warn;

use crate::error::FetchError;
use crate::region::{RegionLevel, RegionSet};
use crate::source::{endpoint, DataSource};

/// Composite geometry cache key. Levels share a code space (county "B" vs a
/// sub-county unit "B"), so concatenated strings are not a safe key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayerKey {
    pub level: RegionLevel,
    pub parent: Option<Arc<str>>,
}

impl LayerKey {
    pub fn new(level: RegionLevel, parent: Option<&str>) -> Self {
        Self { level, parent: parent.map(Arc::from) }
    }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some(parent) => write!(f, "{}/{}", self.level, parent),
            None => write!(f, "{}", self.level),
        }
    }
}

/// Session-lifetime geometry cache.
///
/// Each (level, parent) key is fetched at most once; entries are immutable and
/// never invalidated. Fetch failures are reported to the caller and are not
/// cached, so the next navigation retries the fetch.
pub struct GeoCache {
    source: Arc<dyn DataSource>,
    entries: Mutex<AHashMap<LayerKey, Arc<RegionSet>>>,
}

impl GeoCache {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source, entries: Mutex::new(AHashMap::new()) }
    }

    /// Whole-set atomic load: the full feature collection is parsed before the
    /// entry becomes visible. Never panics on bad input.
    pub fn get_geometry(
        &self,
        level: RegionLevel,
        parent: Option<&str>,
    ) -> Result<Arc<RegionSet>, FetchError> {
        let key = LayerKey::new(level, parent);

        if let Some(set) = self.entries.lock().expect("geo cache lock poisoned").get(&key) {
            return Ok(Arc::clone(set));
        }

        let set = Arc::new(self.fetch(&key, level, parent)?);
        self.entries
            .lock()
            .expect("geo cache lock poisoned")
            .insert(key, Arc::clone(&set));
        Ok(set)
    }

    fn fetch(
        &self,
        key: &LayerKey,
        level: RegionLevel,
        parent: Option<&str>,
    ) -> Result<RegionSet, FetchError> {
        let primary = endpoint::geometry(level, parent);
        let bytes = match self.source.get(&primary) {
            Ok(bytes) => bytes,
            Err(err) => {
                let fallback = endpoint::geometry_fallback(level, parent);
                if self.source.has(&fallback) {
                    warn!("[geo] {primary} unavailable, using fallback dataset: {err:#}");
                    self.source
                        .get(&fallback)
                        .map_err(|err| FetchError::geometry(key.to_string(), format!("{err:#}")))?
                } else {
                    return Err(FetchError::geometry(key.to_string(), format!("{err:#}")));
                }
            }
        };

        let regions = super::parse_feature_collection(&bytes, level, parent)
            .map_err(|err| FetchError::geometry(key.to_string(), format!("{err:#}")))?;
        Ok(RegionSet::new(level, regions))
    }
}
