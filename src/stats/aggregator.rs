use std::sync::{Arc, Mutex};

use ahash::AHashMap;
use log::warn;

use crate::error::FetchError;
use crate::region::{RegionLevel, RegionSet};
use crate::round::RoundState;
use crate::source::{endpoint, DataSource};

use super::model::{RegionStats, StatsMap};
use super::reference::reference_stats;
use super::summary::{parse_api_map, parse_summary, SummaryRecord};
use super::tabular::{aggregate_tabular, RawCounts};

/// Sub-county cache key. Scoped by round id so a round switch reloads.
type UatKey = (String, Arc<str>);

/// Merges the tabular feed, the per-region summaries, and the live/sub-county
/// API records into one statistics map per (level, parent, round) request.
pub struct StatsAggregator {
    source: Arc<dyn DataSource>,
    uat_cache: Mutex<AHashMap<UatKey, Arc<StatsMap>>>,
}

impl StatsAggregator {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source, uat_cache: Mutex::new(AHashMap::new()) }
    }

    /// Full contract: fetch and merge, then guarantee an entry (possibly
    /// all-zero) for every geometry-known region code.
    pub fn load(
        &self,
        level: RegionLevel,
        parent: Option<&str>,
        round: &RoundState,
        location: Option<&str>,
        known: &RegionSet,
    ) -> Result<StatsMap, FetchError> {
        let mut map = self.load_raw(level, parent, round, location)?;
        fill_missing(&mut map, known);
        Ok(map)
    }

    /// Fetch and merge without the geometry-driven zero fill. The orchestrator
    /// runs this concurrently with the geometry load and fills afterwards.
    ///
    /// Only live fetches surface an error; the preloaded path always degrades
    /// to the reference dataset or placeholders so the map keeps rendering.
    pub(crate) fn load_raw(
        &self,
        level: RegionLevel,
        parent: Option<&str>,
        round: &RoundState,
        location: Option<&str>,
    ) -> Result<StatsMap, FetchError> {
        if !round.has_data {
            // Zero placeholders for the whole geometry set come from the fill
            // step; nothing is fetched for a round without data.
            return Ok(StatsMap::default());
        }

        match level.display_level() {
            RegionLevel::SubCounty => {
                let parent = parent.ok_or_else(|| {
                    FetchError::statistics("uat", "missing parent county code")
                })?;
                self.load_subcounty(parent, round)
            }
            _ => self.load_county(round, location),
        }
    }

    fn load_county(
        &self,
        round: &RoundState,
        location: Option<&str>,
    ) -> Result<StatsMap, FetchError> {
        if round.is_live {
            let rel = endpoint::live(&round.round_id, location);
            let bytes = self
                .source
                .get(&rel)
                .map_err(|err| FetchError::statistics(rel.clone(), format!("{err:#}")))?;
            return parse_api_map(&bytes, &rel);
        }

        let summary = self.fetch_summary(round, location);
        match self.fetch_raw_counts(round, location) {
            Some(raw) if !raw.is_empty() => Ok(merge_counts(raw, summary)),
            _ => {
                warn!(
                    "[stats] no usable tabular rows for round {}, substituting reference dataset",
                    round.round_id
                );
                let mut map = reference_stats();
                apply_summary(&mut map, summary);
                Ok(map)
            }
        }
    }

    fn fetch_raw_counts(
        &self,
        round: &RoundState,
        location: Option<&str>,
    ) -> Option<AHashMap<Arc<str>, RawCounts>> {
        let rel = endpoint::tabular(&round.round_id, location);
        let bytes = match self.source.get(&rel) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("[stats] {rel} unavailable: {err:#}");
                return None;
            }
        };
        match aggregate_tabular(&bytes) {
            Ok(raw) => Some(raw),
            Err(err) => {
                warn!("[stats] {rel}: {err}");
                None
            }
        }
    }

    fn fetch_summary(
        &self,
        round: &RoundState,
        location: Option<&str>,
    ) -> Option<AHashMap<Arc<str>, SummaryRecord>> {
        let rel = endpoint::summary(&round.round_id, location);
        if !self.source.has(&rel) {
            return None;
        }
        let bytes = match self.source.get(&rel) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("[stats] {rel} unavailable: {err:#}");
                return None;
            }
        };
        match parse_summary(&bytes, &rel) {
            Ok(map) => Some(map),
            Err(err) => {
                warn!("[stats] {err}");
                None
            }
        }
    }

    /// Parent-scoped sub-county load. Successful fetches are cached per
    /// (round, parent); live rounds bypass the cache so polling stays fresh.
    fn load_subcounty(&self, parent: &str, round: &RoundState) -> Result<StatsMap, FetchError> {
        let key: UatKey = (round.round_id.clone(), Arc::from(parent));

        if !round.is_live {
            if let Some(cached) = self.uat_cache.lock().expect("uat cache lock poisoned").get(&key)
            {
                return Ok((**cached).clone());
            }
        }

        let rel = if round.is_live {
            endpoint::live_subcounty(&round.round_id, parent)
        } else {
            endpoint::subcounty(&round.round_id, parent)
        };

        let fetched = match self.source.get(&rel) {
            Ok(bytes) => match parse_api_map(&bytes, &rel) {
                Ok(map) => Some(map),
                Err(err) => {
                    warn!("[stats] {err}");
                    None
                }
            },
            Err(err) => {
                warn!("[stats] {rel} unavailable: {err:#}");
                None
            }
        };

        match fetched {
            Some(map) => {
                if !round.is_live {
                    self.uat_cache
                        .lock()
                        .expect("uat cache lock poisoned")
                        .insert(key, Arc::new(map.clone()));
                }
                Ok(map)
            }
            // Placeholder entries for every geometry-known unit come from the
            // fill step; failures are not cached so navigation can retry.
            None => Ok(StatsMap::default()),
        }
    }
}

/// Every region present in the geometry set gets a statistics entry.
pub(crate) fn fill_missing(map: &mut StatsMap, known: &RegionSet) {
    for code in known.codes() {
        map.entry(Arc::clone(code)).or_insert_with(RegionStats::zero);
    }
}

fn merge_counts(
    raw: AHashMap<Arc<str>, RawCounts>,
    summary: Option<AHashMap<Arc<str>, SummaryRecord>>,
) -> StatsMap {
    let mut out = StatsMap::default();
    for (code, counts) in raw {
        // The remote summary is authoritative for registered voters when it
        // carries a nonzero figure; row sums cover feeds without summaries.
        let registered = summary
            .as_ref()
            .and_then(|s| s.get(&code))
            .map(|record| record.registered_voters)
            .filter(|&r| r > 0)
            .unwrap_or(counts.registered);

        out.insert(
            code,
            RegionStats::derive(
                registered,
                counts.stations.len() as u32,
                counts.permanent,
                counts.supplementary,
                counts.special,
                counts.mobile,
            ),
        );
    }

    // Regions only the summary knows about still get an entry.
    if let Some(summary) = summary {
        for (code, record) in summary {
            out.entry(code)
                .or_insert_with(|| RegionStats::derive(record.registered_voters, 0, 0, 0, 0, 0));
        }
    }

    out
}

fn apply_summary(map: &mut StatsMap, summary: Option<AHashMap<Arc<str>, SummaryRecord>>) {
    let Some(summary) = summary else { return };
    for (code, record) in summary {
        if record.registered_voters == 0 {
            continue;
        }
        match map.get_mut(&code) {
            Some(stats) => {
                *stats = RegionStats::derive(
                    record.registered_voters,
                    stats.polling_station_count,
                    stats.permanent_list_voters,
                    stats.supplementary_list_voters,
                    stats.special_circumstances_voters,
                    stats.mobile_urns_voters,
                );
            }
            None => {
                map.insert(code, RegionStats::derive(record.registered_voters, 0, 0, 0, 0, 0));
            }
        }
    }
}
