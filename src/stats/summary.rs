use std::{collections::HashMap, sync::Arc};

use ahash::AHashMap;
use serde::Deserialize;

use crate::error::FetchError;

use super::model::{RegionStats, StatsMap};

/// Per-region summary from the statistics API. Only the registered-voter
/// count is consumed; unknown metadata fields are ignored.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SummaryRecord {
    pub registered_voters: u64,
}

pub(crate) fn parse_summary(
    bytes: &[u8],
    what: &str,
) -> Result<AHashMap<Arc<str>, SummaryRecord>, FetchError> {
    let map: HashMap<String, SummaryRecord> = serde_json::from_slice(bytes)
        .map_err(|err| FetchError::statistics(what, err))?;
    Ok(map.into_iter().map(|(code, record)| (Arc::from(code.as_str()), record)).collect())
}

/// Full per-region record from the live and sub-county endpoints.
/// Totals and turnout are always recomputed, never trusted from the wire.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ApiRecord {
    pub registered_voters: u64,
    pub polling_station_count: u32,
    pub permanent_list_voters: u64,
    pub supplementary_list_voters: u64,
    pub special_circumstances_voters: u64,
    pub mobile_urns_voters: u64,
}

impl ApiRecord {
    pub(crate) fn into_stats(self) -> RegionStats {
        RegionStats::derive(
            self.registered_voters,
            self.polling_station_count,
            self.permanent_list_voters,
            self.supplementary_list_voters,
            self.special_circumstances_voters,
            self.mobile_urns_voters,
        )
    }
}

pub(crate) fn parse_api_map(bytes: &[u8], what: &str) -> Result<StatsMap, FetchError> {
    let map: HashMap<String, ApiRecord> = serde_json::from_slice(bytes)
        .map_err(|err| FetchError::statistics(what, err))?;
    Ok(map
        .into_iter()
        .map(|(code, record)| (Arc::<str>::from(code.as_str()), record.into_stats()))
        .collect())
}
