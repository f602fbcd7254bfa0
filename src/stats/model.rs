use std::sync::Arc;

use ahash::AHashMap;

/// Per-region voting statistics for one load of one round.
///
/// `total_voters` and `turnout` are always derived from the category counts;
/// neither is ever taken from a feed as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionStats {
    pub registered_voters: u64,
    pub polling_station_count: u32,
    pub permanent_list_voters: u64,
    pub supplementary_list_voters: u64,
    pub special_circumstances_voters: u64,
    pub mobile_urns_voters: u64,
    pub total_voters: u64,
    /// Display percentage with two decimals, "0.00" when nobody is registered.
    pub turnout: String,
}

impl RegionStats {
    pub fn derive(
        registered: u64,
        stations: u32,
        permanent: u64,
        supplementary: u64,
        special: u64,
        mobile: u64,
    ) -> Self {
        let total = permanent + supplementary + special + mobile;
        Self {
            registered_voters: registered,
            polling_station_count: stations,
            permanent_list_voters: permanent,
            supplementary_list_voters: supplementary,
            special_circumstances_voters: special,
            mobile_urns_voters: mobile,
            total_voters: total,
            turnout: format_turnout(total, registered),
        }
    }

    pub fn zero() -> Self {
        Self::derive(0, 0, 0, 0, 0, 0)
    }

    /// Numeric turnout for banding; the formatted field is for display only.
    pub fn turnout_percent(&self) -> f64 {
        if self.registered_voters == 0 {
            0.0
        } else {
            self.total_voters as f64 / self.registered_voters as f64 * 100.0
        }
    }
}

impl Default for RegionStats {
    fn default() -> Self {
        Self::zero()
    }
}

pub(crate) fn format_turnout(total: u64, registered: u64) -> String {
    if registered == 0 {
        "0.00".to_string()
    } else {
        format!("{:.2}", total as f64 / registered as f64 * 100.0)
    }
}

/// Statistics keyed by region code. Replaced wholesale on every reload.
pub type StatsMap = AHashMap<Arc<str>, RegionStats>;

/// Extrema observed across one loaded statistics map. Banding ceilings and
/// filter-threshold ranges are computed against these, never refetched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Observed {
    pub max_turnout: f64,
    pub min_stations: u32,
    pub max_stations: u32,
    pub max_voters: u64,
}

impl Observed {
    pub fn from_map(map: &StatsMap) -> Self {
        let mut observed = Observed::default();
        for (i, stats) in map.values().enumerate() {
            observed.max_turnout = observed.max_turnout.max(stats.turnout_percent());
            observed.max_stations = observed.max_stations.max(stats.polling_station_count);
            observed.min_stations = if i == 0 {
                stats.polling_station_count
            } else {
                observed.min_stations.min(stats.polling_station_count)
            };
            observed.max_voters = observed.max_voters.max(stats.total_voters);
        }
        observed
    }
}
