use crate::stats::{Observed, RegionStats};
use crate::view::{Metric, Normalization};

/// Fill for filter matches.
pub(crate) const HIGHLIGHT: &str = "#facc15";
/// Fill for regions with no statistics entry.
pub(crate) const NEUTRAL: &str = "#e5e7eb";
/// Fill for regions below an exact-match station filter.
pub(crate) const FAINT: &str = "#f8fafc";
/// Five-band ramp, lowest to highest ratio.
pub(crate) const RAMP: [&str; 5] = ["#edf8e9", "#bae4b3", "#74c476", "#31a354", "#006d2c"];
/// Darker variant used with whole-list normalization.
pub(crate) const RAMP_DARK: [&str; 5] = ["#c7e9c0", "#a1d99b", "#41ab5d", "#238b45", "#00441b"];

/// Turnout values this close to the filter threshold count as a match.
const THRESHOLD_EPSILON: f64 = 0.1;

/// Discrete band for a normalized ratio; monotone in the ratio.
pub(crate) fn band_index(ratio: f64) -> usize {
    if ratio > 0.6 {
        4
    } else if ratio > 0.4 {
        3
    } else if ratio > 0.2 {
        2
    } else if ratio > 0.1 {
        1
    } else {
        0
    }
}

/// Fill for one region under the current metric, normalization, and filter.
///
/// The station filter highlights on equality while the voters filter
/// highlights at-or-above the threshold; the asymmetry is a documented quirk
/// of the feed semantics and is preserved as-is.
pub(crate) fn region_fill(
    metric: Metric,
    normalization: Normalization,
    stats: Option<&RegionStats>,
    threshold: f64,
    observed: &Observed,
) -> &'static str {
    let Some(stats) = stats else { return NEUTRAL };

    match metric {
        Metric::Turnout => {
            let percent = stats.turnout_percent();
            if (percent - threshold).abs() < THRESHOLD_EPSILON {
                return HIGHLIGHT;
            }
            match normalization {
                Normalization::RelativeToTotal => RAMP_DARK[band_index(percent / 100.0)],
                Normalization::RelativeToMax => {
                    let ceiling =
                        if observed.max_turnout > 0.0 { observed.max_turnout } else { 100.0 };
                    RAMP[band_index(percent / ceiling)]
                }
            }
        }
        Metric::Stations => {
            let count = stats.polling_station_count;
            let max = observed.max_stations;
            let filter = threshold.round() as u32;
            if count == filter || (filter >= max && count == max) {
                HIGHLIGHT
            } else if count > filter {
                RAMP[band_index(count as f64 / max.max(1) as f64)]
            } else {
                FAINT
            }
        }
        Metric::Voters => {
            if stats.total_voters as f64 >= threshold {
                HIGHLIGHT
            } else {
                RAMP[band_index(stats.total_voters as f64 / observed.max_voters.max(1) as f64)]
            }
        }
    }
}
