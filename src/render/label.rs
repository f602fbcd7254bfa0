use crate::stats::RegionStats;
use crate::view::Metric;

/// Compact count formatting for labels: 12300 -> "12.3k", 1200000 -> "1.2M".
pub(crate) fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        short(n as f64 / 1e6, "M")
    } else if n >= 1_000 {
        short(n as f64 / 1e3, "k")
    } else {
        n.to_string()
    }
}

fn short(value: f64, suffix: &str) -> String {
    let text = format!("{value:.1}");
    let text = text.strip_suffix(".0").unwrap_or(&text);
    format!("{text}{suffix}")
}

/// Second label line under the region code, with its opacity. The line is
/// always rendered; visibility toggles through opacity so a metric switch
/// never reflows the layout.
pub(crate) fn secondary_label(metric: Metric, stats: &RegionStats) -> (String, f64) {
    match metric {
        Metric::Stations => (stats.polling_station_count.to_string(), 1.0),
        Metric::Voters => (format_count(stats.total_voters), 1.0),
        Metric::Turnout => (format_count(stats.total_voters), 0.0),
    }
}
