use std::{fmt, str::FromStr, sync::Arc};

use crate::region::RegionLevel;
use crate::stats::Observed;

/// Statistic driving region colors and labels. Closed set: the banding
/// function matches exhaustively, so a new metric touches every consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Turnout,
    Stations,
    Voters,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Turnout => "turnout",
            Metric::Stations => "stations",
            Metric::Voters => "voters",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "turnout" => Ok(Metric::Turnout),
            "stations" => Ok(Metric::Stations),
            "voters" => Ok(Metric::Voters),
            other => Err(format!("unknown metric: {other}")),
        }
    }
}

/// Ceiling used when normalizing a region's ratio into a color band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Maximum observed value across the loaded regions is the ceiling.
    RelativeToMax,
    /// The theoretical whole (100% of registered) is the ceiling.
    RelativeToTotal,
}

impl Normalization {
    pub fn as_str(self) -> &'static str {
        match self {
            Normalization::RelativeToMax => "relative-to-max",
            Normalization::RelativeToTotal => "relative-to-total",
        }
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Normalization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relative-to-max" | "max" => Ok(Normalization::RelativeToMax),
            "relative-to-total" | "total" => Ok(Normalization::RelativeToTotal),
            other => Err(format!("unknown normalization: {other}")),
        }
    }
}

/// Mutable view configuration, created with defaults at component start and
/// torn down with the view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub level: RegionLevel,
    pub metric: Metric,
    pub normalization: Normalization,
    pub filter_threshold: f64,
    pub selected_parent: Option<Arc<str>>,
    pub location: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            level: RegionLevel::Country,
            metric: Metric::Turnout,
            normalization: Normalization::RelativeToMax,
            filter_threshold: 0.0,
            selected_parent: None,
            location: None,
        }
    }
}

impl ViewState {
    /// Valid threshold range for the current metric.
    pub fn threshold_range(&self, observed: &Observed) -> (f64, f64) {
        match self.metric {
            Metric::Turnout => (0.0, 100.0),
            Metric::Stations => (0.0, observed.max_stations as f64),
            Metric::Voters => (0.0, observed.max_voters as f64),
        }
    }

    /// A metric switch always resets the filter threshold to a value valid
    /// for the new metric's range.
    pub fn set_metric(&mut self, metric: Metric, observed: &Observed) {
        if self.metric == metric {
            return;
        }
        self.metric = metric;
        self.filter_threshold = match metric {
            Metric::Turnout => 0.0,
            Metric::Stations => observed.min_stations as f64,
            Metric::Voters => observed.max_voters as f64,
        };
    }

    pub fn set_threshold(&mut self, value: f64, observed: &Observed) {
        let (lo, hi) = self.threshold_range(observed);
        self.filter_threshold = value.clamp(lo, hi);
    }

    /// Whole-list normalization caps the turnout threshold at 100.
    pub fn set_normalization(&mut self, normalization: Normalization) {
        self.normalization = normalization;
        if normalization == Normalization::RelativeToTotal && self.metric == Metric::Turnout {
            self.filter_threshold = self.filter_threshold.min(100.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed() -> Observed {
        Observed { max_turnout: 72.5, min_stations: 3, max_stations: 40, max_voters: 90_000 }
    }

    #[test]
    fn metric_switch_resets_the_threshold() {
        let mut view = ViewState::default();
        view.set_threshold(55.0, &observed());
        assert_eq!(view.filter_threshold, 55.0);

        view.set_metric(Metric::Stations, &observed());
        assert_eq!(view.filter_threshold, 3.0);

        view.set_metric(Metric::Voters, &observed());
        assert_eq!(view.filter_threshold, 90_000.0);

        view.set_metric(Metric::Turnout, &observed());
        assert_eq!(view.filter_threshold, 0.0);
    }

    #[test]
    fn reselecting_the_same_metric_keeps_the_threshold() {
        let mut view = ViewState::default();
        view.set_threshold(42.0, &observed());
        view.set_metric(Metric::Turnout, &observed());
        assert_eq!(view.filter_threshold, 42.0);
    }

    #[test]
    fn thresholds_clamp_to_the_metric_range() {
        let mut view = ViewState::default();
        view.set_threshold(250.0, &observed());
        assert_eq!(view.filter_threshold, 100.0);

        view.set_metric(Metric::Stations, &observed());
        view.set_threshold(99.0, &observed());
        assert_eq!(view.filter_threshold, 40.0);
        view.set_threshold(-5.0, &observed());
        assert_eq!(view.filter_threshold, 0.0);
    }

    #[test]
    fn whole_list_normalization_caps_turnout_threshold() {
        let mut view = ViewState::default();
        view.filter_threshold = 180.0; // out of range after a data swap
        view.set_normalization(Normalization::RelativeToTotal);
        assert_eq!(view.filter_threshold, 100.0);
    }

    #[test]
    fn metric_names_round_trip() {
        for metric in [Metric::Turnout, Metric::Stations, Metric::Voters] {
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
        }
        assert!("seats".parse::<Metric>().is_err());
    }
}
