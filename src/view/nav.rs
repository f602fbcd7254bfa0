use std::sync::Arc;

use log::warn;

use crate::region::RegionLevel;
use crate::round::RoundState;

use super::params::{ViewParams, ViewStore};
use super::state::ViewState;

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// The view changed; the pipeline must reload for the new key.
    Changed,
    /// Drill-down into a round without data: show the notice, fetch nothing.
    NoDataForRound,
    /// The request was a no-op (already there, or nothing to go back to).
    Ignored,
}

/// Drill-down state machine over the three nesting levels.
///
/// Country -> County on a county click, County -> SubCounty on a sub-region
/// click, back pops to the exact pre-drill view (metric and filter threshold
/// included). Every transition persists the shareable view parameters.
pub struct Navigator {
    view: ViewState,
    round_id: String,
    stack: Vec<ViewState>,
    store: Box<dyn ViewStore>,
}

impl Navigator {
    /// Restores a persisted view when the store holds one, so a reload or a
    /// shared link lands on the same level/parent/round.
    pub fn new(store: Box<dyn ViewStore>, round_id: impl Into<String>) -> Self {
        let mut nav = Self {
            view: ViewState::default(),
            round_id: round_id.into(),
            stack: Vec::new(),
            store,
        };
        match nav.store.read() {
            Ok(Some(params)) => nav.apply(params),
            Ok(None) => {}
            Err(err) => warn!("[nav] ignoring unreadable view params: {err:#}"),
        }
        nav
    }

    fn apply(&mut self, params: ViewParams) {
        self.view.level = params.level;
        self.view.selected_parent = params.parent.map(Arc::from);
        self.view.location = params.location;
        self.round_id = params.round;
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub fn round_id(&self) -> &str {
        &self.round_id
    }

    pub fn params(&self) -> ViewParams {
        ViewParams {
            level: self.view.level,
            parent: self.view.selected_parent.as_deref().map(str::to_string),
            round: self.round_id.clone(),
            location: self.view.location.clone(),
        }
    }

    /// Region click from the render surface.
    pub fn drill_into(&mut self, code: &str, round: &RoundState) -> NavOutcome {
        match self.view.level {
            RegionLevel::Country => {
                self.stack.push(self.view.clone());
                self.view.level = RegionLevel::County;
                self.view.selected_parent = Some(Arc::from(code));
                self.persist();
                NavOutcome::Changed
            }
            RegionLevel::County => {
                if !round.has_data {
                    // Surfaced instead of attempting a sub-county fetch.
                    return NavOutcome::NoDataForRound;
                }
                self.stack.push(self.view.clone());
                self.view.level = RegionLevel::SubCounty;
                self.view.selected_parent = Some(Arc::from(code));
                self.persist();
                NavOutcome::Changed
            }
            RegionLevel::SubCounty => NavOutcome::Ignored,
        }
    }

    /// Explicit "back": restores the exact pre-drill view.
    pub fn back(&mut self) -> NavOutcome {
        match self.stack.pop() {
            Some(previous) => {
                self.view = previous;
                self.persist();
                NavOutcome::Changed
            }
            None => NavOutcome::Ignored,
        }
    }

    /// Explicit level selection from the menu chrome.
    pub fn select_level(&mut self, level: RegionLevel, round: &RoundState) -> NavOutcome {
        if level == self.view.level {
            return NavOutcome::Ignored;
        }
        match level {
            RegionLevel::Country => {
                self.stack.clear();
                self.view.level = RegionLevel::Country;
                self.view.selected_parent = None;
                self.persist();
                NavOutcome::Changed
            }
            RegionLevel::County => {
                self.stack.push(self.view.clone());
                self.view.level = RegionLevel::County;
                self.persist();
                NavOutcome::Changed
            }
            RegionLevel::SubCounty => {
                let Some(parent) = self.view.selected_parent.clone() else {
                    return NavOutcome::Ignored;
                };
                if !round.has_data {
                    return NavOutcome::NoDataForRound;
                }
                self.stack.push(self.view.clone());
                self.view.level = RegionLevel::SubCounty;
                self.view.selected_parent = Some(parent);
                self.persist();
                NavOutcome::Changed
            }
        }
    }

    pub fn on_round_change(&mut self, round_id: &str) {
        self.round_id = round_id.to_string();
        self.persist();
    }

    pub fn set_location(&mut self, location: Option<String>) {
        self.view.location = location;
        self.persist();
    }

    fn persist(&mut self) {
        let params = self.params();
        if let Err(err) = self.store.write(&params) {
            warn!("[nav] failed to persist view params: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Observed;
    use crate::view::params::MemStore;
    use crate::view::state::Metric;

    fn observed() -> Observed {
        Observed { max_turnout: 60.0, min_stations: 2, max_stations: 20, max_voters: 5_000 }
    }

    #[test]
    fn drill_down_round_trip_restores_the_pre_drill_view() {
        let round = RoundState::preloaded("tur1", true);
        let mut nav = Navigator::new(Box::new(MemStore::new()), "tur1");

        nav.view_mut().set_metric(Metric::Stations, &observed());
        nav.view_mut().set_threshold(7.0, &observed());
        let before = nav.view().clone();

        assert_eq!(nav.drill_into("CJ", &round), NavOutcome::Changed);
        assert_eq!(nav.view().level, RegionLevel::County);
        assert_eq!(nav.drill_into("CJ", &round), NavOutcome::Changed);
        assert_eq!(nav.view().level, RegionLevel::SubCounty);
        assert_eq!(nav.view().selected_parent.as_deref(), Some("CJ"));

        assert_eq!(nav.back(), NavOutcome::Changed);
        assert_eq!(nav.view().level, RegionLevel::County);
        assert_eq!(nav.back(), NavOutcome::Changed);
        assert_eq!(nav.view(), &before);
        assert_eq!(nav.back(), NavOutcome::Ignored);
    }

    #[test]
    fn drill_down_without_round_data_surfaces_a_notice() {
        let round = RoundState::preloaded("tur2", false);
        let mut nav = Navigator::new(Box::new(MemStore::new()), "tur2");

        assert_eq!(nav.drill_into("CJ", &round), NavOutcome::Changed);
        // County -> SubCounty is the transition that would fetch.
        assert_eq!(nav.drill_into("CJ", &round), NavOutcome::NoDataForRound);
        assert_eq!(nav.view().level, RegionLevel::County);
    }

    #[test]
    fn entering_subcounty_persists_level_and_parent() {
        let round = RoundState::preloaded("tur1", true);
        let store = MemStore::new();
        let mut nav = Navigator::new(Box::new(store.clone()), "tur1");

        nav.drill_into("AB", &round);
        nav.drill_into("AB", &round);

        let persisted = store.read().unwrap().unwrap();
        assert_eq!(persisted.level, RegionLevel::SubCounty);
        assert_eq!(persisted.parent.as_deref(), Some("AB"));
        assert_eq!(persisted.round, "tur1");

        // A fresh navigator over the same store reconstructs the view.
        let restored = Navigator::new(Box::new(store), "tur1");
        assert_eq!(restored.view().level, RegionLevel::SubCounty);
        assert_eq!(restored.view().selected_parent.as_deref(), Some("AB"));
    }

    #[test]
    fn clicks_at_subcounty_level_are_ignored() {
        let round = RoundState::preloaded("tur1", true);
        let mut nav = Navigator::new(Box::new(MemStore::new()), "tur1");
        nav.drill_into("AB", &round);
        nav.drill_into("AB", &round);
        assert_eq!(nav.drill_into("AB-001", &round), NavOutcome::Ignored);
    }

    #[test]
    fn explicit_country_selection_clears_the_stack() {
        let round = RoundState::preloaded("tur1", true);
        let mut nav = Navigator::new(Box::new(MemStore::new()), "tur1");
        nav.drill_into("AB", &round);
        nav.drill_into("AB", &round);

        assert_eq!(nav.select_level(RegionLevel::Country, &round), NavOutcome::Changed);
        assert_eq!(nav.view().level, RegionLevel::Country);
        assert_eq!(nav.view().selected_parent, None);
        assert_eq!(nav.back(), NavOutcome::Ignored);
    }
}
