use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use log::{debug, warn};
use tokio::task;

use crate::boundary::GeoCache;
use crate::region::{RegionLevel, RegionSet};
use crate::render::{Notice, RenderEngine, Tooltip, Viewport};
use crate::round::{PollTick, RoundManager, RoundState};
use crate::source::DataSource;
use crate::stats::{fill_missing, Observed, StatsAggregator, StatsMap};
use crate::view::{Metric, NavOutcome, Navigator, Normalization, ViewParams, ViewState, ViewStore};

/// Identity of one frame load. A completion tagged with a key that is no
/// longer current is dropped, so the view never mixes two loads.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FrameKey {
    level: RegionLevel,
    parent: Option<Arc<str>>,
    round: RoundState,
    location: Option<String>,
}

/// The view-visible frame. Replaced wholesale on every successful load.
#[derive(Default)]
struct FrameSlot {
    key: Option<FrameKey>,
    regions: Option<Arc<RegionSet>>,
    stats: Option<Arc<StatsMap>>,
    notice: Option<Notice>,
}

struct Inner {
    geo: GeoCache,
    stats: StatsAggregator,
    frame: Mutex<FrameSlot>,
    /// The combination the view is asking for right now.
    current: Mutex<Option<FrameKey>>,
}

impl Inner {
    /// Load geometry and statistics for `key` and install the frame.
    ///
    /// The two fetches run concurrently and may resolve in either order; the
    /// frame is installed only once both are available, and only if `key` is
    /// still the current combination (last-completed-wins).
    async fn refresh(self: Arc<Self>, key: FrameKey) -> Result<()> {
        let display = key.level.display_level();
        let parent = match display {
            RegionLevel::SubCounty => key.parent.clone(),
            _ => None,
        };

        let geo_inner = Arc::clone(&self);
        let geo_parent = parent.clone();
        let geo_task = task::spawn_blocking(move || {
            geo_inner.geo.get_geometry(display, geo_parent.as_deref())
        });

        let stats_inner = Arc::clone(&self);
        let stats_key = key.clone();
        let stats_task = task::spawn_blocking(move || {
            stats_inner.stats.load_raw(
                stats_key.level,
                parent.as_deref(),
                &stats_key.round,
                stats_key.location.as_deref(),
            )
        });

        let (geo_result, stats_result) = tokio::join!(geo_task, stats_task);
        let geo_result = geo_result.context("geometry task panicked")?;
        let stats_result = stats_result.context("statistics task panicked")?;

        let regions = match geo_result {
            Ok(regions) => regions,
            Err(err) => {
                warn!("[dashboard] {err}");
                self.install(key, None, None, Some(Notice::GeometryUnavailable(err.to_string())));
                return Ok(());
            }
        };

        let mut stats = match stats_result {
            Ok(map) => map,
            Err(err) => {
                // A failed poll tick for an already-loaded frame keeps the
                // previous statistics; the timer stays alive.
                let has_previous =
                    self.frame.lock().expect("frame lock poisoned").key.as_ref() == Some(&key);
                if has_previous {
                    warn!("[dashboard] live fetch failed, keeping previous statistics: {err}");
                    return Ok(());
                }
                warn!("[dashboard] {err}");
                StatsMap::default()
            }
        };

        fill_missing(&mut stats, &regions);
        let notice = (!key.round.has_data).then_some(Notice::NoDataForRound);
        self.install(key, Some(regions), Some(Arc::new(stats)), notice);
        Ok(())
    }

    fn install(
        &self,
        key: FrameKey,
        regions: Option<Arc<RegionSet>>,
        stats: Option<Arc<StatsMap>>,
        notice: Option<Notice>,
    ) {
        let still_current =
            self.current.lock().expect("current key lock poisoned").as_ref() == Some(&key);
        if !still_current {
            debug!("[dashboard] dropping stale frame for {}/{}", key.level, key.round.round_id);
            return;
        }

        let mut frame = self.frame.lock().expect("frame lock poisoned");
        frame.key = Some(key);
        frame.regions = regions;
        frame.stats = stats;
        frame.notice = notice;
    }
}

/// Orchestrates the load pipeline: round selection drives the geometry cache
/// and the statistics aggregator, results land in an atomically swapped
/// frame, and pointer events route back through the drill-down navigator.
pub struct Dashboard {
    inner: Arc<Inner>,
    rounds: RoundManager,
    nav: Navigator,
    engine: RenderEngine,
}

impl Dashboard {
    pub fn new(
        source: Arc<dyn DataSource>,
        store: Box<dyn ViewStore>,
        initial_round: RoundState,
        viewport: Viewport,
    ) -> Self {
        let inner = Arc::new(Inner {
            geo: GeoCache::new(Arc::clone(&source)),
            stats: StatsAggregator::new(source),
            frame: Mutex::new(FrameSlot::default()),
            current: Mutex::new(None),
        });

        // The poll tick re-runs the load for whatever combination is current.
        let tick: PollTick = {
            let inner = Arc::clone(&inner);
            Arc::new(move || {
                let inner = Arc::clone(&inner);
                Box::pin(async move {
                    let current =
                        inner.current.lock().expect("current key lock poisoned").clone();
                    match current {
                        Some(key) => Arc::clone(&inner).refresh(key).await,
                        None => Ok(()),
                    }
                })
            })
        };

        let nav = Navigator::new(store, initial_round.round_id.clone());
        let rounds = RoundManager::new(initial_round, tick);

        Self { inner, rounds, nav, engine: RenderEngine::new(viewport) }
    }

    pub fn view(&self) -> &ViewState {
        self.nav.view()
    }

    /// Shareable view parameters for the current state.
    pub fn params(&self) -> ViewParams {
        self.nav.params()
    }

    pub fn round(&self) -> RoundState {
        self.rounds.current()
    }

    pub fn is_polling(&self) -> bool {
        self.rounds.is_polling()
    }

    /// Round selection: cancels any prior polling, installs the round, and
    /// reloads. Entering a live round starts the recurring poll.
    pub async fn select_round(&mut self, round: RoundState) -> Result<()> {
        self.nav.on_round_change(&round.round_id);
        self.rounds.select_round(round);
        self.refresh().await
    }

    /// Rebuild the frame for the current view, round, and location.
    pub async fn refresh(&mut self) -> Result<()> {
        let view = self.nav.view();
        let key = FrameKey {
            level: view.level,
            parent: view.selected_parent.clone(),
            round: self.rounds.current(),
            location: view.location.clone(),
        };
        *self.inner.current.lock().expect("current key lock poisoned") = Some(key.clone());
        Arc::clone(&self.inner).refresh(key).await
    }

    /// Region click routed through the navigator; a level change reloads.
    pub async fn drill_into(&mut self, code: &str) -> Result<NavOutcome> {
        let round = self.rounds.current();
        let outcome = self.nav.drill_into(code, &round);
        if outcome == NavOutcome::Changed {
            self.refresh().await?;
        }
        Ok(outcome)
    }

    pub async fn back(&mut self) -> Result<NavOutcome> {
        let outcome = self.nav.back();
        if outcome == NavOutcome::Changed {
            self.refresh().await?;
        }
        Ok(outcome)
    }

    pub async fn select_level(&mut self, level: RegionLevel) -> Result<NavOutcome> {
        let round = self.rounds.current();
        let outcome = self.nav.select_level(level, &round);
        if outcome == NavOutcome::Changed {
            self.refresh().await?;
        }
        Ok(outcome)
    }

    /// Location switches reload statistics; geometry stays cached.
    pub async fn set_location(&mut self, location: Option<String>) -> Result<()> {
        self.nav.set_location(location);
        self.refresh().await
    }

    /// Metric switches recolor the current frame; nothing is refetched.
    pub fn set_metric(&mut self, metric: Metric) {
        let observed = self.observed();
        self.nav.view_mut().set_metric(metric, &observed);
    }

    pub fn set_threshold(&mut self, value: f64) {
        let observed = self.observed();
        self.nav.view_mut().set_threshold(value, &observed);
    }

    pub fn set_normalization(&mut self, normalization: Normalization) {
        self.nav.view_mut().set_normalization(normalization);
    }

    pub fn observed(&self) -> Observed {
        let frame = self.inner.frame.lock().expect("frame lock poisoned");
        frame.stats.as_deref().map(Observed::from_map).unwrap_or_default()
    }

    /// Surface click: hit-test the current frame and drill into the region.
    pub async fn click(&mut self, x: f64, y: f64) -> Result<NavOutcome> {
        let code = {
            let frame = self.inner.frame.lock().expect("frame lock poisoned");
            frame.regions.as_deref().and_then(|regions| self.engine.click(regions, x, y))
        };
        match code {
            Some(code) => self.drill_into(&code).await,
            None => Ok(NavOutcome::Ignored),
        }
    }

    /// Pointer move over the surface; None clears the tooltip.
    pub fn hover(&self, x: f64, y: f64) -> Option<Tooltip> {
        let frame = self.inner.frame.lock().expect("frame lock poisoned");
        let regions = frame.regions.as_deref()?;
        let stats = frame.stats.as_deref()?;
        self.engine.hover(regions, stats, x, y)
    }

    pub fn render_svg(&self) -> Result<String> {
        let frame = self.inner.frame.lock().expect("frame lock poisoned");
        if let Some(Notice::GeometryUnavailable(message)) = &frame.notice {
            let mut buffer = Vec::new();
            self.engine.render_message(&mut buffer, message)?;
            return Ok(String::from_utf8(buffer)?);
        }
        match (&frame.regions, &frame.stats) {
            (Some(regions), Some(stats)) => {
                self.engine.render_to_string(regions, stats, self.nav.view(), frame.notice.as_ref())
            }
            _ => {
                let mut buffer = Vec::new();
                self.engine.render_message(&mut buffer, "No data loaded")?;
                Ok(String::from_utf8(buffer)?)
            }
        }
    }

    pub fn engine(&self) -> &RenderEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut RenderEngine {
        &mut self.engine
    }

    /// Teardown unconditionally cancels polling.
    pub fn teardown(&mut self) {
        self.rounds.stop_polling();
    }
}
