#![doc = "Electomap public API"]
pub mod cli;
pub mod commands;

mod boundary;
mod dashboard;
mod error;
mod region;
mod render;
mod round;
mod source;
mod stats;
mod view;

#[doc(inline)]
pub use dashboard::Dashboard;

#[doc(inline)]
pub use region::{Region, RegionLevel, RegionSet};

#[doc(inline)]
pub use boundary::{GeoCache, LayerKey};

#[doc(inline)]
pub use stats::{Observed, RegionStats, StatsAggregator, StatsMap};

#[doc(inline)]
pub use round::{PollTick, RoundManager, RoundState, POLL_INTERVAL};

#[doc(inline)]
pub use render::{Notice, RenderEngine, Tooltip, Transform, Viewport};

#[doc(inline)]
pub use view::{MemStore, Metric, NavOutcome, Navigator, Normalization, ViewParams, ViewState, ViewStore};

#[doc(inline)]
pub use source::{DataSource, DiskSource, HttpSource, MemSource};

#[doc(inline)]
pub use error::FetchError;
