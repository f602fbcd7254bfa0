mod nav;
mod params;
mod state;

pub use nav::{NavOutcome, Navigator};
pub use params::{MemStore, ViewParams, ViewStore};
pub use state::{Metric, Normalization, ViewState};
