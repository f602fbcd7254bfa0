mod cache;
mod geojson;

pub use cache::{GeoCache, LayerKey};
pub(crate) use geojson::parse_feature_collection;
