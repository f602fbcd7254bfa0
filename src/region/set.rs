use std::sync::Arc;

use ahash::AHashMap;
use geo::{BoundingRect, Centroid, Coord, MultiPolygon, Point, Rect};

use super::RegionLevel;

/// A geographic unit at one nesting level.
/// Geometry is immutable once loaded; the centroid anchors the region label.
#[derive(Debug, Clone)]
pub struct Region {
    pub code: Arc<str>,
    pub name: Arc<str>,
    pub level: RegionLevel,
    pub parent: Option<Arc<str>>,
    pub shape: MultiPolygon<f64>,
    pub centroid: Option<Point<f64>>,
}

impl Region {
    pub fn new(
        code: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        level: RegionLevel,
        parent: Option<Arc<str>>,
        shape: MultiPolygon<f64>,
    ) -> Self {
        let centroid = shape.centroid();
        Self { code: code.into(), name: name.into(), level, parent, shape, centroid }
    }
}

/// An atomically-loaded set of regions for one (level, parent) key.
#[derive(Debug)]
pub struct RegionSet {
    level: RegionLevel,
    regions: Vec<Region>,
    index: AHashMap<Arc<str>, u32>, // code -> position in `regions`
    bounds: Option<Rect<f64>>,
}

impl RegionSet {
    pub fn new(level: RegionLevel, regions: Vec<Region>) -> Self {
        let index = regions
            .iter()
            .enumerate()
            .map(|(i, region)| (Arc::clone(&region.code), i as u32))
            .collect();
        let bounds = merged_bounds(&regions);
        Self { level, regions, index, bounds }
    }

    pub fn level(&self) -> RegionLevel { self.level }

    pub fn len(&self) -> usize { self.regions.len() }

    pub fn is_empty(&self) -> bool { self.regions.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &Region> { self.regions.iter() }

    pub fn get(&self, code: &str) -> Option<&Region> {
        self.index.get(code).map(|&i| &self.regions[i as usize])
    }

    pub fn contains(&self, code: &str) -> bool { self.index.contains_key(code) }

    pub fn codes(&self) -> impl Iterator<Item = &Arc<str>> {
        self.regions.iter().map(|region| &region.code)
    }

    /// Union of all member bounding boxes, in lon/lat.
    pub fn bounds(&self) -> Option<Rect<f64>> { self.bounds }
}

fn merged_bounds(regions: &[Region]) -> Option<Rect<f64>> {
    let mut acc: Option<(Coord<f64>, Coord<f64>)> = None;
    for region in regions {
        let Some(rect) = region.shape.bounding_rect() else { continue };
        acc = Some(match acc {
            None => (rect.min(), rect.max()),
            Some((min, max)) => (
                Coord { x: min.x.min(rect.min().x), y: min.y.min(rect.min().y) },
                Coord { x: max.x.max(rect.max().x), y: max.y.max(rect.max().y) },
            ),
        });
    }
    acc.map(|(min, max)| Rect::new(min, max))
}
