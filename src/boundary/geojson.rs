use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;

use crate::region::{Region, RegionLevel};

/// Parse a GeoJSON FeatureCollection into regions for one (level, parent) key.
///
/// Features without a usable code property get a deterministic "<parent>-NNN"
/// code so unresolved units still render and still receive statistics entries.
pub(crate) fn parse_feature_collection(
    bytes: &[u8],
    level: RegionLevel,
    parent: Option<&str>,
) -> Result<Vec<Region>> {
    let root: Value = serde_json::from_slice(bytes).context("invalid GeoJSON document")?;
    let features = root
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("not a FeatureCollection: missing features array"))?;

    let scope = parent.unwrap_or("RO");
    let mut regions = Vec::with_capacity(features.len());

    for (i, feature) in features.iter().enumerate() {
        let properties = feature.get("properties");
        let prop_str = |key: &str| properties.and_then(|p| p.get(key)).and_then(Value::as_str);

        let code = prop_str("code")
            .or_else(|| prop_str("mnemonic"))
            .or_else(|| feature.get("id").and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-{:03}", scope, i + 1));
        let name = prop_str("name").map(str::to_string).unwrap_or_else(|| code.clone());

        let geometry = feature
            .get("geometry")
            .ok_or_else(|| anyhow!("feature {i} has no geometry"))?;
        let shape = parse_geometry(geometry).with_context(|| format!("feature {i} ({code})"))?;

        regions.push(Region::new(code, name, level, parent.map(Arc::from), shape));
    }

    Ok(regions)
}

fn parse_geometry(geometry: &Value) -> Result<MultiPolygon<f64>> {
    let ty = geometry.get("type").and_then(Value::as_str).unwrap_or_default();
    let coordinates = geometry
        .get("coordinates")
        .ok_or_else(|| anyhow!("geometry has no coordinates"))?;

    match ty {
        "Polygon" => Ok(MultiPolygon(vec![parse_polygon(coordinates)?])),
        "MultiPolygon" => {
            let polygons = coordinates
                .as_array()
                .ok_or_else(|| anyhow!("MultiPolygon coordinates must be an array"))?
                .iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>>>()?;
            Ok(MultiPolygon(polygons))
        }
        other => bail!("unsupported geometry type: {other}"),
    }
}

/// First ring is the exterior, the rest are holes (GeoJSON ring order).
fn parse_polygon(rings: &Value) -> Result<Polygon<f64>> {
    let rings = rings
        .as_array()
        .ok_or_else(|| anyhow!("Polygon coordinates must be an array of rings"))?;

    let mut exterior = None;
    let mut interiors = Vec::new();
    for (i, ring) in rings.iter().enumerate() {
        let ring = parse_ring(ring)?;
        if i == 0 {
            exterior = Some(ring);
        } else {
            interiors.push(ring);
        }
    }

    Ok(Polygon::new(
        exterior.ok_or_else(|| anyhow!("polygon has no rings"))?,
        interiors,
    ))
}

fn parse_ring(ring: &Value) -> Result<LineString<f64>> {
    let positions = ring
        .as_array()
        .ok_or_else(|| anyhow!("ring must be an array of positions"))?;

    let coords = positions
        .iter()
        .map(|position| {
            let position = position
                .as_array()
                .filter(|p| p.len() >= 2)
                .ok_or_else(|| anyhow!("position must be a [lon, lat] pair"))?;
            let x = position[0].as_f64().ok_or_else(|| anyhow!("non-numeric longitude"))?;
            let y = position[1].as_f64().ok_or_else(|| anyhow!("non-numeric latitude"))?;
            Ok(Coord { x, y })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(LineString(coords))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(features: &str) -> String {
        format!(r#"{{"type":"FeatureCollection","features":[{features}]}}"#)
    }

    #[test]
    fn parses_polygon_and_multipolygon_features() {
        let doc = collection(
            r#"{"type":"Feature","properties":{"code":"AB","name":"Alba"},
                "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
               {"type":"Feature","properties":{"code":"CJ","name":"Cluj"},
                "geometry":{"type":"MultiPolygon","coordinates":[[[[2,0],[3,0],[3,1],[2,1],[2,0]]]]}}"#,
        );

        let regions = parse_feature_collection(doc.as_bytes(), RegionLevel::County, None).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(&*regions[0].code, "AB");
        assert_eq!(&*regions[0].name, "Alba");
        assert_eq!(regions[1].shape.0.len(), 1);
    }

    #[test]
    fn features_without_codes_get_deterministic_names() {
        let doc = collection(
            r#"{"type":"Feature","properties":{"name":"Unresolved"},
                "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}}"#,
        );

        let regions =
            parse_feature_collection(doc.as_bytes(), RegionLevel::SubCounty, Some("CJ")).unwrap();
        assert_eq!(&*regions[0].code, "CJ-001");
        assert_eq!(regions[0].parent.as_deref(), Some("CJ"));
    }

    #[test]
    fn rejects_documents_without_features() {
        assert!(parse_feature_collection(b"{}", RegionLevel::County, None).is_err());
        assert!(parse_feature_collection(b"not json", RegionLevel::County, None).is_err());
    }
}
