//! GeoJSON-style geofence ingestion.
//!
//! Parsing is all-or-nothing: the whole collection is validated and resolved
//! into covering cells before anything is handed to the store, so a
//! structurally invalid payload persists nothing.

use serde_json::Value;
use uuid::Uuid;

use valleyhub_common::{Geofence, GeoPoint, HubError, Place};

use crate::grid;

/// Parse a FeatureCollection of polygon features into geofences, computing
/// the bounding box, centroid and covering cell set per feature.
pub fn parse_feature_collection(raw: &Value) -> Result<Vec<Geofence>, HubError> {
    let kind = raw.get("type").and_then(Value::as_str).unwrap_or_default();
    if kind != "FeatureCollection" {
        return Err(HubError::MalformedInput(format!(
            "expected a FeatureCollection, got {kind:?}"
        )));
    }

    let features = raw
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| HubError::MalformedInput("missing features array".to_string()))?;

    features.iter().map(parse_feature).collect()
}

fn parse_feature(feature: &Value) -> Result<Geofence, HubError> {
    let geometry = feature
        .get("geometry")
        .ok_or_else(|| HubError::MalformedInput("feature missing geometry".to_string()))?;

    let gtype = geometry.get("type").and_then(Value::as_str).unwrap_or_default();
    if gtype != "Polygon" {
        return Err(HubError::MalformedInput(format!(
            "expected Polygon geometry, got {gtype:?}"
        )));
    }

    let rings = geometry
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| HubError::MalformedInput("geometry missing ring coordinates".to_string()))?;

    // Outer ring only; holes are ignored.
    let outer = rings
        .first()
        .and_then(Value::as_array)
        .ok_or_else(|| HubError::MalformedInput("polygon has no outer ring".to_string()))?;

    let ring = outer
        .iter()
        .map(parse_position)
        .collect::<Result<Vec<_>, _>>()?;

    let cells = grid::cells_covering(&ring)?;

    let (mut min_lng, mut min_lat, mut max_lng, mut max_lat) = (180.0f64, 90.0f64, -180.0f64, -90.0f64);
    for p in &ring {
        min_lng = min_lng.min(p.lng);
        min_lat = min_lat.min(p.lat);
        max_lng = max_lng.max(p.lng);
        max_lat = max_lat.max(p.lat);
    }

    let props = feature.get("properties").cloned().unwrap_or(Value::Null);

    Ok(Geofence {
        id: props
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        name: props
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Unnamed District")
            .to_string(),
        place: props
            .get("city")
            .and_then(Value::as_str)
            .map(Place::from_str_loose)
            .unwrap_or(Place::GreaterValley),
        aliases: string_list(&props, "aliases"),
        zip_codes: string_list(&props, "zipCodes"),
        cells,
        centroid: GeoPoint {
            lat: (min_lat + max_lat) / 2.0,
            lng: (min_lng + max_lng) / 2.0,
        },
        bbox: [min_lng, min_lat, max_lng, max_lat],
    })
}

fn parse_position(position: &Value) -> Result<GeoPoint, HubError> {
    let pair = position
        .as_array()
        .filter(|a| a.len() >= 2)
        .ok_or_else(|| HubError::MalformedInput("ring position is not an [lng, lat] pair".to_string()))?;
    let lng = pair[0]
        .as_f64()
        .ok_or_else(|| HubError::MalformedInput("ring longitude is not a number".to_string()))?;
    let lat = pair[1]
        .as_f64()
        .ok_or_else(|| HubError::MalformedInput("ring latitude is not a number".to_string()))?;
    Ok(GeoPoint { lat, lng })
}

fn string_list(props: &Value, key: &str) -> Vec<String> {
    props
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn center_city() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {
                    "id": "at-cc",
                    "name": "Center City",
                    "city": "Allentown",
                    "aliases": ["Downtown Allentown"],
                    "zipCodes": ["18101"]
                },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [-75.48, 40.60], [-75.46, 40.60], [-75.46, 40.61],
                        [-75.48, 40.61], [-75.48, 40.60]
                    ]]
                }
            }]
        })
    }

    #[test]
    fn parses_polygon_feature() {
        let fences = parse_feature_collection(&center_city()).unwrap();
        assert_eq!(fences.len(), 1);

        let fence = &fences[0];
        assert_eq!(fence.id, "at-cc");
        assert_eq!(fence.name, "Center City");
        assert_eq!(fence.place, Place::Allentown);
        assert_eq!(fence.zip_codes, vec!["18101"]);
        assert!(!fence.cells.is_empty());
        assert_eq!(fence.bbox, [-75.48, 40.60, -75.46, 40.61]);
        assert!((fence.centroid.lat - 40.605).abs() < 1e-9);
        assert!((fence.centroid.lng - -75.47).abs() < 1e-9);
    }

    #[test]
    fn generates_id_and_defaults_when_properties_sparse() {
        let raw = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [-75.48, 40.60], [-75.46, 40.60], [-75.46, 40.61],
                        [-75.48, 40.61], [-75.48, 40.60]
                    ]]
                }
            }]
        });
        let fences = parse_feature_collection(&raw).unwrap();
        assert_eq!(fences[0].name, "Unnamed District");
        assert_eq!(fences[0].place, Place::GreaterValley);
        assert!(!fences[0].id.is_empty());
    }

    #[test]
    fn rejects_wrong_top_level_type() {
        let raw = json!({ "type": "Feature", "features": [] });
        let err = parse_feature_collection(&raw).unwrap_err();
        assert!(err.to_string().contains("FeatureCollection"));
    }

    #[test]
    fn rejects_missing_ring_coordinates() {
        let raw = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "name": "Broken" },
                "geometry": { "type": "Polygon" }
            }]
        });
        assert!(parse_feature_collection(&raw).is_err());
    }

    #[test]
    fn one_bad_feature_fails_the_whole_collection() {
        let mut raw = center_city();
        raw["features"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "type": "Feature", "geometry": { "type": "Point" } }));
        assert!(parse_feature_collection(&raw).is_err());
    }
}
