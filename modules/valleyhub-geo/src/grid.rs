//! Hex grid indexer, a thin wrapper around the H3 tiling.
//!
//! Every component that produces or consumes a cell id uses the single
//! fixed resolution below. Mixing resolutions does not error; cells from
//! different resolutions simply never compare equal, so lookups silently
//! miss. Callers must not vary the resolution at runtime.

use std::collections::HashSet;

use geo_types::{Coord, LineString, Polygon};
use h3o::geom::{ContainmentMode, TilerBuilder};
use h3o::{CellIndex, LatLng, Resolution};

use valleyhub_common::{GeoPoint, HubError};

/// Fixed grid resolution (~0.1 km² cells, ~170 m edges). Shared by every
/// producer and consumer of cell ids.
pub const GRID_RESOLUTION: Resolution = Resolution::Nine;

/// Grid-disk radius for proximity queries (~500 m at the fixed resolution).
pub const RING_STEPS: u32 = 2;

/// Encode a point to its grid cell at the fixed resolution.
///
/// The underlying library wraps out-of-range degrees, so the range check
/// happens here.
pub fn cell_of(lat: f64, lng: f64) -> Result<CellIndex, HubError> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(HubError::MalformedInput(format!(
            "coordinate out of range ({lat}, {lng})"
        )));
    }
    let point = LatLng::new(lat, lng).map_err(|e| {
        HubError::MalformedInput(format!("invalid coordinate ({lat}, {lng}): {e}"))
    })?;
    Ok(point.to_cell(GRID_RESOLUTION))
}

/// Cells covering a polygon's outer ring at the fixed resolution.
///
/// Holes are unsupported. Coverage mode includes every cell the polygon
/// touches, so a point strictly inside the polygon always encodes to a
/// covered cell.
pub fn cells_covering(outer_ring: &[GeoPoint]) -> Result<Vec<CellIndex>, HubError> {
    if outer_ring.len() < 4 {
        return Err(HubError::MalformedInput(format!(
            "polygon ring needs at least 4 positions, got {}",
            outer_ring.len()
        )));
    }

    let exterior = LineString::from(
        outer_ring
            .iter()
            .map(|p| Coord { x: p.lng, y: p.lat })
            .collect::<Vec<_>>(),
    );
    let polygon = Polygon::new(exterior, Vec::new());

    let mut tiler = TilerBuilder::new(GRID_RESOLUTION)
        .containment_mode(ContainmentMode::Covers)
        .build();
    tiler
        .add(polygon)
        .map_err(|e| HubError::MalformedInput(format!("invalid polygon ring: {e}")))?;

    Ok(tiler.into_coverage().collect())
}

/// All cells within `steps` grid hops of `center`, including the center.
/// Approximates a circular proximity query.
pub fn ring(center: CellIndex, steps: u32) -> HashSet<CellIndex> {
    center.grid_disk::<Vec<_>>(steps).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Vec<GeoPoint> {
        vec![
            GeoPoint { lat: min_lat, lng: min_lng },
            GeoPoint { lat: min_lat, lng: max_lng },
            GeoPoint { lat: max_lat, lng: max_lng },
            GeoPoint { lat: max_lat, lng: min_lng },
            GeoPoint { lat: min_lat, lng: min_lng },
        ]
    }

    #[test]
    fn cell_of_is_deterministic() {
        let a = cell_of(40.6023, -75.4714).unwrap();
        let b = cell_of(40.6023, -75.4714).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cell_of_rejects_out_of_range_coordinates() {
        assert!(cell_of(200.0, -75.0).is_err());
        assert!(cell_of(40.0, 500.0).is_err());
    }

    #[test]
    fn ring_zero_is_just_the_center() {
        let center = cell_of(40.6, -75.47).unwrap();
        let disk = ring(center, 0);
        assert_eq!(disk.len(), 1);
        assert!(disk.contains(&center));
    }

    #[test]
    fn ring_two_has_nineteen_cells() {
        // 1 + 6 + 12 on a hex grid away from pentagons.
        let center = cell_of(40.6, -75.47).unwrap();
        let disk = ring(center, 2);
        assert_eq!(disk.len(), 19);
        assert!(disk.contains(&center));
    }

    #[test]
    fn covering_rejects_degenerate_ring() {
        let ring = vec![
            GeoPoint { lat: 40.60, lng: -75.48 },
            GeoPoint { lat: 40.61, lng: -75.48 },
        ];
        assert!(cells_covering(&ring).is_err());
    }

    #[test]
    fn covering_contains_interior_points() {
        let cells = cells_covering(&square(-75.48, 40.60, -75.46, 40.61)).unwrap();
        assert!(!cells.is_empty());

        // Center and a point near the edge both encode to covered cells.
        let center = cell_of(40.605, -75.47).unwrap();
        assert!(cells.contains(&center));
        let near_edge = cell_of(40.6005, -75.4795).unwrap();
        assert!(cells.contains(&near_edge));
    }

    #[test]
    fn covering_excludes_faraway_points() {
        let cells = cells_covering(&square(-75.48, 40.60, -75.46, 40.61)).unwrap();
        let far = cell_of(40.9, -75.9).unwrap();
        assert!(!cells.contains(&far));
    }
}
