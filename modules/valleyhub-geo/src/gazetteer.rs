//! Free-text venue and place resolution.
//!
//! The venue heuristic is two-tier and deliberately precision-biased: the
//! classifier's venue strings are noisy, and a wrong landmark is worse than
//! no landmark.

use std::collections::HashSet;

use valleyhub_common::{Geofence, Landmark};

/// Tokens this short ("at", "the", "ppl") carry no signal on their own.
const MIN_TOKEN_LEN: usize = 4;

/// Minimum token overlap for a tier-2 match.
const MIN_TOKEN_OVERLAP: usize = 2;

/// Resolve a free-text venue string to a landmark.
///
/// Tier 1: mutual substring over lowercased strings. Tier 2: whitespace
/// tokens longer than 3 characters, accepted at an overlap of 2 or more.
/// Returns None when neither tier matches.
pub fn resolve_by_text<'a>(text: &str, landmarks: &'a [Landmark]) -> Option<&'a Landmark> {
    let needle = text.to_lowercase();
    let needle = needle.trim();
    if needle.is_empty() {
        return None;
    }

    for landmark in landmarks {
        let name = landmark.name.to_lowercase();
        if needle.contains(name.as_str()) || name.contains(needle) {
            return Some(landmark);
        }
    }

    let tokens: Vec<&str> = needle
        .split_whitespace()
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .collect();

    for landmark in landmarks {
        let name = landmark.name.to_lowercase();
        let name_tokens: HashSet<&str> = name.split_whitespace().collect();
        let overlap = tokens.iter().filter(|t| name_tokens.contains(**t)).count();
        if overlap >= MIN_TOKEN_OVERLAP {
            return Some(landmark);
        }
    }

    None
}

/// The neighborhood a landmark belongs to: its explicit owning geofence when
/// curated, otherwise the first geofence whose covering set holds the
/// landmark's cell.
pub fn neighborhood_of<'a>(landmark: &Landmark, geofences: &'a [Geofence]) -> Option<&'a Geofence> {
    if let Some(id) = &landmark.geofence_id {
        return geofences.iter().find(|f| &f.id == id);
    }
    geofences.iter().find(|f| f.cells.contains(&landmark.cell))
}

/// Scan free text for a geofence name or alias mention.
pub fn resolve_place_text<'a>(text: &str, geofences: &'a [Geofence]) -> Option<&'a Geofence> {
    let lower = text.to_lowercase();
    for fence in geofences {
        if lower.contains(&fence.name.to_lowercase()) {
            return Some(fence);
        }
        for alias in &fence.aliases {
            if lower.contains(&alias.to_lowercase()) {
                return Some(fence);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::cell_of;
    use valleyhub_common::{GeoPoint, LandmarkCategory, Place};

    fn landmark(id: &str, name: &str, lat: f64, lng: f64) -> Landmark {
        Landmark {
            id: id.to_string(),
            name: name.to_string(),
            category: LandmarkCategory::Entertainment,
            address: String::new(),
            lat,
            lng,
            cell: cell_of(lat, lng).unwrap(),
            geofence_id: None,
        }
    }

    fn fixtures() -> Vec<Landmark> {
        vec![
            landmark("ppl-center", "PPL Center", 40.6023, -75.4714),
            landmark("steelstacks", "SteelStacks", 40.6152, -75.3621),
            landmark("miller-symphony-hall", "Miller Symphony Hall", 40.6030, -75.4716),
        ]
    }

    #[test]
    fn substring_match_finds_venue_inside_noisy_text() {
        let landmarks = fixtures();
        let hit = resolve_by_text("Live music tonight at the PPL Center Plaza", &landmarks);
        assert_eq!(hit.map(|l| l.name.as_str()), Some("PPL Center"));
    }

    #[test]
    fn reverse_substring_matches_partial_input() {
        let landmarks = fixtures();
        let hit = resolve_by_text("SteelStacks", &landmarks);
        assert_eq!(hit.map(|l| l.id.as_str()), Some("steelstacks"));
    }

    #[test]
    fn token_overlap_rescues_reordered_names() {
        let landmarks = fixtures();
        let hit = resolve_by_text("symphony concert at miller hall downtown", &landmarks);
        assert_eq!(hit.map(|l| l.id.as_str()), Some("miller-symphony-hall"));
    }

    #[test]
    fn unrelated_text_resolves_to_none() {
        let landmarks = fixtures();
        assert!(resolve_by_text("Grabbed lunch downtown", &landmarks).is_none());
        assert!(resolve_by_text("", &landmarks).is_none());
    }

    #[test]
    fn single_token_overlap_is_not_enough() {
        let landmarks = fixtures();
        // Only "center" overlaps with "PPL Center".
        assert!(resolve_by_text("community center potluck", &landmarks).is_none());
    }

    fn fence(id: &str, name: &str, cells: Vec<h3o::CellIndex>) -> Geofence {
        Geofence {
            id: id.to_string(),
            name: name.to_string(),
            place: Place::Allentown,
            aliases: vec!["Downtown Allentown".to_string()],
            zip_codes: vec![],
            cells,
            centroid: GeoPoint { lat: 40.605, lng: -75.47 },
            bbox: [-75.48, 40.60, -75.46, 40.61],
        }
    }

    #[test]
    fn neighborhood_prefers_explicit_owner() {
        let mut lm = landmark("ppl-center", "PPL Center", 40.6023, -75.4714);
        lm.geofence_id = Some("at-cc".to_string());
        let fences = vec![
            fence("other", "Other", vec![lm.cell]),
            fence("at-cc", "Center City", vec![]),
        ];
        assert_eq!(
            neighborhood_of(&lm, &fences).map(|f| f.id.as_str()),
            Some("at-cc")
        );
    }

    #[test]
    fn neighborhood_falls_back_to_cell_containment() {
        let lm = landmark("ppl-center", "PPL Center", 40.6023, -75.4714);
        let fences = vec![fence("at-cc", "Center City", vec![lm.cell])];
        assert_eq!(
            neighborhood_of(&lm, &fences).map(|f| f.id.as_str()),
            Some("at-cc")
        );
    }

    #[test]
    fn neighborhood_is_none_when_no_fence_covers_the_cell() {
        let lm = landmark("dorney", "Dorney Park", 40.5815, -75.5348);
        let fences = vec![fence("at-cc", "Center City", vec![])];
        assert!(neighborhood_of(&lm, &fences).is_none());
    }

    #[test]
    fn place_text_matches_aliases() {
        let fences = vec![fence("at-cc", "Center City", vec![])];
        let hit = resolve_place_text("Parade through downtown allentown on Saturday", &fences);
        assert_eq!(hit.map(|f| f.id.as_str()), Some("at-cc"));
        assert!(resolve_place_text("Nothing spatial here", &fences).is_none());
    }
}
