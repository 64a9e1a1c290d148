//! Enrichment pipeline: raw item + external classification + a gazetteer
//! and geofence snapshot in, fully resolved event record out.
//!
//! Pure given its inputs (no hidden state), so it tests with fixed
//! fixtures and a stub classifier.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;

use valleyhub_common::{Classification, Geofence, HubEvent, Landmark};
use valleyhub_geo::gazetteer;

static ZIP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{5}\b").unwrap());

/// One raw item as it arrives from a source, before classification.
#[derive(Debug, Clone)]
pub struct RawItem {
    pub title: String,
    pub body: String,
    pub source_url: String,
    pub event_date: DateTime<Utc>,
}

/// Last-resort location signal: first five-digit postal code in the text.
pub fn extract_zip(text: &str) -> Option<String> {
    ZIP_RE.find(text).map(|m| m.as_str().to_string())
}

/// Assemble a fully resolved event record.
///
/// 1. Resolve the classified venue against the gazetteer; a match replaces
///    the free-text venue with the landmark's canonical name and attaches
///    its id and cell.
/// 2. A missing neighborhood is derived from the matched landmark.
/// 3. Still unresolved, the raw text is scanned for a postal code.
///
/// Neighborhood, landmark and cell all legitimately stay unresolved.
pub fn enrich(
    raw: &RawItem,
    classification: &Classification,
    landmarks: &[Landmark],
    geofences: &[Geofence],
) -> HubEvent {
    let mut venue = classification.venue.clone();
    let mut neighborhood = classification.neighborhood.clone();
    let mut neighborhood_id = None;
    let mut landmark_id = None;
    let mut cell = None;

    if let Some(hit) = gazetteer::resolve_by_text(&classification.venue, landmarks) {
        venue = hit.name.clone();
        landmark_id = Some(hit.id.clone());
        cell = Some(hit.cell);

        if neighborhood.is_none() {
            if let Some(fence) = gazetteer::neighborhood_of(hit, geofences) {
                neighborhood = Some(fence.name.clone());
                neighborhood_id = Some(fence.id.clone());
            }
        }
    }

    let zip_code = if neighborhood.is_none() && landmark_id.is_none() {
        extract_zip(&raw.title).or_else(|| extract_zip(&raw.body))
    } else {
        None
    };

    HubEvent {
        id: Uuid::new_v4(),
        title: raw.title.clone(),
        venue,
        place: classification.place,
        neighborhood,
        neighborhood_id,
        landmark_id,
        cell,
        zip_code,
        event_date: raw.event_date,
        category: classification.category,
        summary: classification.summary.clone(),
        source_url: raw.source_url.clone(),
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valleyhub_geo::seed::{preset_geofences, preset_landmarks};
    use valleyhub_common::{Category, Place};

    fn raw(title: &str, body: &str) -> RawItem {
        RawItem {
            title: title.to_string(),
            body: body.to_string(),
            source_url: "https://example.com/story".to_string(),
            event_date: Utc::now(),
        }
    }

    fn classification(venue: &str) -> Classification {
        Classification {
            summary: "Two sentences of summary.".to_string(),
            venue: venue.to_string(),
            place: Place::Allentown,
            neighborhood: None,
            category: Category::Arts,
        }
    }

    #[test]
    fn matched_venue_gets_canonical_name_id_and_cell() {
        let landmarks = preset_landmarks().unwrap();
        let geofences = preset_geofences().unwrap();
        let event = enrich(
            &raw("Concert downtown", "Hockey arena doubleheader"),
            &classification("the ppl center arena"),
            &landmarks,
            &geofences,
        );
        assert_eq!(event.venue, "PPL Center");
        assert_eq!(event.landmark_id.as_deref(), Some("ppl-center"));
        assert!(event.cell.is_some());
        // Derived from the landmark's cell falling inside Center City.
        assert_eq!(event.neighborhood.as_deref(), Some("Center City"));
        assert_eq!(event.neighborhood_id.as_deref(), Some("at-cc"));
        assert!(event.zip_code.is_none());
    }

    #[test]
    fn classifier_supplied_neighborhood_wins_over_derivation() {
        let landmarks = preset_landmarks().unwrap();
        let geofences = preset_geofences().unwrap();
        let mut c = classification("PPL Center");
        c.neighborhood = Some("Hamilton District".to_string());
        let event = enrich(&raw("Concert", ""), &c, &landmarks, &geofences);
        assert_eq!(event.neighborhood.as_deref(), Some("Hamilton District"));
        assert!(event.neighborhood_id.is_none());
    }

    #[test]
    fn unmatched_venue_falls_back_to_postal_scan() {
        let landmarks = preset_landmarks().unwrap();
        let geofences = preset_geofences().unwrap();
        let event = enrich(
            &raw("Yard sale", "Saturday on Main St, Bethlehem PA 18018"),
            &classification("Various Locations"),
            &landmarks,
            &geofences,
        );
        assert!(event.landmark_id.is_none());
        assert!(event.cell.is_none());
        assert!(event.neighborhood.is_none());
        assert_eq!(event.zip_code.as_deref(), Some("18018"));
        assert_eq!(event.venue, "Various Locations");
    }

    #[test]
    fn fully_unresolved_event_is_still_legal() {
        let event = enrich(
            &raw("Statewide update", "No location signal here"),
            &classification("Various Locations"),
            &[],
            &[],
        );
        assert!(event.landmark_id.is_none());
        assert!(event.neighborhood.is_none());
        assert!(event.zip_code.is_none());
        assert!(!event.id.is_nil());
    }

    #[test]
    fn zip_scan_ignores_longer_digit_runs() {
        assert_eq!(extract_zip("call 6105551234 or visit 18101 today"), Some("18101".to_string()));
        assert!(extract_zip("no codes here").is_none());
    }
}
