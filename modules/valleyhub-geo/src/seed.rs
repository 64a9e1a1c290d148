//! Curated Lehigh Valley seed data: the landmark gazetteer and the initial
//! neighborhood boundaries. Re-seeding is idempotent because ingestion is
//! keyed by id.

use serde_json::{json, Value};

use valleyhub_common::{Geofence, HubError, Landmark, LandmarkCategory};

use crate::geofence::parse_feature_collection;
use crate::grid;

const LANDMARK_SEEDS: &[(&str, &str, LandmarkCategory, &str, f64, f64)] = &[
    // Allentown
    ("ppl-center", "PPL Center", LandmarkCategory::Entertainment, "701 Hamilton St, Allentown, PA 18101", 40.6023, -75.4714),
    ("coca-cola-park", "Coca-Cola Park", LandmarkCategory::Sports, "1050 IronPigs Way, Allentown, PA 18109", 40.6258, -75.4542),
    ("allentown-art-museum", "Allentown Art Museum", LandmarkCategory::Culture, "31 N 5th St, Allentown, PA 18101", 40.6033, -75.4703),
    ("miller-symphony-hall", "Miller Symphony Hall", LandmarkCategory::Arts, "23 N 6th St, Allentown, PA 18101", 40.6030, -75.4716),
    ("muhlenberg-college", "Muhlenberg College", LandmarkCategory::Education, "2400 Chew St, Allentown, PA 18104", 40.5976, -75.5097),
    ("allentown-fairgrounds", "Allentown Fairgrounds", LandmarkCategory::Entertainment, "302 N 17th St, Allentown, PA 18104", 40.6019, -75.4925),
    ("cedar-crest-college", "Cedar Crest College", LandmarkCategory::Education, "100 College Dr, Allentown, PA 18104", 40.5878, -75.5186),
    ("allentown-city-hall", "Allentown City Hall", LandmarkCategory::Government, "435 Hamilton St, Allentown, PA 18101", 40.6025, -75.4682),
    ("da-vinci-science", "Da Vinci Science Center", LandmarkCategory::Education, "3145 Hamilton Blvd, Allentown, PA 18103", 40.5794, -75.5268),
    ("lehigh-valley-zoo", "Lehigh Valley Zoo", LandmarkCategory::Public, "5150 Game Preserve Rd, Schnecksville, PA 18078", 40.6552, -75.6178),
    // Bethlehem
    ("steelstacks", "SteelStacks", LandmarkCategory::Entertainment, "101 Founders Way, Bethlehem, PA 18015", 40.6152, -75.3621),
    ("wind-creek", "Wind Creek Event Center", LandmarkCategory::Entertainment, "77 Wind Creek Blvd, Bethlehem, PA 18015", 40.6145, -75.3678),
    ("lehigh-university", "Lehigh University", LandmarkCategory::Education, "27 Memorial Dr W, Bethlehem, PA 18015", 40.6083, -75.3742),
    ("moravian-university", "Moravian University", LandmarkCategory::Education, "1200 Main St, Bethlehem, PA 18018", 40.6300, -75.3812),
    ("bethlehem-public-library", "Bethlehem Public Library", LandmarkCategory::Public, "11 W Church St, Bethlehem, PA 18018", 40.6219, -75.3783),
    ("artsquest-center", "ArtsQuest Center", LandmarkCategory::Arts, "101 Founders Way, Bethlehem, PA 18015", 40.6155, -75.3615),
    ("bethlehem-city-hall", "Bethlehem City Hall", LandmarkCategory::Government, "10 E Church St, Bethlehem, PA 18018", 40.6225, -75.3775),
    ("historic-hotel-bethlehem", "Hotel Bethlehem", LandmarkCategory::Culture, "437 Main St, Bethlehem, PA 18018", 40.6205, -75.3815),
    ("st-lukes-hospital", "St. Lukes Hospital", LandmarkCategory::Public, "801 Ostrum St, Bethlehem, PA 18015", 40.6062, -75.3725),
    ("west-gate-mall", "Westgate Mall", LandmarkCategory::Retail, "2285 Schoenersville Rd, Bethlehem, PA 18017", 40.6485, -75.3952),
    // Easton
    ("state-theatre", "State Theatre", LandmarkCategory::Arts, "453 Northampton St, Easton, PA 18042", 40.6914, -75.2114),
    ("lafayette-college", "Lafayette College", LandmarkCategory::Education, "Easton, PA 18042", 40.6978, -75.2104),
    ("easton-public-market", "Easton Public Market", LandmarkCategory::Retail, "325 Northampton St, Easton, PA 18042", 40.6912, -75.2102),
    ("crayola-experience", "Crayola Experience", LandmarkCategory::Entertainment, "30 Centre Square, Easton, PA 18042", 40.6908, -75.2095),
    ("sigal-museum", "Sigal Museum", LandmarkCategory::Culture, "342 Northampton St, Easton, PA 18042", 40.6910, -75.2105),
    ("easton-city-hall", "Easton City Hall", LandmarkCategory::Government, "123 S 3rd St, Easton, PA 18042", 40.6895, -75.2110),
    ("riverside-park", "Riverside Park Easton", LandmarkCategory::Public, "Easton, PA 18042", 40.6922, -75.2055),
    // Greater Valley
    ("lv-airport", "Lehigh Valley Airport", LandmarkCategory::Public, "3311 Airport Rd, Allentown, PA 18109", 40.6521, -75.4405),
    ("dorney-park", "Dorney Park", LandmarkCategory::Entertainment, "3830 Dorney Park Rd, Allentown, PA 18104", 40.5815, -75.5348),
    ("lv-health-network", "LVHN Cedar Crest", LandmarkCategory::Public, "1200 S Cedar Crest Blvd, Allentown, PA 18103", 40.5695, -75.5135),
    ("promenade-saucon", "Promenade Saucon Valley", LandmarkCategory::Retail, "Center Valley, PA 18034", 40.5405, -75.4182),
];

/// The landmark gazetteer, with each venue resolved to its grid cell.
pub fn preset_landmarks() -> Result<Vec<Landmark>, HubError> {
    LANDMARK_SEEDS
        .iter()
        .map(|&(id, name, category, address, lat, lng)| {
            Ok(Landmark {
                id: id.to_string(),
                name: name.to_string(),
                category,
                address: address.to_string(),
                lat,
                lng,
                cell: grid::cell_of(lat, lng)?,
                geofence_id: None,
            })
        })
        .collect()
}

/// Initial neighborhood boundaries as a FeatureCollection.
pub fn preset_boundaries() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {
                    "id": "at-cc",
                    "name": "Center City",
                    "city": "Allentown",
                    "aliases": ["Downtown Allentown", "Hamilton District", "7th Street"],
                    "zipCodes": ["18101", "18102"]
                },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [-75.48, 40.60], [-75.46, 40.60], [-75.46, 40.61],
                        [-75.48, 40.61], [-75.48, 40.60]
                    ]]
                }
            },
            {
                "type": "Feature",
                "properties": {
                    "id": "bt-ss",
                    "name": "South Side",
                    "city": "Bethlehem",
                    "aliases": ["SteelStacks", "Lehigh University", "3rd Street", "4th Street"],
                    "zipCodes": ["18015"]
                },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [-75.385, 40.603], [-75.355, 40.603], [-75.355, 40.620],
                        [-75.385, 40.620], [-75.385, 40.603]
                    ]]
                }
            },
            {
                "type": "Feature",
                "properties": {
                    "id": "et-dt",
                    "name": "Downtown",
                    "city": "Easton",
                    "aliases": ["Centre Square", "Easton Circle", "Riverside"],
                    "zipCodes": ["18042"]
                },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [-75.220, 40.685], [-75.202, 40.685], [-75.202, 40.695],
                        [-75.220, 40.695], [-75.220, 40.685]
                    ]]
                }
            }
        ]
    })
}

/// Initial boundaries resolved into geofences.
pub fn preset_geofences() -> Result<Vec<Geofence>, HubError> {
    parse_feature_collection(&preset_boundaries())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::neighborhood_of;
    use valleyhub_common::Place;

    #[test]
    fn every_seed_landmark_resolves_to_a_cell() {
        let landmarks = preset_landmarks().unwrap();
        assert_eq!(landmarks.len(), LANDMARK_SEEDS.len());
        let ppl = landmarks.iter().find(|l| l.id == "ppl-center").unwrap();
        assert_eq!(ppl.cell, grid::cell_of(40.6023, -75.4714).unwrap());
    }

    #[test]
    fn preset_boundaries_parse_into_geofences() {
        let fences = preset_geofences().unwrap();
        assert_eq!(fences.len(), 3);
        assert!(fences.iter().all(|f| !f.cells.is_empty()));
        assert_eq!(
            fences.iter().find(|f| f.id == "bt-ss").map(|f| f.place),
            Some(Place::Bethlehem)
        );
    }

    #[test]
    fn seed_landmarks_fall_inside_seed_boundaries() {
        let landmarks = preset_landmarks().unwrap();
        let fences = preset_geofences().unwrap();

        let ppl = landmarks.iter().find(|l| l.id == "ppl-center").unwrap();
        assert_eq!(
            neighborhood_of(ppl, &fences).map(|f| f.id.as_str()),
            Some("at-cc")
        );

        let stacks = landmarks.iter().find(|l| l.id == "steelstacks").unwrap();
        assert_eq!(
            neighborhood_of(stacks, &fences).map(|f| f.id.as_str()),
            Some("bt-ss")
        );
    }
}
