use chrono::{DateTime, Utc};
use h3o::CellIndex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Geo Types ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

// --- Enums ---

/// Editorial category assigned to every stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Family,
    Nightlife,
    Arts,
    News,
    General,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Family => write!(f, "family"),
            Category::Nightlife => write!(f, "nightlife"),
            Category::Arts => write!(f, "arts"),
            Category::News => write!(f, "news"),
            Category::General => write!(f, "general"),
        }
    }
}

impl Category {
    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "family" => Self::Family,
            "nightlife" => Self::Nightlife,
            "arts" => Self::Arts,
            "news" => Self::News,
            _ => Self::General,
        }
    }
}

/// Canonical place: the metro municipalities plus a catch-all for the wider region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Place {
    Allentown,
    Bethlehem,
    Easton,
    GreaterValley,
    Other,
}

impl std::fmt::Display for Place {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Place::Allentown => write!(f, "Allentown"),
            Place::Bethlehem => write!(f, "Bethlehem"),
            Place::Easton => write!(f, "Easton"),
            Place::GreaterValley => write!(f, "Greater Valley"),
            Place::Other => write!(f, "Other"),
        }
    }
}

impl Place {
    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "allentown" => Self::Allentown,
            "bethlehem" => Self::Bethlehem,
            "easton" => Self::Easton,
            "greater valley" | "greater_valley" | "greater lv" | "lehigh valley"
            | "greater lehigh valley" => Self::GreaterValley,
            _ => Self::Other,
        }
    }
}

/// What kind of venue a landmark is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkCategory {
    Entertainment,
    Sports,
    Culture,
    Arts,
    Education,
    Government,
    Public,
    Retail,
}

impl std::fmt::Display for LandmarkCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LandmarkCategory::Entertainment => write!(f, "entertainment"),
            LandmarkCategory::Sports => write!(f, "sports"),
            LandmarkCategory::Culture => write!(f, "culture"),
            LandmarkCategory::Arts => write!(f, "arts"),
            LandmarkCategory::Education => write!(f, "education"),
            LandmarkCategory::Government => write!(f, "government"),
            LandmarkCategory::Public => write!(f, "public"),
            LandmarkCategory::Retail => write!(f, "retail"),
        }
    }
}

impl LandmarkCategory {
    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "entertainment" => Self::Entertainment,
            "sports" => Self::Sports,
            "culture" => Self::Culture,
            "arts" => Self::Arts,
            "education" => Self::Education,
            "government" => Self::Government,
            "retail" => Self::Retail,
            _ => Self::Public,
        }
    }
}

// --- Spatial entities ---

/// A named polygonal region, represented by its covering set of grid cells.
///
/// The covering set is derived from the source polygon at the single fixed
/// grid resolution. Two geofences may legitimately overlap (adjacent or
/// nested districts).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geofence {
    pub id: String,
    pub name: String,
    pub place: Place,
    pub aliases: Vec<String>,
    pub zip_codes: Vec<String>,
    /// Covering cells at the fixed grid resolution.
    pub cells: Vec<CellIndex>,
    pub centroid: GeoPoint,
    /// [min_lng, min_lat, max_lng, max_lat]
    pub bbox: [f64; 4],
}

/// A named point-of-interest venue. Owns exactly one grid cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Landmark {
    pub id: String,
    pub name: String,
    pub category: LandmarkCategory,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub cell: CellIndex,
    /// Explicit owning geofence, when curated. Falls back to cell containment.
    pub geofence_id: Option<String>,
}

// --- Events ---

/// A fully enriched event record. Neighborhood, landmark and cell are all
/// optional: enrichment legitimately leaves them unresolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubEvent {
    pub id: Uuid,
    pub title: String,
    pub venue: String,
    pub place: Place,
    pub neighborhood: Option<String>,
    pub neighborhood_id: Option<String>,
    pub landmark_id: Option<String>,
    pub cell: Option<CellIndex>,
    pub zip_code: Option<String>,
    pub event_date: DateTime<Utc>,
    pub category: Category,
    pub summary: String,
    pub source_url: String,
    pub created_at: DateTime<Utc>,
}

/// Query predicates over the event store. Every field is optional; absence
/// means "no constraint". All present predicates are ANDed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilters {
    pub category: Option<Category>,
    pub place: Option<Place>,
    pub neighborhood: Option<String>,
    pub neighborhood_id: Option<String>,
    pub landmark_id: Option<String>,
    /// Case-insensitive substring match across title, venue and summary.
    pub search: Option<String>,
    /// Center of a grid-disk proximity query against the event's cell.
    pub near: Option<GeoPoint>,
}

/// Best-guess structured metadata for one raw item, produced by the external
/// classification step. The engine treats the classifier as an opaque
/// function and never depends on its internals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub summary: String,
    pub venue: String,
    pub place: Place,
    pub neighborhood: Option<String>,
    pub category: Category,
}

/// Read-only store counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubStats {
    pub events: usize,
    pub geofences: usize,
    pub landmarks: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&Category::Nightlife).unwrap();
        assert_eq!(json, "\"nightlife\"");
    }

    #[test]
    fn place_from_str_loose_accepts_legacy_spellings() {
        assert_eq!(Place::from_str_loose("Allentown"), Place::Allentown);
        assert_eq!(Place::from_str_loose("Greater LV"), Place::GreaterValley);
        assert_eq!(Place::from_str_loose("greater_valley"), Place::GreaterValley);
        assert_eq!(Place::from_str_loose("Philadelphia"), Place::Other);
    }

    #[test]
    fn category_from_str_loose_defaults_to_general() {
        assert_eq!(Category::from_str_loose("ARTS"), Category::Arts);
        assert_eq!(Category::from_str_loose("unknown"), Category::General);
    }

    #[test]
    fn default_filters_have_no_constraints() {
        let f = EventFilters::default();
        assert!(f.category.is_none());
        assert!(f.place.is_none());
        assert!(f.search.is_none());
        assert!(f.near.is_none());
    }
}
