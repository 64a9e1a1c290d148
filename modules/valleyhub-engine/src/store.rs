//! The hub store: geofences, landmarks, events, and the inverted spatial
//! indexes, owned by one logical actor per deployment instance.
//!
//! Every operation runs to completion before the next begins, so no internal
//! locking exists. Mutations update memory and rebuild the derived indexes
//! synchronously, then await the durable snapshot write; reads on the same
//! instance observe new state immediately. A crash between the in-memory
//! mutation and the snapshot write loses that mutation; upserts are
//! idempotent, so the caller re-triggers.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use h3o::CellIndex;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use valleyhub_common::{
    EventFilters, Geofence, HubError, HubEvent, HubStats, Landmark,
};
use valleyhub_geo::{gazetteer, geofence, grid};

use crate::snapshot::SnapshotStore;

const GEOFENCES_KEY: &str = "geofences";
const LANDMARKS_KEY: &str = "landmarks";
const EVENTS_KEY: &str = "hub_events";

static PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// The composite key that deduplicates events: normalized title plus the
/// calendar day. Re-ingesting the same story on the same day collapses to
/// one record, whatever the source. Two distinct same-titled stories on the
/// same day also collapse; accepted precision/recall tradeoff.
pub fn dedup_key(title: &str, event_date: DateTime<Utc>) -> String {
    let lowered = title.to_lowercase();
    let stripped = PUNCT_RE.replace_all(lowered.trim(), "");
    let normalized = WS_RE.replace_all(stripped.trim(), "_");
    format!("{}_{}", normalized, event_date.format("%Y-%m-%d"))
}

pub struct HubStore {
    backend: Box<dyn SnapshotStore>,
    loaded: bool,

    // Source-of-truth maps.
    geofences: HashMap<String, Geofence>,
    landmarks: HashMap<String, Landmark>,
    events: HashMap<String, HubEvent>,

    // Derived, rebuilt wholesale, never persisted.
    fence_index: HashMap<CellIndex, HashSet<String>>,
    landmark_index: HashMap<CellIndex, HashSet<String>>,

    last_activity: Option<DateTime<Utc>>,
}

impl HubStore {
    /// Construction is synchronous and side-effect free; the first public
    /// call restores snapshots and rebuilds the indexes.
    pub fn new(backend: Box<dyn SnapshotStore>) -> Self {
        Self {
            backend,
            loaded: false,
            geofences: HashMap::new(),
            landmarks: HashMap::new(),
            events: HashMap::new(),
            fence_index: HashMap::new(),
            landmark_index: HashMap::new(),
            last_activity: None,
        }
    }

    async fn ensure_loaded(&mut self) -> Result<(), HubError> {
        if self.loaded {
            return Ok(());
        }
        self.geofences = self.restore(GEOFENCES_KEY).await?;
        self.landmarks = self.restore(LANDMARKS_KEY).await?;
        self.events = self.restore(EVENTS_KEY).await?;
        self.rebuild_indexes();
        self.loaded = true;
        debug!(
            geofences = self.geofences.len(),
            landmarks = self.landmarks.len(),
            events = self.events.len(),
            "Store loaded"
        );
        Ok(())
    }

    async fn restore<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<HashMap<String, T>, HubError> {
        let value = self
            .backend
            .get(key)
            .await
            .map_err(|e| HubError::Persistence(format!("restoring {key}: {e}")))?;
        match value {
            Some(v) => serde_json::from_value(v)
                .map_err(|e| HubError::Persistence(format!("decoding {key} snapshot: {e}"))),
            None => Ok(HashMap::new()),
        }
    }

    async fn persist<T: Serialize>(&self, key: &str, value: &T) -> Result<(), HubError> {
        let value = serde_json::to_value(value)
            .map_err(|e| HubError::Persistence(format!("encoding {key} snapshot: {e}")))?;
        self.backend
            .put(key, value)
            .await
            .map_err(|e| HubError::Persistence(format!("writing {key}: {e}")))
    }

    /// Rebuild both inverted indexes from the source-of-truth maps. Linear
    /// in total cell count; entity counts are low hundreds, so wholesale
    /// rebuild beats incremental removal.
    fn rebuild_indexes(&mut self) {
        self.fence_index.clear();
        for fence in self.geofences.values() {
            for cell in &fence.cells {
                self.fence_index
                    .entry(*cell)
                    .or_default()
                    .insert(fence.id.clone());
            }
        }
        self.landmark_index.clear();
        for landmark in self.landmarks.values() {
            self.landmark_index
                .entry(landmark.cell)
                .or_default()
                .insert(landmark.id.clone());
        }
    }

    fn touch(&mut self) {
        self.last_activity = Some(Utc::now());
    }

    // --- Geofences ---

    /// Ingest a FeatureCollection of polygon features. All-or-nothing: a
    /// structurally invalid collection is rejected before anything persists.
    pub async fn ingest_geofences(&mut self, raw: &Value) -> Result<usize, HubError> {
        self.ensure_loaded().await?;
        let fences = geofence::parse_feature_collection(raw)?;
        let count = fences.len();
        for fence in fences {
            self.geofences.insert(fence.id.clone(), fence);
        }
        self.rebuild_indexes();
        self.touch();
        self.persist(GEOFENCES_KEY, &self.geofences).await?;
        info!(count, "Ingested geofences");
        Ok(count)
    }

    pub async fn upsert_geofence(&mut self, fence: Geofence) -> Result<(), HubError> {
        self.ensure_loaded().await?;
        self.geofences.insert(fence.id.clone(), fence);
        self.rebuild_indexes();
        self.touch();
        self.persist(GEOFENCES_KEY, &self.geofences).await
    }

    pub async fn list_geofences(&mut self) -> Result<Vec<Geofence>, HubError> {
        self.ensure_loaded().await?;
        let mut fences: Vec<Geofence> = self.geofences.values().cloned().collect();
        fences.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(fences)
    }

    /// Geofences containing a point. Zero-to-many: overlap is legal and
    /// expected, and a miss is an empty list, not an error.
    pub async fn resolve_at(&mut self, lat: f64, lng: f64) -> Result<Vec<Geofence>, HubError> {
        self.ensure_loaded().await?;
        let cell = grid::cell_of(lat, lng)?;
        let ids = match self.fence_index.get(&cell) {
            Some(ids) => ids,
            None => return Ok(Vec::new()),
        };
        let mut fences: Vec<Geofence> = ids
            .iter()
            .filter_map(|id| self.geofences.get(id).cloned())
            .collect();
        fences.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(fences)
    }

    // --- Landmarks ---

    pub async fn upsert_landmark(&mut self, landmark: Landmark) -> Result<(), HubError> {
        self.ensure_loaded().await?;
        self.landmarks.insert(landmark.id.clone(), landmark);
        self.rebuild_indexes();
        self.touch();
        self.persist(LANDMARKS_KEY, &self.landmarks).await
    }

    /// Bulk upsert with a single snapshot write, used for seeding.
    pub async fn upsert_landmarks(&mut self, landmarks: Vec<Landmark>) -> Result<usize, HubError> {
        self.ensure_loaded().await?;
        let count = landmarks.len();
        for landmark in landmarks {
            self.landmarks.insert(landmark.id.clone(), landmark);
        }
        self.rebuild_indexes();
        self.touch();
        self.persist(LANDMARKS_KEY, &self.landmarks).await?;
        info!(count, "Upserted landmarks");
        Ok(count)
    }

    pub async fn list_landmarks(&mut self) -> Result<Vec<Landmark>, HubError> {
        self.ensure_loaded().await?;
        let mut landmarks: Vec<Landmark> = self.landmarks.values().cloned().collect();
        landmarks.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(landmarks)
    }

    /// Landmarks occupying the cell of a point.
    pub async fn landmarks_at(&mut self, lat: f64, lng: f64) -> Result<Vec<Landmark>, HubError> {
        self.ensure_loaded().await?;
        let cell = grid::cell_of(lat, lng)?;
        let ids = match self.landmark_index.get(&cell) {
            Some(ids) => ids,
            None => return Ok(Vec::new()),
        };
        let mut landmarks: Vec<Landmark> = ids
            .iter()
            .filter_map(|id| self.landmarks.get(id).cloned())
            .collect();
        landmarks.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(landmarks)
    }

    /// Resolve a free-text venue string against the gazetteer.
    pub async fn resolve_venue(&mut self, text: &str) -> Result<Option<Landmark>, HubError> {
        self.ensure_loaded().await?;
        let landmarks: Vec<Landmark> = self.landmarks.values().cloned().collect();
        Ok(gazetteer::resolve_by_text(text, &landmarks).cloned())
    }

    /// A consistent (landmarks, geofences) snapshot for the enrichment
    /// pipeline, which is a pure function of its inputs.
    pub async fn geo_snapshot(&mut self) -> Result<(Vec<Landmark>, Vec<Geofence>), HubError> {
        self.ensure_loaded().await?;
        Ok((
            self.landmarks.values().cloned().collect(),
            self.geofences.values().cloned().collect(),
        ))
    }

    // --- Events ---

    /// Dedup-aware upsert: the same normalized-title+day key overwrites in
    /// place. Generates an id when the caller supplied none.
    pub async fn upsert_event(&mut self, mut event: HubEvent) -> Result<(), HubError> {
        self.ensure_loaded().await?;
        if event.id.is_nil() {
            event.id = Uuid::new_v4();
        }
        let key = dedup_key(&event.title, event.event_date);
        self.events.insert(key, event);
        self.touch();
        self.persist(EVENTS_KEY, &self.events).await
    }

    /// Events matching every supplied predicate, newest first.
    pub async fn list_events(&mut self, filters: &EventFilters) -> Result<Vec<HubEvent>, HubError> {
        self.ensure_loaded().await?;

        let near_cells = match &filters.near {
            Some(p) => Some(grid::ring(grid::cell_of(p.lat, p.lng)?, grid::RING_STEPS)),
            None => None,
        };
        let search = filters.search.as_ref().map(|s| s.to_lowercase());

        let mut results: Vec<HubEvent> = self
            .events
            .values()
            .filter(|e| {
                filters.category.is_none_or(|c| e.category == c)
                    && filters.place.is_none_or(|p| e.place == p)
                    && filters
                        .neighborhood
                        .as_ref()
                        .is_none_or(|n| e.neighborhood.as_deref() == Some(n.as_str()))
                    && filters
                        .neighborhood_id
                        .as_ref()
                        .is_none_or(|n| e.neighborhood_id.as_deref() == Some(n.as_str()))
                    && filters
                        .landmark_id
                        .as_ref()
                        .is_none_or(|l| e.landmark_id.as_deref() == Some(l.as_str()))
                    && search.as_ref().is_none_or(|q| {
                        e.title.to_lowercase().contains(q)
                            || e.venue.to_lowercase().contains(q)
                            || e.summary.to_lowercase().contains(q)
                    })
                    && near_cells
                        .as_ref()
                        .is_none_or(|cells| e.cell.is_some_and(|c| cells.contains(&c)))
            })
            .cloned()
            .collect();

        results.sort_by(|a, b| b.event_date.cmp(&a.event_date));
        Ok(results)
    }

    /// Remove events older than the cutoff. Invoked by an external trigger,
    /// never by an internal timer. Returns the number removed.
    pub async fn prune(&mut self, max_age_days: i64) -> Result<usize, HubError> {
        self.ensure_loaded().await?;
        let cutoff = Utc::now() - Duration::days(max_age_days);
        let before = self.events.len();
        self.events.retain(|_, e| e.event_date >= cutoff);
        let removed = before - self.events.len();
        if removed > 0 {
            self.touch();
            self.persist(EVENTS_KEY, &self.events).await?;
        }
        info!(removed, max_age_days, "Pruned events");
        Ok(removed)
    }

    /// Event counts per landmark over a filtered view, most active first.
    /// Read-only aggregate; never persisted.
    pub async fn trending_venues(
        &mut self,
        filters: &EventFilters,
    ) -> Result<Vec<(String, usize)>, HubError> {
        let events = self.list_events(filters).await?;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for event in &events {
            if let Some(id) = &event.landmark_id {
                *counts.entry(id.clone()).or_default() += 1;
            }
        }
        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(ranked)
    }

    pub async fn stats(&mut self) -> Result<HubStats, HubError> {
        self.ensure_loaded().await?;
        Ok(HubStats {
            events: self.events.len(),
            geofences: self.geofences.len(),
            landmarks: self.landmarks.len(),
            last_activity: self.last_activity,
        })
    }
}
