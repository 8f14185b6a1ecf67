//! Favorited events, keyed by event id and persisted after every change.

use std::collections::BTreeMap;

use crate::api::EventSummary;
use crate::normalize::DateFormatter;
use crate::storage::KeyValueStore;

pub const FAVORITES_KEY: &str = "favorites_v1";

pub type FavoritesEntities = BTreeMap<String, EventSummary>;

/// Read the favorites mapping from `store`. Any failure reads as "no favorites".
pub fn get_stored_favorites(store: &dyn KeyValueStore) -> FavoritesEntities {
    let raw = match store.get_string(FAVORITES_KEY) {
        Ok(Some(raw)) if !raw.trim().is_empty() => raw,
        Ok(_) => return FavoritesEntities::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read favorites, falling back to empty");
            return FavoritesEntities::new();
        }
    };

    match serde_json::from_str::<FavoritesEntities>(&raw) {
        Ok(entities) => entities,
        Err(e) => {
            tracing::warn!(error = %e, "stored favorites are malformed, falling back to empty");
            FavoritesEntities::new()
        }
    }
}

/// Serialize and write the whole mapping. Failures are logged, not returned.
pub fn persist_favorites(store: &dyn KeyValueStore, entities: &FavoritesEntities) {
    let serialized = match serde_json::to_string(entities) {
        Ok(serialized) => serialized,
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize favorites");
            return;
        }
    };
    if let Err(e) = store.set(FAVORITES_KEY, &serialized) {
        tracing::warn!(error = %e, "failed to write favorites");
    }
}

/// Owns the favorites mapping and its backing store.
pub struct FavoritesStore {
    backend: Box<dyn KeyValueStore>,
    entities: FavoritesEntities,
}

impl FavoritesStore {
    /// Hydrate from `backend`, regenerating display dates with `formatter`.
    pub fn load(backend: Box<dyn KeyValueStore>, formatter: &DateFormatter) -> Self {
        let mut entities = get_stored_favorites(backend.as_ref());
        for event in entities.values_mut() {
            event.formatted_date = formatter.format(Some(&event.date));
        }
        tracing::debug!(count = entities.len(), "favorites loaded");
        Self { backend, entities }
    }

    pub fn save(&self) {
        persist_favorites(self.backend.as_ref(), &self.entities);
    }

    /// Add the event if absent, remove it if present. Returns whether it is
    /// now a favorite. Detail-only fields never reach the store.
    pub fn toggle_favorite(&mut self, event: impl Into<EventSummary>) -> bool {
        let event: EventSummary = event.into();
        let now_favorite = if self.entities.remove(&event.id).is_some() {
            tracing::info!(event_id = %event.id, "favorite removed");
            false
        } else {
            tracing::info!(event_id = %event.id, name = %event.name, "favorite added");
            self.entities.insert(event.id.clone(), event);
            true
        };
        self.save();
        now_favorite
    }

    /// Returns whether anything was removed.
    pub fn remove_favorite(&mut self, id: &str) -> bool {
        let removed = self.entities.remove(id).is_some();
        if removed {
            tracing::info!(event_id = %id, "favorite removed");
        }
        self.save();
        removed
    }

    pub fn replace_favorites(&mut self, entities: FavoritesEntities) {
        tracing::debug!(count = entities.len(), "favorites replaced");
        self.entities = entities;
        self.save();
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn entities(&self) -> &FavoritesEntities {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Favorites in display order: by date (TBD last), then name.
    pub fn sorted(&self) -> Vec<&EventSummary> {
        let mut events: Vec<&EventSummary> = self.entities.values().collect();
        events.sort_by(|a, b| {
            let key = |e: &EventSummary| (e.date == crate::normalize::DATE_TBD, e.date.clone());
            key(a).cmp(&key(b)).then_with(|| a.name.cmp(&b.name))
        });
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{EventDetail, PriceRange};
    use crate::storage::{MemoryStore, Result as StoreResult, StoreError};
    use std::sync::Arc;

    /// Shares one memory store between a store instance and the test.
    #[derive(Clone, Default)]
    struct SharedStore(Arc<MemoryStore>);

    impl KeyValueStore for SharedStore {
        fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
            self.0.get_string(key)
        }

        fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            self.0.set(key, value)
        }
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get_string(&self, _key: &str) -> StoreResult<Option<String>> {
            Err(StoreError::Corrupt("disk on fire".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
            Err(StoreError::Corrupt("disk on fire".to_string()))
        }
    }

    fn event(id: &str, date: &str) -> EventSummary {
        let formatter = DateFormatter::default();
        EventSummary {
            id: id.to_string(),
            name: format!("Event {}", id),
            date: date.to_string(),
            formatted_date: formatter.format(Some(date)),
            category: Some("Music / Jazz".to_string()),
            ..EventSummary::default()
        }
    }

    fn load(store: &SharedStore) -> FavoritesStore {
        FavoritesStore::load(Box::new(store.clone()), &DateFormatter::default())
    }

    #[test]
    fn test_toggle_twice_restores_previous_state() {
        let backend = SharedStore::default();
        let mut favorites = load(&backend);
        favorites.toggle_favorite(event("a", "2025-01-01"));
        let before = favorites.entities().clone();

        assert!(favorites.toggle_favorite(event("b", "2025-02-01")));
        assert!(!favorites.toggle_favorite(event("b", "2025-02-01")));

        assert_eq!(favorites.entities(), &before);
        assert_eq!(load(&backend).entities(), &before);
    }

    #[test]
    fn test_replace_then_reload_roundtrips() {
        let backend = SharedStore::default();
        let mut favorites = load(&backend);

        let mut mapping = FavoritesEntities::new();
        for e in [event("x", "2025-03-01T20:00:00"), event("y", "TBD")] {
            mapping.insert(e.id.clone(), e);
        }
        favorites.replace_favorites(mapping.clone());

        assert_eq!(get_stored_favorites(&backend), mapping);
        assert_eq!(load(&backend).entities(), &mapping);
    }

    #[test]
    fn test_toggling_detail_stores_summary_only() {
        let backend = SharedStore::default();
        let mut favorites = load(&backend);

        let detail = EventDetail {
            summary: event("d", "2025-05-05"),
            description: Some("long text".to_string()),
            ticket_url: Some("https://tickets".to_string()),
            price_ranges: vec![PriceRange::default()],
            ..EventDetail::default()
        };
        favorites.toggle_favorite(detail);

        let raw = backend.get_string(FAVORITES_KEY).unwrap().unwrap();
        assert!(!raw.contains("long text"));
        assert!(!raw.contains("https://tickets"));
        assert!(favorites.is_favorite("d"));
    }

    #[test]
    fn test_remove_favorite_persists() {
        let backend = SharedStore::default();
        let mut favorites = load(&backend);
        favorites.toggle_favorite(event("a", "2025-01-01"));

        assert!(favorites.remove_favorite("a"));
        assert!(!favorites.remove_favorite("a"));
        assert!(load(&backend).is_empty());
    }

    #[test]
    fn test_garbage_json_reads_as_empty() {
        let backend = SharedStore::default();
        backend.set(FAVORITES_KEY, "{not json").unwrap();
        assert!(get_stored_favorites(&backend).is_empty());

        backend.set(FAVORITES_KEY, "[1, 2, 3]").unwrap();
        assert!(get_stored_favorites(&backend).is_empty());
    }

    #[test]
    fn test_failing_backend_reads_empty_and_swallows_writes() {
        let mut favorites = FavoritesStore::load(Box::new(BrokenStore), &DateFormatter::default());
        assert!(favorites.is_empty());

        assert!(favorites.toggle_favorite(event("a", "2025-01-01")));
        assert!(favorites.is_favorite("a"));
    }

    #[test]
    fn test_load_regenerates_formatted_date() {
        let backend = SharedStore::default();
        let mut stale = event("a", "2025-06-01T19:30:00");
        stale.formatted_date = "whatever was stored".to_string();
        let mut mapping = FavoritesEntities::new();
        mapping.insert("a".to_string(), stale);
        persist_favorites(&backend, &mapping);

        let favorites = load(&backend);
        assert_eq!(
            favorites.entities()["a"].formatted_date,
            "Jun 1, 2025, 7:30 PM"
        );
    }

    #[test]
    fn test_sorted_puts_tbd_last() {
        let backend = SharedStore::default();
        let mut favorites = load(&backend);
        favorites.toggle_favorite(event("late", "2025-12-01"));
        favorites.toggle_favorite(event("tbd", "TBD"));
        favorites.toggle_favorite(event("early", "2025-01-01"));

        let order: Vec<&str> = favorites.sorted().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(order, vec!["early", "late", "tbd"]);
    }
}
