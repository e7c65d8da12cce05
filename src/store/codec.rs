//! Versioned load/save of the progress document
//!
//! A corrupt or missing store never surfaces as an error: `load` falls back
//! to a fresh document and `save` swallows write failures, so the learning
//! flow continues without durable persistence for that session.

use tracing::{debug, warn};

use super::ProgressStore;
use crate::model::{unix_now, ProgressStorage, SCHEMA_VERSION};

/// Fixed key the document is stored under
pub const STORAGE_KEY: &str = "learning-progress";

/// Reads and writes one `ProgressStorage` document under a fixed key
pub struct ProgressCodec {
    store: Box<dyn ProgressStore>,
    key: String,
    user_id: String,
}

impl ProgressCodec {
    pub fn new(store: Box<dyn ProgressStore>, user_id: &str) -> Self {
        Self { store, key: STORAGE_KEY.to_string(), user_id: user_id.to_string() }
    }

    /// Load the document, falling back to a fresh one on any failure
    pub fn load(&self) -> ProgressStorage {
        let Some(raw) = self.store.read(&self.key) else {
            debug!("No stored progress under {:?}, starting fresh", self.key);
            return ProgressStorage::new(&self.user_id);
        };

        match serde_json::from_str::<ProgressStorage>(&raw) {
            Ok(doc) if doc.version == SCHEMA_VERSION => doc,
            Ok(doc) => self.migrate(doc),
            Err(err) => {
                warn!("Corrupt progress document, reinitializing: {err}");
                ProgressStorage::new(&self.user_id)
            }
        }
    }

    /// Stamp `last_updated` and persist; write failures are logged, not raised
    pub fn save(&self, doc: &mut ProgressStorage) {
        doc.last_updated = unix_now();

        let contents = match serde_json::to_string(doc) {
            Ok(c) => c,
            Err(err) => {
                warn!("Failed to serialize progress document: {err}");
                return;
            }
        };

        if let Err(err) = self.store.write(&self.key, &contents) {
            warn!("Failed to persist progress document: {err}");
        }
    }

    /// Bring an older document up to the current schema. All nested types
    /// deserialize leniently, so the identity migration just restamps the
    /// version.
    fn migrate(&self, mut doc: ProgressStorage) -> ProgressStorage {
        warn!(
            "Progress schema version {:?} differs from current {:?}, migrating",
            doc.version, SCHEMA_VERSION
        );
        doc.version = SCHEMA_VERSION.to_string();
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PathProgress;
    use crate::store::{MemoryStore, NullStore};

    fn codec() -> ProgressCodec {
        ProgressCodec::new(Box::new(MemoryStore::new()), "u1")
    }

    #[test]
    fn load_without_stored_data_is_fresh() {
        let doc = codec().load();
        assert_eq!(doc.user_id, "u1");
        assert!(doc.paths.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let codec = codec();
        let mut doc = codec.load();
        doc.paths.insert("p1".into(), PathProgress::new("p1", "u1", 10));
        codec.save(&mut doc);

        let reloaded = codec.load();
        assert!(reloaded.paths.contains_key("p1"));
        assert!(reloaded.last_updated > 0);
    }

    #[test]
    fn corrupt_data_falls_back_to_fresh() {
        let store = MemoryStore::new();
        store.write(STORAGE_KEY, "not json at all {{{").unwrap();

        let codec = ProgressCodec::new(Box::new(store), "u1");
        let doc = codec.load();
        assert_eq!(doc.version, SCHEMA_VERSION);
        assert!(doc.paths.is_empty());
    }

    #[test]
    fn version_mismatch_migrates_instead_of_discarding() {
        let codec = codec();
        let mut doc = codec.load();
        doc.paths.insert("p1".into(), PathProgress::new("p1", "u1", 10));
        doc.version = "0".into();

        let raw = serde_json::to_string(&doc).unwrap();
        let store = MemoryStore::new();
        store.write(STORAGE_KEY, &raw).unwrap();

        let codec = ProgressCodec::new(Box::new(store), "u1");
        let migrated = codec.load();
        assert_eq!(migrated.version, SCHEMA_VERSION);
        // Data survives the migration
        assert!(migrated.paths.contains_key("p1"));
    }

    #[test]
    fn null_store_degrades_to_in_memory_only() {
        let codec = ProgressCodec::new(Box::new(NullStore), "u1");
        let mut doc = codec.load();
        doc.paths.insert("p1".into(), PathProgress::new("p1", "u1", 10));
        codec.save(&mut doc);

        // Nothing persisted, but nothing failed either
        assert!(codec.load().paths.is_empty());
    }
}
