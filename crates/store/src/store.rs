//! Whole-file JSON persistence for record collections.
//!
//! [`RecordStore`] is the only code in the system that touches the collection files.
//! Everything above it exchanges [`Record`] maps or typed [`Entity`](crate::Entity) values.

use crate::{Collection, Entity, MatchMode, StoreError, StoreResult};
use clinic_ids::PrefixedId;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One flat record: field name to JSON value, in insertion order.
pub type Record = Map<String, Value>;

/// Returns the value of `field` as text.
///
/// Strings are returned as-is, numbers and booleans in their JSON form, and missing or
/// `null` fields as the empty string.
pub fn field_text(record: &Record, field: &str) -> String {
    match record.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Record store rooted at one data directory.
///
/// The store holds no cached state; each call reads the relevant file afresh.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root_directory: PathBuf,
}

impl RecordStore {
    /// Opens (and if necessary creates) the data directory.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if:
    /// - the path exists but is not a directory
    /// - the directory cannot be created
    pub fn new(root_directory: &Path) -> StoreResult<Self> {
        if root_directory.exists() && !root_directory.is_dir() {
            return Err(StoreError::InvalidDataDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }
        fs::create_dir_all(root_directory)?;

        Ok(Self {
            root_directory: root_directory.to_path_buf(),
        })
    }

    /// Full path of the file backing `collection`.
    pub fn path(&self, collection: Collection) -> PathBuf {
        self.root_directory.join(collection.file_name())
    }

    /// Returns every record of `collection` in stored order.
    ///
    /// Never fails: a missing file, an unreadable file, content that is not valid JSON, or a
    /// top-level value that is not an array all read as an empty collection. Array elements
    /// that are not objects are skipped.
    pub fn read_all(&self, collection: Collection) -> Vec<Record> {
        let path = self.path(collection);
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!("failed to read {}: {}", path.display(), e);
                return Vec::new();
            }
        };

        let items = match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                tracing::warn!("{} does not hold a JSON array; treating as empty", path.display());
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(
                    "failed to decode {}: {}; treating as empty",
                    path.display(),
                    e
                );
                return Vec::new();
            }
        };

        items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(record) => Some(record),
                other => {
                    tracing::warn!("skipping non-record entry in {}: {}", path.display(), other);
                    None
                }
            })
            .collect()
    }

    /// Rewrites the whole collection, pretty-printed with four-space indentation.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if encoding or writing the file fails.
    pub fn write_all(&self, collection: Collection, records: &[Record]) -> StoreResult<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        records
            .serialize(&mut ser)
            .map_err(StoreError::Serialization)?;

        fs::write(self.path(collection), buf)?;
        Ok(())
    }

    /// Returns every record matching `filters` under `mode`.
    ///
    /// Each filter compares the record's field (as text, see [`field_text`]) against the
    /// filter value, case-insensitively. With [`MatchMode::And`] all filters must match;
    /// with [`MatchMode::Or`] at least one must.
    pub fn find(&self, collection: Collection, mode: MatchMode, filters: &[(&str, &str)]) -> Vec<Record> {
        self.read_all(collection)
            .into_iter()
            .filter(|record| {
                let mut matches = filters
                    .iter()
                    .map(|(field, value)| field_text(record, field).to_lowercase() == value.to_lowercase());
                match mode {
                    MatchMode::And => matches.all(|m| m),
                    MatchMode::Or => matches.any(|m| m),
                }
            })
            .collect()
    }

    /// Computes the identifier the next [`add`](Self::add) to `collection` would assign.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Id` if the identifier space is exhausted.
    pub fn next_id(&self, collection: Collection) -> StoreResult<PrefixedId> {
        let records = self.read_all(collection);
        Self::next_id_in(collection, &records)
    }

    fn next_id_in(collection: Collection, records: &[Record]) -> StoreResult<PrefixedId> {
        let field = collection.id_field();
        let existing: Vec<String> = records.iter().map(|r| field_text(r, field)).collect();
        Ok(clinic_ids::next_id(
            existing.iter().map(String::as_str),
            collection.id_prefix(),
        )?)
    }

    /// Appends `record` with a freshly allocated identifier and persists the collection.
    ///
    /// Any identifier already present on `record` is replaced. The identifier field is
    /// written first; the remaining fields keep their order.
    ///
    /// # Returns
    ///
    /// The stored record, including its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if allocation, encoding or writing fails.
    pub fn add(&self, collection: Collection, record: Record) -> StoreResult<Record> {
        let mut records = self.read_all(collection);
        let id = Self::next_id_in(collection, &records)?;
        let id_field = collection.id_field();

        let mut stored = Record::new();
        stored.insert(id_field.to_string(), Value::String(id.to_string()));
        for (key, value) in record {
            if key != id_field {
                stored.insert(key, value);
            }
        }

        records.push(stored.clone());
        self.write_all(collection, &records)?;

        tracing::info!("added {} to {}", id, collection);
        Ok(stored)
    }

    /// Merges `patch` into the first record whose identifier equals `id`.
    ///
    /// Keys in `patch` that the record does not have yet are added. The file is only
    /// rewritten when a record was found.
    ///
    /// # Returns
    ///
    /// `true` if a record was updated, `false` if none carries `id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if writing the collection fails.
    pub fn update(&self, collection: Collection, id: &str, patch: Record) -> StoreResult<bool> {
        let mut records = self.read_all(collection);
        let id_field = collection.id_field();

        let Some(target) = records
            .iter_mut()
            .find(|r| field_text(r, id_field) == id)
        else {
            tracing::debug!("update: {} not found in {}", id, collection);
            return Ok(false);
        };

        for (key, value) in patch {
            target.insert(key, value);
        }

        self.write_all(collection, &records)?;
        tracing::info!("updated {} in {}", id, collection);
        Ok(true)
    }

    /// Removes the first record whose identifier equals `id`.
    ///
    /// # Returns
    ///
    /// `true` if a record was removed. Deleting an unknown identifier leaves the file
    /// untouched and returns `false`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if writing the collection fails.
    pub fn delete(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        let mut records = self.read_all(collection);
        let id_field = collection.id_field();

        let Some(index) = records.iter().position(|r| field_text(r, id_field) == id) else {
            return Ok(false);
        };
        records.remove(index);

        self.write_all(collection, &records)?;
        tracing::info!("deleted {} from {}", id, collection);
        Ok(true)
    }

    // ========================================================================
    // TYPED ACCESS
    // ========================================================================

    /// Loads every record of `T`'s collection that decodes into `T`.
    ///
    /// Records that fail to decode are logged and skipped.
    pub fn load<T: Entity>(&self) -> Vec<T> {
        self.read_all(T::COLLECTION)
            .into_iter()
            .filter_map(|record| match T::from_record(record) {
                Ok(entity) => Some(entity),
                Err(e) => {
                    tracing::warn!("skipping undecodable record in {}: {}", T::COLLECTION, e);
                    None
                }
            })
            .collect()
    }

    /// Loads the entity with identifier `id`, if present.
    pub fn get<T: Entity>(&self, id: &str) -> Option<T> {
        self.load::<T>().into_iter().find(|e| e.id() == id)
    }

    /// Stores a new entity, assigning its identifier.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if encoding, allocation or writing fails.
    pub fn insert<T: Entity>(&self, entity: T) -> StoreResult<T> {
        let stored = self.add(T::COLLECTION, entity.to_record()?)?;
        T::from_record(stored)
    }

    /// Writes every field of `entity` over the stored record with the same identifier.
    ///
    /// # Returns
    ///
    /// `true` if the record existed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if encoding or writing fails.
    pub fn save<T: Entity>(&self, entity: &T) -> StoreResult<bool> {
        self.update(T::COLLECTION, entity.id(), entity.to_record()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    fn test_store() -> (TempDir, RecordStore) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = RecordStore::new(temp_dir.path()).expect("RecordStore::new should succeed");
        (temp_dir, store)
    }

    #[test]
    fn test_new_rejects_file_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file = temp_dir.path().join("not-a-dir");
        fs::write(&file, "x").unwrap();

        let err = RecordStore::new(&file).expect_err("should reject a file");
        assert!(matches!(err, StoreError::InvalidDataDirectory(_)));
    }

    #[test]
    fn test_read_all_missing_file_is_empty() {
        let (_dir, store) = test_store();
        assert!(store.read_all(Collection::Patients).is_empty());
    }

    #[test]
    fn test_read_all_corrupt_file_is_empty() {
        let (_dir, store) = test_store();
        fs::write(store.path(Collection::Patients), "{ not json [[").unwrap();
        assert!(store.read_all(Collection::Patients).is_empty());

        fs::write(store.path(Collection::Patients), "{\"a\": 1}").unwrap();
        assert!(store.read_all(Collection::Patients).is_empty());
    }

    #[test]
    fn test_read_all_skips_non_object_entries() {
        let (_dir, store) = test_store();
        fs::write(
            store.path(Collection::Medicines),
            r#"[{"medID": "M1"}, 42, "x", {"medID": "M2"}]"#,
        )
        .unwrap();
        let records = store.read_all(Collection::Medicines);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_add_round_trip_assigns_id() {
        let (_dir, store) = test_store();
        let input = record(json!({"name": "Jane Doe", "dob": "1990-01-01"}));

        let stored = store
            .add(Collection::Patients, input.clone())
            .expect("add should succeed");
        assert_eq!(field_text(&stored, "patientID"), "P1");

        let all = store.read_all(Collection::Patients);
        assert_eq!(all.len(), 1);
        let mut expected = input;
        expected.insert("patientID".into(), json!("P1"));
        assert_eq!(all[0].len(), expected.len());
        for (k, v) in &expected {
            assert_eq!(all[0].get(k), Some(v));
        }
        assert_eq!(all[0].keys().next().map(String::as_str), Some("patientID"));
    }

    #[test]
    fn test_add_allocates_past_existing_maximum() {
        let (_dir, store) = test_store();
        store
            .write_all(
                Collection::Appointments,
                &[record(json!({"aptID": "A7"})), record(json!({"aptID": "A2"}))],
            )
            .unwrap();

        let stored = store
            .add(Collection::Appointments, record(json!({"aptID": "A1", "status": "booked"})))
            .unwrap();
        assert_eq!(field_text(&stored, "aptID"), "A8");
        assert_eq!(store.read_all(Collection::Appointments).len(), 3);
    }

    #[test]
    fn test_find_and_or_modes() {
        let (_dir, store) = test_store();
        store
            .write_all(
                Collection::Users,
                &[
                    record(json!({"userID": "U1", "username": "Alice", "role": "doctor"})),
                    record(json!({"userID": "U2", "username": "bob", "role": "Doctor"})),
                    record(json!({"userID": "U3", "username": "carol", "role": "pharmacist"})),
                ],
            )
            .unwrap();

        let doctors = store.find(Collection::Users, MatchMode::And, &[("role", "DOCTOR")]);
        assert_eq!(doctors.len(), 2);

        let alice_doctor = store.find(
            Collection::Users,
            MatchMode::And,
            &[("role", "doctor"), ("username", "alice")],
        );
        assert_eq!(alice_doctor.len(), 1);

        let either = store.find(
            Collection::Users,
            MatchMode::Or,
            &[("username", "carol"), ("userID", "U1")],
        );
        let ids: Vec<String> = either.iter().map(|r| field_text(r, "userID")).collect();
        assert_eq!(ids, vec!["U1", "U3"]);
    }

    #[test]
    fn test_find_compares_numbers_as_text() {
        let (_dir, store) = test_store();
        store
            .write_all(Collection::Medicines, &[record(json!({"medID": "M1", "stock": 5}))])
            .unwrap();
        assert_eq!(
            store.find(Collection::Medicines, MatchMode::And, &[("stock", "5")]).len(),
            1
        );
    }

    #[test]
    fn test_update_merges_and_adds_new_keys() {
        let (_dir, store) = test_store();
        store
            .add(Collection::Appointments, record(json!({"status": "booked"})))
            .unwrap();

        let found = store
            .update(
                Collection::Appointments,
                "A1",
                record(json!({"status": "consulted", "note": "flu"})),
            )
            .unwrap();
        assert!(found);

        let stored = &store.read_all(Collection::Appointments)[0];
        assert_eq!(field_text(stored, "status"), "consulted");
        assert_eq!(field_text(stored, "note"), "flu");
    }

    #[test]
    fn test_update_missing_id_returns_false() {
        let (_dir, store) = test_store();
        let found = store
            .update(Collection::Appointments, "A99", record(json!({"status": "paid"})))
            .unwrap();
        assert!(!found);
        assert!(!store.path(Collection::Appointments).exists());
    }

    #[test]
    fn test_delete_removes_first_match_only() {
        let (_dir, store) = test_store();
        store
            .write_all(
                Collection::Medicines,
                &[
                    record(json!({"medID": "M1", "name": "a"})),
                    record(json!({"medID": "M1", "name": "b"})),
                ],
            )
            .unwrap();

        assert!(store.delete(Collection::Medicines, "M1").unwrap());
        let remaining = store.read_all(Collection::Medicines);
        assert_eq!(remaining.len(), 1);
        assert_eq!(field_text(&remaining[0], "name"), "b");
    }

    #[test]
    fn test_delete_unknown_id_leaves_file_unchanged() {
        let (_dir, store) = test_store();
        store
            .add(Collection::Medicines, record(json!({"name": "Paracetamol"})))
            .unwrap();
        let before = fs::read_to_string(store.path(Collection::Medicines)).unwrap();

        assert!(!store.delete(Collection::Medicines, "M42").unwrap());
        let after = fs::read_to_string(store.path(Collection::Medicines)).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_write_all_uses_four_space_indent() {
        let (_dir, store) = test_store();
        store
            .write_all(Collection::Users, &[record(json!({"userID": "U1"}))])
            .unwrap();
        let raw = fs::read_to_string(store.path(Collection::Users)).unwrap();
        assert!(raw.contains("\n        \"userID\": \"U1\""));
    }
}
