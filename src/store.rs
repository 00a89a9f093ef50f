use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PlatformError, Result};

/// Well-known keys in the local store.
pub mod keys {
    pub const USERS: &str = "users";
    pub const SESSION: &str = "session";
    pub const COURSES: &str = "courses";

    pub fn progress_snapshot(course_id: &str) -> String {
        format!("progress_snapshot:{course_id}")
    }

    pub fn tracker(course_id: &str) -> String {
        format!("tracker:{course_id}")
    }
}

/// Key/value store of JSON-serialized blobs backed by SQLite.
///
/// All writes are synchronous and complete before the call returns, so no
/// partial state is ever observable by a later open.
pub struct LocalStore {
    conn: rusqlite::Connection,
}

impl LocalStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = rusqlite::Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Reads and deserializes a blob. A blob that fails to parse is discarded
    /// and treated as absent; corruption is never fatal.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = self.raw_get(key)?;
        match raw {
            None => Ok(None),
            Some(text) => match serde_json::from_str(&text) {
                Ok(value) => Ok(Some(value)),
                Err(_) => {
                    self.remove(key)?;
                    Ok(None)
                }
            },
        }
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)
            .map_err(|e| PlatformError::StorageCorrupt(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, text],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])?;
        Ok(())
    }

    /// The raw stored text, without deserialization.
    pub fn raw_get(&self, key: &str) -> Result<Option<String>> {
        let result = self.conn.query_row(
            "SELECT value FROM kv WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(text) => Ok(Some(text)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Used by tests to plant malformed blobs.
    #[cfg(test)]
    pub fn raw_put(&self, key: &str, text: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, text],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        name: String,
        count: u32,
    }

    fn setup_store() -> LocalStore {
        LocalStore::open_in_memory().expect("in-memory store should open")
    }

    #[test]
    fn get_missing_key_returns_none() {
        let store = setup_store();
        let value: Option<Blob> = store.get("nothing").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = setup_store();
        let blob = Blob {
            name: "hello".to_string(),
            count: 3,
        };
        store.put("blob", &blob).unwrap();

        let loaded: Blob = store.get("blob").unwrap().unwrap();
        assert_eq!(loaded, blob);
    }

    #[test]
    fn put_overwrites_existing_value() {
        let store = setup_store();
        store
            .put(
                "blob",
                &Blob {
                    name: "first".to_string(),
                    count: 1,
                },
            )
            .unwrap();
        store
            .put(
                "blob",
                &Blob {
                    name: "second".to_string(),
                    count: 2,
                },
            )
            .unwrap();

        let loaded: Blob = store.get("blob").unwrap().unwrap();
        assert_eq!(loaded.name, "second");
    }

    #[test]
    fn remove_deletes_the_key() {
        let store = setup_store();
        store.put("blob", &1u32).unwrap();
        store.remove("blob").unwrap();
        let value: Option<u32> = store.get("blob").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn remove_missing_key_is_a_noop() {
        let store = setup_store();
        store.remove("nothing").unwrap();
    }

    #[test]
    fn corrupt_blob_is_discarded_and_treated_as_absent() {
        let store = setup_store();
        store.raw_put("blob", "{not valid json").unwrap();

        let value: Option<Blob> = store.get("blob").unwrap();
        assert!(value.is_none());

        // The corrupt row is gone, not just skipped.
        assert!(store.raw_get("blob").unwrap().is_none());
    }

    #[test]
    fn wrong_shape_blob_is_also_discarded() {
        let store = setup_store();
        store.raw_put("blob", r#"{"unexpected": true}"#).unwrap();

        let value: Option<Blob> = store.get("blob").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn known_key_helpers() {
        assert_eq!(keys::progress_snapshot("n8n"), "progress_snapshot:n8n");
        assert_eq!(keys::tracker("n8n"), "tracker:n8n");
    }
}
