//! SQLite-backed `LocalCache`.

use crate::cache::LocalCache;
use crate::db::{open_db, open_db_in_memory, DbResult};
use log::{debug, error, warn};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;

/// Local cache persisted in the `cache_entries` table.
pub struct SqliteLocalCache {
    conn: Mutex<Connection>,
}

impl SqliteLocalCache {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens (creating and migrating if needed) a file-backed cache.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        open_db(path).map(Self::new)
    }

    /// Opens a process-private in-memory cache.
    pub fn open_in_memory() -> DbResult<Self> {
        open_db_in_memory().map(Self::new)
    }

    /// Lists stored keys in ascending order.
    pub fn keys(&self) -> Vec<String> {
        let conn = self.conn.lock();
        let result = conn
            .prepare("SELECT key FROM cache_entries ORDER BY key ASC;")
            .and_then(|mut stmt| {
                let keys = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>();
                keys
            });
        match result {
            Ok(keys) => keys,
            Err(err) => {
                error!("event=cache_keys module=cache status=error error={err}");
                Vec::new()
            }
        }
    }
}

impl LocalCache for SqliteLocalCache {
    fn save(&self, key: &str, value: &Value) {
        let encoded = value.to_string();
        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO cache_entries (key, value)
             VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, encoded],
        );
        match result {
            Ok(_) => debug!(
                "event=cache_save module=cache status=ok key={} bytes={}",
                key,
                encoded.len()
            ),
            Err(err) => error!("event=cache_save module=cache status=error key={key} error={err}"),
        }
    }

    fn load(&self, key: &str) -> Option<Value> {
        let conn = self.conn.lock();
        let raw = conn
            .query_row(
                "SELECT value FROM cache_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional();

        let raw = match raw {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                error!("event=cache_load module=cache status=error key={key} error={err}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    "event=cache_load module=cache status=error key={} error_code=corrupt_entry error={}",
                    key, err
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteLocalCache;
    use crate::cache::LocalCache;
    use serde_json::json;

    fn cache() -> SqliteLocalCache {
        SqliteLocalCache::open_in_memory().expect("in-memory cache should open")
    }

    #[test]
    fn save_then_load_returns_latest_value() {
        let cache = cache();
        cache.save("production1", &json!([{"a": 1}]));
        cache.save("production1", &json!([{"a": 2}]));

        assert_eq!(cache.load("production1"), Some(json!([{"a": 2}])));
        assert_eq!(cache.keys(), vec!["production1".to_string()]);
    }

    #[test]
    fn missing_key_uses_default() {
        let cache = cache();
        assert!(cache.keys().is_empty());
        assert_eq!(cache.load("nothing"), None);
        assert_eq!(cache.load_or("nothing", json!(null)), json!(null));
    }

    #[test]
    fn corrupt_entry_reads_as_absent() {
        let cache = cache();
        cache
            .conn
            .lock()
            .execute(
                "INSERT INTO cache_entries (key, value) VALUES ('broken', '{not json');",
                [],
            )
            .expect("raw insert should succeed");

        assert_eq!(cache.load("broken"), None);
    }
}
