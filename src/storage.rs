use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

/// Durable string key-value storage, the client-side equivalent of the
/// browser's origin-scoped local storage. Values survive restarts.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct SqliteKvStore {
    path: String,
}

impl SqliteKvStore {
    pub fn new(path: &str) -> Result<Self> {
        if path.trim().is_empty() {
            anyhow::bail!("STOCKDESK_STORAGE is empty");
        }
        if path != ":memory:" && !path.starts_with("file:") {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create storage parent dir for {path}"))?;
            }
        }

        // Note: rusqlite::Connection is not Send/Sync. We keep only a path here
        // and open short-lived connections per operation. WAL keeps this fast
        // enough for the handful of session reads/writes per navigation.
        Ok(Self { path: path.to_string() })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn open_conn(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)
            .with_context(|| format!("open storage {}", self.path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Ok(conn)
    }

    pub fn init_db(&self) -> Result<()> {
        let conn = self.open_conn()?;
        conn.execute_batch(
            r#"
CREATE TABLE IF NOT EXISTS kv (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL
);
"#,
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.open_conn()?;
        let v = conn
            .query_row("SELECT value FROM kv WHERE key=?", params![key], |r| {
                r.get::<_, String>(0)
            })
            .optional()?;
        Ok(v)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.open_conn()?;
        conn.execute(
            r#"
INSERT INTO kv(key, value) VALUES(?,?)
ON CONFLICT(key) DO UPDATE SET value=excluded.value
"#,
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.open_conn()?;
        conn.execute("DELETE FROM kv WHERE key=?", params![key])?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let conn = self.open_conn()?;
        conn.execute("DELETE FROM kv", [])?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryKvStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.inner.lock().clear();
        Ok(())
    }
}
