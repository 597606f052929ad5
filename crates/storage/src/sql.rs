//! Embedded SQL backend (rusqlite)
//!
//! Single table `(key text, range_key integer, data blob, primary
//! key(key, range_key))`; range queries are plain `ORDER BY range_key`
//! scans. The connection is wrapped in a [`parking_lot::Mutex`] since
//! `rusqlite::Connection` is `Send` but not `Sync`.

use crate::error::{Result, StoreError};
use crate::store::{Entry, Store};
use bucketdb_core::Key;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

/// Embedded SQLite-backed store.
pub struct SqlStore {
    conn: Mutex<Connection>,
}

impl SqlStore {
    /// Open (and migrate) a store backed by the sqlite database at `path`.
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory sqlite database, primarily for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS buckets (
                key TEXT NOT NULL,
                range_key INTEGER NOT NULL,
                data BLOB NOT NULL,
                PRIMARY KEY (key, range_key)
            )",
            [],
        )?;
        Ok(SqlStore {
            conn: Mutex::new(conn),
        })
    }
}

impl Store for SqlStore {
    fn insert(&self, key: &Key, range_key: u32, data: Vec<u8>) -> Result<()> {
        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO buckets (key, range_key, data) VALUES (?1, ?2, ?3)",
            params![key.as_str(), range_key, data],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update(&self, key: &Key, range_key: u32, data: Vec<u8>) -> Result<()> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE buckets SET data = ?3 WHERE key = ?1 AND range_key = ?2",
            params![key.as_str(), range_key, data],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn get(&self, key: &Key, range_key: u32) -> Result<Vec<u8>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT data FROM buckets WHERE key = ?1 AND range_key = ?2",
            params![key.as_str(), range_key],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(StoreError::NotFound)
    }

    fn first(&self, key: &Key) -> Result<Entry> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT range_key, data FROM buckets WHERE key = ?1 ORDER BY range_key ASC LIMIT 1",
            params![key.as_str()],
            |row| Ok((row.get::<_, i64>(0)? as u32, row.get(1)?)),
        )
        .optional()?
        .ok_or(StoreError::NotFound)
    }

    fn last(&self, key: &Key) -> Result<Entry> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT range_key, data FROM buckets WHERE key = ?1 ORDER BY range_key DESC LIMIT 1",
            params![key.as_str()],
            |row| Ok((row.get::<_, i64>(0)? as u32, row.get(1)?)),
        )
        .optional()?
        .ok_or(StoreError::NotFound)
    }

    fn left(&self, key: &Key, range_key: u32) -> Result<Entry> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT range_key, data FROM buckets WHERE key = ?1 AND range_key <= ?2
             ORDER BY range_key DESC LIMIT 1",
            params![key.as_str(), range_key],
            |row| Ok((row.get::<_, i64>(0)? as u32, row.get(1)?)),
        )
        .optional()?
        .ok_or(StoreError::NotFound)
    }

    fn range(&self, key: &Key, min: u32, max: u32) -> Result<Vec<Entry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT range_key, data FROM buckets WHERE key = ?1 AND range_key BETWEEN ?2 AND ?3
             ORDER BY range_key ASC",
        )?;
        let rows = stmt.query_map(params![key.as_str(), min, max], |row| {
            Ok((row.get::<_, i64>(0)? as u32, row.get(1)?))
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Key {
        Key::new(s).unwrap()
    }

    #[test]
    fn insert_then_get_round_trips() {
        let store = SqlStore::open_in_memory().unwrap();
        store.insert(&key("k"), 10, vec![1, 2, 3]).unwrap();
        assert_eq!(store.get(&key("k"), 10).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn insert_conflicts_on_duplicate_primary_key() {
        let store = SqlStore::open_in_memory().unwrap();
        store.insert(&key("k"), 10, vec![1]).unwrap();
        assert!(matches!(
            store.insert(&key("k"), 10, vec![2]),
            Err(StoreError::Conflict)
        ));
    }

    #[test]
    fn query_prepends_left_entry() {
        let store = SqlStore::open_in_memory().unwrap();
        for rk in [5u32, 10, 15, 20] {
            store.insert(&key("k"), rk, vec![rk as u8]).unwrap();
        }
        let q = store.query(&key("k"), 12, 30).unwrap();
        let rks: Vec<u32> = q.iter().map(|(rk, _)| *rk).collect();
        assert_eq!(rks, vec![10, 15, 20]);
    }
}
