//! Caller-side memory of served tokens, kept in SQLite. The engine never
//! touches this; the one-shot driver loads it into a `RecencySet` before a
//! request and folds the response's `seen` list back in afterwards.

use rusqlite::{params, Connection};
use std::path::Path;
use std::thread;
use std::time::Duration;

pub const DEFAULT_HISTORY_CAP: usize = 700;
const WRITE_ATTEMPTS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        conn.busy_timeout(Duration::from_millis(5000))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, HistoryError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, HistoryError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS seen_tokens(
                token TEXT PRIMARY KEY,
                seen_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_seen_tokens_at ON seen_tokens(seen_at);",
        )?;
        Ok(HistoryStore { conn })
    }

    /// Most recent first, at most `limit` tokens.
    pub fn load_recent(&self, limit: usize) -> Result<Vec<String>, HistoryError> {
        let mut stmt = self
            .conn
            .prepare("SELECT token FROM seen_tokens ORDER BY seen_at DESC, rowid DESC LIMIT ?1")?;
        let rows = stmt.query_map(params![limit as i64], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Records `tokens` as seen now; a token seen again moves to the front.
    pub fn remember(&mut self, tokens: &[String]) -> Result<(), HistoryError> {
        let now = chrono::Utc::now().timestamp_millis();
        let conn = &mut self.conn;
        retry_with_backoff(
            || {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO seen_tokens(token, seen_at) VALUES (?1, ?2)
                         ON CONFLICT(token) DO UPDATE SET seen_at = excluded.seen_at",
                    )?;
                    for token in tokens {
                        stmt.execute(params![token, now])?;
                    }
                }
                tx.commit()
            },
            WRITE_ATTEMPTS,
        )?;
        Ok(())
    }

    /// Drops everything but the newest `cap` tokens. Returns how many went.
    pub fn trim(&mut self, cap: usize) -> Result<usize, HistoryError> {
        let conn = &mut self.conn;
        let removed = retry_with_backoff(
            || {
                conn.execute(
                    "DELETE FROM seen_tokens WHERE token NOT IN
                     (SELECT token FROM seen_tokens ORDER BY seen_at DESC, rowid DESC LIMIT ?1)",
                    params![cap as i64],
                )
            },
            WRITE_ATTEMPTS,
        )?;
        Ok(removed)
    }

    pub fn len(&self) -> Result<usize, HistoryError> {
        let n: i64 = self.conn.query_row("SELECT COUNT(*) FROM seen_tokens", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    pub fn is_empty(&self) -> Result<bool, HistoryError> {
        Ok(self.len()? == 0)
    }
}

/// Retries a write while SQLite reports contention: 50ms, 100ms, 200ms...
fn retry_with_backoff<F, T>(mut f: F, max_attempts: usize) -> Result<T, rusqlite::Error>
where
    F: FnMut() -> Result<T, rusqlite::Error>,
{
    let mut attempt = 1;
    loop {
        match f() {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_attempts && is_busy(&e) => {
                log::debug!("history write busy (attempt {attempt}): {e}");
                thread::sleep(Duration::from_millis(50 << (attempt - 1)));
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn is_busy(e: &rusqlite::Error) -> bool {
    matches!(
        e.sqlite_error_code(),
        Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    #[test]
    fn remembers_and_loads() {
        let mut store = HistoryStore::open_in_memory().unwrap();
        assert!(store.is_empty().unwrap());
        store.remember(&tokens("A", 5)).unwrap();
        store.remember(&tokens("A", 2)).unwrap();
        assert_eq!(store.len().unwrap(), 5);
        assert_eq!(store.load_recent(3).unwrap().len(), 3);
    }

    #[test]
    fn trim_keeps_the_newest() {
        let mut store = HistoryStore::open_in_memory().unwrap();
        store.remember(&tokens("OLD", 10)).unwrap();
        thread::sleep(Duration::from_millis(5));
        store.remember(&tokens("NEW", 4)).unwrap();
        assert_eq!(store.trim(4).unwrap(), 10);
        let left = store.load_recent(100).unwrap();
        assert_eq!(left.len(), 4);
        assert!(left.iter().all(|t| t.starts_with("NEW")));
    }

    #[test]
    fn file_backed_store_persists() {
        let path = std::env::temp_dir().join(format!("cx_history_{}.sqlite", std::process::id()));
        let _ = std::fs::remove_file(&path);
        {
            let mut store = HistoryStore::open(&path).unwrap();
            store.remember(&tokens("W", 3)).unwrap();
        }
        let store = HistoryStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 3);
        drop(store);
        let _ = std::fs::remove_file(&path);
    }
}
