//! `DuckDB` connection pool management.
//!
//! One database instance is opened per manager; pooled connections are
//! clones of it, so every connection sees the same committed state.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ::duckdb::Connection;

struct PoolInner {
    db_path: Option<PathBuf>,
    max_pool_size: usize,
    root: Mutex<Connection>,
    idle: Mutex<Vec<Connection>>,
}

/// A connection pool manager for `DuckDB` connections.
#[derive(Clone)]
pub struct DuckDbConnectionManager {
    inner: Arc<PoolInner>,
}

impl DuckDbConnectionManager {
    /// Open the database file and create a pool on top of it.
    ///
    /// # Errors
    /// Returns an error if the database file cannot be opened or configured.
    pub fn open(path: impl Into<PathBuf>, max_pool_size: usize) -> Result<Self, ::duckdb::Error> {
        let path = path.into();
        let root = Connection::open(&path)?;
        Self::from_root(root, Some(path), max_pool_size)
    }

    /// Pool over a private in-memory database.
    ///
    /// # Errors
    /// Returns an error if `DuckDB` cannot allocate the database.
    pub fn open_in_memory(max_pool_size: usize) -> Result<Self, ::duckdb::Error> {
        let root = Connection::open_in_memory()?;
        Self::from_root(root, None, max_pool_size)
    }

    fn from_root(
        root: Connection,
        db_path: Option<PathBuf>,
        max_pool_size: usize,
    ) -> Result<Self, ::duckdb::Error> {
        configure_connection(&root)?;
        Ok(Self {
            inner: Arc::new(PoolInner {
                db_path,
                max_pool_size: max_pool_size.max(1),
                root: Mutex::new(root),
                idle: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Acquire a connection from the pool.
    ///
    /// # Errors
    /// Returns an error if a new connection cannot be cloned or configured.
    ///
    /// # Panics
    /// Panics if a pool mutex is poisoned (indicating a previous panic while
    /// holding the lock).
    pub fn acquire(&self) -> Result<PooledConnection, ::duckdb::Error> {
        let idle = self
            .inner
            .idle
            .lock()
            .expect("duckdb connection pool mutex poisoned")
            .pop();

        let connection = match idle {
            Some(connection) => connection,
            None => {
                let connection = self
                    .inner
                    .root
                    .lock()
                    .expect("duckdb root connection mutex poisoned")
                    .try_clone()?;
                configure_connection(&connection)?;
                connection
            }
        };

        Ok(PooledConnection {
            pool: Arc::clone(&self.inner),
            connection: Some(connection),
        })
    }

    /// Path to the database file, `None` for in-memory pools.
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.inner.db_path.as_deref()
    }
}

/// A pooled connection that returns to the pool when dropped.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    connection: Option<Connection>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        self.connection
            .as_ref()
            .expect("pooled connection unexpectedly missing")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.connection
            .as_mut()
            .expect("pooled connection unexpectedly missing")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };

        // A connection still inside a transaction is not reusable.
        if !connection.is_autocommit() {
            return;
        }

        let Ok(mut idle) = self.pool.idle.lock() else {
            return;
        };
        if idle.len() < self.pool.max_pool_size {
            idle.push(connection);
        }
    }
}

/// Configure a database connection with appropriate settings.
///
/// # Errors
/// Returns an error if configuration SQL fails to execute.
fn configure_connection(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_connections_share_one_database() {
        let manager = DuckDbConnectionManager::open_in_memory(2).expect("open");
        {
            let writer = manager.acquire().expect("writer");
            writer
                .execute_batch("CREATE TABLE shared AS SELECT 42 AS answer")
                .expect("create");
        }

        let first = manager.acquire().expect("first");
        let second = manager.acquire().expect("second");
        for connection in [&first, &second] {
            let answer: i32 = connection
                .query_row("SELECT answer FROM shared", [], |row| row.get(0))
                .expect("query");
            assert_eq!(answer, 42);
        }
    }

    #[test]
    fn released_connections_are_reused_up_to_pool_size() {
        let manager = DuckDbConnectionManager::open_in_memory(1).expect("open");
        drop(manager.acquire().expect("a"));
        drop(manager.acquire().expect("b"));
        drop(manager.acquire().expect("c"));

        let idle = manager.inner.idle.lock().expect("lock").len();
        assert_eq!(idle, 1);
        assert!(manager.db_path().is_none());
    }
}
