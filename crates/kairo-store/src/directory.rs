//! Pooled read access to the users table for the batch matcher.
//!
//! Each matcher worker checks out its own connection, so lookups from
//! different batches never share a statement cache or temp table.

use crate::error::{Result, StoreError};
use crate::repo::UsersRepo;
use crate::{db, Store};
use kairo_core::{Directory, DirectoryError, DirectoryUser};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

pub struct DirectoryPool {
    idle: Mutex<Vec<Connection>>,
    returned: Condvar,
    size: usize,
}

impl DirectoryPool {
    /// Opens `size` connections to the database at `path`.
    pub fn open(path: &Path, size: usize) -> Result<Self> {
        let size = size.max(1);
        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            connections.push(db::open(path)?);
        }
        Ok(Self::from_connections(connections))
    }

    /// A single-connection pool over an already migrated store. In-memory
    /// databases cannot be reopened, so this is how they are shared.
    pub fn from_store(store: Store) -> Self {
        Self::from_connections(vec![store.into_connection()])
    }

    fn from_connections(connections: Vec<Connection>) -> Self {
        let size = connections.len();
        Self {
            idle: Mutex::new(connections),
            returned: Condvar::new(),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn checkout(&self) -> PooledConnection<'_> {
        let mut idle = self.lock();
        loop {
            if let Some(conn) = idle.pop() {
                return PooledConnection {
                    pool: self,
                    conn: Some(conn),
                };
            }
            idle = self
                .returned
                .wait(idle)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// The idle list stays consistent across a panicking holder, so a
    /// poisoned lock is taken over rather than reported.
    fn lock(&self) -> MutexGuard<'_, Vec<Connection>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_users<T>(&self, f: impl FnOnce(&UsersRepo<'_>) -> Result<T>) -> Result<T> {
        let pooled = self.checkout();
        let conn = pooled
            .conn
            .as_ref()
            .ok_or_else(|| StoreError::PoolUnavailable("connection already returned".to_string()))?;
        f(&UsersRepo::new(conn))
    }
}

struct PooledConnection<'a> {
    pool: &'a DirectoryPool,
    conn: Option<Connection>,
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        self.pool.lock().push(conn);
        self.pool.returned.notify_one();
    }
}

impl Directory for DirectoryPool {
    fn find_by_exact_phone_set(
        &self,
        tokens: &[String],
    ) -> std::result::Result<Vec<DirectoryUser>, DirectoryError> {
        Ok(self.with_users(|users| users.find_by_exact_phones(tokens))?)
    }

    fn find_by_phone_pattern(
        &self,
        digits: &str,
        limit: usize,
    ) -> std::result::Result<Vec<DirectoryUser>, DirectoryError> {
        Ok(self.with_users(|users| users.find_by_phone_pattern(digits, limit))?)
    }

    fn find_by_phone_patterns(
        &self,
        patterns: &[String],
        limit: usize,
    ) -> std::result::Result<Vec<Vec<DirectoryUser>>, DirectoryError> {
        Ok(self.with_users(|users| users.find_by_phone_patterns(patterns, limit))?)
    }
}
