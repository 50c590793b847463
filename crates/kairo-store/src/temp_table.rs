use crate::error::Result;
use kairo_core::matching::directory::PATTERN_TAIL_DIGITS;
use rusqlite::{params, Connection};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TEMP_TABLE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Connection-scoped scratch table, dropped with the guard.
pub(crate) struct TempLookupTable<'a> {
    conn: &'a Connection,
    name: String,
}

impl<'a> TempLookupTable<'a> {
    /// One row per distinct phone token.
    pub(crate) fn with_tokens(conn: &'a Connection, tokens: &[String]) -> Result<Self> {
        let guard = Self::create(conn, "tokens", "phone TEXT PRIMARY KEY")?;
        {
            let mut stmt = guard.conn.prepare(&format!(
                "INSERT OR IGNORE INTO {} (phone) VALUES (?1);",
                guard.name
            ))?;
            for token in tokens {
                stmt.execute([token])?;
            }
        }
        Ok(guard)
    }

    /// One row per pattern, keyed by its position in `patterns`.
    pub(crate) fn with_patterns(conn: &'a Connection, patterns: &[String]) -> Result<Self> {
        let guard = Self::create(
            conn,
            "patterns",
            "slot INTEGER PRIMARY KEY, digits TEXT NOT NULL, tail TEXT NOT NULL",
        )?;
        {
            let mut stmt = guard.conn.prepare(&format!(
                "INSERT INTO {} (slot, digits, tail) VALUES (?1, ?2, ?3);",
                guard.name
            ))?;
            for (slot, digits) in patterns.iter().enumerate() {
                let tail = &digits[digits.len().saturating_sub(PATTERN_TAIL_DIGITS)..];
                stmt.execute(params![slot as i64, digits, tail])?;
            }
        }
        Ok(guard)
    }

    fn create(conn: &'a Connection, kind: &str, columns: &str) -> Result<Self> {
        let table_name = generate_temp_table_name(kind);
        debug_assert!(table_name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_'));
        let full_name = format!("temp.{}", table_name);

        conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {full_name};
             CREATE TEMP TABLE {full_name} ({columns});"
        ))?;

        Ok(Self {
            conn,
            name: full_name,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for TempLookupTable<'_> {
    fn drop(&mut self) {
        let _ = self
            .conn
            .execute(&format!("DROP TABLE IF EXISTS {};", self.name), []);
    }
}

fn generate_temp_table_name(kind: &str) -> String {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let counter = TEMP_TABLE_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("temp_{}_{}_{}", kind, micros, counter)
}
