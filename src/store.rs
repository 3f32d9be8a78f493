// 🗄️ Value Store - SQLite persistence for subjects, attributes and timed values
//
// One row per (subject, attribute, timestamp). Re-importing the same key
// replaces the value, so imports are idempotent.

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::entities::{Attribute, Provider, Subject, SubjectType, TimedValue};
use crate::lookup::{LookupError, ValueLookup};
use crate::matcher::AttributeMatcher;
use crate::temporal::{format_storage, parse_timestamp};

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS providers (
            label TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS attributes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            provider TEXT NOT NULL REFERENCES providers(label),
            label TEXT NOT NULL,
            description TEXT,
            UNIQUE(provider, label)
        );

        CREATE TABLE IF NOT EXISTS subject_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            provider TEXT NOT NULL,
            label TEXT NOT NULL,
            name TEXT,
            UNIQUE(provider, label)
        );

        CREATE TABLE IF NOT EXISTS subjects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            subject_type_id INTEGER NOT NULL REFERENCES subject_types(id),
            label TEXT NOT NULL,
            name TEXT,
            UNIQUE(subject_type_id, label)
        );

        CREATE TABLE IF NOT EXISTS timed_values (
            subject_id INTEGER NOT NULL REFERENCES subjects(id),
            attribute_id INTEGER NOT NULL REFERENCES attributes(id),
            timestamp TEXT NOT NULL,
            value REAL NOT NULL,
            caveat TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (subject_id, attribute_id, timestamp)
        );

        CREATE INDEX IF NOT EXISTS idx_subjects_label ON subjects(label);
        CREATE INDEX IF NOT EXISTS idx_attributes_label ON attributes(provider, label);",
    )
    .context("Failed to create schema")?;

    Ok(())
}

// ============================================================================
// WRITES
// ============================================================================

pub fn insert_provider(conn: &Connection, provider: &Provider) -> Result<()> {
    conn.execute(
        "INSERT INTO providers (label, name) VALUES (?1, ?2)
         ON CONFLICT(label) DO UPDATE SET name = excluded.name",
        params![provider.label, provider.name],
    )?;
    Ok(())
}

/// Insert (or refresh) an attribute, returning its row id
pub fn insert_attribute(conn: &Connection, attribute: &Attribute) -> Result<i64> {
    // Attributes may arrive before their provider is described
    conn.execute(
        "INSERT OR IGNORE INTO providers (label, name) VALUES (?1, ?1)",
        params![attribute.provider],
    )?;

    conn.execute(
        "INSERT INTO attributes (provider, label, description) VALUES (?1, ?2, ?3)
         ON CONFLICT(provider, label)
         DO UPDATE SET description = COALESCE(excluded.description, attributes.description)",
        params![attribute.provider, attribute.label, attribute.description],
    )?;

    let id = conn.query_row(
        "SELECT id FROM attributes WHERE provider = ?1 AND label = ?2",
        params![attribute.provider, attribute.label],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Insert (or refresh) a subject and its type, returning the subject row id
pub fn insert_subject(conn: &Connection, subject: &Subject) -> Result<i64> {
    let st = &subject.subject_type;
    conn.execute(
        "INSERT INTO subject_types (provider, label, name) VALUES (?1, ?2, ?3)
         ON CONFLICT(provider, label) DO UPDATE SET name = COALESCE(excluded.name, subject_types.name)",
        params![st.provider, st.label, st.name],
    )?;
    let subject_type_id: i64 = conn.query_row(
        "SELECT id FROM subject_types WHERE provider = ?1 AND label = ?2",
        params![st.provider, st.label],
        |row| row.get(0),
    )?;

    conn.execute(
        "INSERT INTO subjects (subject_type_id, label, name) VALUES (?1, ?2, ?3)
         ON CONFLICT(subject_type_id, label) DO UPDATE SET name = COALESCE(excluded.name, subjects.name)",
        params![subject_type_id, subject.label, subject.name],
    )?;
    let id = conn.query_row(
        "SELECT id FROM subjects WHERE subject_type_id = ?1 AND label = ?2",
        params![subject_type_id, subject.label],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Upsert timed values in one transaction. Returns the number of rows written.
pub fn insert_timed_values(conn: &Connection, values: &[TimedValue]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut written = 0;

    for tv in values {
        let subject_id = insert_subject(&tx, &tv.subject)?;
        let attribute_id = insert_attribute(&tx, &tv.attribute)?;

        written += tx.execute(
            "INSERT INTO timed_values (subject_id, attribute_id, timestamp, value, caveat)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(subject_id, attribute_id, timestamp)
             DO UPDATE SET value = excluded.value, caveat = excluded.caveat",
            params![subject_id, attribute_id, format_storage(&tv.timestamp), tv.value, tv.caveat],
        )?;
    }

    tx.commit()?;
    info!(written, "Stored timed values");
    Ok(written)
}

pub fn count_timed_values(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM timed_values", [], |row| row.get(0))?;
    Ok(count)
}

/// Look up a subject by type label and code
pub fn find_subject(conn: &Connection, subject_type: &str, label: &str) -> Result<Option<Subject>> {
    let subject = conn
        .query_row(
            "SELECT st.provider, st.label, st.name, s.label, s.name
             FROM subjects s
             JOIN subject_types st ON st.id = s.subject_type_id
             WHERE st.label = ?1 AND s.label = ?2",
            params![subject_type, label],
            |row| {
                Ok(Subject {
                    subject_type: SubjectType {
                        provider: row.get(0)?,
                        label: row.get(1)?,
                        name: row.get(2)?,
                    },
                    label: row.get(3)?,
                    name: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(subject)
}

// ============================================================================
// CSV IMPORT
// ============================================================================

/// One CSV line: subject_type,subject,provider,attribute,timestamp,value[,caveat][,subject_type_provider]
#[derive(Debug, Deserialize)]
struct CsvRow {
    subject_type: String,
    subject: String,
    #[serde(default)]
    subject_type_provider: Option<String>,
    #[serde(default)]
    provider: Option<String>,
    attribute: String,
    timestamp: String,
    value: f64,
    #[serde(default)]
    caveat: Option<String>,
}

/// Read timed values from CSV. Rows with an empty provider get `default_provider`.
///
/// The subject type never takes the data provider of the row: one LSOA
/// reported by several providers is still one subject. It is owned by
/// `subject_type_provider` when given, else by `default_provider`.
pub fn load_csv(csv_path: &Path, default_provider: &str) -> Result<Vec<TimedValue>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file: {:?}", csv_path))?;

    let mut values = Vec::new();

    for (line, result) in rdr.deserialize().enumerate() {
        let row: CsvRow = result.context("Failed to deserialize timed value")?;
        let timestamp = parse_timestamp(&row.timestamp)
            .with_context(|| format!("Bad timestamp on data line {}", line + 1))?;

        let provider = row
            .provider
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| default_provider.to_string());

        let subject_type_provider = row
            .subject_type_provider
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| default_provider.to_string());

        let subject = Subject::new(SubjectType::new(subject_type_provider, row.subject_type), row.subject);
        let attribute = Attribute {
            provider,
            label: row.attribute,
            description: None,
        };

        let mut tv = TimedValue::new(subject, attribute, timestamp, row.value);
        tv.caveat = row.caveat.filter(|c| !c.is_empty());
        values.push(tv);
    }

    Ok(values)
}

// ============================================================================
// SQLITE STORE (lookup collaborator)
// ============================================================================

/// SQLite-backed `ValueLookup`.
///
/// The connection sits behind a Mutex so one store can serve fields
/// evaluated from several threads.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {:?}", path))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    /// Run a closure against the underlying connection
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().map_err(|_| anyhow!("Value store lock poisoned"))?;
        f(&conn)
    }

    pub fn insert_timed_values(&self, values: &[TimedValue]) -> Result<usize> {
        self.with_conn(|conn| insert_timed_values(conn, values))
    }

    pub fn find_subject(&self, subject_type: &str, label: &str) -> Result<Option<Subject>> {
        self.with_conn(|conn| find_subject(conn, subject_type, label))
    }

    pub fn count_timed_values(&self) -> Result<i64> {
        self.with_conn(count_timed_values)
    }
}

impl ValueLookup for SqliteStore {
    fn resolve(&self, subject: &Subject, matcher: &AttributeMatcher) -> Result<Option<TimedValue>, LookupError> {
        let conn = self.conn.lock().map_err(|_| LookupError::Poisoned)?;

        let mut stmt = conn.prepare_cached(
            "SELECT tv.timestamp, tv.value, tv.caveat, a.description
             FROM timed_values tv
             JOIN subjects s ON s.id = tv.subject_id
             JOIN subject_types st ON st.id = s.subject_type_id
             JOIN attributes a ON a.id = tv.attribute_id
             WHERE st.provider = ?1 AND st.label = ?2 AND s.label = ?3
               AND a.provider = ?4 AND a.label = ?5
             ORDER BY tv.timestamp DESC",
        )?;

        let rows = stmt.query_map(
            params![
                subject.subject_type.provider,
                subject.subject_type.label,
                subject.label,
                matcher.provider,
                matcher.label,
            ],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            },
        )?;

        for row in rows {
            let (timestamp, value, caveat, description) = row?;
            if !matcher.accepts_caveat(caveat.as_deref()) {
                continue;
            }

            let attribute = Attribute {
                provider: matcher.provider.clone(),
                label: matcher.label.clone(),
                description,
            };
            let mut tv = TimedValue::new(subject.clone(), attribute, parse_timestamp(&timestamp)?, value);
            tv.caveat = caveat;
            return Ok(Some(tv));
        }

        debug!(subject = %subject, attribute = %matcher, "No stored value");
        Ok(None)
    }
}

// ============================================================================
// TESTS
// ============================================================================
