// 🗄️ Storage Engine - SQLite persistence for ledger records
// Per-call connections: every operation opens, works, commits, releases

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::record::{Record, RecordType};

/// Canonical write format: full sub-second precision
const TS_FORMAT_MICROS: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Legacy read format: whole seconds only
const TS_FORMAT_SECONDS: &str = "%Y-%m-%d %H:%M:%S";

/// Seed categories inserted at initialization (4 income + 8 expense).
/// Insertions are idempotent; re-running init never duplicates or errors.
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("salary", "income"),
    ("part-time", "income"),
    ("investment", "income"),
    ("other income", "income"),
    ("dining", "expense"),
    ("transport", "expense"),
    ("shopping", "expense"),
    ("entertainment", "expense"),
    ("medical", "expense"),
    ("housing", "expense"),
    ("communication", "expense"),
    ("other expense", "expense"),
];

/// CSV export header, first row of every export
const EXPORT_HEADER: [&str; 6] = ["ID", "Date", "Type", "Category", "Amount", "Description"];

// ============================================================================
// SEARCH FILTER
// ============================================================================

/// Composable record filters. Every field is independently optional; set
/// fields combine with AND semantics. Bounds are inclusive and applied
/// literally (an inverted min/max simply matches nothing).
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Substring match against description OR category. Uses SQLite LIKE,
    /// which is case-insensitive for ASCII and case-sensitive beyond it.
    pub keyword: Option<String>,

    /// Exact category match
    pub category: Option<String>,

    /// Earliest date, inclusive
    pub start_date: Option<NaiveDateTime>,

    /// Latest date, inclusive
    pub end_date: Option<NaiveDateTime>,

    /// Minimum amount, inclusive
    pub min_amount: Option<f64>,

    /// Maximum amount, inclusive
    pub max_amount: Option<f64>,

    /// Income or expense only
    pub record_type: Option<RecordType>,
}

// ============================================================================
// STORAGE ENGINE
// ============================================================================

/// SQLite-backed record store.
///
/// Holds only the database path; each operation is a self-contained unit of
/// work over its own connection, committed on completion. Not-found is a
/// value (`None` / `false`), never an error; storage-medium failures
/// propagate as errors.
pub struct Storage {
    db_path: PathBuf,
}

impl Storage {
    /// Open (or create) the database at `path` and ensure the schema and
    /// default categories exist. Creates the containing directory if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Storage> {
        let db_path = path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory: {}", parent.display())
                })?;
            }
        }

        let storage = Storage { db_path };
        storage.init_db()?;
        Ok(storage)
    }

    /// Open the default database at `data/account_book.db` under the
    /// current directory.
    pub fn open_default() -> Result<Storage> {
        Storage::open(Path::new("data").join("account_book.db"))
    }

    /// Path of the underlying database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .with_context(|| format!("Failed to open database: {}", self.db_path.display()))
    }

    /// Create tables and seed default categories. Safe to call repeatedly:
    /// tables are IF NOT EXISTS and the seed uses INSERT OR IGNORE keyed on
    /// the category name's UNIQUE constraint.
    fn init_db(&self) -> Result<()> {
        let conn = self.connect()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                description TEXT,
                type TEXT NOT NULL CHECK(type IN ('income', 'expense')),
                date TIMESTAMP NOT NULL
            )",
            [],
        )
        .context("Failed to create records table")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                type TEXT NOT NULL CHECK(type IN ('income', 'expense'))
            )",
            [],
        )
        .context("Failed to create categories table")?;

        for (name, category_type) in DEFAULT_CATEGORIES {
            conn.execute(
                "INSERT OR IGNORE INTO categories (name, type) VALUES (?1, ?2)",
                params![name, category_type],
            )
            .context("Failed to seed default categories")?;
        }

        Ok(())
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    /// Insert a new record and return the assigned row id.
    pub fn save_record(&self, record: &Record) -> Result<i64> {
        let conn = self.connect()?;

        conn.execute(
            "INSERT INTO records (amount, category, description, type, date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.amount,
                record.category,
                record.description,
                record.record_type.as_db_str(),
                record.date.format(TS_FORMAT_MICROS).to_string(),
            ],
        )
        .context("Failed to insert record")?;

        Ok(conn.last_insert_rowid())
    }

    /// Fetch one record by id; `None` when no row matches.
    pub fn get_record(&self, record_id: i64) -> Result<Option<Record>> {
        let conn = self.connect()?;

        let mut stmt = conn.prepare(
            "SELECT id, amount, category, description, type, date
             FROM records WHERE id = ?1",
        )?;

        let mut rows = stmt.query_map(params![record_id], map_record_row)?;

        match rows.next() {
            Some(row) => Ok(Some(row.context("Failed to read record row")?)),
            None => Ok(None),
        }
    }

    /// All records, most recent first, optionally restricted to an inclusive
    /// date range. Either bound may be omitted independently.
    pub fn get_all_records(
        &self,
        start_date: Option<NaiveDateTime>,
        end_date: Option<NaiveDateTime>,
    ) -> Result<Vec<Record>> {
        let conn = self.connect()?;

        let mut query = String::from(
            "SELECT id, amount, category, description, type, date FROM records",
        );
        let mut conditions: Vec<&str> = Vec::new();
        let mut bind_params: Vec<String> = Vec::new();

        if let Some(start) = start_date {
            conditions.push("date >= ?");
            bind_params.push(start.format(TS_FORMAT_MICROS).to_string());
        }
        if let Some(end) = end_date {
            conditions.push("date <= ?");
            bind_params.push(end.format(TS_FORMAT_MICROS).to_string());
        }

        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        query.push_str(" ORDER BY date DESC");

        let mut stmt = conn.prepare(&query)?;
        let records = stmt
            .query_map(params_from_iter(bind_params.iter()), map_record_row)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read record rows")?;

        Ok(records)
    }

    /// Overwrite all mutable fields of an existing record. Returns false if
    /// the record has no id or no row matched.
    pub fn update_record(&self, record: &Record) -> Result<bool> {
        let record_id = match record.id {
            Some(id) => id,
            None => return Ok(false),
        };

        let conn = self.connect()?;

        let changed = conn
            .execute(
                "UPDATE records SET amount = ?1, category = ?2, description = ?3,
                 type = ?4, date = ?5 WHERE id = ?6",
                params![
                    record.amount,
                    record.category,
                    record.description,
                    record.record_type.as_db_str(),
                    record.date.format(TS_FORMAT_MICROS).to_string(),
                    record_id,
                ],
            )
            .context("Failed to update record")?;

        Ok(changed > 0)
    }

    /// Delete one record by id; false when no row matched.
    pub fn delete_record(&self, record_id: i64) -> Result<bool> {
        let conn = self.connect()?;

        let deleted = conn
            .execute("DELETE FROM records WHERE id = ?1", params![record_id])
            .context("Failed to delete record")?;

        Ok(deleted > 0)
    }

    // ========================================================================
    // SEARCH
    // ========================================================================

    /// Search records with the given filters, most recent first. All set
    /// filters apply conjunctively; an empty result is valid.
    pub fn search_records(&self, filter: &SearchFilter) -> Result<Vec<Record>> {
        let conn = self.connect()?;

        let mut query = String::from(
            "SELECT id, amount, category, description, type, date
             FROM records WHERE 1=1",
        );
        let mut bind_params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(keyword) = &filter.keyword {
            query.push_str(" AND (description LIKE ? OR category LIKE ?)");
            let pattern = format!("%{}%", keyword);
            bind_params.push(Box::new(pattern.clone()));
            bind_params.push(Box::new(pattern));
        }

        if let Some(category) = &filter.category {
            query.push_str(" AND category = ?");
            bind_params.push(Box::new(category.clone()));
        }

        if let Some(start) = filter.start_date {
            query.push_str(" AND date >= ?");
            bind_params.push(Box::new(start.format(TS_FORMAT_MICROS).to_string()));
        }

        if let Some(end) = filter.end_date {
            query.push_str(" AND date <= ?");
            bind_params.push(Box::new(end.format(TS_FORMAT_MICROS).to_string()));
        }

        if let Some(min_amount) = filter.min_amount {
            query.push_str(" AND amount >= ?");
            bind_params.push(Box::new(min_amount));
        }

        if let Some(max_amount) = filter.max_amount {
            query.push_str(" AND amount <= ?");
            bind_params.push(Box::new(max_amount));
        }

        if let Some(record_type) = filter.record_type {
            query.push_str(" AND type = ?");
            bind_params.push(Box::new(record_type.as_db_str()));
        }

        query.push_str(" ORDER BY date DESC");

        let mut stmt = conn.prepare(&query)?;
        let records = stmt
            .query_map(
                params_from_iter(bind_params.iter().map(|p| p.as_ref())),
                map_record_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read search rows")?;

        Ok(records)
    }

    // ========================================================================
    // CATEGORIES
    // ========================================================================

    /// Category names, optionally restricted to one record type.
    pub fn get_categories(&self, record_type: Option<RecordType>) -> Result<Vec<String>> {
        let conn = self.connect()?;

        let names = match record_type {
            Some(rt) => {
                let mut stmt =
                    conn.prepare("SELECT name FROM categories WHERE type = ?1")?;
                let names = stmt
                    .query_map(params![rt.as_db_str()], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<String>, _>>()?;
                names
            }
            None => {
                let mut stmt = conn.prepare("SELECT name FROM categories")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<String>, _>>()?;
                names
            }
        };

        Ok(names)
    }

    // ========================================================================
    // EXPORT
    // ========================================================================

    /// Export records as CSV: one header row, then one row per record with
    /// (id, date without sub-seconds, type label, category, amount,
    /// description). Exports all records when `records` is None. The file is
    /// UTF-8 with a BOM so spreadsheet tools pick up multi-byte text.
    /// Returns the number of data rows written.
    pub fn export_csv<P: AsRef<Path>>(
        &self,
        file_path: P,
        records: Option<&[Record]>,
    ) -> Result<usize> {
        let all_records;
        let records = match records {
            Some(records) => records,
            None => {
                all_records = self.get_all_records(None, None)?;
                &all_records
            }
        };

        let mut file = fs::File::create(file_path.as_ref()).with_context(|| {
            format!("Failed to create export file: {}", file_path.as_ref().display())
        })?;
        file.write_all("\u{feff}".as_bytes())
            .context("Failed to write UTF-8 BOM")?;

        let mut writer = csv::Writer::from_writer(file);
        writer
            .write_record(EXPORT_HEADER)
            .context("Failed to write CSV header")?;

        for record in records {
            writer
                .write_record([
                    record.id.map(|id| id.to_string()).unwrap_or_default(),
                    record.date.format(TS_FORMAT_SECONDS).to_string(),
                    record.record_type.label().to_string(),
                    record.category.clone(),
                    record.amount.to_string(),
                    record.description.clone(),
                ])
                .context("Failed to write CSV row")?;
        }

        writer.flush().context("Failed to flush CSV export")?;
        Ok(records.len())
    }
}

// ============================================================================
// ROW MAPPING & TIMESTAMP PARSING
// ============================================================================

fn map_record_row(row: &Row<'_>) -> rusqlite::Result<Record> {
    let id: i64 = row.get(0)?;
    let type_token: String = row.get(4)?;
    // Wrong column type counts as unparseable, same as a malformed string
    let raw_date: Option<String> = row.get(5).unwrap_or(None);

    Ok(Record {
        id: Some(id),
        amount: row.get(1)?,
        category: row.get(2)?,
        description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        record_type: RecordType::from_db_str(&type_token)
            .unwrap_or(RecordType::Expense),
        date: parse_db_timestamp(raw_date.as_deref(), id),
    })
}

/// Parse a persisted timestamp, tolerating both the canonical sub-second
/// format and the plain whole-second format. Any failure falls back to the
/// current time with a diagnostic; queries must never fail because one row's
/// date is unreadable.
pub fn parse_db_timestamp(raw: Option<&str>, record_id: i64) -> NaiveDateTime {
    let raw = match raw {
        Some(s) if !s.is_empty() => s,
        _ => {
            eprintln!(
                "Warning: record {} has an empty date, using current time",
                record_id
            );
            return Local::now().naive_local();
        }
    };

    let format = if raw.contains('.') {
        TS_FORMAT_MICROS
    } else {
        TS_FORMAT_SECONDS
    };

    match NaiveDateTime::parse_from_str(raw, format) {
        Ok(dt) => dt,
        Err(e) => {
            eprintln!(
                "Warning: record {} has unparseable date {:?} ({}), using current time",
                record_id, raw, e
            );
            Local::now().naive_local()
        }
    }
}
