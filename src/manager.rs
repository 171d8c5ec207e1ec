// 🧾 Record Manager - Typed facade over the storage engine
// Pass-through by design; the only rule it owns is read-before-write on update

use anyhow::Result;
use chrono::NaiveDateTime;

use crate::record::{Record, RecordType};
use crate::storage::{SearchFilter, Storage};

/// Thin orchestration layer the statistics engine (and any UI) talks to.
pub struct RecordManager {
    storage: Storage,
}

impl RecordManager {
    /// Wrap an already-opened storage engine.
    pub fn new(storage: Storage) -> Self {
        RecordManager { storage }
    }

    /// Open the default database and wrap it.
    pub fn open_default() -> Result<Self> {
        Ok(RecordManager::new(Storage::open_default()?))
    }

    /// Access the underlying storage (export, category listing by callers
    /// that hold only the manager).
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Add a new record and return its assigned id.
    pub fn add_record(
        &self,
        amount: f64,
        category: &str,
        description: &str,
        record_type: RecordType,
        date: NaiveDateTime,
    ) -> Result<i64> {
        let record = Record::with_date(
            amount,
            category.to_string(),
            description.to_string(),
            record_type,
            date,
        );
        self.storage.save_record(&record)
    }

    pub fn get_record(&self, record_id: i64) -> Result<Option<Record>> {
        self.storage.get_record(record_id)
    }

    pub fn get_all_records(
        &self,
        start_date: Option<NaiveDateTime>,
        end_date: Option<NaiveDateTime>,
    ) -> Result<Vec<Record>> {
        self.storage.get_all_records(start_date, end_date)
    }

    /// Update an existing record: fetch it, overwrite the mutable fields in
    /// memory, persist. Returns false without touching storage again when the
    /// id is unknown.
    pub fn update_record(
        &self,
        record_id: i64,
        amount: f64,
        category: &str,
        description: &str,
        record_type: RecordType,
        date: NaiveDateTime,
    ) -> Result<bool> {
        let mut record = match self.storage.get_record(record_id)? {
            Some(record) => record,
            None => return Ok(false),
        };

        record.amount = amount;
        record.category = category.to_string();
        record.description = description.to_string();
        record.record_type = record_type;
        record.date = date;

        self.storage.update_record(&record)
    }

    pub fn delete_record(&self, record_id: i64) -> Result<bool> {
        self.storage.delete_record(record_id)
    }

    pub fn search_records(&self, filter: &SearchFilter) -> Result<Vec<Record>> {
        self.storage.search_records(filter)
    }

    pub fn get_categories(&self, record_type: Option<RecordType>) -> Result<Vec<String>> {
        self.storage.get_categories(record_type)
    }
}
