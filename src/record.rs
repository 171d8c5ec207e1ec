// 📒 Record Entity - One income/expense ledger line
// Value objects only: storage owns persistence, stats owns aggregation

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ============================================================================
// RECORD TYPE
// ============================================================================

/// Closed two-value tag for a ledger entry.
///
/// Persisted as the literal tokens `"income"` / `"expense"`; the raw token
/// never leaves the storage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// Money coming in
    Income,

    /// Money going out
    Expense,
}

impl RecordType {
    /// Database token (matches the CHECK constraint on the records table)
    pub fn as_db_str(&self) -> &'static str {
        match self {
            RecordType::Income => "income",
            RecordType::Expense => "expense",
        }
    }

    /// Parse a database token back into the enum.
    pub fn from_db_str(s: &str) -> Option<RecordType> {
        match s {
            "income" => Some(RecordType::Income),
            "expense" => Some(RecordType::Expense),
            _ => None,
        }
    }

    /// Human-readable label (export, CLI output)
    pub fn label(&self) -> &'static str {
        match self {
            RecordType::Income => "Income",
            RecordType::Expense => "Expense",
        }
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// One ledger entry.
///
/// `id` is None until the storage engine assigns the row id on insert, and
/// immutable afterwards. Amounts are positive; input validation (positivity,
/// category membership) is the caller's job, not the engine's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Row id assigned by storage; None before persistence
    pub id: Option<i64>,

    /// Monetary value (cent-level display precision, f64 underneath)
    pub amount: f64,

    /// Category label (free text at write time)
    pub category: String,

    /// Free-text note, may be empty
    pub description: String,

    /// Income or expense
    pub record_type: RecordType,

    /// Entry timestamp, sub-second precision
    pub date: NaiveDateTime,
}

impl Record {
    /// Create an unsaved record dated now.
    pub fn new(
        amount: f64,
        category: String,
        description: String,
        record_type: RecordType,
    ) -> Self {
        Record {
            id: None,
            amount,
            category,
            description,
            record_type,
            date: Local::now().naive_local(),
        }
    }

    /// Create an unsaved record with an explicit date.
    pub fn with_date(
        amount: f64,
        category: String,
        description: String,
        record_type: RecordType,
        date: NaiveDateTime,
    ) -> Self {
        Record {
            id: None,
            amount,
            category,
            description,
            record_type,
            date,
        }
    }
}

// ============================================================================
// AGGREGATE SHAPES (produced by the statistics engine)
// ============================================================================

/// Income/expense totals over one time window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Summary {
    pub total_income: f64,
    pub total_expense: f64,
    /// Always `total_income - total_expense`
    pub balance: f64,
}

/// One period of a trend series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// Label: "MM-DD" (day), "MM-DD~MM-DD" (week), "YYYY-MM" (month)
    pub period: String,
    pub income: f64,
    pub expense: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_token_round_trip() {
        assert_eq!(RecordType::Income.as_db_str(), "income");
        assert_eq!(RecordType::Expense.as_db_str(), "expense");
        assert_eq!(RecordType::from_db_str("income"), Some(RecordType::Income));
        assert_eq!(RecordType::from_db_str("expense"), Some(RecordType::Expense));
        assert_eq!(RecordType::from_db_str("transfer"), None);
        assert_eq!(RecordType::from_db_str(""), None);
    }

    #[test]
    fn test_new_record_defaults_to_now() {
        let before = Local::now().naive_local();
        let record = Record::new(
            12.5,
            "dining".to_string(),
            "lunch".to_string(),
            RecordType::Expense,
        );
        let after = Local::now().naive_local();

        assert!(record.id.is_none());
        assert!(record.date >= before && record.date <= after);
    }

    #[test]
    fn test_with_date_keeps_explicit_date() {
        let date = NaiveDateTime::parse_from_str("2024-03-01 08:30:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let record = Record::with_date(
            100.0,
            "salary".to_string(),
            String::new(),
            RecordType::Income,
            date,
        );

        assert_eq!(record.date, date);
        assert_eq!(record.record_type, RecordType::Income);
    }
}
