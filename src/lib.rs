// Account Book - Core Library
// SQLite-backed personal ledger: records, search, and statistics

pub mod record;
pub mod storage;
pub mod manager;
pub mod stats;

// Re-export commonly used types
pub use record::{Record, RecordType, Summary, TrendPoint};
pub use storage::{parse_db_timestamp, SearchFilter, Storage};
pub use manager::RecordManager;
pub use stats::{StatisticsEngine, TrendPeriod};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
