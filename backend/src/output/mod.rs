//! Result tables and reports.

pub mod checksum;
pub mod table;

pub use checksum::calculate_checksum;
pub use table::{to_rows, write_csv, write_json, CombinedRow, StackReport};
