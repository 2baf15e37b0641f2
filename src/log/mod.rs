//! Reading of per-session QoE event logs.

pub mod parse;
pub mod record;

pub use parse::{read_records, split_header};
pub use record::{LogRow, RawRecord};
