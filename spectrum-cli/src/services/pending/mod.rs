//! Pending identification queue
//!
//! Pending records live in three differently shaped places: the panel sheet,
//! the approach log and one sheet per monitoring station. This module reads
//! all three into a single `PendingRecord` shape.

pub mod models;
pub mod normalizer;
pub mod queue;

pub use models::{PendingRecord, RecordLocator, RecordSource, RecordStatus, parse_flag};
pub use normalizer::{normalize_approach, normalize_panel, normalize_station, parse_record_date, sort_records};
pub use queue::{get_pending_queue, load_approach_pending, load_panel_pending, load_station_pending};
