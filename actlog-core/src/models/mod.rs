pub mod action;
pub mod action_result;
pub mod activity;

pub use action::ActionRecord;
pub use action_result::ActionResultRecord;
pub use activity::{parse_timestamp, ActivityLogEntry, ActivityLogItem, ActivityLogPage, EntryKind};
