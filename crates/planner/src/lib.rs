//! Personal planner domain module (memos and calendar events).
//!
//! Every record here belongs to exactly one user. Validation is pure; who may
//! touch whose records is decided by the policy layer, not here.

pub mod calendar;
pub mod memo;

pub use calendar::{CalendarEvent, NewCalendarEvent};
pub use memo::{MEMO_MAX_CHARS, Memo};
