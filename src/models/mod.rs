pub mod event;

pub use event::{Event, EventStatus, EventSuggestion, NewEvent};
