pub mod error;
pub mod event_history;
pub mod history_event;
