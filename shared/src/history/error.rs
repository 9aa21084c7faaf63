use thiserror::Error;

use crate::types::EventNumber;

/// Errors that can occur while feeding a mirrored history
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// A replicated event arrived with a number not above the newest one held
    #[error("Replicated event {number} is not newer than last event {last_event_number}. Ghost histories must be fed in order")]
    OutOfOrder {
        number: EventNumber,
        last_event_number: EventNumber,
    },

    /// A transferred history listed the same event number twice
    #[error("Transferred history contains event {number} more than once")]
    DuplicateEvent { number: EventNumber },
}
