use std::{
    collections::{BTreeMap, HashMap},
    ops::Bound,
};

use log::warn;

use crate::types::EventNumber;

use super::{
    error::HistoryError,
    history_event::{EventDescription, HistoryEvent},
};

/// Ordered log of the events of one real entity.
///
/// Latest-value-only events are compacted through a slot index: appending to
/// an occupied slot removes the previous event of that slot, so at most one
/// event per slot is ever held and it carries the newest number.
///
/// Readers remember the last number they forwarded. If that number is below
/// [`EventHistory::last_trimmed_event_number`] they have missed reliable data
/// and must resynchronise from scratch.
#[derive(Clone, Debug, Default)]
pub struct EventHistory {
    events: BTreeMap<EventNumber, HistoryEvent>,
    slots: HashMap<u16, EventNumber>,
    last_event_number: EventNumber,
    last_trimmed_event_number: EventNumber,
}

impl EventHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history joining a stream that already produced `last_event_number`
    /// events. Nothing before that point can be replayed from it.
    pub fn starting_at(last_event_number: EventNumber) -> Self {
        Self {
            events: BTreeMap::new(),
            slots: HashMap::new(),
            last_event_number,
            last_trimmed_event_number: last_event_number,
        }
    }

    /// Rebuilds a history handed over during an offload
    pub fn from_transfer(
        events: Vec<HistoryEvent>,
        last_event_number: EventNumber,
        last_trimmed_event_number: EventNumber,
    ) -> Result<Self, HistoryError> {
        let mut history = Self {
            events: BTreeMap::new(),
            slots: HashMap::new(),
            last_event_number,
            last_trimmed_event_number,
        };
        for event in events {
            let number = event.number();
            if history.events.contains_key(&number) {
                return Err(HistoryError::DuplicateEvent { number });
            }
            if let Some(slot) = event.compaction_slot() {
                if let Some(previous) = history.slots.insert(slot, number) {
                    // keep only the newest event of the slot
                    if previous > number {
                        history.slots.insert(slot, previous);
                        continue;
                    }
                    history.events.remove(&previous);
                }
            }
            history.last_event_number = history.last_event_number.max(number);
            history.events.insert(number, event);
        }
        Ok(history)
    }

    /// Records a new event and returns the number assigned to it
    pub fn append(&mut self, description: EventDescription, payload: Vec<u8>) -> EventNumber {
        self.last_event_number += 1;
        let event = HistoryEvent::new(self.last_event_number, description, payload);
        self.insert(event);
        self.last_event_number
    }

    /// Feeds an event numbered by the real entity into a mirrored history.
    ///
    /// The real numbers its events without gaps. A gap means events were lost
    /// on the way, so the missing numbers count as trimmed and readers that
    /// needed them resynchronise.
    pub fn insert_replicated(&mut self, event: HistoryEvent) -> Result<(), HistoryError> {
        let number = event.number();
        if number <= self.last_event_number {
            return Err(HistoryError::OutOfOrder {
                number,
                last_event_number: self.last_event_number,
            });
        }
        if number > self.last_event_number + 1 {
            warn!(
                "EventHistory::insert_replicated: events {}..{} missing",
                self.last_event_number + 1,
                number
            );
            self.last_trimmed_event_number = self.last_trimmed_event_number.max(number - 1);
        }
        self.last_event_number = number;
        self.insert(event);
        Ok(())
    }

    fn insert(&mut self, event: HistoryEvent) {
        let number = event.number();
        if let Some(slot) = event.compaction_slot() {
            if let Some(previous) = self.slots.insert(slot, number) {
                self.events.remove(&previous);
            }
        }
        self.events.insert(number, event);
    }

    /// Deletes every event numbered at or below `low_water_mark`
    pub fn trim(&mut self, low_water_mark: EventNumber) -> usize {
        if low_water_mark > self.last_event_number {
            warn!(
                "EventHistory::trim: mark {} is beyond last event {}, clamping",
                low_water_mark, self.last_event_number
            );
        }
        let low_water_mark = low_water_mark.min(self.last_event_number);

        let kept = self.events.split_off(&low_water_mark.saturating_add(1));
        let trimmed = std::mem::replace(&mut self.events, kept);

        for event in trimmed.values() {
            if let Some(slot) = event.compaction_slot() {
                if self.slots.get(&slot) == Some(&event.number()) {
                    self.slots.remove(&slot);
                }
            }
        }

        if let Some(number) = trimmed
            .values()
            .rev()
            .find(|event| event.is_reliable())
            .map(HistoryEvent::number)
        {
            self.last_trimmed_event_number = self.last_trimmed_event_number.max(number);
        }

        trimmed.len()
    }

    /// Events numbered strictly after `number`, oldest first
    pub fn events_after(&self, number: EventNumber) -> impl Iterator<Item = &HistoryEvent> {
        self.events
            .range((Bound::Excluded(number), Bound::Unbounded))
            .map(|(_, event)| event)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEvent> {
        self.events.values()
    }

    pub fn get(&self, number: EventNumber) -> Option<&HistoryEvent> {
        self.events.get(&number)
    }

    pub fn latest_in_slot(&self, slot: u16) -> Option<&HistoryEvent> {
        self.slots.get(&slot).and_then(|number| self.events.get(number))
    }

    /// True if a reader that last saw `last_seen` can no longer catch up
    /// incrementally
    pub fn needs_resync(&self, last_seen: EventNumber) -> bool {
        last_seen < self.last_trimmed_event_number
    }

    pub fn last_event_number(&self) -> EventNumber {
        self.last_event_number
    }

    pub fn last_trimmed_event_number(&self) -> EventNumber {
        self.last_trimmed_event_number
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.slots.clear();
    }

    /// Consumes the history for transfer, see [`EventHistory::from_transfer`]
    pub fn into_parts(self) -> (Vec<HistoryEvent>, EventNumber, EventNumber) {
        (
            self.events.into_values().collect(),
            self.last_event_number,
            self.last_trimmed_event_number,
        )
    }
}
