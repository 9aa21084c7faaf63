use std::fmt;

use cellrep_shared::{
    DetailLevel, EntityId, EventHistory, EventLevel, EventNumber, HistoryEvent, IdAlias,
    NO_ID_ALIAS,
};

use super::{aoi_update_scheme::AoiUpdateScheme, detail_levels::DetailLevels};

/// State flags of an [`EntityCache`]. Several may be set at once.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheFlags(u8);

impl CacheFlags {
    /// The observer has not been told the entity entered its AoI
    pub const ENTER_PENDING: CacheFlags = CacheFlags(1 << 0);
    /// Entered, but the full state has not been sent yet
    pub const CREATE_PENDING: CacheFlags = CacheFlags(1 << 1);
    /// Left the AoI; the entry is torn down on the next update
    pub const GONE: CacheFlags = CacheFlags(1 << 2);
    /// Hidden from the observer while it stays in range
    pub const WITHHELD: CacheFlags = CacheFlags(1 << 3);
    /// History was lost under the entry; leave and re-enter
    pub const REFRESH: CacheFlags = CacheFlags(1 << 4);
    pub const MANUALLY_ADDED: CacheFlags = CacheFlags(1 << 5);
    pub const ADDED_BY_TRIGGER: CacheFlags = CacheFlags(1 << 6);

    const NOT_UPDATABLE: CacheFlags = CacheFlags(
        Self::ENTER_PENDING.0
            | Self::CREATE_PENDING.0
            | Self::GONE.0
            | Self::WITHHELD.0
            | Self::REFRESH.0,
    );

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn contains(&self, other: CacheFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(&self, other: CacheFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: CacheFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: CacheFlags) {
        self.0 &= !other.0;
    }

    /// True when none of the pending/gone/withheld/refresh states is set
    pub fn is_updatable(&self) -> bool {
        !self.intersects(Self::NOT_UPDATABLE)
    }
}

impl fmt::Debug for CacheFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(CacheFlags, &str); 7] = [
            (CacheFlags::ENTER_PENDING, "ENTER_PENDING"),
            (CacheFlags::CREATE_PENDING, "CREATE_PENDING"),
            (CacheFlags::GONE, "GONE"),
            (CacheFlags::WITHHELD, "WITHHELD"),
            (CacheFlags::REFRESH, "REFRESH"),
            (CacheFlags::MANUALLY_ADDED, "MANUALLY_ADDED"),
            (CacheFlags::ADDED_BY_TRIGGER, "ADDED_BY_TRIGGER"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "CacheFlags({})", names.join(" | "))
    }
}

/// What [`EntityCache::collect_events`] found
#[derive(Debug, PartialEq)]
pub enum CacheUpdate {
    /// Events to forward, oldest first
    Events(Vec<HistoryEvent>),
    /// The history was trimmed past this entry; it has been flagged
    /// [`CacheFlags::REFRESH`]
    Refresh,
}

/// What one observer knows about one entity in its AoI
#[derive(Debug)]
pub struct EntityCache {
    entity: EntityId,
    flags: CacheFlags,
    id_alias: IdAlias,
    priority: f64,
    last_priority_delta: f32,
    last_event_number: EventNumber,
    detail_level: DetailLevel,
    // last event number forwarded while each level was active
    lod_event_numbers: Vec<EventNumber>,
}

impl EntityCache {
    /// A new entry waiting to be announced to the observer
    pub fn new(entity: EntityId, priority: f64) -> Self {
        let mut flags = CacheFlags::empty();
        flags.insert(CacheFlags::ENTER_PENDING);
        Self {
            entity,
            flags,
            id_alias: NO_ID_ALIAS,
            priority,
            last_priority_delta: 0.0,
            last_event_number: 0,
            detail_level: 0,
            lod_event_numbers: Vec::new(),
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn flags(&self) -> CacheFlags {
        self.flags
    }

    pub fn flags_mut(&mut self) -> &mut CacheFlags {
        &mut self.flags
    }

    pub fn is_updatable(&self) -> bool {
        self.flags.is_updatable()
    }

    pub fn is_gone(&self) -> bool {
        self.flags.contains(CacheFlags::GONE)
    }

    pub fn id_alias(&self) -> Option<IdAlias> {
        if self.id_alias == NO_ID_ALIAS {
            None
        } else {
            Some(self.id_alias)
        }
    }

    pub fn set_id_alias(&mut self, id_alias: IdAlias) {
        self.id_alias = id_alias;
    }

    pub fn priority(&self) -> f64 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: f64) {
        self.priority = priority;
    }

    pub fn last_priority_delta(&self) -> f32 {
        self.last_priority_delta
    }

    pub fn last_event_number(&self) -> EventNumber {
        self.last_event_number
    }

    pub fn detail_level(&self) -> DetailLevel {
        self.detail_level
    }

    pub fn lod_event_number(&self, level: DetailLevel) -> Option<EventNumber> {
        self.lod_event_numbers.get(usize::from(level)).copied()
    }

    /// Advances the priority by the scheme's delta for `distance`. The delta
    /// may grow to at most `throttle_factor` times the previous one.
    pub fn update_priority(
        &mut self,
        distance: f32,
        scheme: &dyn AoiUpdateScheme,
        throttle_factor: f32,
    ) {
        let mut delta = scheme.priority_delta(distance);
        if self.last_priority_delta > 0.0 {
            delta = delta.min(self.last_priority_delta * throttle_factor);
        }
        self.priority += f64::from(delta);
        self.last_priority_delta = delta;
    }

    /// Resets the entry to the state of a freshly sent create: the observer
    /// holds everything up to the history's last event at every level.
    pub fn on_created(&mut self, history: &EventHistory, detail_level: DetailLevel, levels: &DetailLevels) {
        self.flags.remove(CacheFlags::CREATE_PENDING);
        self.last_event_number = history.last_event_number();
        self.detail_level = detail_level;
        self.lod_event_numbers = vec![history.last_event_number(); levels.count()];
        self.last_priority_delta = 0.0;
    }

    /// Events after the last forwarded one that are relevant at the current
    /// detail level
    pub fn collect_events(&mut self, history: &EventHistory, lod_priority: f32) -> CacheUpdate {
        if history.needs_resync(self.last_event_number) {
            self.flags.insert(CacheFlags::REFRESH);
            return CacheUpdate::Refresh;
        }
        let events = history
            .events_after(self.last_event_number)
            .filter(|event| event.should_send(lod_priority, self.detail_level))
            .cloned()
            .collect();
        self.last_event_number = history.last_event_number();
        CacheUpdate::Events(events)
    }

    /// Moves at most one level towards the level for `lod_priority`.
    ///
    /// Refining returns the events tagged for the level entered that were
    /// left out while the entry was coarser. Coarsening stamps the level
    /// being left with the history's last event number.
    pub fn update_detail_level(
        &mut self,
        lod_priority: f32,
        levels: &DetailLevels,
        history: &EventHistory,
    ) -> Vec<HistoryEvent> {
        if self.lod_event_numbers.len() != levels.count() {
            self.lod_event_numbers
                .resize(levels.count(), history.last_event_number());
        }

        let next = levels.step(self.detail_level, lod_priority);
        if next > self.detail_level {
            self.lod_event_numbers[usize::from(self.detail_level)] = history.last_event_number();
            self.detail_level = next;
            return Vec::new();
        }
        if next == self.detail_level {
            return Vec::new();
        }

        self.detail_level = next;
        let stamp = self.lod_event_numbers[usize::from(next)];
        let last = self.last_event_number;
        history
            .events_after(stamp)
            .take_while(|event| event.number() <= last)
            .filter(|event| event.level() == EventLevel::Detail(next))
            .cloned()
            .collect()
    }

    /// Brings a torn-down entry back into use when its entity re-enters
    /// before the entry was removed. Returns true if the entry needs a full
    /// refresh because the history was trimmed past what it saw. An entry
    /// the observer has not been sent a create for never needs one.
    pub fn reuse(&mut self, history: &EventHistory) -> bool {
        self.flags.remove(CacheFlags::GONE);
        if self.flags.contains(CacheFlags::ENTER_PENDING)
            || self.flags.contains(CacheFlags::CREATE_PENDING)
        {
            return false;
        }
        if history.needs_resync(self.last_event_number) {
            self.flags.insert(CacheFlags::REFRESH);
            return true;
        }
        false
    }

    /// Oldest event number this entry may still have to forward; events
    /// after it must be kept
    pub fn oldest_needed(&self) -> EventNumber {
        self.lod_event_numbers
            .iter()
            .take(usize::from(self.detail_level))
            .fold(self.last_event_number, |oldest, stamp| oldest.min(*stamp))
    }
}
