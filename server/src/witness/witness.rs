use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use cellrep_shared::{EntityId, EventHistory, EventNumber, IdAlias, Position, NO_ID_ALIAS};

use crate::cell::cell_config::WitnessConfig;

use super::{
    aoi_update_scheme::AoiUpdateScheme,
    entity_cache::{CacheFlags, CacheUpdate, EntityCache},
    witness_message::WitnessMessage,
};

/// A view of one entity a witness may observe
pub struct ObservedEntity<'a> {
    pub position: Position,
    pub state: &'a [u8],
    pub history: &'a EventHistory,
}

/// Access to the entities on the witness's cell
pub trait EntityLookup {
    fn observed(&self, entity: &EntityId) -> Option<ObservedEntity<'_>>;

    /// Every entity within `radius` of `center`
    fn entities_within(&self, center: &Position, radius: f32) -> Vec<EntityId>;
}

/// Streams the entities around one real entity to that entity's observer.
///
/// Each tick the witness diffs its AoI, then walks its entries in priority
/// order. An entry's priority is the virtual time it is next due at, so the
/// front of the queue is the current time. The walk stops once an entry is
/// more than `max_priority_delta` past the front, or the tick's bandwidth is
/// spent.
pub struct Witness {
    entity: EntityId,
    aoi_radius: f32,
    entries: HashMap<EntityId, EntityCache>,
    free_aliases: Vec<IdAlias>,
    outgoing: Vec<WitnessMessage>,
    bandwidth_deficit: usize,
}

impl Witness {
    pub fn new(entity: EntityId, aoi_radius: f32) -> Self {
        Self {
            entity,
            aoi_radius,
            entries: HashMap::new(),
            // popped from the back, so low aliases go first
            free_aliases: (0..NO_ID_ALIAS).rev().collect(),
            outgoing: Vec::new(),
            bandwidth_deficit: 0,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn aoi_radius(&self) -> f32 {
        self.aoi_radius
    }

    pub fn set_aoi_radius(&mut self, aoi_radius: f32) {
        self.aoi_radius = aoi_radius;
    }

    pub fn entry(&self, entity: &EntityId) -> Option<&EntityCache> {
        self.entries.get(entity)
    }

    pub fn entries(&self) -> impl Iterator<Item = &EntityCache> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bandwidth_deficit(&self) -> usize {
        self.bandwidth_deficit
    }

    /// Messages produced since the last [`Witness::take_messages`]
    pub fn pending_messages(&self) -> &[WitnessMessage] {
        &self.outgoing
    }

    pub fn take_messages(&mut self) -> Vec<WitnessMessage> {
        std::mem::take(&mut self.outgoing)
    }

    /// Keeps `entity` in the AoI regardless of distance
    pub fn add_to_aoi(&mut self, entity: EntityId) {
        if entity == self.entity {
            return;
        }
        let priority = self.front_priority();
        let entry = self
            .entries
            .entry(entity)
            .or_insert_with(|| EntityCache::new(entity, priority));
        entry.flags_mut().insert(CacheFlags::MANUALLY_ADDED);
    }

    /// Undoes [`Witness::add_to_aoi`]. The entity leaves unless it is still in
    /// range. Removing an entity that was never added is logged and ignored.
    pub fn remove_from_aoi(&mut self, entity: &EntityId) -> bool {
        let Some(entry) = self.entries.get_mut(entity) else {
            warn!(
                "Witness::remove_from_aoi: {} is not in the AoI of {}",
                entity, self.entity
            );
            return false;
        };
        if !entry.flags().contains(CacheFlags::MANUALLY_ADDED) {
            warn!(
                "Witness::remove_from_aoi: {} was not manually added to {}",
                entity, self.entity
            );
            return false;
        }
        entry.flags_mut().remove(CacheFlags::MANUALLY_ADDED);
        if !entry.flags().contains(CacheFlags::ADDED_BY_TRIGGER) {
            entry.flags_mut().insert(CacheFlags::GONE);
        }
        true
    }

    /// Hides or reveals an entity that stays in the AoI
    pub fn set_withheld(&mut self, entity: &EntityId, withheld: bool) -> bool {
        let Some(entry) = self.entries.get_mut(entity) else {
            return false;
        };
        if withheld {
            entry.flags_mut().insert(CacheFlags::WITHHELD);
        } else {
            entry.flags_mut().remove(CacheFlags::WITHHELD);
        }
        true
    }

    /// The oldest event of `entity` this witness may still forward, if it
    /// holds a live entry for it
    pub fn oldest_needed(&self, entity: &EntityId) -> Option<EventNumber> {
        let entry = self.entries.get(entity)?;
        let flags = entry.flags();
        if flags.intersects(CacheFlags::GONE)
            || flags.intersects(CacheFlags::ENTER_PENDING)
            || flags.intersects(CacheFlags::CREATE_PENDING)
        {
            return None;
        }
        Some(entry.oldest_needed())
    }

    /// Everything the witness knows is told to the observer as leaving, and
    /// the entries are dropped
    pub fn clear(&mut self) {
        let mut entries: Vec<EntityCache> = self.entries.drain().map(|(_, entry)| entry).collect();
        entries.sort_by_key(EntityCache::entity);
        for entry in entries {
            if !entry.flags().contains(CacheFlags::ENTER_PENDING) {
                self.outgoing.push(WitnessMessage::LeaveAoi {
                    entity: entry.entity(),
                });
            }
            if let Some(alias) = entry.id_alias() {
                self.free_aliases.push(alias);
            }
        }
    }

    pub fn update(
        &mut self,
        observer: &Position,
        lookup: &dyn EntityLookup,
        config: &WitnessConfig,
        scheme: &dyn AoiUpdateScheme,
    ) {
        self.update_membership(observer, lookup);

        let mut order: Vec<(f64, EntityId)> = self
            .entries
            .values()
            .map(|entry| (entry.priority(), entry.entity()))
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let Some((front, _)) = order.first().copied() else {
            self.bandwidth_deficit = 0;
            return;
        };
        let max_priority = front + f64::from(config.max_priority_delta);
        let budget = config
            .bandwidth_per_tick
            .saturating_sub(self.bandwidth_deficit);

        let mut bytes = 0;
        for (priority, entity) in &order {
            if *priority >= max_priority || bytes >= budget {
                break;
            }
            bytes += self.process_entry(entity, observer, lookup, config, scheme);
        }

        self.bandwidth_deficit = bytes.saturating_sub(budget).min(config.bandwidth_per_tick);
        if self.bandwidth_deficit > 0 {
            debug!(
                "Witness {}: {} bytes over budget",
                self.entity, self.bandwidth_deficit
            );
        }
    }

    fn front_priority(&self) -> f64 {
        self.entries
            .values()
            .map(EntityCache::priority)
            .min_by(|a, b| a.total_cmp(b))
            .unwrap_or(0.0)
    }

    fn update_membership(&mut self, observer: &Position, lookup: &dyn EntityLookup) {
        let in_range: HashSet<EntityId> = lookup
            .entities_within(observer, self.aoi_radius)
            .into_iter()
            .filter(|entity| *entity != self.entity)
            .collect();

        for entry in self.entries.values_mut() {
            let entity = entry.entity();
            let Some(observed) = lookup.observed(&entity) else {
                // destroyed or moved off this cell
                entry.flags_mut().remove(CacheFlags::MANUALLY_ADDED);
                entry.flags_mut().insert(CacheFlags::GONE);
                continue;
            };
            if in_range.contains(&entity) {
                entry.flags_mut().insert(CacheFlags::ADDED_BY_TRIGGER);
                if entry.is_gone() {
                    entry.reuse(observed.history);
                }
            } else if entry.flags().contains(CacheFlags::ADDED_BY_TRIGGER) {
                entry.flags_mut().remove(CacheFlags::ADDED_BY_TRIGGER);
                if !entry.flags().contains(CacheFlags::MANUALLY_ADDED) {
                    entry.flags_mut().insert(CacheFlags::GONE);
                }
            } else if entry.is_gone() && entry.flags().contains(CacheFlags::MANUALLY_ADDED) {
                entry.reuse(observed.history);
            }
        }

        let priority = self.front_priority();
        let mut entering: Vec<EntityId> = in_range
            .into_iter()
            .filter(|entity| !self.entries.contains_key(entity))
            .collect();
        entering.sort();
        for entity in entering {
            let mut entry = EntityCache::new(entity, priority);
            entry.flags_mut().insert(CacheFlags::ADDED_BY_TRIGGER);
            self.entries.insert(entity, entry);
        }
    }

    /// Handles one popped entry and returns the bytes it produced
    fn process_entry(
        &mut self,
        entity: &EntityId,
        observer: &Position,
        lookup: &dyn EntityLookup,
        config: &WitnessConfig,
        scheme: &dyn AoiUpdateScheme,
    ) -> usize {
        let Some(entry) = self.entries.get(entity) else {
            return 0;
        };
        let first = self.outgoing.len();

        if entry.is_updatable() {
            self.send_update(entity, observer, lookup, config, scheme);
        } else {
            self.handle_state_change(entity, observer, lookup, config, scheme);
        }

        self.outgoing[first..].iter().map(WitnessMessage::size).sum()
    }

    fn handle_state_change(
        &mut self,
        entity: &EntityId,
        observer: &Position,
        lookup: &dyn EntityLookup,
        config: &WitnessConfig,
        scheme: &dyn AoiUpdateScheme,
    ) {
        let Some(entry) = self.entries.get_mut(entity) else {
            return;
        };

        if entry.is_gone() {
            let Some(entry) = self.entries.remove(entity) else {
                return;
            };
            if !entry.flags().contains(CacheFlags::ENTER_PENDING) {
                self.outgoing
                    .push(WitnessMessage::LeaveAoi { entity: *entity });
            }
            if let Some(alias) = entry.id_alias() {
                self.free_aliases.push(alias);
            }
            return;
        }

        let observed = lookup.observed(entity);
        let distance = observed
            .as_ref()
            .map(|observed| observer.distance(&observed.position))
            .unwrap_or(f32::MAX);

        if entry.flags().contains(CacheFlags::WITHHELD) {
            if !entry.flags().contains(CacheFlags::ENTER_PENDING) {
                self.outgoing
                    .push(WitnessMessage::LeaveAoi { entity: *entity });
                if let Some(alias) = entry.id_alias() {
                    self.free_aliases.push(alias);
                    entry.set_id_alias(NO_ID_ALIAS);
                }
                entry.flags_mut().remove(CacheFlags::CREATE_PENDING);
                entry.flags_mut().insert(CacheFlags::ENTER_PENDING);
            }
            entry.update_priority(distance, scheme, config.priority_throttle_factor);
            return;
        }

        if entry.flags().contains(CacheFlags::REFRESH) {
            entry.flags_mut().remove(CacheFlags::REFRESH);
            // the observer's view can't be caught up, start it over
            if !entry.flags().contains(CacheFlags::ENTER_PENDING) {
                self.outgoing
                    .push(WitnessMessage::LeaveAoi { entity: *entity });
                if let Some(alias) = entry.id_alias() {
                    self.free_aliases.push(alias);
                    entry.set_id_alias(NO_ID_ALIAS);
                }
                entry.flags_mut().remove(CacheFlags::CREATE_PENDING);
                entry.flags_mut().insert(CacheFlags::ENTER_PENDING);
            }
        }

        if entry.flags().contains(CacheFlags::ENTER_PENDING) {
            entry.flags_mut().remove(CacheFlags::ENTER_PENDING);
            entry.flags_mut().insert(CacheFlags::CREATE_PENDING);
            let alias = self.free_aliases.pop().unwrap_or(NO_ID_ALIAS);
            entry.set_id_alias(alias);
            self.outgoing.push(WitnessMessage::EnterAoi {
                entity: *entity,
                id_alias: entry.id_alias(),
            });
        }

        if entry.flags().contains(CacheFlags::CREATE_PENDING) {
            let Some(observed) = observed else {
                entry.flags_mut().insert(CacheFlags::GONE);
                return;
            };
            let lod_priority = scheme.lod_priority(distance);
            let detail_level = config.detail_levels.level_for(lod_priority);
            entry.on_created(observed.history, detail_level, &config.detail_levels);
            self.outgoing.push(WitnessMessage::Create {
                entity: *entity,
                position: observed.position,
                detail_level,
                last_event_number: observed.history.last_event_number(),
                state: observed.state.to_vec(),
            });
            entry.update_priority(distance, scheme, config.priority_throttle_factor);
        }
    }

    fn send_update(
        &mut self,
        entity: &EntityId,
        observer: &Position,
        lookup: &dyn EntityLookup,
        config: &WitnessConfig,
        scheme: &dyn AoiUpdateScheme,
    ) {
        let Some(entry) = self.entries.get_mut(entity) else {
            return;
        };
        let Some(observed) = lookup.observed(entity) else {
            entry.flags_mut().insert(CacheFlags::GONE);
            return;
        };

        let distance = observer.distance(&observed.position);
        let lod_priority = scheme.lod_priority(distance);

        let events = match entry.collect_events(observed.history, lod_priority) {
            CacheUpdate::Events(events) => events,
            CacheUpdate::Refresh => {
                debug!(
                    "Witness {}: history of {} trimmed past {}, refreshing",
                    self.entity,
                    entity,
                    entry.last_event_number()
                );
                return;
            }
        };

        self.outgoing.push(WitnessMessage::Position {
            entity: *entity,
            position: observed.position,
        });
        for event in events {
            self.outgoing.push(WitnessMessage::Event {
                entity: *entity,
                event,
            });
        }

        let previous_level = entry.detail_level();
        let resent =
            entry.update_detail_level(lod_priority, &config.detail_levels, observed.history);
        if entry.detail_level() != previous_level {
            self.outgoing.push(WitnessMessage::DetailLevel {
                entity: *entity,
                detail_level: entry.detail_level(),
            });
        }
        for event in resent {
            self.outgoing.push(WitnessMessage::Event {
                entity: *entity,
                event,
            });
        }

        entry.update_priority(distance, scheme, config.priority_throttle_factor);
    }
}
