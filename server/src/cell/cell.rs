use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
};

use log::{debug, info, warn};

use cellrep_shared::{
    CellMessage, ChannelRegistry, EntityId, EventDescription, EventHistory, EventNumber,
    GameTime, MessageBundle, OffloadData, Position, Transport,
};

use crate::{
    cell::{
        cell_config::CellConfig,
        ghost_maintainer::GhostMaintainer,
        offload_checker::{OffloadCandidate, OffloadChecker},
    },
    death::{
        death_ack_task::{DeathAck, DeathAckTask},
        death_scheduler::DeathScheduler,
        deletion_budget::DeletionBudget,
    },
    entity::{
        buffered_ghost_messages::BufferedGhostMessages, ghost::Ghost, haunt::Haunt,
        real_entity::RealEntity,
    },
    error::CellError,
    events::CellEvent,
    space::SpaceQuery,
    witness::{
        aoi_update_scheme::{AoiUpdateScheme, DistanceScheme},
        witness::{EntityLookup, ObservedEntity, Witness},
        witness_message::WitnessMessage,
    },
};

/// One partition of a space. Owns the reals inside its region, ghosts of
/// nearby reals owned elsewhere, the witnesses of its reals and the channels
/// to the other cells.
///
/// Everything runs on the thread calling [`Cell::tick`] and [`Cell::receive`];
/// outgoing traffic is queued on channels and flushed at the end of a tick.
pub struct Cell {
    address: SocketAddr,
    config: CellConfig,
    now: GameTime,
    reals: HashMap<EntityId, RealEntity>,
    ghosts: HashMap<EntityId, Ghost>,
    buffered: BufferedGhostMessages,
    witnesses: HashMap<EntityId, Witness>,
    registry: ChannelRegistry,
    death_scheduler: DeathScheduler,
    deletion_budget: DeletionBudget,
    // offloads sent to each cell and not acked yet
    pending_acks: HashMap<SocketAddr, Vec<EntityId>>,
    space: Box<dyn SpaceQuery>,
    transport: Box<dyn Transport>,
    aoi_scheme: Box<dyn AoiUpdateScheme>,
    events: Vec<CellEvent>,
}

impl Cell {
    pub fn new(
        address: SocketAddr,
        config: CellConfig,
        space: Box<dyn SpaceQuery>,
        transport: Box<dyn Transport>,
    ) -> Self {
        let registry = ChannelRegistry::new(config.channel.clone());
        let deletion_budget = DeletionBudget::new(config.ghost.max_ghost_deletions_per_tick);
        Self {
            address,
            config,
            now: 0,
            reals: HashMap::new(),
            ghosts: HashMap::new(),
            buffered: BufferedGhostMessages::new(),
            witnesses: HashMap::new(),
            registry,
            death_scheduler: DeathScheduler::new(),
            deletion_budget,
            pending_acks: HashMap::new(),
            space,
            transport,
            aoi_scheme: Box::new(DistanceScheme::default()),
            events: Vec::new(),
        }
    }

    pub fn set_aoi_update_scheme(&mut self, scheme: Box<dyn AoiUpdateScheme>) {
        self.aoi_scheme = scheme;
    }

    /// Registers a callback run whenever the death of a remote cell is
    /// acknowledged
    pub fn set_death_callback<F: FnMut(&DeathAck) + 'static>(&mut self, callback: F) {
        self.death_scheduler.set_completion_callback(callback);
    }

    // Reals

    pub fn create_real(
        &mut self,
        entity: EntityId,
        position: Position,
        appeal_radius: f32,
        state: Vec<u8>,
    ) -> Result<(), CellError> {
        if self.reals.contains_key(&entity) || self.ghosts.contains_key(&entity) {
            return Err(CellError::EntityExists { entity });
        }
        let real = RealEntity::new(
            entity,
            position,
            appeal_radius,
            state,
            EventHistory::new(),
            self.now,
        );
        self.reals.insert(entity, real);
        Ok(())
    }

    /// Removes a real for good, deleting its ghosts everywhere
    pub fn destroy_real(&mut self, entity: &EntityId) -> Result<(), CellError> {
        let mut real = self
            .reals
            .remove(entity)
            .ok_or(CellError::NotReal { entity: *entity })?;
        for haunt in real.take_haunts() {
            self.send_on(&haunt, CellMessage::GhostDelete { entity: *entity });
            self.registry.release(haunt.channel(), self.now);
        }
        if let Some(mut witness) = self.witnesses.remove(entity) {
            witness.clear();
        }
        Ok(())
    }

    pub fn set_position(&mut self, entity: &EntityId, position: Position) -> Result<(), CellError> {
        self.real_mut(entity)?.set_position(position);
        Ok(())
    }

    pub fn set_state(&mut self, entity: &EntityId, state: Vec<u8>) -> Result<(), CellError> {
        self.real_mut(entity)?.set_state(state);
        Ok(())
    }

    /// Records an event in the real's history and forwards it to every ghost
    pub fn add_event(
        &mut self,
        entity: &EntityId,
        description: EventDescription,
        payload: Vec<u8>,
    ) -> Result<EventNumber, CellError> {
        let real = self
            .reals
            .get_mut(entity)
            .ok_or(CellError::NotReal { entity: *entity })?;
        let number = real.history_mut().append(description, payload);
        let Some(event) = real.history().get(number).cloned() else {
            return Ok(number);
        };
        for haunt in real.haunts() {
            let message = CellMessage::GhostHistoryEvent {
                entity: *entity,
                event: event.clone(),
            };
            if let Err(error) = self.registry.send(haunt.channel(), message, self.now) {
                debug!("Cell {}: {}", self.address, error);
            }
        }
        Ok(number)
    }

    // Witnesses

    /// Starts streaming the surroundings of a real. `aoi_radius` defaults to
    /// the configured radius.
    pub fn enable_witness(
        &mut self,
        entity: &EntityId,
        aoi_radius: Option<f32>,
    ) -> Result<(), CellError> {
        if !self.reals.contains_key(entity) {
            return Err(CellError::NotReal { entity: *entity });
        }
        let aoi_radius = aoi_radius.unwrap_or(self.config.witness.default_aoi_radius);
        self.witnesses
            .entry(*entity)
            .and_modify(|witness| witness.set_aoi_radius(aoi_radius))
            .or_insert_with(|| Witness::new(*entity, aoi_radius));
        Ok(())
    }

    /// Stops the witness. Its final leave messages are returned.
    pub fn disable_witness(&mut self, entity: &EntityId) -> Result<Vec<WitnessMessage>, CellError> {
        let mut witness = self
            .witnesses
            .remove(entity)
            .ok_or(CellError::NoWitness { entity: *entity })?;
        witness.clear();
        Ok(witness.take_messages())
    }

    pub fn witness(&self, entity: &EntityId) -> Option<&Witness> {
        self.witnesses.get(entity)
    }

    pub fn witness_mut(&mut self, entity: &EntityId) -> Option<&mut Witness> {
        self.witnesses.get_mut(entity)
    }

    pub fn take_witness_messages(&mut self, entity: &EntityId) -> Vec<WitnessMessage> {
        self.witnesses
            .get_mut(entity)
            .map(Witness::take_messages)
            .unwrap_or_default()
    }

    // Incoming

    /// Handles a bundle received from the cell at `from`.
    ///
    /// Every message is applied on its own; bad ones are logged and skipped
    /// and the first error is returned.
    pub fn receive(&mut self, from: &SocketAddr, payload: &[u8]) -> Result<(), CellError> {
        let messages = MessageBundle::read(payload).map_err(|source| {
            warn!("Cell {}: malformed bundle from {}: {}", self.address, from, source);
            CellError::Decode {
                from: *from,
                source,
            }
        })?;

        let mut first_error = None;
        for message in messages {
            if let Err(error) = self.handle_message(from, message) {
                warn!("Cell {}: {}", self.address, error);
                first_error.get_or_insert(error);
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    // A new owner's subsequence waits until the old owner signs off
    fn should_buffer(&self, from: &SocketAddr, message: &CellMessage) -> bool {
        match message {
            CellMessage::EntityOffload(_) | CellMessage::AckOffload { .. } => false,
            _ if self.buffered.is_delaying(&message.entity(), from) => true,
            CellMessage::GhostSetReal { entity, real } => {
                *real == *from
                    && !self.reals.contains_key(entity)
                    && self
                        .ghosts
                        .get(entity)
                        .map_or(true, |ghost| !ghost.accepts_from(from))
            }
            _ => false,
        }
    }

    fn handle_message(&mut self, from: &SocketAddr, message: CellMessage) -> Result<(), CellError> {
        if self.should_buffer(from, &message) {
            debug!(
                "Cell {}: holding {} for {} from {}",
                self.address,
                message.name(),
                message.entity(),
                from
            );
            self.buffered.delay(*from, message);
            return Ok(());
        }

        let name = message.name();
        match message {
            CellMessage::GhostCreate {
                entity,
                position,
                appeal_radius,
                last_event_number,
                state,
            } => {
                if self.reals.contains_key(&entity) {
                    return Err(CellError::EntityExists { entity });
                }
                let ghost = Ghost::new(
                    entity,
                    position,
                    appeal_radius,
                    state,
                    EventHistory::starting_at(last_event_number),
                    *from,
                    self.now,
                );
                if self.ghosts.insert(entity, ghost).is_some() {
                    debug!("Cell {}: replaced ghost of {}", self.address, entity);
                }
                self.events.push(CellEvent::GhostCreated {
                    entity,
                    real: *from,
                });
            }
            CellMessage::GhostUpdate {
                entity,
                position,
                delta,
            } => {
                self.ghost_from(&entity, from, name)?
                    .apply_update(position, delta);
                self.events.push(CellEvent::GhostUpdated { entity });
            }
            CellMessage::GhostDelete { entity } => {
                self.ghost_from(&entity, from, name)?;
                self.ghosts.remove(&entity);
                self.buffered.drop_entity(&entity);
                self.events.push(CellEvent::GhostDestroyed { entity });
            }
            CellMessage::GhostHistoryEvent { entity, event } => {
                self.ghost_from(&entity, from, name)?
                    .history_mut()
                    .insert_replicated(event)?;
            }
            CellMessage::GhostSetReal { entity, real } => {
                if real != *from {
                    return Err(CellError::UnexpectedSender {
                        entity,
                        from: *from,
                        message: name,
                    });
                }
                self.ghosts
                    .get_mut(&entity)
                    .ok_or(CellError::NoGhost {
                        entity,
                        message: name,
                    })?
                    .set_real(real);
            }
            CellMessage::GhostSetNextReal { entity, next_real } => {
                self.ghost_from(&entity, from, name)?
                    .set_next_real(next_real);
                self.replay_buffered(&entity, &next_real)?;
            }
            CellMessage::EntityOffload(data) => {
                self.accept_offload(from, *data)?;
            }
            CellMessage::AckOffload { entity } => {
                self.registry.ack_critical(from)?;
                if let Some(pending) = self.pending_acks.get_mut(from) {
                    pending.retain(|pending_entity| *pending_entity != entity);
                    if pending.is_empty() {
                        self.pending_acks.remove(from);
                    }
                }
                debug!("Cell {}: offload of {} acked by {}", self.address, entity, from);
            }
        }
        Ok(())
    }

    fn replay_buffered(&mut self, entity: &EntityId, sender: &SocketAddr) -> Result<(), CellError> {
        let messages = self.buffered.take_subsequence(entity, sender);
        if messages.is_empty() {
            return Ok(());
        }
        debug!(
            "Cell {}: replaying {} held messages from {} for {}",
            self.address,
            messages.len(),
            sender,
            entity
        );
        let mut first_error = None;
        for message in messages {
            if let Err(error) = self.handle_message(sender, message) {
                warn!("Cell {}: {}", self.address, error);
                first_error.get_or_insert(error);
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn ghost_from(
        &mut self,
        entity: &EntityId,
        from: &SocketAddr,
        message: &'static str,
    ) -> Result<&mut Ghost, CellError> {
        let ghost = self.ghosts.get_mut(entity).ok_or(CellError::NoGhost {
            entity: *entity,
            message,
        })?;
        if !ghost.accepts_from(from) {
            return Err(CellError::UnexpectedSender {
                entity: *entity,
                from: *from,
                message,
            });
        }
        Ok(ghost)
    }

    fn accept_offload(&mut self, from: &SocketAddr, data: OffloadData) -> Result<(), CellError> {
        let entity = data.entity;
        if self.reals.contains_key(&entity) {
            panic!(
                "Cell {}: offload of {} from {} but it is already real here",
                self.address, entity, from
            );
        }

        self.buffered.drop_entity(&entity);

        // an up to date mirror keeps the trim state of local witnesses
        let history = match self.ghosts.remove(&entity).map(Ghost::into_history) {
            Some(mirror) if mirror.last_event_number() == data.last_event_number => mirror,
            _ => EventHistory::from_transfer(
                data.events,
                data.last_event_number,
                data.last_trimmed_event_number,
            )?,
        };

        let mut real = RealEntity::new(
            entity,
            data.position,
            data.appeal_radius,
            data.state,
            history,
            self.now,
        );
        for address in data.haunts {
            if address == self.address {
                continue;
            }
            let Some(handle) = self.registry.get(&address, true, self.now) else {
                debug!(
                    "Cell {}: not haunting recently dead {} with {}",
                    self.address, address, entity
                );
                continue;
            };
            self.registry.send(
                &handle,
                CellMessage::GhostSetReal {
                    entity,
                    real: self.address,
                },
                self.now,
            )?;
            self.registry.retain(&handle)?;
            real.add_haunt(Haunt::new(handle, address, self.now));
        }
        self.reals.insert(entity, real);

        if let Some(aoi_radius) = data.aoi_radius {
            self.witnesses
                .insert(entity, Witness::new(entity, aoi_radius));
        }

        match self.registry.get(from, true, self.now) {
            Some(handle) => {
                self.registry
                    .send(&handle, CellMessage::AckOffload { entity }, self.now)?;
            }
            None => warn!(
                "Cell {}: cannot ack offload of {} to recently dead {}",
                self.address, entity, from
            ),
        }

        info!("Cell {}: {} is now real here, from {}", self.address, entity, from);
        self.events.push(CellEvent::AuthorityGained {
            entity,
            from: *from,
        });
        Ok(())
    }

    // Failure

    /// The cell at `address` is gone for good. Haunts on it are dropped,
    /// ghosts whose real lived there are destroyed and offloads it never
    /// acked are reported lost.
    pub fn remote_failure(&mut self, address: &SocketAddr) {
        if *address == self.address {
            warn!("Cell {}: ignoring failure report about itself", self.address);
            return;
        }
        let had_channel = self.registry.remote_failure(address, self.now);
        info!(
            "Cell {}: remote cell {} failed (channel: {})",
            self.address, address, had_channel
        );

        for real in self.reals.values_mut() {
            real.remove_haunt(address);
        }

        let mut zombies: Vec<EntityId> = self
            .ghosts
            .values()
            .filter(|ghost| ghost.real() == *address)
            .map(Ghost::id)
            .collect();
        zombies.sort();
        for entity in zombies {
            self.ghosts.remove(&entity);
            self.buffered.drop_entity(&entity);
            self.events.push(CellEvent::GhostDestroyed { entity });
        }
        let dropped = self.buffered.drop_sender(address);
        if dropped > 0 {
            debug!(
                "Cell {}: dropped {} held messages from {}",
                self.address, dropped, address
            );
        }
        for ghost in self.ghosts.values_mut() {
            if ghost.next_real() == Some(*address) {
                ghost.clear_next_real();
            }
        }

        let lost = self.pending_acks.remove(address).unwrap_or_default();
        for entity in &lost {
            warn!("Cell {}: {} was lost with {}", self.address, entity, address);
            self.events.push(CellEvent::RealLost {
                entity: *entity,
                address: *address,
            });
        }

        let acknowledge_at = self
            .now
            .saturating_add(self.config.ghost.death_recovery_period);
        self.death_scheduler
            .schedule(DeathAckTask::new(*address, lost, acknowledge_at));
    }

    // Tick

    /// Advances the cell to `now`: reconciles ghosts, offloads reals that
    /// left the region, updates witnesses, trims histories and flushes every
    /// channel
    pub fn tick(&mut self, now: GameTime) {
        self.now = now;
        self.deletion_budget.reset();

        for address in self.registry.update(now) {
            debug!("Cell {}: dropped idle channel to {}", self.address, address);
        }
        for ack in self.death_scheduler.update(now) {
            self.events.push(CellEvent::DeathAcknowledged {
                address: ack.address,
                lost_entities: ack.lost_entities,
            });
        }

        let offloads = self.collect_offloads();
        let destinations: HashMap<EntityId, SocketAddr> = offloads
            .iter()
            .map(|candidate| (candidate.entity, candidate.destination))
            .collect();

        let mut entities: Vec<EntityId> = self.reals.keys().copied().collect();
        entities.sort();
        for entity in &entities {
            self.maintain_ghosts(entity, destinations.get(entity));
        }
        if self.deletion_budget.deferred() > 0 {
            debug!(
                "Cell {}: {} ghost deletions deferred",
                self.address,
                self.deletion_budget.deferred()
            );
        }
        for entity in &entities {
            self.flush_ghost_updates(entity);
        }

        for candidate in offloads {
            self.offload(candidate);
        }

        self.update_witnesses();

        let trim_period = self.config.history.trim_period;
        if trim_period > 0 && now % trim_period == 0 {
            self.trim_histories();
        }

        self.flush();
    }

    /// Sends everything queued on the channels. Addresses the transport
    /// refuses are treated as failed cells.
    pub fn flush(&mut self) {
        let failed = self.registry.send_all(self.transport.as_mut());
        for address in failed {
            self.remote_failure(&address);
        }
    }

    fn collect_offloads(&self) -> Vec<OffloadCandidate> {
        let awaiting: HashSet<EntityId> = self.pending_acks.values().flatten().copied().collect();
        OffloadChecker::collect(
            self.reals.values(),
            &awaiting,
            &self.address,
            self.space.as_ref(),
            &self.registry,
            &self.death_scheduler,
            &self.config.ghost,
        )
    }

    fn maintain_ghosts(&mut self, entity: &EntityId, offload_destination: Option<&SocketAddr>) {
        let Some(real) = self.reals.get(entity) else {
            return;
        };
        let plan = GhostMaintainer::plan(
            real,
            &self.address,
            offload_destination,
            self.space.as_ref(),
            &self.registry,
            &self.config.ghost,
        );
        for address in plan.to_create {
            self.create_haunt(entity, address);
        }
        for address in plan.to_delete {
            self.delete_haunt(entity, &address);
        }
    }

    fn create_haunt(&mut self, entity: &EntityId, address: SocketAddr) {
        let now = self.now;
        let Some(real) = self.reals.get_mut(entity) else {
            return;
        };
        let Some(handle) = self.registry.get(&address, true, now) else {
            return;
        };
        let message = CellMessage::GhostCreate {
            entity: *entity,
            position: *real.position(),
            appeal_radius: real.appeal_radius(),
            last_event_number: real.history().last_event_number(),
            state: real.state().to_vec(),
        };
        if let Err(error) = self
            .registry
            .send(&handle, message, now)
            .and_then(|()| self.registry.retain(&handle))
        {
            warn!("Cell {}: {}", self.address, error);
            return;
        }
        real.add_haunt(Haunt::new(handle, address, now));
        info!("Cell {}: ghosting {} on {}", self.address, entity, address);
    }

    fn delete_haunt(&mut self, entity: &EntityId, address: &SocketAddr) {
        let now = self.now;
        let Some(real) = self.reals.get_mut(entity) else {
            return;
        };
        let Some(haunt) = real.haunt(address).copied() else {
            return;
        };
        if !GhostMaintainer::may_delete(&haunt, real.age(now), now, &self.config.ghost) {
            return;
        }
        if !self.deletion_budget.try_consume() {
            return;
        }
        real.remove_haunt(address);
        self.send_on(&haunt, CellMessage::GhostDelete { entity: *entity });
        self.registry.release(haunt.channel(), now);
        info!("Cell {}: unghosting {} from {}", self.address, entity, address);
    }

    fn flush_ghost_updates(&mut self, entity: &EntityId) {
        let Some(real) = self.reals.get_mut(entity) else {
            return;
        };
        let Some(delta) = real.take_dirty() else {
            return;
        };
        let delta = delta.unwrap_or_default();
        for haunt in real.haunts() {
            let message = CellMessage::GhostUpdate {
                entity: *entity,
                position: *real.position(),
                delta: delta.clone(),
            };
            if let Err(error) = self.registry.send(haunt.channel(), message, self.now) {
                debug!("Cell {}: {}", self.address, error);
            }
        }
    }

    /// Hands a real to another cell and keeps a ghost of it here
    fn offload(&mut self, candidate: OffloadCandidate) {
        let OffloadCandidate {
            entity,
            destination,
        } = candidate;
        let Some(handle) = self.registry.get(&destination, true, self.now) else {
            return;
        };
        let Some(mut real) = self.reals.remove(&entity) else {
            return;
        };

        let mut haunts = Vec::new();
        for haunt in real.take_haunts() {
            if haunt.address() != destination {
                self.send_on(
                    &haunt,
                    CellMessage::GhostSetNextReal {
                        entity,
                        next_real: destination,
                    },
                );
                haunts.push(haunt.address());
            }
            self.registry.release(haunt.channel(), self.now);
        }
        // this cell keeps a ghost
        haunts.push(self.address);

        let aoi_radius = self
            .witnesses
            .remove(&entity)
            .map(|witness| witness.aoi_radius());

        let (position, appeal_radius, state, history) = real.into_parts();
        let (events, last_event_number, last_trimmed_event_number) = history.clone().into_parts();
        let data = OffloadData {
            entity,
            position,
            appeal_radius,
            state: state.clone(),
            haunts,
            events,
            last_event_number,
            last_trimmed_event_number,
            aoi_radius,
        };

        if let Err(error) = self
            .registry
            .send(&handle, CellMessage::EntityOffload(Box::new(data)), self.now)
            .and_then(|()| self.registry.add_critical(&handle))
        {
            warn!("Cell {}: {}", self.address, error);
        }

        self.ghosts.insert(
            entity,
            Ghost::new(
                entity,
                position,
                appeal_radius,
                state,
                history,
                destination,
                self.now,
            ),
        );
        self.pending_acks.entry(destination).or_default().push(entity);

        info!("Cell {}: offloading {} to {}", self.address, entity, destination);
        self.events.push(CellEvent::AuthorityLost {
            entity,
            to: destination,
        });
    }

    fn update_witnesses(&mut self) {
        let lookup = CellEntities {
            reals: &self.reals,
            ghosts: &self.ghosts,
        };
        let mut observers: Vec<EntityId> = self.witnesses.keys().copied().collect();
        observers.sort();

        for observer in observers {
            let (Some(witness), Some(real)) =
                (self.witnesses.get_mut(&observer), self.reals.get(&observer))
            else {
                continue;
            };
            let first = witness.pending_messages().len();
            witness.update(
                real.position(),
                &lookup,
                &self.config.witness,
                self.aoi_scheme.as_ref(),
            );
            for message in &witness.pending_messages()[first..] {
                match message {
                    WitnessMessage::Create {
                        entity,
                        detail_level,
                        ..
                    } => self.events.push(CellEvent::EnteredAoi {
                        witness: observer,
                        entity: *entity,
                        detail_level: *detail_level,
                    }),
                    WitnessMessage::LeaveAoi { entity } => self.events.push(CellEvent::LeftAoi {
                        witness: observer,
                        entity: *entity,
                    }),
                    _ => {}
                }
            }
        }
    }

    /// Trims every history up to what the local witnesses still need
    fn trim_histories(&mut self) {
        let witnesses = &self.witnesses;
        let low_water_mark = |entity: &EntityId, history: &EventHistory| {
            witnesses
                .values()
                .filter_map(|witness| witness.oldest_needed(entity))
                .min()
                .unwrap_or_else(|| history.last_event_number())
        };

        for (entity, real) in self.reals.iter_mut() {
            let mark = low_water_mark(entity, real.history());
            real.history_mut().trim(mark);
        }
        for (entity, ghost) in self.ghosts.iter_mut() {
            let mark = low_water_mark(entity, ghost.history());
            ghost.history_mut().trim(mark);
        }
    }

    fn send_on(&mut self, haunt: &Haunt, message: CellMessage) {
        if let Err(error) = self.registry.send(haunt.channel(), message, self.now) {
            debug!("Cell {}: {}", self.address, error);
        }
    }

    fn real_mut(&mut self, entity: &EntityId) -> Result<&mut RealEntity, CellError> {
        self.reals
            .get_mut(entity)
            .ok_or(CellError::NotReal { entity: *entity })
    }

    // Accessors

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn now(&self) -> GameTime {
        self.now
    }

    pub fn config(&self) -> &CellConfig {
        &self.config
    }

    pub fn is_real(&self, entity: &EntityId) -> bool {
        self.reals.contains_key(entity)
    }

    pub fn real(&self, entity: &EntityId) -> Option<&RealEntity> {
        self.reals.get(entity)
    }

    pub fn reals(&self) -> impl Iterator<Item = &RealEntity> {
        self.reals.values()
    }

    pub fn ghost(&self, entity: &EntityId) -> Option<&Ghost> {
        self.ghosts.get(entity)
    }

    pub fn ghosts(&self) -> impl Iterator<Item = &Ghost> {
        self.ghosts.values()
    }

    /// Ghost messages waiting for their handover to complete
    pub fn buffered_ghost_messages(&self) -> &BufferedGhostMessages {
        &self.buffered
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn is_recovering(&self) -> bool {
        self.death_scheduler.is_recovering()
    }

    /// Entities offloaded to `address` that it has not acked yet
    pub fn pending_offloads(&self, address: &SocketAddr) -> &[EntityId] {
        self.pending_acks
            .get(address)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn take_events(&mut self) -> Vec<CellEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Entity lookup over a cell's reals and ghosts, for its witnesses
struct CellEntities<'c> {
    reals: &'c HashMap<EntityId, RealEntity>,
    ghosts: &'c HashMap<EntityId, Ghost>,
}

impl EntityLookup for CellEntities<'_> {
    fn observed(&self, entity: &EntityId) -> Option<ObservedEntity<'_>> {
        if let Some(real) = self.reals.get(entity) {
            return Some(ObservedEntity {
                position: *real.position(),
                state: real.state(),
                history: real.history(),
            });
        }
        self.ghosts.get(entity).map(|ghost| ObservedEntity {
            position: *ghost.position(),
            state: ghost.state(),
            history: ghost.history(),
        })
    }

    fn entities_within(&self, center: &Position, radius: f32) -> Vec<EntityId> {
        let reals = self
            .reals
            .values()
            .filter(|real| real.position().distance(center) <= radius)
            .map(RealEntity::id);
        let ghosts = self
            .ghosts
            .values()
            .filter(|ghost| ghost.position().distance(center) <= radius)
            .map(Ghost::id);
        reals.chain(ghosts).collect()
    }
}
