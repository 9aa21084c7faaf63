use std::{collections::HashSet, net::SocketAddr};

use log::debug;

use cellrep_shared::{ChannelRegistry, EntityId};

use crate::{
    cell::cell_config::GhostConfig, death::death_scheduler::DeathScheduler,
    entity::real_entity::RealEntity, space::SpaceQuery,
};

/// A real that should move to another cell this tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OffloadCandidate {
    pub entity: EntityId,
    pub destination: SocketAddr,
}

/// Decides which reals leave the cell
pub struct OffloadChecker;

impl OffloadChecker {
    /// The cell `real` should move to, if any.
    ///
    /// A real only moves once it is `offload_hysteresis` beyond its own
    /// cell's region, unless that cell is being retired. The destination
    /// must not be retiring and its channel must be healthy.
    pub fn destination(
        real: &RealEntity,
        own_address: &SocketAddr,
        space: &dyn SpaceQuery,
        registry: &ChannelRegistry,
        config: &GhostConfig,
    ) -> Option<SocketAddr> {
        let position = real.position();
        let cell = space.cell_at(position)?;
        if cell.address == *own_address || cell.is_delete_pending {
            return None;
        }

        if let Some(own) = space.cell_info(own_address) {
            if !own.is_delete_pending
                && own.region.inflated(config.offload_hysteresis).contains(position)
            {
                return None;
            }
        }

        let healthy = match registry.find(&cell.address) {
            Some(handle) => registry.is_healthy(&handle),
            None => !registry.is_recently_dead(&cell.address),
        };
        if !healthy {
            debug!(
                "OffloadChecker: {} stays, channel to {} is not healthy",
                real.id(),
                cell.address
            );
            return None;
        }

        Some(cell.address)
    }

    /// Collects this tick's offloads. Nothing moves while the cell recovers
    /// from a remote death, and reals in `awaiting_ack` stay put.
    pub fn collect<'r>(
        reals: impl IntoIterator<Item = &'r RealEntity>,
        awaiting_ack: &HashSet<EntityId>,
        own_address: &SocketAddr,
        space: &dyn SpaceQuery,
        registry: &ChannelRegistry,
        death_scheduler: &DeathScheduler,
        config: &GhostConfig,
    ) -> Vec<OffloadCandidate> {
        if death_scheduler.is_recovering() {
            return Vec::new();
        }
        let mut candidates: Vec<OffloadCandidate> = reals
            .into_iter()
            .filter(|real| !awaiting_ack.contains(&real.id()))
            .filter_map(|real| {
                Self::destination(real, own_address, space, registry, config).map(|destination| {
                    OffloadCandidate {
                        entity: real.id(),
                        destination,
                    }
                })
            })
            .collect();
        candidates.sort_by_key(|candidate| candidate.entity);
        candidates
    }
}
