use std::{collections::HashSet, net::SocketAddr};

use cellrep_shared::{ChannelRegistry, GameTime, Position, Rect};

use crate::{
    cell::cell_config::GhostConfig,
    entity::{haunt::Haunt, real_entity::RealEntity},
    space::SpaceQuery,
};

/// Haunt changes needed to bring a real in line with the cells that must
/// ghost it
#[derive(Debug, Default, PartialEq, Eq)]
pub struct GhostPlan {
    pub to_create: Vec<SocketAddr>,
    /// Candidates only: deletion is still subject to lifespans and the
    /// per-tick budget
    pub to_delete: Vec<SocketAddr>,
}

impl GhostPlan {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// Decides which cells hold ghosts of a real
pub struct GhostMaintainer;

impl GhostMaintainer {
    /// Rectangle around a real that a cell's region must intersect for the
    /// cell to ghost it
    pub fn interest_rect(position: &Position, appeal_radius: f32, config: &GhostConfig) -> Rect {
        Rect::from_point(position).inflated(config.interest_distance(appeal_radius))
    }

    /// Every cell that must hold a ghost of `real`: those intersecting its
    /// interest rectangle, minus the owning cell, cells pending deletion and
    /// cells that failed recently
    pub fn required_haunts(
        real: &RealEntity,
        own_address: &SocketAddr,
        space: &dyn SpaceQuery,
        registry: &ChannelRegistry,
        config: &GhostConfig,
    ) -> HashSet<SocketAddr> {
        let rect = Self::interest_rect(real.position(), real.appeal_radius(), config);
        space
            .cells_intersecting(&rect)
            .into_iter()
            .filter(|cell| {
                cell.address != *own_address
                    && !cell.is_delete_pending
                    && !registry.is_recently_dead(&cell.address)
            })
            .map(|cell| cell.address)
            .collect()
    }

    /// Two-set difference of the current and required haunts, sorted
    pub fn reconcile(current: &HashSet<SocketAddr>, required: &HashSet<SocketAddr>) -> GhostPlan {
        let mut to_create: Vec<SocketAddr> = required.difference(current).copied().collect();
        let mut to_delete: Vec<SocketAddr> = current.difference(required).copied().collect();
        to_create.sort();
        to_delete.sort();
        GhostPlan {
            to_create,
            to_delete,
        }
    }

    /// Plans the haunt changes for `real` this tick. No ghost is created on
    /// `offload_destination`: it will build its own haunts once it owns the
    /// real.
    pub fn plan(
        real: &RealEntity,
        own_address: &SocketAddr,
        offload_destination: Option<&SocketAddr>,
        space: &dyn SpaceQuery,
        registry: &ChannelRegistry,
        config: &GhostConfig,
    ) -> GhostPlan {
        let required = Self::required_haunts(real, own_address, space, registry, config);
        let mut plan = Self::reconcile(&real.haunt_addresses(), &required);
        if let Some(destination) = offload_destination {
            plan.to_create.retain(|address| address != destination);
        }
        plan
    }

    /// Whether a haunt may be deleted yet. Young haunts and haunts of young
    /// reals are kept so a real crossing a boundary doesn't flap.
    pub fn may_delete(haunt: &Haunt, real_age: GameTime, now: GameTime, config: &GhostConfig) -> bool {
        haunt.age(now) >= config.min_ghost_lifespan && real_age >= config.real_grace_period
    }
}
