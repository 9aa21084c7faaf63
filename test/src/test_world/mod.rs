//! Simple entity store for witness testing, standing in for a cell's reals
//! and ghosts

use std::collections::HashMap;

use cellrep_server::{EntityLookup, ObservedEntity};
use cellrep_shared::{EntityId, EventDescription, EventHistory, EventNumber, Position};

pub struct TestEntity {
    pub position: Position,
    pub state: Vec<u8>,
    pub history: EventHistory,
}

// TestWorld - HashMap-based entity store
#[derive(Default)]
pub struct TestWorld {
    pub entities: HashMap<EntityId, TestEntity>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, entity: EntityId, position: Position) {
        self.entities.insert(
            entity,
            TestEntity {
                position,
                state: vec![0],
                history: EventHistory::new(),
            },
        );
    }

    pub fn despawn(&mut self, entity: &EntityId) {
        self.entities.remove(entity);
    }

    pub fn move_to(&mut self, entity: &EntityId, position: Position) {
        if let Some(test_entity) = self.entities.get_mut(entity) {
            test_entity.position = position;
        }
    }

    pub fn record(
        &mut self,
        entity: &EntityId,
        description: EventDescription,
        payload: Vec<u8>,
    ) -> EventNumber {
        self.history_mut(entity).append(description, payload)
    }

    pub fn history(&self, entity: &EntityId) -> &EventHistory {
        &self.entities[entity].history
    }

    pub fn history_mut(&mut self, entity: &EntityId) -> &mut EventHistory {
        &mut self.entities.get_mut(entity).unwrap().history
    }
}

impl EntityLookup for TestWorld {
    fn observed(&self, entity: &EntityId) -> Option<ObservedEntity<'_>> {
        self.entities.get(entity).map(|test_entity| ObservedEntity {
            position: test_entity.position,
            state: &test_entity.state,
            history: &test_entity.history,
        })
    }

    fn entities_within(&self, center: &Position, radius: f32) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, test_entity)| test_entity.position.distance(center) <= radius)
            .map(|(entity, _)| *entity)
            .collect()
    }
}
