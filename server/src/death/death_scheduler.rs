
use log::info;

use cellrep_shared::GameTime;

use super::death_ack_task::{DeathAck, DeathAckTask};

type CompletionCallback = Box<dyn FnMut(&DeathAck)>;

/// Owns the pending [`DeathAckTask`]s of a cell and completes them as time
/// passes. Offloads are paused while any task is pending.
pub struct DeathScheduler {
    tasks: Vec<DeathAckTask>,
    on_complete: Option<CompletionCallback>,
}

impl DeathScheduler {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            on_complete: None,
        }
    }

    /// Registers the callback run for every completed task, replacing any
    /// previous one
    pub fn set_completion_callback<F: FnMut(&DeathAck) + 'static>(&mut self, callback: F) {
        self.on_complete = Some(Box::new(callback));
    }

    pub fn schedule(&mut self, task: DeathAckTask) {
        if let Some(existing) = self
            .tasks
            .iter_mut()
            .find(|existing| existing.address() == task.address())
        {
            let acknowledge_at = task.acknowledge_at();
            existing.merge(task.complete().lost_entities, acknowledge_at);
            return;
        }
        self.tasks.push(task);
    }

    /// Completes every task that is due and returns their acks
    pub fn update(&mut self, now: GameTime) -> Vec<DeathAck> {
        let mut acks = Vec::new();
        let mut index = 0;
        while index < self.tasks.len() {
            if !self.tasks[index].is_complete(now) {
                index += 1;
                continue;
            }
            let ack = self.tasks.swap_remove(index).complete();
            info!(
                "DeathScheduler: death of {} acknowledged, {} entities lost",
                ack.address,
                ack.lost_entities.len()
            );
            if let Some(callback) = self.on_complete.as_mut() {
                callback(&ack);
            }
            acks.push(ack);
        }
        acks
    }

    pub fn is_recovering(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Default for DeathScheduler {
    fn default() -> Self {
        Self::new()
    }
}
