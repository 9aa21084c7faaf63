/// Caps how many haunts a cell deletes in one tick. Deletions refused by the
/// budget are retried on a later tick.
#[derive(Debug)]
pub struct DeletionBudget {
    max_per_tick: usize,
    remaining: usize,
    deferred: usize,
}

impl DeletionBudget {
    pub fn new(max_per_tick: usize) -> Self {
        Self {
            max_per_tick,
            remaining: max_per_tick,
            deferred: 0,
        }
    }

    /// Called at the start of every tick
    pub fn reset(&mut self) {
        self.remaining = self.max_per_tick;
        self.deferred = 0;
    }

    /// Takes one deletion from the budget. Returns false, and counts the
    /// deletion as deferred, once the budget is spent.
    pub fn try_consume(&mut self) -> bool {
        if self.remaining == 0 {
            self.deferred += 1;
            return false;
        }
        self.remaining -= 1;
        true
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Deletions refused since the last reset
    pub fn deferred(&self) -> usize {
        self.deferred
    }
}
