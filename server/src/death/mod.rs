pub mod death_ack_task;
pub mod death_scheduler;
pub mod deletion_budget;
