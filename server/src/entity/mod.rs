pub mod buffered_ghost_messages;
pub mod ghost;
pub mod haunt;
pub mod real_entity;
