pub mod grid_space;
pub mod local_network;
pub mod test_world;

pub use grid_space::GridSpace;
pub use helpers::*;
pub use local_network::{LocalNetwork, LocalTransport, Packet};
pub use test_world::{TestEntity, TestWorld};
