pub mod cell;
pub mod cell_config;
pub mod ghost_maintainer;
pub mod offload_checker;
