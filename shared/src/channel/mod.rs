pub mod channel;
pub mod channel_config;
pub mod channel_registry;
pub mod error;
