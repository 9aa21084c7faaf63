pub mod cell_message;
pub mod message_bundle;
