pub mod aoi_update_scheme;
pub mod detail_levels;
pub mod entity_cache;
pub mod witness;
pub mod witness_message;
