//! Business logic services.
//!
//! # Services
//!
//! - `maps` - Map creation (geocode pins, allocate an id, persist) and lookup

pub mod maps;

pub use maps::{MapError, MapIdGenerator, MapService, RandomIdGenerator};
