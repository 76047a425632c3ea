//! Core types for Pinmap.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod coordinates;
pub mod id;
pub mod map;

pub use address::{NormalizedAddress, normalize};
pub use coordinates::Coordinates;
pub use id::{MapId, MapIdError};
pub use map::{CreatedMap, NewMap, Pin, RawPin, ResolvedPin, SharedMap};
