//! Pinmap Core - Shared types library.
//!
//! This crate provides the types used across all Pinmap components:
//! - `server` - JSON API that turns address lists into shareable maps
//! - `cli` - Command-line tools for migrations and cache inspection
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Address normalization lives here because
//! it is pure and both the server and the CLI need the exact same cache keys.
//!
//! # Modules
//!
//! - [`types`] - Map ids, coordinates, normalized addresses and the map aggregate

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
