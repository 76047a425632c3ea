//! Pinmap server library.
//!
//! Turns lists of postal addresses into shareable maps: every address is
//! normalized, resolved through a durable geocode cache with a provider
//! fallback, and stored with its map in one transaction.
//!
//! The binary in `main.rs` wires this library to `PostgreSQL` and Google's
//! Geocoding API; the CLI reuses it for migrations and cache warming.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod geocoding;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
