//! Player Registry - resolves loosely-typed player names to stable keys
//!
//! Stat feeds identify players by a name/team string pair rather than a
//! numeric ID. This crate turns those strings into a `PlayerKey` once, at the
//! boundary, and keeps the accepted aliases and base price for each player.

pub mod registry;
pub mod types;

pub use registry::PlayerRegistry;
pub use types::{PlayerKey, RegisteredPlayer, RegistryFile, RegistryLookupError};
