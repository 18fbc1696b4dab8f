//! Error types for the trajectory engine

use player_registry::PlayerKey;
use serde::Serialize;
use thiserror::Error;

/// Result type for valuation operations
pub type Result<T> = std::result::Result<T, ValuationError>;

/// Per-player valuation failures and data-quality findings
///
/// `AmbiguousOrdering` and `MalformedRecord` are reported as diagnostics next
/// to an otherwise complete trajectory. The rest stop the player's valuation.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValuationError {
    #[error("{player} has {qualifying} qualifying games, {required} required")]
    IneligiblePlayer { player: PlayerKey, qualifying: usize, required: usize },

    #[error("{player} has negative base price {base_price}")]
    InvalidBasePrice { player: PlayerKey, base_price: i64 },

    #[error("Price at position {position} is out of range ({value})")]
    PriceOutOfRange { position: usize, value: f64 },

    #[error("Round '{round}' in season {season} is not numeric, ordered after numeric rounds")]
    AmbiguousOrdering { season: i32, round: String },

    #[error("Malformed record for {player} (season {season}, round {round}): {reason}")]
    MalformedRecord { player: String, season: i32, round: String, reason: String },
}

/// A player left out of valuation, with the findings gathered before it stopped
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("Skipped {key}: {reason}")]
pub struct SkippedPlayer {
    pub key: PlayerKey,
    pub reason: ValuationError,
    /// Malformed records and ordering findings that led up to the failure
    pub diagnostics: Vec<ValuationError>,
}

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration load error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Configuration render error: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
