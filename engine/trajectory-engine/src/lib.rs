//! Price Trajectory Engine
//!
//! Derives, for every qualifying game in a player's history, a rolling form
//! average, a market value and a smoothed price. The whole trajectory is a
//! pure function of the base price and the ordered records, so it can be
//! recomputed retroactively at any time and always comes out the same.
//!
//! Pipeline per player: filter -> sequence -> (rolling form -> market value
//! -> smoothing) at every position. Players are independent and can be
//! valued in parallel; positions within a player cannot.

pub mod batch;
pub mod calculator;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod logging;
pub mod models;
pub mod sequencer;

#[cfg(test)]
mod tests;

pub use crate::batch::{BatchReport, ValuationRequest};
pub use crate::calculator::{PriceCalculator, RollingForm};
pub use crate::config::{RoundingPolicy, TrajectoryConfig, ValuationParameters};
pub use crate::engine::{PriceState, TrajectoryEngine};
pub use crate::error::{ConfigError, Result, SkippedPlayer, ValuationError};
pub use crate::filter::{filter_records, FilterOutcome};
pub use crate::models::*;
pub use crate::sequencer::{sequence_records, SequenceOutcome};

pub use player_registry::{PlayerKey, PlayerRegistry, RegisteredPlayer};
