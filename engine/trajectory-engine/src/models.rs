use chrono::{DateTime, Utc};
use player_registry::PlayerKey;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValuationError;

/// Portion of a match a stat line covers
///
/// Feeds mark this with a period field; "All"/"Full"/"Game" mean the whole
/// match, anything else (Q1, H2, ...) is a partial period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum GameScope {
    WholeGame,
    PartialPeriod,
}

impl GameScope {
    pub fn from_marker(marker: &str) -> Self {
        match marker.trim().to_lowercase().as_str() {
            "whole-game" | "whole_game" | "all" | "full" | "game" => GameScope::WholeGame,
            _ => GameScope::PartialPeriod,
        }
    }
}

impl From<String> for GameScope {
    fn from(marker: String) -> Self {
        GameScope::from_marker(&marker)
    }
}

impl From<GameScope> for &'static str {
    fn from(scope: GameScope) -> Self {
        match scope {
            GameScope::WholeGame => "whole-game",
            GameScope::PartialPeriod => "partial-period",
        }
    }
}

/// Round identifier as the feed supplies it: a number or a label like "Grand Final"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Round {
    Number(i64),
    Label(String),
}

/// Sort key for a round. All numeric rounds order before all labelled rounds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum RoundKey {
    Numeric(i64),
    Label(String),
}

impl Round {
    /// Sort key, coercing labels such as " 7 " to numbers
    pub fn key(&self) -> RoundKey {
        match self {
            Round::Number(n) => RoundKey::Numeric(*n),
            Round::Label(label) => match label.trim().parse() {
                Ok(n) => RoundKey::Numeric(n),
                Err(_) => RoundKey::Label(label.clone()),
            },
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Round::Number(n) => write!(f, "{n}"),
            Round::Label(label) => write!(f, "{label}"),
        }
    }
}

impl From<i64> for Round {
    fn from(n: i64) -> Self {
        Round::Number(n)
    }
}

impl From<&str> for Round {
    fn from(label: &str) -> Self {
        Round::Label(label.to_string())
    }
}

/// One stat line from the ingestion feed. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub season: i32,
    pub round: Round,
    pub player: String,
    pub team: String,
    pub scope: GameScope,
    /// Fantasy points; missing or invalid values make the record malformed
    #[serde(default)]
    pub score: Option<f64>,
}

impl PerformanceRecord {
    pub fn whole_game(
        season: i32,
        round: impl Into<Round>,
        player: impl Into<String>,
        team: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            season,
            round: round.into(),
            player: player.into(),
            team: team.into(),
            scope: GameScope::WholeGame,
            score: Some(score),
        }
    }

    pub fn with_scope(mut self, scope: GameScope) -> Self {
        self.scope = scope;
        self
    }
}

/// A whole-game record that passed filtering, with its validated score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingRecord {
    pub record: PerformanceRecord,
    pub score: f64,
}

/// The subject of valuation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedPlayer {
    pub key: PlayerKey,
    /// Price before any record in the timeline is applied
    pub base_price: i64,
    /// True once the filtered timeline holds enough qualifying games
    pub eligible: bool,
}

impl PricedPlayer {
    pub fn new(key: PlayerKey, base_price: i64) -> Self {
        Self { key, base_price, eligible: false }
    }

    pub fn with_eligibility(mut self, qualifying_games: usize, min_games: usize) -> Self {
        self.eligible = qualifying_games >= min_games;
        self
    }
}

/// Where a position sits in the per-player state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationPhase {
    /// Trailing window not yet full, price carried forward
    AwaitingData,
    /// Price blended with market value
    Smoothing,
}

/// Derived valuation at one point in a player's timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePosition {
    pub index: usize,
    pub record: QualifyingRecord,
    pub window_size: usize,
    pub rolling_average: f64,
    pub market_value: f64,
    pub price_before: i64,
    pub price_after: i64,
    pub price_change: i64,
    pub phase: ValuationPhase,
}

/// Outputs of the most recent position only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub key: PlayerKey,
    pub position: usize,
    pub rolling_average: f64,
    pub market_value: f64,
    pub price_before: i64,
    pub price_after: i64,
}

/// Full valuation result for one player
#[derive(Debug, Clone, Serialize)]
pub struct Trajectory {
    pub player: PricedPlayer,
    pub positions: Vec<TimelinePosition>,
    /// Non-fatal data-quality findings (malformed records, ambiguous rounds)
    pub diagnostics: Vec<ValuationError>,
}

impl Trajectory {
    /// Price after the most recent game
    pub fn latest_price(&self) -> i64 {
        self.positions.last().map(|p| p.price_after).unwrap_or(self.player.base_price)
    }

    pub fn latest(&self) -> Option<&TimelinePosition> {
        self.positions.last()
    }
}

/// Events emitted by batch valuation
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrajectoryEvent {
    /// Latest game moved the player's price
    PriceUpdated {
        player: PlayerKey,
        position: usize,
        price_before: i64,
        price_after: i64,
        delta: i64,
        timestamp: DateTime<Utc>,
    },

    /// Player left out of the batch
    PlayerSkipped {
        player: PlayerKey,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Batch processing completed
    BatchCompleted {
        processed: usize,
        valued: usize,
        skipped: usize,
        timestamp: DateTime<Utc>,
    },
}
