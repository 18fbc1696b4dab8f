use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::batch::ValuationRequest;
use crate::calculator::PriceCalculator;
use crate::config::TrajectoryConfig;
use crate::error::{ConfigError, Result, SkippedPlayer, ValuationError};
use crate::filter::filter_records;
use crate::models::{
    PerformanceRecord, PriceSnapshot, PricedPlayer, QualifyingRecord, TimelinePosition,
    Trajectory,
};
use crate::sequencer::sequence_records;

/// Running state of one player's trajectory
///
/// Folding a record advances it by exactly one position. Callers that
/// persist it can apply each new game without replaying the whole history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceState {
    /// Number of records folded so far, i.e. the index of the next position
    pub position: usize,
    /// Price after the last folded record (base price before any)
    pub price: i64,
    /// Trailing scores, oldest first, at most `window_size` long
    pub window: VecDeque<f64>,
}

impl PriceState {
    pub fn initial(base_price: i64) -> Self {
        Self { position: 0, price: base_price, window: VecDeque::new() }
    }
}

/// Drives filter, sequencer and calculator over a player's history
pub struct TrajectoryEngine {
    config: TrajectoryConfig,
    calculator: PriceCalculator,
}

impl TrajectoryEngine {
    pub fn new(config: TrajectoryConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let calculator = PriceCalculator::new(config.valuation.clone());
        Ok(Self { config, calculator })
    }

    pub fn config(&self) -> &TrajectoryConfig {
        &self.config
    }

    /// Fail fast when the player cannot be valued at all
    ///
    /// Rejects timelines shorter than the minimum and negative base prices.
    pub fn check_eligibility(&self, player: &PricedPlayer, qualifying: usize) -> Result<()> {
        let required = self.config.valuation.min_qualifying_games;
        if qualifying < required {
            return Err(ValuationError::IneligiblePlayer {
                player: player.key.clone(),
                qualifying,
                required,
            });
        }
        if player.base_price < 0 {
            return Err(ValuationError::InvalidBasePrice {
                player: player.key.clone(),
                base_price: player.base_price,
            });
        }
        Ok(())
    }

    /// Apply one more record to `state` and return the position it produces
    ///
    /// `state` is left untouched when the new price would overflow.
    pub fn fold(
        &self,
        state: &mut PriceState,
        record: &QualifyingRecord,
    ) -> Result<TimelinePosition> {
        let window_size = self.config.valuation.window_size;
        let mut window = state.window.clone();
        window.push_back(record.score);
        while window.len() > window_size {
            window.pop_front();
        }

        let index = state.position;
        let form = self.calculator.form_over(&window);
        let market_value = self.calculator.market_value(form.average);
        let price_before = state.price;
        let out_of_range = |value: f64| ValuationError::PriceOutOfRange { position: index, value };

        let price_after = self
            .calculator
            .next_price(price_before, market_value, index)
            .ok_or_else(|| out_of_range(market_value))?;
        let price_change = price_after
            .checked_sub(price_before)
            .ok_or_else(|| out_of_range(price_after as f64))?;

        debug!(
            "Position {}: form {:.2} over {} games, market value {:.2}, price {} -> {}",
            index, form.average, form.window_size, market_value, price_before, price_after
        );

        state.position += 1;
        state.price = price_after;
        state.window = window;

        Ok(TimelinePosition {
            index,
            record: record.clone(),
            window_size: form.window_size,
            rolling_average: form.average,
            market_value,
            price_before,
            price_after,
            price_change,
            phase: self.calculator.phase(index),
        })
    }

    /// Fold every record of `sequence` into a fresh state without keeping positions
    pub fn replay(&self, base_price: i64, sequence: &[QualifyingRecord]) -> Result<PriceState> {
        let mut state = PriceState::initial(base_price);
        for record in sequence {
            self.fold(&mut state, record)?;
        }
        Ok(state)
    }

    /// Full trajectory for an already filtered and sequenced timeline
    pub fn assemble(
        &self,
        player: &PricedPlayer,
        sequence: &[QualifyingRecord],
    ) -> Result<Vec<TimelinePosition>> {
        self.check_eligibility(player, sequence.len())?;

        let mut state = PriceState::initial(player.base_price);
        sequence.iter().map(|record| self.fold(&mut state, record)).collect()
    }

    /// Outputs for the latest position, replayed from the base price
    pub fn current_price(
        &self,
        player: &PricedPlayer,
        sequence: &[QualifyingRecord],
    ) -> Result<PriceSnapshot> {
        self.check_eligibility(player, sequence.len())?;

        // Eligibility guarantees at least one record.
        let (last, history) = match sequence.split_last() {
            Some(split) => split,
            None => {
                return Err(ValuationError::IneligiblePlayer {
                    player: player.key.clone(),
                    qualifying: 0,
                    required: self.config.valuation.min_qualifying_games,
                })
            }
        };

        let mut state = self.replay(player.base_price, history)?;
        let latest = self.fold(&mut state, last)?;

        Ok(PriceSnapshot {
            key: player.key.clone(),
            position: latest.index,
            rolling_average: latest.rolling_average,
            market_value: latest.market_value,
            price_before: latest.price_before,
            price_after: latest.price_after,
        })
    }

    /// Filter, sequence and assemble one player's raw records
    ///
    /// Diagnostics found along the way are kept on the result either way.
    pub fn value_player(
        &self,
        request: &ValuationRequest,
        records: &[PerformanceRecord],
    ) -> std::result::Result<Trajectory, SkippedPlayer> {
        let filtered = filter_records(records, &request.key, &request.accepted_names);
        let sequenced = sequence_records(filtered.records);

        let mut diagnostics = filtered.rejected;
        diagnostics.extend(sequenced.diagnostics);

        let player = PricedPlayer::new(request.key.clone(), request.base_price)
            .with_eligibility(sequenced.records.len(), self.config.valuation.min_qualifying_games);

        let positions = match self.assemble(&player, &sequenced.records) {
            Ok(positions) => positions,
            Err(reason) => {
                return Err(SkippedPlayer { key: request.key.clone(), reason, diagnostics })
            }
        };

        let trajectory = Trajectory { player, positions, diagnostics };
        info!(
            "Valued {}: {} games, price {} -> {}",
            trajectory.player.key,
            trajectory.positions.len(),
            trajectory.player.base_price,
            trajectory.latest_price()
        );
        Ok(trajectory)
    }
}
