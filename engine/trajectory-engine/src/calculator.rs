use crate::config::{RoundingPolicy, ValuationParameters};
use crate::models::{QualifyingRecord, ValuationPhase};

/// Rolling form over the trailing window ending at a position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingForm {
    pub window_size: usize,
    pub average: f64,
}

/// Price calculator for per-game valuation steps
///
/// Holds the policy constants and applies the three per-position steps:
/// rolling form, market value and price smoothing.
#[derive(Debug, Clone)]
pub struct PriceCalculator {
    params: ValuationParameters,
}

impl PriceCalculator {
    /// Create a new price calculator
    pub fn new(params: ValuationParameters) -> Self {
        Self { params }
    }

    /// Mean score over the last `min(window_size, position + 1)` records ending at `position`
    ///
    /// Returns `None` when `position` is past the end of `sequence`.
    pub fn rolling_average(
        &self,
        sequence: &[QualifyingRecord],
        position: usize,
    ) -> Option<RollingForm> {
        if position >= sequence.len() {
            return None;
        }
        let start = (position + 1).saturating_sub(self.params.window_size);
        Some(self.form_over(sequence[start..=position].iter().map(|r| &r.score)))
    }

    /// Rolling form of an already trimmed trailing window, oldest score first
    pub fn form_over<'a>(&self, window: impl IntoIterator<Item = &'a f64>) -> RollingForm {
        let (average, window_size) = mean(window);
        RollingForm { window_size, average }
    }

    /// Market value for a rolling form average, unrounded
    pub fn market_value(&self, rolling_average: f64) -> f64 {
        self.params.magic_number * rolling_average
    }

    /// Smoothing step: price carried forward until the window fills, blended after
    ///
    /// Returns `None` when the blended price does not fit in an `i64`.
    pub fn next_price(
        &self,
        price_before: i64,
        market_value: f64,
        position: usize,
    ) -> Option<i64> {
        if self.phase(position) == ValuationPhase::AwaitingData {
            return Some(price_before);
        }

        let market_value = match self.params.rounding {
            RoundingPolicy::AtPrice => market_value,
            RoundingPolicy::AtMarketValue => market_value.round(),
        };

        // P' = round(w_old * P + w_new * MV)
        let blended = self.params.smoothing_weight_old * price_before as f64
            + self.params.smoothing_weight_new * market_value;
        let rounded = blended.round();
        // i64::MAX as f64 is 2^63, one past the largest representable price.
        if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
            return None;
        }
        Some(rounded as i64)
    }

    pub fn phase(&self, position: usize) -> ValuationPhase {
        if position < self.params.smoothing_start() {
            ValuationPhase::AwaitingData
        } else {
            ValuationPhase::Smoothing
        }
    }
}

/// Arithmetic mean and count, summed oldest to newest
fn mean<'a>(scores: impl IntoIterator<Item = &'a f64>) -> (f64, usize) {
    let (sum, count) = scores.into_iter().fold((0.0_f64, 0usize), |(s, c), x| (s + x, c + 1));
    if count == 0 {
        (0.0, 0)
    } else {
        (sum / count as f64, count)
    }
}
