//! Property tests for trajectory recomputation

use proptest::prelude::*;

use crate::config::TrajectoryConfig;
use crate::engine::{PriceState, TrajectoryEngine};
use crate::error::ValuationError;
use crate::models::{PerformanceRecord, PricedPlayer, QualifyingRecord};
use player_registry::PlayerKey;

fn engine() -> TrajectoryEngine {
    TrajectoryEngine::new(TrajectoryConfig::default()).unwrap()
}

fn player(base_price: i64) -> PricedPlayer {
    PricedPlayer::new(PlayerKey::new("Sam Walsh", "CARL"), base_price)
}

fn timeline(scores: &[f64]) -> Vec<QualifyingRecord> {
    scores
        .iter()
        .enumerate()
        .map(|(i, &score)| QualifyingRecord {
            record: PerformanceRecord::whole_game(2024, i as i64 + 1, "Sam Walsh", "CARL", score),
            score,
        })
        .collect()
}

fn scores_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..200.0, 3..40)
}

proptest! {
    #[test]
    fn prop_assemble_is_deterministic(scores in scores_strategy(), base in 0i64..1_000_000) {
        let engine = engine();
        let seq = timeline(&scores);
        let first = engine.assemble(&player(base), &seq).unwrap();
        let second = engine.assemble(&player(base), &seq).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_no_price_change_before_window_fills(scores in scores_strategy(), base in 0i64..1_000_000) {
        let positions = engine().assemble(&player(base), &timeline(&scores)).unwrap();
        for position in &positions[..2] {
            prop_assert_eq!(position.price_after, position.price_before);
            prop_assert_eq!(position.price_change, 0);
        }
        prop_assert_eq!(positions[0].price_before, base);
    }

    #[test]
    fn prop_price_threads_between_positions(scores in scores_strategy(), base in 0i64..1_000_000) {
        let positions = engine().assemble(&player(base), &timeline(&scores)).unwrap();
        for pair in positions.windows(2) {
            prop_assert_eq!(pair[0].price_after, pair[1].price_before);
        }
    }

    #[test]
    fn prop_base_price_only_moves_prices(
        scores in scores_strategy(),
        base_a in 0i64..1_000_000,
        base_b in 0i64..1_000_000,
    ) {
        let engine = engine();
        let seq = timeline(&scores);
        let a = engine.assemble(&player(base_a), &seq).unwrap();
        let b = engine.assemble(&player(base_b), &seq).unwrap();

        for (x, y) in a.iter().zip(&b) {
            prop_assert_eq!(x.rolling_average, y.rolling_average);
            prop_assert_eq!(x.market_value, y.market_value);
            prop_assert_eq!(x.window_size, y.window_size);
        }
    }

    #[test]
    fn prop_distinct_base_prices_diverge_from_position_two(
        scores in scores_strategy(),
        base in 0i64..1_000_000,
        gap in 8i64..1_000_000,
    ) {
        // A gap of at least 8 survives the 0.75 factor and rounding at position 2.
        let engine = engine();
        let seq = timeline(&scores);
        let a = engine.assemble(&player(base), &seq).unwrap();
        let b = engine.assemble(&player(base + gap), &seq).unwrap();
        prop_assert_ne!(a[2].price_after, b[2].price_after);
    }

    #[test]
    fn prop_rolling_average_within_window_bounds(scores in scores_strategy()) {
        let positions = engine().assemble(&player(100_000), &timeline(&scores)).unwrap();
        for (i, position) in positions.iter().enumerate() {
            let window = &scores[(i + 1).saturating_sub(3)..=i];
            let lo = window.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = window.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(position.rolling_average >= lo - 1e-9);
            prop_assert!(position.rolling_average <= hi + 1e-9);
            prop_assert_eq!(position.window_size, window.len());
        }
    }

    #[test]
    fn prop_incremental_matches_full_replay(scores in scores_strategy(), base in 0i64..1_000_000) {
        let engine = engine();
        let seq = timeline(&scores);
        let full = engine.assemble(&player(base), &seq).unwrap();

        let mut state = PriceState::initial(base);
        for (record, expected) in seq.iter().zip(&full) {
            let json = serde_json::to_string(&state).unwrap();
            state = serde_json::from_str(&json).unwrap();
            let position = engine.fold(&mut state, record).unwrap();
            prop_assert_eq!(&position, expected);
        }

        let snapshot = engine.current_price(&player(base), &seq).unwrap();
        prop_assert_eq!(snapshot.price_after, full.last().unwrap().price_after);
    }

    #[test]
    fn prop_short_timelines_are_ineligible(scores in prop::collection::vec(0.0f64..200.0, 0..3)) {
        let result = engine().assemble(&player(100_000), &timeline(&scores));
        let is_ineligible = matches!(result, Err(ValuationError::IneligiblePlayer { .. }));
        prop_assert!(is_ineligible);
    }
}
