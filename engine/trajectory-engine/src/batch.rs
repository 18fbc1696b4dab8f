//! Batch valuation across many players
//!
//! Players are independent, so they are valued in parallel. One player's
//! failure only lands that player in `skipped`.

use chrono::Utc;
use player_registry::{PlayerKey, PlayerRegistry, RegisteredPlayer};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::engine::TrajectoryEngine;
use crate::error::SkippedPlayer;
use crate::models::{PerformanceRecord, Trajectory, TrajectoryEvent};

/// Everything needed to value one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRequest {
    pub key: PlayerKey,
    pub base_price: i64,
    /// Extra names the feed uses for this player
    #[serde(default)]
    pub accepted_names: Vec<String>,
}

impl ValuationRequest {
    pub fn new(key: PlayerKey, base_price: i64) -> Self {
        Self { key, base_price, accepted_names: Vec::new() }
    }

    /// Build a request from a registry entry, taking only unambiguous aliases
    pub fn from_registry(registry: &PlayerRegistry, player: &RegisteredPlayer) -> Self {
        let key = player.key();
        let accepted_names = registry.aliases_for(&key);
        Self { key, base_price: player.base_price, accepted_names }
    }
}

/// Result of valuing a batch of players
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub trajectories: Vec<Trajectory>,
    pub skipped: Vec<SkippedPlayer>,
    pub events: Vec<TrajectoryEvent>,
}

impl TrajectoryEngine {
    /// Value every request against the same record pool
    ///
    /// Output order follows `requests` regardless of scheduling.
    pub fn value_batch(
        &self,
        requests: &[ValuationRequest],
        records: &[PerformanceRecord],
    ) -> BatchReport {
        info!("Valuing {} players against {} records", requests.len(), records.len());

        let results = self.run_requests(requests, records);

        let mut trajectories = Vec::new();
        let mut skipped = Vec::new();
        let mut events = Vec::new();
        let events_cfg = &self.config().events;

        for (request, result) in requests.iter().zip(results) {
            match result {
                Ok(trajectory) => {
                    if let Some(latest) = trajectory.latest() {
                        let moved = latest.price_change.abs() >= events_cfg.min_change;
                        if events_cfg.enabled && moved {
                            events.push(TrajectoryEvent::PriceUpdated {
                                player: request.key.clone(),
                                position: latest.index,
                                price_before: latest.price_before,
                                price_after: latest.price_after,
                                delta: latest.price_change,
                                timestamp: Utc::now(),
                            });
                        }
                    }
                    trajectories.push(trajectory);
                }
                Err(skip) => {
                    warn!("{} ({} diagnostics)", skip, skip.diagnostics.len());
                    if events_cfg.enabled {
                        events.push(TrajectoryEvent::PlayerSkipped {
                            player: skip.key.clone(),
                            reason: skip.reason.to_string(),
                            timestamp: Utc::now(),
                        });
                    }
                    skipped.push(skip);
                }
            }
        }

        if events_cfg.enabled {
            events.push(TrajectoryEvent::BatchCompleted {
                processed: requests.len(),
                valued: trajectories.len(),
                skipped: skipped.len(),
                timestamp: Utc::now(),
            });
        }

        info!(
            "Batch complete: {} processed, {} valued, {} skipped",
            requests.len(),
            trajectories.len(),
            skipped.len()
        );

        BatchReport { trajectories, skipped, events }
    }

    fn run_requests(
        &self,
        requests: &[ValuationRequest],
        records: &[PerformanceRecord],
    ) -> Vec<Result<Trajectory, SkippedPlayer>> {
        let batch = &self.config().batch;
        if !batch.parallel {
            return requests.iter().map(|r| self.value_player(r, records)).collect();
        }

        let run = || -> Vec<Result<Trajectory, SkippedPlayer>> {
            requests.par_iter().map(|r| self.value_player(r, records)).collect()
        };
        if batch.worker_threads == 0 {
            return run();
        }

        match rayon::ThreadPoolBuilder::new().num_threads(batch.worker_threads).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                warn!(
                    "Could not build {}-thread pool ({}), using global pool",
                    batch.worker_threads, e
                );
                run()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrajectoryConfig;
    use crate::error::ValuationError;

    fn records() -> Vec<PerformanceRecord> {
        let mut records = Vec::new();
        for (round, score) in [(1, 40.0), (2, 60.0), (3, 80.0), (4, 20.0)] {
            records.push(PerformanceRecord::whole_game(2024, round, "Nick Daicos", "COLL", score));
        }
        for (round, score) in [(1, 100.0), (2, 100.0)] {
            records.push(PerformanceRecord::whole_game(2024, round, "Josh Daicos", "COLL", score));
        }
        for (round, score) in [(1, 50.0), (2, 50.0), (3, 50.0)] {
            records.push(PerformanceRecord::whole_game(2024, round, "Bont", "WB", score));
        }
        records
    }

    fn requests() -> Vec<ValuationRequest> {
        vec![
            ValuationRequest::new(PlayerKey::new("Nick Daicos", "COLL"), 100_000),
            ValuationRequest::new(PlayerKey::new("Josh Daicos", "COLL"), 90_000),
            ValuationRequest {
                key: PlayerKey::new("Marcus Bontempelli", "WB"),
                base_price: 250_000,
                accepted_names: vec!["bont".to_string()],
            },
        ]
    }

    #[test]
    fn test_batch_isolates_ineligible_players() {
        let engine = TrajectoryEngine::new(TrajectoryConfig::default()).unwrap();
        let report = engine.value_batch(&requests(), &records());

        assert_eq!(report.trajectories.len(), 2);
        assert_eq!(report.trajectories[0].latest_price(), 179_167);
        // 0.75 * 250_000 + 0.25 * 250_000
        assert_eq!(report.trajectories[1].latest_price(), 250_000);

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].key, PlayerKey::new("Josh Daicos", "COLL"));
        assert!(matches!(
            report.skipped[0].reason,
            ValuationError::IneligiblePlayer { qualifying: 2, .. }
        ));
    }

    #[test]
    fn test_batch_events() {
        let engine = TrajectoryEngine::new(TrajectoryConfig::default()).unwrap();
        let report = engine.value_batch(&requests(), &records());

        // Nick moved, Josh skipped, Bont unchanged, then completion
        assert_eq!(report.events.len(), 3);
        assert!(matches!(
            report.events[0],
            TrajectoryEvent::PriceUpdated { delta: 29_167, position: 3, .. }
        ));
        assert!(matches!(report.events[1], TrajectoryEvent::PlayerSkipped { .. }));
        assert!(matches!(
            report.events[2],
            TrajectoryEvent::BatchCompleted { processed: 3, valued: 2, skipped: 1, .. }
        ));
    }

    #[test]
    fn test_skipped_player_carries_malformed_records() {
        let mut records = records();
        records.push(PerformanceRecord::whole_game(2024, 3, "Josh Daicos", "COLL", f64::NAN));

        let engine = TrajectoryEngine::new(TrajectoryConfig::default()).unwrap();
        let report = engine.value_batch(&requests(), &records);

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].diagnostics.len(), 1);
        assert!(matches!(
            report.skipped[0].diagnostics[0],
            ValuationError::MalformedRecord { .. }
        ));
    }

    #[test]
    fn test_events_disabled() {
        let mut config = TrajectoryConfig::default();
        config.events.enabled = false;
        let engine = TrajectoryEngine::new(config).unwrap();
        let report = engine.value_batch(&requests(), &records());
        assert!(report.events.is_empty());
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let parallel = TrajectoryEngine::new(TrajectoryConfig::default()).unwrap();

        let mut config = TrajectoryConfig::default();
        config.batch.parallel = false;
        let sequential = TrajectoryEngine::new(config).unwrap();

        let mut config = TrajectoryConfig::default();
        config.batch.worker_threads = 2;
        let pooled = TrajectoryEngine::new(config).unwrap();

        let a = parallel.value_batch(&requests(), &records());
        let b = sequential.value_batch(&requests(), &records());
        let c = pooled.value_batch(&requests(), &records());

        for other in [&b, &c] {
            assert_eq!(a.trajectories.len(), other.trajectories.len());
            for (x, y) in a.trajectories.iter().zip(&other.trajectories) {
                assert_eq!(x.positions, y.positions);
            }
        }
    }

    #[test]
    fn test_request_from_registry() {
        let registry = PlayerRegistry::from_players(vec![RegisteredPlayer::new(
            "Marcus Bontempelli",
            "WB",
            250_000,
        )
        .with_aliases(["Bont"])]);
        let player = registry.players()[0].clone();
        let request = ValuationRequest::from_registry(&registry, &player);

        assert_eq!(request.base_price, 250_000);
        assert_eq!(
            request.accepted_names,
            vec!["marcus bontempelli".to_string(), "bont".to_string()]
        );

        let engine = TrajectoryEngine::new(TrajectoryConfig::default()).unwrap();
        let trajectory = engine.value_player(&request, &records()).unwrap();
        assert_eq!(trajectory.positions.len(), 3);
    }
}
