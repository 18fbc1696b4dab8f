//! Record filter: picks a player's qualifying whole-game records
//!
//! Duplicate stat lines are kept as separate games; deduplication belongs
//! to the feed.

use player_registry::types::normalize;
use player_registry::PlayerKey;
use tracing::{debug, warn};

use crate::error::ValuationError;
use crate::models::{GameScope, PerformanceRecord, QualifyingRecord};

/// Records kept for valuation plus the ones rejected as malformed
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub records: Vec<QualifyingRecord>,
    pub rejected: Vec<ValuationError>,
}

/// Select `key`'s whole-game records
///
/// A record matches when its team equals the key's team and its player name
/// equals the key's identity or one of `accepted_names` (all compared
/// case-insensitively). Input order is preserved; ordering is the
/// sequencer's job.
pub fn filter_records(
    records: &[PerformanceRecord],
    key: &PlayerKey,
    accepted_names: &[String],
) -> FilterOutcome {
    let names: Vec<String> = std::iter::once(key.identity_norm().to_string())
        .chain(accepted_names.iter().map(|n| normalize(n)))
        .collect();

    let mut outcome = FilterOutcome::default();
    let mut partial = 0usize;

    for record in records {
        if !key.same_team(&record.team) {
            continue;
        }
        let player = normalize(&record.player);
        if !names.iter().any(|n| *n == player) {
            continue;
        }
        if record.scope != GameScope::WholeGame {
            partial += 1;
            continue;
        }

        match validate_score(record) {
            Ok(score) => outcome.records.push(QualifyingRecord { record: record.clone(), score }),
            Err(err) => {
                warn!("Excluding record: {}", err);
                outcome.rejected.push(err);
            }
        }
    }

    debug!(
        "Filtered {} qualifying records for {} ({} partial-period, {} malformed)",
        outcome.records.len(),
        key,
        partial,
        outcome.rejected.len()
    );

    outcome
}

fn validate_score(record: &PerformanceRecord) -> Result<f64, ValuationError> {
    let reason = match record.score {
        None => "score is missing".to_string(),
        Some(score) if !score.is_finite() => format!("score {score} is not a finite number"),
        Some(score) if score < 0.0 => format!("score {score} is negative"),
        Some(score) => return Ok(score),
    };

    Err(ValuationError::MalformedRecord {
        player: record.player.clone(),
        season: record.season,
        round: record.round.to_string(),
        reason,
    })
}
