//! Chronological sequencer
//!
//! Orders qualifying records by season, then round. Numeric rounds compare
//! numerically and always come before labelled rounds ("Grand Final" etc.),
//! which compare lexicographically among themselves. Equal keys keep their
//! input order.

use std::collections::BTreeSet;
use tracing::warn;

use crate::error::ValuationError;
use crate::models::{QualifyingRecord, RoundKey};

/// Ordered timeline plus any ordering diagnostics
#[derive(Debug, Clone, Default)]
pub struct SequenceOutcome {
    pub records: Vec<QualifyingRecord>,
    pub diagnostics: Vec<ValuationError>,
}

pub fn sequence_records(mut records: Vec<QualifyingRecord>) -> SequenceOutcome {
    // Stable: equal (season, round) keys keep input order.
    records.sort_by_key(|r| (r.record.season, r.record.round.key()));

    let labelled: BTreeSet<(i32, String)> = records
        .iter()
        .filter_map(|r| match r.record.round.key() {
            RoundKey::Label(label) => Some((r.record.season, label)),
            RoundKey::Numeric(_) => None,
        })
        .collect();

    let diagnostics = labelled
        .into_iter()
        .map(|(season, round)| {
            let diagnostic = ValuationError::AmbiguousOrdering { season, round };
            warn!("{}", diagnostic);
            diagnostic
        })
        .collect();

    SequenceOutcome { records, diagnostics }
}
