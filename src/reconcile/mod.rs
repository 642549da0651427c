//! Reconciliation engine: inventory → match → compare
//!
//! Three pure stages, each consuming the full output of the one before:
//!
//! 1. [`normalize_inventory`]: group WAVs by side and infer each side's mode
//! 2. [`match_tracks`]: join the tracklist to the inventory by (side, position)
//! 3. [`compare`]: per-side totals, delta and OK/WARN/FAIL status
//!
//! Nothing is kept between calls. Anomalies that do not stop the pipeline go
//! to the caller's [`AuditSink`].

mod compare;
mod infer;
mod matcher;
mod normalize;

pub use compare::{classify, compare, Tolerance};
pub use infer::infer_side_position;
pub use matcher::match_tracks;
pub use normalize::{normalize_inventory, Inventory};

use crate::audit::AuditSink;
use crate::model::{AudioItem, ComparisonResult, MatchedRecord, ReferenceTracklist};
use serde::Serialize;

/// Everything produced for one pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub inventory: Inventory,
    pub matched: Vec<MatchedRecord>,
    pub comparison: ComparisonResult,
}

/// Run all three stages on one pair's inputs
pub fn reconcile(
    pair_id: &str,
    reference: &ReferenceTracklist,
    items: Vec<AudioItem>,
    tolerance: Tolerance,
    sink: &mut dyn AuditSink,
) -> Reconciliation {
    let inventory = normalize_inventory(items, sink);
    let matched = match_tracks(reference, &inventory.modes, &inventory.items, sink);
    let per_side = compare(reference, &inventory.modes, &matched, tolerance, sink);

    Reconciliation {
        inventory,
        matched,
        comparison: ComparisonResult {
            pair_id: pair_id.to_string(),
            per_side,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditLog, NullSink};
    use crate::model::{ReferenceTrack, Side, Status};

    fn tracklist() -> ReferenceTracklist {
        [('A', 1, 252), ('A', 2, 228), ('B', 1, 300), ('B', 2, 310)]
            .into_iter()
            .map(|(s, position, duration_sec)| ReferenceTrack {
                title: format!("Song {s}{position}"),
                side: Side::new(s).unwrap(),
                position,
                duration_sec,
            })
            .collect()
    }

    fn items() -> Vec<AudioItem> {
        vec![
            AudioItem::from_file("A2.wav", 227.7),
            AudioItem::from_file("A1.wav", 252.2),
            AudioItem::from_file("Side B.wav", 612.0),
            AudioItem::from_file("notes.wav", 3.0),
            AudioItem::from_file("C1.wav", 90.0),
        ]
    }

    #[test]
    fn test_reconcile_end_to_end() {
        let mut log = AuditLog::new();
        let rec = reconcile("123456", &tracklist(), items(), Tolerance::new(3, 6), &mut log);

        let statuses: Vec<(char, Status)> = rec
            .comparison
            .per_side
            .iter()
            .map(|it| (it.side.letter(), it.status))
            .collect();
        assert_eq!(statuses, vec![('A', Status::Ok), ('B', Status::Warn), ('C', Status::Fail)]);
        assert_eq!(rec.comparison.pair_id, "123456");
        assert_eq!(rec.inventory.items.len(), 5);
        assert_eq!(log.count("unmatchable_wav"), 1);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let reference = tracklist();
        let first = reconcile("1", &reference, items(), Tolerance::default(), &mut NullSink);
        let second = reconcile("1", &reference, items(), Tolerance::default(), &mut NullSink);

        assert_eq!(first, second);
        let a = serde_json::to_string(&first.comparison.per_side).unwrap();
        let b = serde_json::to_string(&second.comparison.per_side).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_side_consolidated_records_never_have_reference() {
        let rec = reconcile("1", &tracklist(), items(), Tolerance::default(), &mut NullSink);
        for m in rec.matched.iter().filter(|m| m.side_consolidated) {
            assert!(m.reference.is_none());
            assert!(!m.fully_matched);
        }
        assert_eq!(rec.matched.iter().filter(|m| m.side_consolidated).count(), 1);
    }
}
