//! Audio inventory normalization
//!
//! Groups the inventoried WAVs by side and decides, per side, whether the
//! audio was delivered as individual tracks or as one continuous recording:
//!
//! - every item on the side lacks a position → `side` mode, total is the sum
//!   of all items
//! - at least one item has a position → `tracks` mode, total is the sum of
//!   the positioned items only; positionless stragglers are reported
//!
//! Sides with no items never appear in the mode map.

use crate::audit::{AuditSink, Severity};
use crate::model::{AudioItem, ModeMap, Side, SideMode, SideSummary};
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

/// Normalized audio inventory of one archive
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Inventory {
    /// Every item, in collection order, including unmatchable ones
    pub items: Vec<AudioItem>,
    #[serde(rename = "per_side_mode")]
    pub modes: ModeMap,
}

impl Inventory {
    pub fn mode(&self, side: Side) -> Option<SideMode> {
        self.modes.get(&side).map(|s| s.mode)
    }

    /// Items that can never be joined to a reference track
    pub fn unmatchable(&self) -> impl Iterator<Item = &AudioItem> {
        self.items.iter().filter(move |item| match item.side {
            None => true,
            Some(side) => item.position.is_none() && self.mode(side) == Some(SideMode::Tracks),
        })
    }
}

pub fn normalize_inventory(items: Vec<AudioItem>, sink: &mut dyn AuditSink) -> Inventory {
    let items: Vec<AudioItem> = items.into_iter().map(|item| sanitize(item, sink)).collect();

    let mut by_side: BTreeMap<Side, Vec<&AudioItem>> = BTreeMap::new();
    for item in &items {
        match item.side {
            Some(side) => by_side.entry(side).or_default().push(item),
            None => sink.record(
                "unmatchable_wav",
                Severity::Warn,
                json!({"filename": item.filename, "reason": "no side could be inferred"}),
            ),
        }
    }

    let mut modes = ModeMap::new();
    for (side, side_items) in &by_side {
        let any_position = side_items.iter().any(|w| w.position.is_some());
        let any_positionless = side_items.iter().any(|w| w.position.is_none());

        let (mode, mut total) = if any_positionless && !any_position {
            (SideMode::Side, side_items.iter().map(|w| w.duration_sec).sum::<f64>())
        } else {
            let positioned = side_items.iter().filter(|w| w.position.is_some());
            (SideMode::Tracks, positioned.map(|w| w.duration_sec).sum::<f64>())
        };

        if mode == SideMode::Tracks {
            report_positionless(*side, side_items, sink);
            report_duplicates(*side, side_items, sink);
        }

        if total < 0.0 {
            sink.record(
                "negative_duration",
                Severity::Warn,
                json!({"side": side, "total": total}),
            );
            total = 0.0;
        }

        modes.insert(
            *side,
            SideSummary {
                side: *side,
                mode,
                total_duration_sec: total,
            },
        );
    }

    let inventory = Inventory { items, modes };
    sink.record(
        "wav_analysis_finish",
        Severity::Info,
        json!({
            "wav_count": inventory.items.len(),
            "unmatchable_count": inventory.unmatchable().count(),
            "sides": inventory.modes.keys().collect::<Vec<_>>(),
        }),
    );
    inventory
}

/// Durations come from an external reader; keep them finite and non-negative
fn sanitize(mut item: AudioItem, sink: &mut dyn AuditSink) -> AudioItem {
    if !item.duration_sec.is_finite() || item.duration_sec < 0.0 {
        sink.record(
            "invalid_duration",
            Severity::Warn,
            json!({"filename": item.filename, "duration_sec": item.duration_sec.to_string()}),
        );
        item.duration_sec = 0.0;
    }
    item
}

fn report_positionless(side: Side, items: &[&AudioItem], sink: &mut dyn AuditSink) {
    for item in items.iter().filter(|w| w.position.is_none()) {
        sink.record(
            "unmatchable_wav",
            Severity::Warn,
            json!({
                "filename": item.filename,
                "side": side,
                "reason": "side label without position on a side delivered as tracks",
            }),
        );
    }
}

fn report_duplicates(side: Side, items: &[&AudioItem], sink: &mut dyn AuditSink) {
    let mut seen = BTreeSet::new();
    for item in items {
        if let Some(position) = item.position {
            if !seen.insert(position) {
                sink.record(
                    "wav_duplicate_for_position",
                    Severity::Warn,
                    json!({"side": side, "position": position, "filename": item.filename}),
                );
            }
        }
    }
}
