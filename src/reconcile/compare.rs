//! Per-side duration comparison and classification
//!
//! For every side present in the tracklist or in the audio inventory:
//!
//! ```text
//! delta = audio_total - reference_total
//!
//! |delta| == 0       -> OK
//! |delta| <= warn    -> WARN
//! |delta| >  fail    -> FAIL
//! otherwise          -> WARN   (warn < |delta| <= fail)
//! ```
//!
//! A side that exists in only one of the two sources is always FAIL with
//! reason `missing_component`, whatever the thresholds.
//!
//! In `tracks` mode the audio total only counts WAVs that were positionally
//! matched to a reference track, so missing or extra tracks show up in the
//! delta rather than being folded into the total.

use crate::audit::{AuditSink, Severity};
use crate::model::{ComparisonItem, MatchedRecord, ModeMap, Reason, ReferenceTracklist, Side, SideMode, Status};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Warn/fail thresholds in whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tolerance {
    pub warn_sec: u32,
    pub fail_sec: u32,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            warn_sec: 3,
            fail_sec: 6,
        }
    }
}

impl Tolerance {
    pub fn new(warn_sec: u32, fail_sec: u32) -> Self {
        Self { warn_sec, fail_sec }
    }

    /// warn >= fail: accepted, but deltas between the two classify as WARN
    pub fn is_inverted(&self) -> bool {
        self.warn_sec >= self.fail_sec
    }
}

/// Classify an absolute delta. The order of the checks matters.
pub fn classify(abs_delta: u64, tolerance: Tolerance) -> Status {
    if abs_delta == 0 {
        Status::Ok
    } else if abs_delta <= u64::from(tolerance.warn_sec) {
        Status::Warn
    } else if abs_delta > u64::from(tolerance.fail_sec) {
        Status::Fail
    } else {
        Status::Warn
    }
}

pub fn compare(
    reference: &ReferenceTracklist,
    modes: &ModeMap,
    matched: &[MatchedRecord],
    tolerance: Tolerance,
    sink: &mut dyn AuditSink,
) -> Vec<ComparisonItem> {
    let all_sides: BTreeSet<Side> = reference
        .sides()
        .map(|(side, _)| side)
        .chain(modes.keys().copied())
        .collect();

    let mut out = Vec::with_capacity(all_sides.len());
    for side in all_sides {
        let reference_total = reference.total_sec(side);
        let audio_total = modes
            .get(&side)
            .map(|summary| audio_total_sec(side, summary.mode, summary.total_duration_sec, matched))
            .unwrap_or(0);
        let delta = audio_total - reference_total;

        let item = if !reference.contains_side(side) || !modes.contains_key(&side) {
            ComparisonItem {
                side,
                reference_total_sec: reference_total,
                audio_total_sec: audio_total,
                delta_sec: delta,
                status: Status::Fail,
                reason: Some(Reason::MissingComponent),
            }
        } else {
            ComparisonItem {
                side,
                reference_total_sec: reference_total,
                audio_total_sec: audio_total,
                delta_sec: delta,
                status: classify(delta.unsigned_abs(), tolerance),
                reason: None,
            }
        };

        sink.record(
            "comparison_result",
            Severity::Info,
            serde_json::to_value(&item).unwrap_or_default(),
        );
        out.push(item);
    }
    out
}

fn audio_total_sec(side: Side, mode: SideMode, side_total: f64, matched: &[MatchedRecord]) -> i64 {
    let secs = match mode {
        SideMode::Side => side_total,
        SideMode::Tracks => matched
            .iter()
            .filter(|m| m.side == side && m.counts_toward_audio_total())
            .filter_map(|m| m.audio.as_ref())
            .map(|w| w.duration_sec)
            .sum(),
    };
    // Half-second totals go to the even second
    secs.round_ties_even() as i64
}
