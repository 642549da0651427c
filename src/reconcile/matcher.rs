//! Track matching: join the tracklist to the inventory by (side, position)
//!
//! Output order is fixed for a given input:
//!
//! 1. reference tracks, side by side, by ascending position
//! 2. positioned audio with no reference track, by (side, position)
//! 3. one synthetic side-consolidated record per `side`-mode side
//!
//! Duplicate positions on either side are resolved first-come: the first WAV
//! for a key is the match target, and the first reference track at a
//! position claims it.

use crate::audit::{AuditSink, Severity};
use crate::model::{AudioItem, MatchedRecord, ModeMap, ReferenceTrack, ReferenceTracklist, Side, SideMode};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

pub fn match_tracks(
    reference: &ReferenceTracklist,
    modes: &ModeMap,
    items: &[AudioItem],
    sink: &mut dyn AuditSink,
) -> Vec<MatchedRecord> {
    let mut lookup: BTreeMap<(Side, u32), &AudioItem> = BTreeMap::new();
    for item in items {
        if let (Some(side), Some(position)) = (item.side, item.position) {
            lookup.entry((side, position)).or_insert(item);
        }
    }

    let mut out = Vec::with_capacity(reference.track_count() + lookup.len());
    let mut covered: BTreeSet<(Side, u32)> = BTreeSet::new();

    for (side, tracks) in reference.sides() {
        let mut ordered: Vec<&ReferenceTrack> = tracks.iter().collect();
        ordered.sort_by_key(|t| t.position);

        for track in ordered {
            let key = (side, track.position);
            let audio = if covered.insert(key) {
                lookup.get(&key).map(|w| (*w).clone())
            } else {
                sink.record(
                    "reference_duplicate_position",
                    Severity::Warn,
                    json!({"side": side, "position": track.position, "title": track.title}),
                );
                None
            };
            out.push(MatchedRecord::for_reference(track.clone(), audio));
        }
    }

    for (&(side, position), item) in &lookup {
        if !covered.contains(&(side, position)) {
            out.push(MatchedRecord::audio_only(side, position, (*item).clone()));
        }
    }

    for (side, summary) in modes {
        if summary.mode != SideMode::Side {
            continue;
        }
        let filename = items
            .iter()
            .find(|w| w.side == Some(*side) && w.position.is_none())
            .map(|w| w.filename.clone())
            .unwrap_or_else(|| format!("Side {}", side));
        out.push(MatchedRecord::side_consolidated(*side, filename, summary.total_duration_sec));
    }

    sink.record(
        "track_matching_finish",
        Severity::Info,
        json!({
            "matched": out.iter().filter(|m| m.fully_matched).count(),
            "reference_missing_audio": out.iter().filter(|m| m.reference.is_some() && m.audio.is_none()).count(),
            "audio_extra": out.iter().filter(|m| m.reference.is_none() && m.audio.is_some() && !m.side_consolidated).count(),
            "side_consolidated": out.iter().filter(|m| m.side_consolidated).count(),
        }),
    );

    out
}
