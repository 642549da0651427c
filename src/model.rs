//! Records shared by the reconciliation stages and the exporters
//!
//! Everything here is plain data: created fresh for each processed pair,
//! never mutated after construction, and serialized as-is into the per-pair
//! JSON files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::TracklistError;

/// A side label could not be turned into a single letter A-Z
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid side label {0:?}: expected a single letter A-Z")]
pub struct InvalidSide(pub String);

/// One face of a physical release ("A", "B", ...)
///
/// Always stored uppercase, so `Side::new('a') == Side::new('A')`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Side(char);

impl Side {
    pub fn new(letter: char) -> Option<Self> {
        let upper = letter.to_ascii_uppercase();
        upper.is_ascii_uppercase().then_some(Side(upper))
    }

    pub fn letter(self) -> char {
        self.0
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Side {
    type Err = InvalidSide;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Side::new(c).ok_or_else(|| InvalidSide(s.to_string())),
            _ => Err(InvalidSide(s.to_string())),
        }
    }
}

impl TryFrom<String> for Side {
    type Error = InvalidSide;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Side> for String {
    fn from(side: Side) -> Self {
        side.0.to_string()
    }
}

/// One track as printed on the release's tracklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTrack {
    pub title: String,
    pub side: Side,
    /// 1-based ordinal within the side
    pub position: u32,
    pub duration_sec: u32,
}

/// Reference tracks grouped by side
///
/// Every track sits under the key of its own `side`. Tracks go in through
/// `push`, and deserialized lists are checked the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTracklist")]
pub struct ReferenceTracklist {
    sides: BTreeMap<Side, Vec<ReferenceTrack>>,
}

#[derive(Deserialize)]
struct RawTracklist {
    sides: BTreeMap<Side, Vec<ReferenceTrack>>,
}

impl TryFrom<RawTracklist> for ReferenceTracklist {
    type Error = TracklistError;

    fn try_from(raw: RawTracklist) -> Result<Self, Self::Error> {
        let mut list = Self::new();
        for (listed, tracks) in raw.sides {
            for track in tracks {
                if track.side != listed {
                    return Err(TracklistError::SideMismatch {
                        declared: track.side.to_string(),
                        listed: listed.to_string(),
                        title: track.title,
                    });
                }
                if track.position == 0 {
                    return Err(TracklistError::InvalidPosition {
                        side: listed.to_string(),
                        position: 0,
                        title: track.title,
                    });
                }
                list.push(track);
            }
        }
        Ok(list)
    }
}

impl ReferenceTracklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, track: ReferenceTrack) {
        self.sides.entry(track.side).or_default().push(track);
    }

    pub fn sides(&self) -> impl Iterator<Item = (Side, &[ReferenceTrack])> {
        self.sides.iter().map(|(side, tracks)| (*side, tracks.as_slice()))
    }

    pub fn contains_side(&self, side: Side) -> bool {
        self.sides.contains_key(&side)
    }

    pub fn tracks(&self, side: Side) -> &[ReferenceTrack] {
        self.sides.get(&side).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_sec(&self, side: Side) -> i64 {
        self.tracks(side).iter().map(|t| i64::from(t.duration_sec)).sum()
    }

    pub fn track_count(&self) -> usize {
        self.sides.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sides.is_empty()
    }
}

impl FromIterator<ReferenceTrack> for ReferenceTracklist {
    fn from_iter<I: IntoIterator<Item = ReferenceTrack>>(iter: I) -> Self {
        let mut list = Self::new();
        for track in iter {
            list.push(track);
        }
        list
    }
}

/// One audio file from an archive, with side/position inferred from its name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioItem {
    pub filename: String,
    pub duration_sec: f64,
    pub side: Option<Side>,
    pub position: Option<u32>,
}

impl AudioItem {
    /// Build an item, inferring side and position from the bare file name
    pub fn from_file(filename: impl Into<String>, duration_sec: f64) -> Self {
        let filename = filename.into();
        let (side, position) = crate::reconcile::infer_side_position(&filename);
        Self {
            filename,
            duration_sec,
            side,
            position,
        }
    }
}

/// How a side's audio is laid out in the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideMode {
    /// One file per track, each tagged with a position
    Tracks,
    /// One or more files labelled only with the side
    Side,
}

impl fmt::Display for SideMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideMode::Tracks => write!(f, "tracks"),
            SideMode::Side => write!(f, "side"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideSummary {
    pub side: Side,
    pub mode: SideMode,
    pub total_duration_sec: f64,
}

/// Per-side mode and aggregate duration, sorted by side
pub type ModeMap = BTreeMap<Side, SideSummary>;

/// One row of the join between the tracklist and the audio inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedRecord {
    pub side: Side,
    pub position: Option<u32>,
    pub reference: Option<ReferenceTrack>,
    pub audio: Option<AudioItem>,
    pub fully_matched: bool,
    pub side_consolidated: bool,
}

impl MatchedRecord {
    pub fn for_reference(track: ReferenceTrack, audio: Option<AudioItem>) -> Self {
        Self {
            side: track.side,
            position: Some(track.position),
            fully_matched: audio.is_some(),
            reference: Some(track),
            audio,
            side_consolidated: false,
        }
    }

    pub fn audio_only(side: Side, position: u32, audio: AudioItem) -> Self {
        Self {
            side,
            position: Some(position),
            reference: None,
            audio: Some(audio),
            fully_matched: false,
            side_consolidated: false,
        }
    }

    /// Synthetic record standing in for a whole side recorded as one piece
    pub fn side_consolidated(side: Side, filename: String, total_duration_sec: f64) -> Self {
        Self {
            side,
            position: None,
            reference: None,
            audio: Some(AudioItem {
                filename,
                duration_sec: total_duration_sec,
                side: Some(side),
                position: None,
            }),
            fully_matched: false,
            side_consolidated: true,
        }
    }

    /// Reference and audio both present on a positional record
    pub fn counts_toward_audio_total(&self) -> bool {
        self.reference.is_some() && self.audio.is_some() && !self.side_consolidated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Warn,
    Fail,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "OK"),
            Status::Warn => write!(f, "WARN"),
            Status::Fail => write!(f, "FAIL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// The side exists in only one of tracklist / audio
    MissingComponent,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::MissingComponent => write!(f, "missing_component"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonItem {
    pub side: Side,
    pub reference_total_sec: i64,
    pub audio_total_sec: i64,
    /// audio minus reference
    pub delta_sec: i64,
    pub status: Status,
    pub reason: Option<Reason>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SideCounts {
    pub ok: usize,
    pub warn: usize,
    pub fail: usize,
    pub sides_total: usize,
}

/// Per-side comparison of one pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub pair_id: String,
    pub per_side: Vec<ComparisonItem>,
}

impl ComparisonResult {
    pub fn counts(&self) -> SideCounts {
        let mut counts = SideCounts {
            sides_total: self.per_side.len(),
            ..SideCounts::default()
        };
        for item in &self.per_side {
            match item.status {
                Status::Ok => counts.ok += 1,
                Status::Warn => counts.warn += 1,
                Status::Fail => counts.fail += 1,
            }
        }
        counts
    }

    /// Largest absolute delta across sides, 0 when there are none
    pub fn worst_delta(&self) -> i64 {
        self.per_side.iter().map(|it| it.delta_sec.abs()).max().unwrap_or(0)
    }
}

/// Totals across every pair processed in a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub pairs_total: usize,
    pub sides_total: usize,
    pub ok: usize,
    pub warn: usize,
    pub fail: usize,
}

impl BatchSummary {
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a ComparisonResult>,
    {
        let mut summary = Self::default();
        for result in results {
            let counts = result.counts();
            summary.pairs_total += 1;
            summary.sides_total += counts.sides_total;
            summary.ok += counts.ok;
            summary.warn += counts.warn;
            summary.fail += counts.fail;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn side(c: char) -> Side {
        Side::new(c).unwrap()
    }

    fn item(side_letter: char, delta: i64, status: Status) -> ComparisonItem {
        ComparisonItem {
            side: side(side_letter),
            reference_total_sec: 100,
            audio_total_sec: 100 + delta,
            delta_sec: delta,
            status,
            reason: None,
        }
    }

    // ==========================================================================
    // SIDE LABEL TESTS
    // ==========================================================================

    #[test]
    fn test_side_is_uppercased() {
        assert_eq!(side('a'), side('A'));
        assert_eq!(side('b').letter(), 'B');
    }

    #[test]
    fn test_side_rejects_non_letters() {
        assert!(Side::new('1').is_none());
        assert!(Side::new(' ').is_none());
        assert!(Side::new('é').is_none());
        assert!("AB".parse::<Side>().is_err());
        assert!("".parse::<Side>().is_err());
    }

    // ==========================================================================
    // TRACKLIST DESERIALIZATION TESTS
    // ==========================================================================

    #[test]
    fn test_tracklist_json_round_trips() {
        let list: ReferenceTracklist = vec![
            ReferenceTrack { title: "One".into(), side: side('A'), position: 1, duration_sec: 252 },
            ReferenceTrack { title: "Two".into(), side: side('B'), position: 1, duration_sec: 300 },
        ]
        .into_iter()
        .collect();
        let text = serde_json::to_string(&list).unwrap();
        let back: ReferenceTracklist = serde_json::from_str(&text).unwrap();
        assert_eq!(back, list);
    }

    #[test]
    fn test_tracklist_rejects_track_under_wrong_side() {
        let text = r#"{"sides": {"A": [{"title": "x", "side": "B", "position": 1, "duration_sec": 252}]}}"#;
        let err = serde_json::from_str::<ReferenceTracklist>(text).unwrap_err();
        assert!(err.to_string().contains("declares side B"), "{err}");
    }

    #[test]
    fn test_tracklist_rejects_position_zero() {
        let text = r#"{"sides": {"A": [{"title": "x", "side": "A", "position": 0, "duration_sec": 252}]}}"#;
        assert!(serde_json::from_str::<ReferenceTracklist>(text).is_err());
    }

    #[test]
    fn test_side_serializes_as_string() {
        let json = serde_json::to_string(&side('c')).unwrap();
        assert_eq!(json, "\"C\"");
        let back: Side = serde_json::from_str("\"d\"").unwrap();
        assert_eq!(back, side('D'));
    }

    #[test]
    fn test_tracklist_serializes_sides_as_keys() {
        let list: ReferenceTracklist = vec![ReferenceTrack {
            title: "Intro".to_string(),
            side: side('A'),
            position: 1,
            duration_sec: 60,
        }]
        .into_iter()
        .collect();
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["sides"]["A"][0]["title"], "Intro");
    }

    // ==========================================================================
    // TRACKLIST GROUPING TESTS
    // ==========================================================================

    #[test]
    fn test_tracklist_groups_by_side() {
        let list: ReferenceTracklist = [('B', 1, 30), ('A', 1, 10), ('A', 2, 20)]
            .into_iter()
            .map(|(s, position, duration_sec)| ReferenceTrack {
                title: format!("{s}{position}"),
                side: side(s),
                position,
                duration_sec,
            })
            .collect();

        let sides: Vec<char> = list.sides().map(|(s, _)| s.letter()).collect();
        assert_eq!(sides, vec!['A', 'B']);
        assert_eq!(list.total_sec(side('A')), 30);
        assert_eq!(list.total_sec(side('Z')), 0);
        assert_eq!(list.track_count(), 3);
    }

    // ==========================================================================
    // RESULT COUNTS TESTS
    // ==========================================================================

    #[test]
    fn test_counts_and_worst_delta() {
        let result = ComparisonResult {
            pair_id: "1234".to_string(),
            per_side: vec![
                item('A', 0, Status::Ok),
                item('B', -4, Status::Warn),
                item('C', 9, Status::Fail),
            ],
        };
        let counts = result.counts();
        assert_eq!(counts.ok, 1);
        assert_eq!(counts.warn, 1);
        assert_eq!(counts.fail, 1);
        assert_eq!(counts.sides_total, 3);
        assert_eq!(result.worst_delta(), 9);
    }

    #[test]
    fn test_worst_delta_empty() {
        let result = ComparisonResult {
            pair_id: "1".to_string(),
            per_side: vec![],
        };
        assert_eq!(result.worst_delta(), 0);
    }

    #[test]
    fn test_batch_summary_sums_pairs() {
        let a = ComparisonResult {
            pair_id: "1".to_string(),
            per_side: vec![item('A', 0, Status::Ok), item('B', 2, Status::Warn)],
        };
        let b = ComparisonResult {
            pair_id: "2".to_string(),
            per_side: vec![item('A', 10, Status::Fail)],
        };
        let summary = BatchSummary::from_results([&a, &b]);
        assert_eq!(
            summary,
            BatchSummary {
                pairs_total: 2,
                sides_total: 3,
                ok: 1,
                warn: 1,
                fail: 1,
            }
        );
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&Status::Warn).unwrap(), "\"WARN\"");
        assert_eq!(
            serde_json::to_string(&Reason::MissingComponent).unwrap(),
            "\"missing_component\""
        );
    }
}
