//! Per-pair orchestration: tracklist → inventory → reconcile → exports
//!
//! Each pair is independent, so the driver may run [`Pipeline::run_pair`]
//! from several threads at once. Everything a pair produces, including its
//! audit events, stays in its own [`PairOutcome`].

use crate::audio::{inventory_archive, DurationProbe};
use crate::audit::{AuditLog, AuditSink, Severity};
use crate::config::Config;
use crate::error::Result;
use crate::model::ComparisonResult;
use crate::pairing::PairingItem;
use crate::reconcile::{reconcile, Reconciliation};
use crate::report::{self, PairDirs};
use crate::tracklist::TracklistSource;
use chrono::Local;
use serde_json::json;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// `RUN_<local timestamp>`, names the output directory of one run
pub fn make_run_tag() -> String {
    format!("RUN_{}", Local::now().format("%Y%m%d_%H%M%S"))
}

pub struct PairOutcome {
    pub pair_id: String,
    pub result: Result<ComparisonResult>,
    pub audit: AuditLog,
}

impl PairOutcome {
    pub fn failed(&self) -> bool {
        self.result.is_err()
    }
}

pub struct Pipeline<'a> {
    pub config: &'a Config,
    pub source: &'a dyn TracklistSource,
    pub probe: &'a dyn DurationProbe,
    pub run_dir: PathBuf,
    pub run_tag: String,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        source: &'a dyn TracklistSource,
        probe: &'a dyn DurationProbe,
        run_tag: String,
    ) -> Self {
        Self {
            run_dir: config.out_root.join(&run_tag),
            config,
            source,
            probe,
            run_tag,
        }
    }

    pub fn batch_dir(&self) -> PathBuf {
        self.run_dir.join("_batch")
    }

    pub fn run_pair(&self, pair: &PairingItem) -> PairOutcome {
        let mut audit = AuditLog::new();
        let result = self.process(pair, &mut audit);

        if let Err(ref e) = result {
            audit.record(
                "pair_failed",
                Severity::Error,
                json!({"reason": e.to_string()}),
            );
        }

        let events_dir = self.run_dir.join(&pair.pair_id);
        if events_dir.is_dir() {
            let dirs = PairDirs {
                wav: events_dir.join("wav"),
                compare: events_dir.join("compare"),
                base: events_dir,
            };
            if let Err(e) = report::save_events(&dirs, &audit, &self.run_tag, &pair.pair_id) {
                log::warn!("[{}] failed to write events: {}", pair.pair_id, e);
            }
        }

        PairOutcome {
            pair_id: pair.pair_id.clone(),
            result: result.map(|r| r.comparison),
            audit,
        }
    }

    fn process(&self, pair: &PairingItem, audit: &mut AuditLog) -> Result<Reconciliation> {
        let dirs = PairDirs::create(&self.run_dir, &pair.pair_id)?;

        audit.record(
            "tracklist_fetch_start",
            Severity::Info,
            json!({"document": pair.document.display().to_string(), "source": self.source.name()}),
        );
        let tracklist = self.source.fetch(&pair.document)?;
        audit.record(
            "tracklist_fetch_finish",
            Severity::Info,
            json!({
                "sides": tracklist.sides().map(|(side, _)| side).collect::<Vec<_>>(),
                "tracks_count": tracklist.track_count(),
            }),
        );
        report::save_tracklist(&dirs, &tracklist)?;

        let items = match &pair.archive {
            Some(archive) => match inventory_archive(archive, self.probe, audit) {
                Ok(items) => items,
                Err(e) => {
                    audit.record(
                        "archive_failed",
                        Severity::Error,
                        json!({"archive": archive.display().to_string(), "reason": e.to_string()}),
                    );
                    Vec::new()
                }
            },
            None => {
                audit.record("no_archive", Severity::Warn, json!({"document": pair.document.display().to_string()}));
                Vec::new()
            }
        };

        let reconciliation = reconcile(&pair.pair_id, &tracklist, items, self.config.tolerance(), audit);

        report::save_inventory(&dirs, &reconciliation.inventory)?;
        report::save_matched(&dirs, &reconciliation.matched)?;
        report::save_comparison(&dirs, &reconciliation.comparison)?;
        Ok(reconciliation)
    }
}

/// Append every pair's events to a shared JSON-lines log
pub fn append_events(log_file: &Path, run_tag: &str, outcomes: &[PairOutcome]) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;
    let mut writer = BufWriter::new(file);
    for outcome in outcomes {
        outcome
            .audit
            .write_jsonl(&mut writer, run_tag, Some(&outcome.pair_id))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::tests::wav_bytes;
    use crate::audio::SymphoniaProbe;
    use crate::error::CueCheckError;
    use crate::model::{Reason, Status};
    use crate::tracklist::{JsonTracklistSource, StubTracklistSource};

    fn config(out: &Path) -> Config {
        Config {
            out_root: out.to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn test_run_tag_format() {
        let tag = make_run_tag();
        assert!(tag.starts_with("RUN_"));
        assert_eq!(tag.len(), "RUN_20240101_120000".len());
    }

    #[test]
    fn test_stub_pair_with_side_recordings() {
        let out = tempfile::tempdir().unwrap();
        let audio = tempfile::tempdir().unwrap();
        let side_a = audio.path().join("7777");
        std::fs::create_dir(&side_a).unwrap();
        std::fs::write(side_a.join("Side A.wav"), wav_bytes(1000, 1, 480.0)).unwrap();
        std::fs::write(side_a.join("Side B.wav"), wav_bytes(1000, 1, 303.0)).unwrap();

        let cfg = config(out.path());
        let pipeline = Pipeline::new(&cfg, &StubTracklistSource, &SymphoniaProbe, "RUN_TEST".to_string());
        let outcome = pipeline.run_pair(&PairingItem {
            pair_id: "7777".to_string(),
            document: PathBuf::from("7777.json"),
            archive: Some(side_a),
        });

        let result = outcome.result.unwrap();
        assert_eq!(result.per_side.len(), 2);
        assert_eq!(result.per_side[0].status, Status::Ok);
        assert_eq!(result.per_side[1].delta_sec, 3);
        assert_eq!(result.per_side[1].status, Status::Warn);

        let pair_dir = out.path().join("RUN_TEST").join("7777");
        for file in [
            "tracklist.json",
            "matched_tracks.json",
            "events.jsonl",
            "wav/wav_analysis.json",
            "compare/compare.json",
            "compare/summary.csv",
        ] {
            assert!(pair_dir.join(file).is_file(), "missing {file}");
        }
    }

    #[test]
    fn test_missing_archive_gives_missing_components() {
        let out = tempfile::tempdir().unwrap();
        let cfg = config(out.path());
        let pipeline = Pipeline::new(&cfg, &StubTracklistSource, &SymphoniaProbe, "RUN_TEST".to_string());
        let outcome = pipeline.run_pair(&PairingItem {
            pair_id: "1".to_string(),
            document: PathBuf::from("1.json"),
            archive: None,
        });

        assert_eq!(outcome.audit.count("no_archive"), 1);
        let result = outcome.result.unwrap();
        assert!(result
            .per_side
            .iter()
            .all(|it| it.status == Status::Fail && it.reason == Some(Reason::MissingComponent)));
    }

    #[test]
    fn test_bad_tracklist_fails_the_pair() {
        let out = tempfile::tempdir().unwrap();
        let docs = tempfile::tempdir().unwrap();
        let doc = docs.path().join("2222.json");
        std::fs::write(&doc, r#"{"sides": {"A": [{"title": "x", "position": 1, "duration_formatted": "60:00"}]}}"#).unwrap();

        let cfg = config(out.path());
        let pipeline = Pipeline::new(&cfg, &JsonTracklistSource, &SymphoniaProbe, "RUN_TEST".to_string());
        let outcome = pipeline.run_pair(&PairingItem {
            pair_id: "2222".to_string(),
            document: doc,
            archive: None,
        });

        assert!(outcome.failed());
        assert!(matches!(outcome.result, Err(CueCheckError::Tracklist(_))));
        assert_eq!(outcome.audit.count("pair_failed"), 1);
        assert!(out.path().join("RUN_TEST/2222/events.jsonl").is_file());
    }

    #[test]
    fn test_append_events() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("run.log");
        let mut audit = AuditLog::new();
        audit.record("a", Severity::Info, json!({}));
        let outcomes = vec![PairOutcome {
            pair_id: "1".to_string(),
            result: Ok(ComparisonResult {
                pair_id: "1".to_string(),
                per_side: vec![],
            }),
            audit,
        }];

        append_events(&log_path, "RUN_X", &outcomes).unwrap();
        append_events(&log_path, "RUN_Y", &outcomes).unwrap();
        let text = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
