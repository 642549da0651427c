//! Inventory of the WAVs delivered for one release
//!
//! An audio delivery is one of:
//!
//! - a `.zip` archive (every entry ending in `.wav`, any case)
//! - a single `.wav` file
//! - a directory tree of `.wav` files
//!
//! Entries are read in sorted name order so the inventory is stable. An entry
//! that cannot be read or probed is left out of the inventory and audited;
//! only a missing or corrupt archive is an error.

use super::DurationProbe;
use crate::audit::{AuditSink, Severity};
use crate::error::AudioError;
use crate::model::AudioItem;
use serde_json::json;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use walkdir::WalkDir;
use zip::ZipArchive;

pub fn inventory_archive(
    path: &Path,
    probe: &dyn DurationProbe,
    sink: &mut dyn AuditSink,
) -> Result<Vec<AudioItem>, AudioError> {
    if !path.exists() {
        return Err(AudioError::NotFound(path.to_path_buf()));
    }

    sink.record(
        "wav_analysis_start",
        Severity::Info,
        json!({"source": path.display().to_string()}),
    );

    let items = if path.is_dir() {
        inventory_dir(path, probe, sink)
    } else if has_extension(path, "zip") {
        inventory_zip(path, probe, sink)?
    } else if has_extension(path, "wav") {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut items = Vec::new();
        let bytes = std::fs::read(path)?;
        push_member(&name, probe.duration_secs(&bytes), &mut items, sink);
        items
    } else {
        return Err(AudioError::Unsupported(path.to_path_buf()));
    };

    if items.is_empty() {
        sink.record(
            "no_wavs_in_archive",
            Severity::Warn,
            json!({"source": path.display().to_string()}),
        );
    }
    Ok(items)
}

fn inventory_zip(
    path: &Path,
    probe: &dyn DurationProbe,
    sink: &mut dyn AuditSink,
) -> Result<Vec<AudioItem>, AudioError> {
    let mut archive = ZipArchive::new(File::open(path)?)?;

    let mut members: Vec<String> = archive
        .file_names()
        .filter(|name| !name.ends_with('/') && name.to_ascii_lowercase().ends_with(".wav"))
        .map(str::to_string)
        .collect();
    members.sort();

    let mut items = Vec::with_capacity(members.len());
    for member in members {
        let bytes = match read_member(&mut archive, &member) {
            Ok(bytes) => bytes,
            Err(e) => {
                sink.record(
                    "wav_missing",
                    Severity::Warn,
                    json!({"member": member, "reason": e.to_string()}),
                );
                continue;
            }
        };
        push_member(&member, probe.duration_secs(&bytes), &mut items, sink);
    }
    Ok(items)
}

fn read_member<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>, AudioError> {
    let mut file = archive.by_name(name)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn inventory_dir(root: &Path, probe: &dyn DurationProbe, sink: &mut dyn AuditSink) -> Vec<AudioItem> {
    let mut files: Vec<_> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && has_extension(e.path(), "wav"))
        .map(|e| e.into_path())
        .collect();
    files.sort();

    let mut items = Vec::with_capacity(files.len());
    for file in files {
        let name = file
            .strip_prefix(root)
            .unwrap_or(&file)
            .to_string_lossy()
            .replace('\\', "/");
        match std::fs::read(&file) {
            Ok(bytes) => push_member(&name, probe.duration_secs(&bytes), &mut items, sink),
            Err(e) => sink.record(
                "wav_missing",
                Severity::Warn,
                json!({"member": name, "reason": e.to_string()}),
            ),
        }
    }
    items
}

fn push_member(
    name: &str,
    duration: Result<f64, AudioError>,
    items: &mut Vec<AudioItem>,
    sink: &mut dyn AuditSink,
) {
    match duration {
        Ok(secs) => {
            let item = AudioItem::from_file(name, secs);
            if item.side.is_none() && item.position.is_none() {
                sink.record(
                    "unparseable_name",
                    Severity::Warn,
                    json!({"filename": name}),
                );
            }
            items.push(item);
        }
        Err(e) => sink.record(
            "wav_corrupt",
            Severity::Warn,
            json!({"member": name, "reason": e.to_string()}),
        ),
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::tests::wav_bytes;
    use crate::audio::SymphoniaProbe;
    use crate::audit::AuditLog;
    use crate::model::Side;
    use std::io::Write;
    use zip::write::FileOptions;

    fn write_zip(path: &Path, entries: &[(&str, Vec<u8>)]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, bytes) in entries {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_zip_inventory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("123456.zip");
        write_zip(
            &path,
            &[
                ("A2.wav", wav_bytes(8000, 1, 3.0)),
                ("A1.WAV", wav_bytes(8000, 1, 2.0)),
                ("notes.txt", b"hello".to_vec()),
                ("broken.wav", b"garbage".to_vec()),
                ("mystery.wav", wav_bytes(8000, 1, 1.0)),
            ],
        );

        let mut log = AuditLog::new();
        let items = inventory_archive(&path, &SymphoniaProbe, &mut log).unwrap();

        let names: Vec<&str> = items.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(names, vec!["A1.WAV", "A2.wav", "mystery.wav"]);
        assert_eq!(items[0].side, Side::new('A'));
        assert_eq!(items[0].position, Some(1));
        assert!((items[1].duration_sec - 3.0).abs() < 1e-6);
        assert_eq!(log.count("wav_corrupt"), 1);
        assert_eq!(log.count("unparseable_name"), 1);
    }

    #[test]
    fn test_empty_zip_is_audited() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.zip");
        write_zip(&path, &[("readme.txt", b"no audio".to_vec())]);

        let mut log = AuditLog::new();
        let items = inventory_archive(&path, &SymphoniaProbe, &mut log).unwrap();
        assert!(items.is_empty());
        assert_eq!(log.count("no_wavs_in_archive"), 1);
    }

    #[test]
    fn test_corrupt_zip_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.zip");
        std::fs::write(&path, b"PK not really").unwrap();

        let mut log = AuditLog::new();
        let err = inventory_archive(&path, &SymphoniaProbe, &mut log).unwrap_err();
        assert!(matches!(err, AudioError::Zip(_)));
    }

    #[test]
    fn test_missing_archive() {
        let mut log = AuditLog::new();
        let err = inventory_archive(Path::new("/nonexistent/cuecheck/1.zip"), &SymphoniaProbe, &mut log)
            .unwrap_err();
        assert!(matches!(err, AudioError::NotFound(_)));
    }

    #[test]
    fn test_single_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Side B.wav");
        std::fs::write(&path, wav_bytes(8000, 2, 4.0)).unwrap();

        let mut log = AuditLog::new();
        let items = inventory_archive(&path, &SymphoniaProbe, &mut log).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].side, Side::new('B'));
        assert_eq!(items[0].position, None);
    }

    #[test]
    fn test_directory_inventory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("side_a")).unwrap();
        std::fs::write(dir.path().join("side_a/A1.wav"), wav_bytes(8000, 1, 1.0)).unwrap();
        std::fs::write(dir.path().join("B1.wav"), wav_bytes(8000, 1, 2.0)).unwrap();
        std::fs::write(dir.path().join("cover.jpg"), b"jpeg").unwrap();

        let mut log = AuditLog::new();
        let items = inventory_archive(dir.path(), &SymphoniaProbe, &mut log).unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(names, vec!["B1.wav", "side_a/A1.wav"]);
        assert_eq!(items[1].position, Some(1));
    }

    #[test]
    fn test_unsupported_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.flac");
        std::fs::write(&path, b"x").unwrap();

        let mut log = AuditLog::new();
        let err = inventory_archive(&path, &SymphoniaProbe, &mut log).unwrap_err();
        assert!(matches!(err, AudioError::Unsupported(_)));
    }
}
