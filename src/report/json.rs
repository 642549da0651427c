//! JSON report output

use crate::error::ReportError;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn write<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub fn write_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ReportError> {
    let mut file = BufWriter::new(File::create(path)?);
    write(&mut file, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AudioItem, MatchedRecord, Side};

    #[test]
    fn test_matched_records_round_trip_fields() {
        let side = Side::new('A').unwrap();
        let records = vec![MatchedRecord::side_consolidated(side, "Side A.wav".to_string(), 600.0)];

        let mut buf = Vec::new();
        write(&mut buf, &records).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value[0]["side"], "A");
        assert_eq!(value[0]["side_consolidated"], true);
        assert_eq!(value[0]["fully_matched"], false);
        assert!(value[0]["reference"].is_null());
        assert_eq!(value[0]["audio"]["duration_sec"], 600.0);
    }

    #[test]
    fn test_output_ends_with_newline() {
        let mut buf = Vec::new();
        write(&mut buf, &AudioItem::from_file("B3.wav", 1.5)).unwrap();
        assert_eq!(buf.last(), Some(&b'\n'));
    }
}
