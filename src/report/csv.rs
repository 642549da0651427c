//! CSV report output

use crate::error::ReportError;
use crate::model::{BatchSummary, ComparisonResult};
use crate::report::BatchRow;
use std::io::Write;

fn writer<W: Write>(inner: W) -> ::csv::Writer<W> {
    ::csv::WriterBuilder::new()
        .terminator(::csv::Terminator::CRLF)
        .from_writer(inner)
}

/// One row per side of a single pair
pub fn write_sides<W: Write>(inner: &mut W, result: &ComparisonResult) -> Result<(), ReportError> {
    let mut wtr = writer(inner);
    wtr.write_record(["side", "reference_total_sec", "audio_total_sec", "delta_sec", "status", "reason"])?;
    for it in &result.per_side {
        wtr.write_record([
            it.side.to_string(),
            it.reference_total_sec.to_string(),
            it.audio_total_sec.to_string(),
            it.delta_sec.to_string(),
            it.status.to_string(),
            it.reason.map(|r| r.to_string()).unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// One row per pair, a blank line, then a TOTALS row
pub fn write_batch<W: Write>(inner: &mut W, rows: &[BatchRow], summary: &BatchSummary) -> Result<(), ReportError> {
    {
        let mut wtr = writer(&mut *inner);
        wtr.write_record(["pair_id", "sides_total", "ok", "warn", "fail", "worst_delta"])?;
        for r in rows {
            wtr.write_record([
                r.pair_id.clone(),
                r.sides_total.to_string(),
                r.ok.to_string(),
                r.warn.to_string(),
                r.fail.to_string(),
                r.worst_delta.to_string(),
            ])?;
        }
        wtr.flush()?;
    }

    // Bare line terminator; the csv writer would emit `""` for an empty record
    inner.write_all(b"\r\n")?;

    let mut wtr = writer(&mut *inner);
    wtr.write_record([
        "TOTALS".to_string(),
        summary.sides_total.to_string(),
        summary.ok.to_string(),
        summary.warn.to_string(),
        summary.fail.to_string(),
        String::new(),
    ])?;
    wtr.flush()?;
    Ok(())
}
