//! Fixed-width text tables

use crate::model::{BatchSummary, ComparisonResult};
use crate::report::BatchRow;
use std::io::{self, Write};

pub fn render_batch(rows: &[BatchRow], summary: &BatchSummary) -> String {
    let head = format!(
        "{:<16} {:>5} {:>4} {:>5} {:>5} {:>12}",
        "PAIR_ID", "SIDES", "OK", "WARN", "FAIL", "WORST_DELTA"
    );
    let rule = "-".repeat(head.len());

    let mut lines = vec![head, rule.clone()];
    for r in rows {
        lines.push(format!(
            "{:<16} {:>5} {:>4} {:>5} {:>5} {:>12}",
            r.pair_id, r.sides_total, r.ok, r.warn, r.fail, r.worst_delta
        ));
    }
    lines.push(rule);
    lines.push(format!(
        "{:<16} {:>5} {:>4} {:>5} {:>5} {:>12}",
        "TOTALS", summary.sides_total, summary.ok, summary.warn, summary.fail, ""
    ));
    lines.join("\n")
}

pub fn write_sides<W: Write>(writer: &mut W, result: &ComparisonResult) -> io::Result<()> {
    writeln!(
        writer,
        "{:<5} {:>10} {:>10} {:>8} {:<6} {}",
        "SIDE", "REFERENCE", "AUDIO", "DELTA", "STATUS", "REASON"
    )?;
    for it in &result.per_side {
        writeln!(
            writer,
            "{:<5} {:>10} {:>10} {:>+8} {:<6} {}",
            it.side.to_string(),
            it.reference_total_sec,
            it.audio_total_sec,
            it.delta_sec,
            it.status.to_string(),
            it.reason.map(|r| r.to_string()).unwrap_or_default()
        )?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_table_shape() {
        let rows = vec![BatchRow {
            pair_id: "123456".to_string(),
            sides_total: 2,
            ok: 2,
            warn: 0,
            fail: 0,
            worst_delta: 1,
        }];
        let summary = BatchSummary {
            pairs_total: 1,
            sides_total: 2,
            ok: 2,
            warn: 0,
            fail: 0,
        };
        let table = render_batch(&rows, &summary);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("PAIR_ID"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(lines[2].starts_with("123456"));
        assert!(lines[4].starts_with("TOTALS"));
        assert_eq!(lines[0].len(), lines[2].len());
    }

    #[test]
    fn test_empty_batch_table() {
        let table = render_batch(&[], &BatchSummary::default());
        assert_eq!(table.lines().count(), 4);
    }
}
