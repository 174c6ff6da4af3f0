//! Comma-and-space separated outputs of the evaluation tools.

use super::EvaluationRecord;
use crate::angle::column_to_angle_deg;
use std::io::{self, Write};

pub const RECORD_HEADER: &str =
    "Grid X [cm], Grid Y [cm], Best heading [degrees], Angular error [degrees], Lowest difference";
pub const SNAPSHOT_INDEX_HEADER: &str = ", Best snapshot index";
pub const RIDF_HEADER: &str = "Rotation[pixels], Rotation [degrees], familiarity";

/// Writes one header line then one line per [`EvaluationRecord`].
pub struct RecordWriter<W: Write> {
    out: W,
    snapshot_column: bool,
}

impl<W: Write> RecordWriter<W> {
    /// Writes the header immediately. `snapshot_column` appends the
    /// best-snapshot-index column.
    pub fn new(mut out: W, snapshot_column: bool) -> io::Result<Self> {
        write!(out, "{RECORD_HEADER}")?;
        if snapshot_column {
            write!(out, "{SNAPSHOT_INDEX_HEADER}")?;
        }
        writeln!(out)?;
        Ok(Self {
            out,
            snapshot_column,
        })
    }

    pub fn write_record(&mut self, record: &EvaluationRecord) -> io::Result<()> {
        writeln!(self.out, "{}", format_record(record, self.snapshot_column))
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

pub fn format_record(record: &EvaluationRecord, snapshot_column: bool) -> String {
    let mut line = format!(
        "{}, {}, {}, {}, {}",
        record.grid_position.x,
        record.grid_position.y,
        record.best_heading_deg,
        record.angular_error_deg,
        record.lowest_difference
    );
    if snapshot_column {
        line.push_str(", ");
        if let Some(index) = record.snapshot_index {
            line.push_str(&index.to_string());
        }
    }
    line
}

/// Writes a RIDF as `column, rotation, value` lines.
pub fn write_ridf<W: Write>(mut out: W, ridf: &[f32]) -> io::Result<()> {
    writeln!(out, "{RIDF_HEADER}")?;
    for (column, value) in ridf.iter().enumerate() {
        writeln!(
            out,
            "{}, {}, {}",
            column,
            column_to_angle_deg(column, ridf.len()),
            value
        )?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn record(snapshot_index: Option<usize>) -> EvaluationRecord {
        EvaluationRecord {
            grid_position: Point2::new(120.0, 40.5),
            best_heading_deg: -45.0,
            angular_error_deg: 5.0,
            lowest_difference: 0.25,
            confidence: 0.75,
            snapshot_index,
        }
    }

    #[test]
    fn writes_header_and_lines() {
        let mut writer = RecordWriter::new(Vec::new(), true).unwrap();
        writer.write_record(&record(Some(7))).unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Grid X [cm], Grid Y [cm], Best heading [degrees], Angular error [degrees], Lowest difference, Best snapshot index"
        );
        assert_eq!(lines[1], "120, 40.5, -45, 5, 0.25, 7");
    }

    #[test]
    fn omits_snapshot_column_for_model_backends() {
        let mut writer = RecordWriter::new(Vec::new(), false).unwrap();
        writer.write_record(&record(None)).unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(text.lines().next(), Some(RECORD_HEADER));
        assert_eq!(text.lines().nth(1), Some("120, 40.5, -45, 5, 0.25"));
    }

    #[test]
    fn ridf_lines_use_signed_rotation() {
        let mut out = Vec::new();
        write_ridf(&mut out, &[0.5, 0.25, 1.0, 0.75]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], RIDF_HEADER);
        assert_eq!(lines[3], "2, 180, 1");
        assert_eq!(lines[4], "3, -90, 0.75");
    }
}
