//! CSV export
//!
//! Row layout matches the desktop export: a `Sample` index column
//! followed by one column per lead, with blank cells where a lead has
//! fewer samples than the window length.

use crate::buffer::LeadBufferSet;
use crate::types::Lead;
use crate::{Error, Result};
use std::path::Path;

/// Export a buffer set to CSV at `path`
pub fn export_csv(set: &LeadBufferSet, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| Error::Export(format!("failed to create {}: {}", path.display(), e)))?;
    write_buffer_set(set, &mut writer)?;
    writer
        .flush()
        .map_err(|e| Error::Export(format!("failed to flush csv: {}", e)))?;
    Ok(())
}

/// Export a buffer set to a CSV string (used by tests and previews)
pub fn export_csv_string(set: &LeadBufferSet) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_buffer_set(set, &mut writer)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Export(format!("failed to finish csv: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Export(format!("csv is not utf-8: {}", e)))
}

/// Export a single-lead window (the live file contents) to CSV
pub fn export_lead_csv(lead: Lead, samples: &[f64], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| Error::Export(format!("failed to create {}: {}", path.display(), e)))?;

    writer
        .write_record(["Sample", lead.as_str()])
        .map_err(|e| Error::Export(format!("failed to write header: {}", e)))?;
    for (i, sample) in samples.iter().enumerate() {
        writer
            .write_record([i.to_string(), format_sample(*sample)])
            .map_err(|e| Error::Export(format!("failed to write row {}: {}", i, e)))?;
    }
    writer
        .flush()
        .map_err(|e| Error::Export(format!("failed to flush csv: {}", e)))?;
    Ok(())
}

fn write_buffer_set<W: std::io::Write>(
    set: &LeadBufferSet,
    writer: &mut csv::Writer<W>,
) -> Result<()> {
    let leads = set.leads();

    let mut header = vec!["Sample".to_string()];
    header.extend(leads.iter().map(|l| l.as_str().to_string()));
    writer
        .write_record(&header)
        .map_err(|e| Error::Export(format!("failed to write header: {}", e)))?;

    let columns: Vec<Vec<f64>> = leads
        .iter()
        .map(|lead| set.buffer(*lead).map(|b| b.samples()).unwrap_or_default())
        .collect();

    // One row per window slot, blank where a lead has fewer samples
    for i in 0..set.capacity() {
        let mut record = vec![i.to_string()];
        for column in &columns {
            match column.get(i) {
                Some(v) => record.push(format_sample(*v)),
                None => record.push(String::new()),
            }
        }
        writer
            .write_record(&record)
            .map_err(|e| Error::Export(format!("failed to write row {}: {}", i, e)))?;
    }
    Ok(())
}

// Integer-valued samples print without a trailing ".0"
fn format_sample(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::LeadBufferSet;
    use crate::frame::RawFrame;
    use crate::types::TestMode;

    fn filled_set(frames: usize) -> LeadBufferSet {
        let mut set = LeadBufferSet::new(TestMode::TwelveLead, 80);
        for i in 0..frames {
            let line = format!("{} 40 50 {} 30 60 10 20", i, i * 2);
            set.push_frame(&RawFrame::parse(&line).unwrap().derive());
        }
        set
    }

    #[test]
    fn test_header_columns() {
        let csv = export_csv_string(&filled_set(1)).unwrap();
        let header = csv.lines().next().unwrap();

        assert!(header.starts_with("Sample,I,II,III,aVR,aVL,aVF,"));
        assert!(header.ends_with("V1,V2,V3,V4,V5,V6"));
    }

    #[test]
    fn test_row_count_and_index() {
        let csv = export_csv_string(&filled_set(3)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        // Header + one row per window slot
        assert_eq!(lines.len(), 81);
        assert!(lines[1].starts_with("0,"));
        assert!(lines[3].starts_with("2,"));
    }

    #[test]
    fn test_rows_beyond_samples_are_blank() {
        let csv = export_csv_string(&filled_set(3)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        // Slot 3 onward has no samples yet: index plus 12 empty cells
        assert_eq!(lines[4], "3,,,,,,,,,,,,");
        assert_eq!(lines[80], "79,,,,,,,,,,,,");
    }

    #[test]
    fn test_derived_values_in_rows() {
        let csv = export_csv_string(&filled_set(2)).unwrap();
        let row: Vec<&str> = csv.lines().nth(2).unwrap().split(',').collect();

        // Row 1: I=1, II=2, III=1
        assert_eq!(row[0], "1");
        assert_eq!(row[1], "1");
        assert_eq!(row[2], "2");
        assert_eq!(row[3], "1");
    }

    #[test]
    fn test_empty_set() {
        let set = LeadBufferSet::new(TestMode::TwelveLead, 80);
        let csv = export_csv_string(&set).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        // Header plus 80 all-blank rows
        assert_eq!(lines.len(), 81);
        assert_eq!(lines[1], "0,,,,,,,,,,,,");
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ecg.csv");

        export_csv(&filled_set(5), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 81);
    }

    #[test]
    fn test_export_lead_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lead_ii.csv");

        export_lead_csv(Lead::II, &[512.0, 640.5, 480.0], &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "Sample,II");
        assert_eq!(lines[1], "0,512");
        assert_eq!(lines[2], "1,640.5");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_format_sample() {
        assert_eq!(format_sample(100.0), "100");
        assert_eq!(format_sample(-250.0), "-250");
        assert_eq!(format_sample(1.5), "1.5");
    }
}
