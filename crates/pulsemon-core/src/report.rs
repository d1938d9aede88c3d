//! HTML report generation
//!
//! Renders a printable ECG report: patient details, observed interval
//! values against their reference ranges, per-lead waveform images two
//! per page, and a fixed conclusion/disclaimer block.

use crate::metrics::{
    IntervalMetrics, HR_RANGE, PR_RANGE, QRS_RANGE, QTC_RANGE, QT_RANGE, ST_RANGE,
};
use crate::types::Lead;
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Patient identity block printed at the top of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientDetails {
    pub first_name: String,
    pub last_name: String,
    pub age: String,
    pub gender: String,
}

/// Inputs for one report
#[derive(Debug, Clone)]
pub struct ReportInput {
    pub test_name: String,
    pub date_time: String,
    pub patient: PatientDetails,
    pub metrics: IntervalMetrics,
    /// Waveform image per lead; missing or nonexistent paths are skipped
    pub lead_images: HashMap<Lead, PathBuf>,
}

/// Render the report to an HTML string
pub fn render_html(input: &ReportInput) -> String {
    let mut html = String::with_capacity(8 * 1024);

    html.push_str(&format!(
        r#"<html>
<head>
<style>
    body {{ font-family: 'Segoe UI', Arial, Helvetica, sans-serif; background: #f7f7f7; color: #222; margin: 0; padding: 0; }}
    .header-bar {{ background: linear-gradient(90deg, #2453ff 0%, #ff6600 100%); padding: 32px 0 18px 0; text-align: center; border-radius: 0 0 32px 32px; }}
    .header-bar h1 {{ margin: 0; font-size: 2.6em; letter-spacing: 2px; font-weight: bold; }}
    .header-bar h3 {{ margin: 10px 0 0 0; font-weight: normal; font-size: 1.2em; }}
    .first-section {{ background: #fffbe7; margin: 36px auto 0 auto; border-radius: 24px; max-width: 820px; padding: 38px 48px; }}
    .section-title {{ color: #2453ff; font-size: 1.5em; font-weight: bold; margin-bottom: 22px; border-bottom: 2px solid #ff6600; padding-bottom: 8px; }}
    .patient-table, .metrics-table {{ width: 100%; border-collapse: collapse; margin: 0 0 28px 0; background: #fff; }}
    .patient-table th, .metrics-table th {{ background: #2453ff; color: #fff; padding: 12px 10px; font-weight: bold; }}
    .patient-table td, .metrics-table td {{ padding: 12px 10px; border-bottom: 1px solid #eee; text-align: center; }}
    .page-break {{ page-break-after: always; }}
    .lead-block {{ margin: 0 auto 20px auto; max-width: 700px; background: #fff; border-radius: 14px; padding: 18px; text-align: center; }}
    .lead-label {{ font-weight: bold; color: #2453ff; margin-bottom: 3px; }}
    .lead-img {{ border: 2.5px solid #2453ff; border-radius: 12px; background: #fff; max-width: 95%; }}
    .conclusion-title, .recommendations-title {{ color: #ff6600; font-weight: bold; margin-bottom: 8px; text-decoration: underline; }}
    .disclaimer {{ margin-top: 24px; color: #888; background: #fffbe7; border-radius: 8px; padding: 10px 18px; border-left: 4px solid #ff6600; }}
</style>
</head>
<body>
    <div class="header-bar">
        <h1>{}</h1>
        <h3>Date: {}</h3>
    </div>
    <div class="first-section">
        <div class="section-title">Patient Details</div>
        <table class="patient-table">
            <tr><th>First Name</th><th>Last Name</th><th>Age</th><th>Gender</th></tr>
            <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>
        </table>
        <div class="section-title">Observed Values</div>
        <table class="metrics-table">
            <tr><th>Parameter</th><th>Observed</th><th>Standard Range</th></tr>
"#,
        escape(&input.test_name),
        escape(&input.date_time),
        escape(&input.patient.first_name),
        escape(&input.patient.last_name),
        escape(&input.patient.age),
        escape(&input.patient.gender),
    ));

    let m = &input.metrics;
    for (range, value) in [
        (HR_RANGE, m.hr),
        (PR_RANGE, m.pr),
        (QRS_RANGE, m.qrs),
        (QT_RANGE, m.qt),
        (QTC_RANGE, m.qtc),
        (ST_RANGE, m.st),
    ] {
        html.push_str(&format!(
            "            <tr><td>{}</td><td>{} {}</td><td>{}</td></tr>\n",
            range.name,
            value,
            range.unit,
            range.describe()
        ));
    }
    let axis = match m.qrs_axis {
        Some(axis) => format!("{}", axis),
        None => "Not Available".to_string(),
    };
    html.push_str(&format!(
        "            <tr><td>QRS Axis</td><td>{}</td><td>Typically -30&deg; to +90&deg;</td></tr>\n",
        axis
    ));

    html.push_str(
        r#"        </table>
    </div>
    <div class="page-break"></div>
"#,
    );

    // Lead graphs, two per page. Pairing follows fixed standard-order
    // positions; a missing image leaves a gap instead of reflowing the
    // later pages.
    if !input.lead_images.is_empty() {
        for pair in Lead::all().chunks(2) {
            html.push_str("    <div>\n");
            for lead in pair {
                if let Some(path) = input.lead_images.get(lead).filter(|p| p.exists()) {
                    html.push_str(&format!(
                        r#"        <div class="lead-block">
            <div class="lead-label">{}</div>
            <img src="{}" class="lead-img" alt="{} Graph" height="200" width="500">
        </div>
"#,
                        lead.as_str(),
                        path.display(),
                        lead.as_str()
                    ));
                }
            }
            html.push_str("    </div>\n    <div class=\"page-break\"></div>\n");
        }
    }

    html.push_str(
        r#"    <div class="section">
        <div class="conclusion">
            <div class="conclusion-title">Conclusion</div>
            <div>This ECG report is generated automatically. Please consult your physician for a detailed diagnosis.</div>
            <div class="recommendations">
                <div class="recommendations-title">Recommendations</div>
                <ul>
                    <li>Consult your physician for a detailed diagnosis.</li>
                    <li>Repeat ECG if symptoms persist or worsen.</li>
                    <li>Maintain a healthy lifestyle and regular checkups.</li>
                </ul>
            </div>
            <div class="disclaimer">
                Disclaimer: This ECG report is an interpretation of electrical parameters and may vary over time. <b>PLEASE CONSULT YOUR PHYSICIAN FOR DIAGNOSIS.</b>
            </div>
        </div>
    </div>
</body>
</html>
"#,
    );

    html
}

/// Render and write the report to `path`
pub fn write_report(input: &ReportInput, path: &Path) -> Result<()> {
    let html = render_html(input);
    std::fs::write(path, html)
        .map_err(|e| Error::Report(format!("failed to write {}: {}", path.display(), e)))?;
    Ok(())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> ReportInput {
        ReportInput {
            test_name: "12 Lead ECG Test".to_string(),
            date_time: "2024-11-25 09:30".to_string(),
            patient: PatientDetails {
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                age: "42".to_string(),
                gender: "F".to_string(),
            },
            metrics: IntervalMetrics::from_strings(
                "72", "160", "90", "400", "410", "100", None,
            ),
            lead_images: HashMap::new(),
        }
    }

    #[test]
    fn test_report_contains_patient_and_test() {
        let html = render_html(&sample_input());

        assert!(html.contains("12 Lead ECG Test"));
        assert!(html.contains("2024-11-25 09:30"));
        assert!(html.contains("<td>Jane</td>"));
        assert!(html.contains("<td>Doe</td>"));
    }

    #[test]
    fn test_report_metric_rows_with_ranges() {
        let html = render_html(&sample_input());

        assert!(html.contains("<td>Heart Rate</td><td>72 bpm</td><td>60 - 100 bpm</td>"));
        assert!(html.contains("<td>PR Interval</td><td>160 ms</td><td>120 - 200 ms</td>"));
        assert!(html.contains("<td>ST Segment</td><td>100 ms</td><td>80 - 120 ms</td>"));
    }

    #[test]
    fn test_missing_axis_prints_not_available() {
        let html = render_html(&sample_input());
        assert!(html.contains("Not Available"));

        let mut input = sample_input();
        input.metrics.qrs_axis = Some(45.0);
        let html = render_html(&input);
        assert!(!html.contains("Not Available"));
        assert!(html.contains("<td>QRS Axis</td><td>45</td>"));
    }

    #[test]
    fn test_no_images_no_graph_pages() {
        let html = render_html(&sample_input());

        assert!(!html.contains("<img"));
        // Only the break after the metrics section
        assert_eq!(html.matches("page-break\"></div>").count(), 1);
    }

    #[test]
    fn test_missing_image_file_skipped() {
        let mut input = sample_input();
        input
            .lead_images
            .insert(Lead::I, PathBuf::from("/nonexistent/lead_I.png"));

        let html = render_html(&input);
        assert!(!html.contains("lead_I.png"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_present_images_paired_by_position() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = sample_input();
        for lead in [Lead::I, Lead::II, Lead::III] {
            let path = dir.path().join(format!("lead_{}.png", lead.as_str()));
            std::fs::write(&path, b"png").unwrap();
            input.lead_images.insert(lead, path);
        }

        let html = render_html(&input);
        assert_eq!(html.matches("<img").count(), 3);
        // One graph page per standard-order pair plus the metrics break
        assert_eq!(html.matches("page-break\"></div>").count(), 7);
    }

    #[test]
    fn test_missing_middle_image_keeps_pairings() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = sample_input();
        // II has no image; I and III must stay on their own pages
        for lead in [Lead::I, Lead::III] {
            let path = dir.path().join(format!("lead_{}.png", lead.as_str()));
            std::fs::write(&path, b"png").unwrap();
            input.lead_images.insert(lead, path);
        }

        let html = render_html(&input);
        let i_pos = html.find("alt=\"I Graph\"").unwrap();
        let iii_pos = html.find("alt=\"III Graph\"").unwrap();
        let between = &html[i_pos..iii_pos];
        assert!(between.contains("page-break"));
    }

    #[test]
    fn test_conclusion_block_always_present() {
        let html = render_html(&sample_input());

        assert!(html.contains("Conclusion"));
        assert!(html.contains("Recommendations"));
        assert!(html.contains("PLEASE CONSULT YOUR PHYSICIAN FOR DIAGNOSIS."));
    }

    #[test]
    fn test_patient_fields_escaped() {
        let mut input = sample_input();
        input.patient.first_name = "<script>".to_string();

        let html = render_html(&input);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");

        write_report(&sample_input(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<html>"));
        assert!(content.trim_end().ends_with("</html>"));
    }
}
