//! Interval metrics for reports
//!
//! Observed values supplied by the measuring device or the operator;
//! this module does not detect beats. Ranges match the printed report:
//! HR 60-100 bpm, PR 120-200 ms, QRS 70-120 ms, QT 300-450 ms,
//! QTc 300-450 ms, ST 80-120 ms, QRS axis -30..+90 degrees.

use serde::{Deserialize, Serialize};

/// Inclusive reference range for one metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRange {
    pub name: &'static str,
    pub low: f64,
    pub high: f64,
    pub unit: &'static str,
}

impl MetricRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    pub fn describe(&self) -> String {
        format!("{} - {} {}", self.low, self.high, self.unit)
    }
}

pub const HR_RANGE: MetricRange = MetricRange {
    name: "Heart Rate",
    low: 60.0,
    high: 100.0,
    unit: "bpm",
};
pub const PR_RANGE: MetricRange = MetricRange {
    name: "PR Interval",
    low: 120.0,
    high: 200.0,
    unit: "ms",
};
pub const QRS_RANGE: MetricRange = MetricRange {
    name: "QRS Complex",
    low: 70.0,
    high: 120.0,
    unit: "ms",
};
pub const QT_RANGE: MetricRange = MetricRange {
    name: "QT Interval",
    low: 300.0,
    high: 450.0,
    unit: "ms",
};
pub const QTC_RANGE: MetricRange = MetricRange {
    name: "QTc Interval",
    low: 300.0,
    high: 450.0,
    unit: "ms",
};
pub const ST_RANGE: MetricRange = MetricRange {
    name: "ST Segment",
    low: 80.0,
    high: 120.0,
    unit: "ms",
};
pub const QRS_AXIS_RANGE: MetricRange = MetricRange {
    name: "QRS Axis",
    low: -30.0,
    high: 90.0,
    unit: "deg",
};

/// Observed interval values for one test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalMetrics {
    pub hr: f64,
    pub pr: f64,
    pub qrs: f64,
    pub qt: f64,
    pub qtc: f64,
    pub st: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qrs_axis: Option<f64>,
}

impl IntervalMetrics {
    /// Build from raw string inputs; non-numeric values become 0.0
    pub fn from_strings(
        hr: &str,
        pr: &str,
        qrs: &str,
        qt: &str,
        qtc: &str,
        st: &str,
        qrs_axis: Option<&str>,
    ) -> Self {
        Self {
            hr: lenient_f64(hr),
            pr: lenient_f64(pr),
            qrs: lenient_f64(qrs),
            qt: lenient_f64(qt),
            qtc: lenient_f64(qtc),
            st: lenient_f64(st),
            qrs_axis: qrs_axis.map(lenient_f64),
        }
    }

    /// Metrics outside their reference range, by display name
    pub fn out_of_range(&self) -> Vec<&'static str> {
        let mut flagged = Vec::new();
        for (range, value) in [
            (HR_RANGE, self.hr),
            (PR_RANGE, self.pr),
            (QRS_RANGE, self.qrs),
            (QT_RANGE, self.qt),
            (QTC_RANGE, self.qtc),
            (ST_RANGE, self.st),
        ] {
            if !range.contains(value) {
                flagged.push(range.name);
            }
        }
        if let Some(axis) = self.qrs_axis {
            if !QRS_AXIS_RANGE.contains(axis) {
                flagged.push(QRS_AXIS_RANGE.name);
            }
        }
        flagged
    }

    /// True when every supplied metric is within range
    pub fn all_in_range(&self) -> bool {
        self.out_of_range().is_empty()
    }
}

/// Lenient numeric intake: anything unparseable becomes 0.0
pub fn lenient_f64(value: &str) -> f64 {
    value.trim().parse().unwrap_or(0.0)
}
