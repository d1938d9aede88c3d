use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the twelve standard ECG leads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lead {
    I,
    II,
    III,
    #[serde(rename = "aVR")]
    AVR,
    #[serde(rename = "aVL")]
    AVL,
    #[serde(rename = "aVF")]
    AVF,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
}

impl Lead {
    /// All twelve leads in standard display order
    pub fn all() -> [Lead; 12] {
        [
            Lead::I,
            Lead::II,
            Lead::III,
            Lead::AVR,
            Lead::AVL,
            Lead::AVF,
            Lead::V1,
            Lead::V2,
            Lead::V3,
            Lead::V4,
            Lead::V5,
            Lead::V6,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lead::I => "I",
            Lead::II => "II",
            Lead::III => "III",
            Lead::AVR => "aVR",
            Lead::AVL => "aVL",
            Lead::AVF => "aVF",
            Lead::V1 => "V1",
            Lead::V2 => "V2",
            Lead::V3 => "V3",
            Lead::V4 => "V4",
            Lead::V5 => "V5",
            Lead::V6 => "V6",
        }
    }

    // Limb leads: I, II, III and the augmented leads
    pub fn is_limb(&self) -> bool {
        matches!(
            self,
            Lead::I | Lead::II | Lead::III | Lead::AVR | Lead::AVL | Lead::AVF
        )
    }

    // Precordial (chest) leads: V1-V6
    pub fn is_precordial(&self) -> bool {
        !self.is_limb()
    }
}

impl fmt::Display for Lead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lead {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "I" => Ok(Lead::I),
            "II" => Ok(Lead::II),
            "III" => Ok(Lead::III),
            "aVR" | "AVR" | "avr" => Ok(Lead::AVR),
            "aVL" | "AVL" | "avl" => Ok(Lead::AVL),
            "aVF" | "AVF" | "avf" => Ok(Lead::AVF),
            "V1" | "v1" => Ok(Lead::V1),
            "V2" | "v2" => Ok(Lead::V2),
            "V3" | "v3" => Ok(Lead::V3),
            "V4" | "v4" => Ok(Lead::V4),
            "V5" | "v5" => Ok(Lead::V5),
            "V6" | "v6" => Ok(Lead::V6),
            other => Err(crate::Error::Parse(format!("unknown lead: {}", other))),
        }
    }
}

/// ECG test catalogue
///
/// Each mode determines which leads are buffered and displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestMode {
    LeadII,
    LeadIII,
    SevenLead,
    TwelveLead,
    LiveMonitoring,
}

impl TestMode {
    /// Leads acquired in this mode
    pub fn leads(&self) -> Vec<Lead> {
        match self {
            // The named-lead tests still show the full 12-lead grid
            TestMode::LeadII | TestMode::LeadIII | TestMode::TwelveLead => Lead::all().to_vec(),
            TestMode::SevenLead => vec![
                Lead::V1,
                Lead::V2,
                Lead::V3,
                Lead::V4,
                Lead::V5,
                Lead::V6,
                Lead::II,
            ],
            TestMode::LiveMonitoring => vec![Lead::II],
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TestMode::LeadII => "Lead II ECG Test",
            TestMode::LeadIII => "Lead III ECG Test",
            TestMode::SevenLead => "7 Lead ECG Test",
            TestMode::TwelveLead => "12 Lead ECG Test",
            TestMode::LiveMonitoring => "ECG Live Monitoring",
        }
    }
}

impl FromStr for TestMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lead-ii" | "Lead II ECG Test" => Ok(TestMode::LeadII),
            "lead-iii" | "Lead III ECG Test" => Ok(TestMode::LeadIII),
            "seven-lead" | "7 Lead ECG Test" => Ok(TestMode::SevenLead),
            "twelve-lead" | "12 Lead ECG Test" => Ok(TestMode::TwelveLead),
            "live-monitoring" | "ECG Live Monitoring" => Ok(TestMode::LiveMonitoring),
            other => Err(crate::Error::Parse(format!("unknown test mode: {}", other))),
        }
    }
}

/// Acquisition statistics
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AcquisitionStats {
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub parse_errors: u64,
    pub live_writes: u64,
    pub last_frame_timestamp: u64,
}

impl AcquisitionStats {
    pub fn new() -> Self {
        Self::default()
    }

    // Record a decoded frame
    pub fn record_frame(&mut self, timestamp: u64) {
        self.frames_received += 1;
        self.last_frame_timestamp = timestamp;
    }

    // Record a line dropped for wrong arity
    pub fn record_drop(&mut self) {
        self.frames_dropped += 1;
    }

    // Record an unparseable line
    pub fn record_parse_error(&mut self) {
        self.parse_errors += 1;
    }

    // Record a live-file write
    pub fn record_live_write(&mut self) {
        self.live_writes += 1;
    }
}
