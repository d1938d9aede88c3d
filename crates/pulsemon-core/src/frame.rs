//! Serial wire format
//!
//! The acquisition board streams ASCII lines. A multi-lead frame is
//! 8 whitespace-separated integers in device channel order:
//! `[I, V4, V5, II, V3, V6, V1, V2]`. The remaining four limb leads
//! are derived from leads I and II. In live-monitoring mode the board
//! sends one bare integer per line instead.

use crate::types::Lead;
use crate::{Error, Result};

/// Number of physical channels per frame
pub const FRAME_CHANNELS: usize = 8;

/// Raw 8-channel frame as sent by the device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFrame {
    pub lead_i: i32,
    pub v4: i32,
    pub v5: i32,
    pub lead_ii: i32,
    pub v3: i32,
    pub v6: i32,
    pub v1: i32,
    pub v2: i32,
}

impl RawFrame {
    /// Parse one serial line into a raw frame
    ///
    /// Lines with the wrong number of fields are rejected with
    /// `Error::Frame` so the caller can count them as dropped rather
    /// than abort acquisition.
    pub fn parse(line: &str) -> Result<Self> {
        let values = line
            .split_whitespace()
            .map(|x| {
                x.parse::<i32>()
                    .map_err(|e| Error::Parse(format!("bad channel value '{}': {}", x, e)))
            })
            .collect::<Result<Vec<i32>>>()?;

        if values.len() != FRAME_CHANNELS {
            return Err(Error::Frame(format!(
                "expected {} channels, got {}",
                FRAME_CHANNELS,
                values.len()
            )));
        }

        Ok(Self {
            lead_i: values[0],
            v4: values[1],
            v5: values[2],
            lead_ii: values[3],
            v3: values[4],
            v6: values[5],
            v1: values[6],
            v2: values[7],
        })
    }

    /// Derive the full 12-lead frame
    ///
    /// III = II - I, aVR = -(I + II)/2, aVL = (I - III)/2,
    /// aVF = (II + III)/2.
    pub fn derive(&self) -> LeadFrame {
        let lead1 = self.lead_i as f64;
        let lead2 = self.lead_ii as f64;
        let lead3 = lead2 - lead1;
        let avr = -(lead1 + lead2) / 2.0;
        let avl = (lead1 - lead3) / 2.0;
        let avf = (lead2 + lead3) / 2.0;

        LeadFrame {
            values: [
                lead1,
                lead2,
                lead3,
                avr,
                avl,
                avf,
                self.v1 as f64,
                self.v2 as f64,
                self.v3 as f64,
                self.v4 as f64,
                self.v5 as f64,
                self.v6 as f64,
            ],
        }
    }
}

/// One sample across all 12 leads, indexed in `Lead::all()` order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeadFrame {
    values: [f64; 12],
}

impl LeadFrame {
    pub fn get(&self, lead: Lead) -> f64 {
        let idx = match lead {
            Lead::I => 0,
            Lead::II => 1,
            Lead::III => 2,
            Lead::AVR => 3,
            Lead::AVL => 4,
            Lead::AVF => 5,
            Lead::V1 => 6,
            Lead::V2 => 7,
            Lead::V3 => 8,
            Lead::V4 => 9,
            Lead::V5 => 10,
            Lead::V6 => 11,
        };
        self.values[idx]
    }

    pub fn values(&self) -> &[f64; 12] {
        &self.values
    }
}

/// Parse a live-monitoring line: a run of ASCII digits
///
/// The board pads single-channel output; only the last three digits
/// carry the sample value.
pub fn parse_single_value(line: &str) -> Option<i32> {
    let line = line.trim();
    if line.is_empty() || !line.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let start = line.len().saturating_sub(3);
    line[start..].parse::<i32>().ok()
}
