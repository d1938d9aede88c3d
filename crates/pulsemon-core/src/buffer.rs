//! Rolling sample windows
//!
//! Every view in the application works on a bounded trailing window of
//! samples per lead, baseline-centered by subtracting the window mean.

use crate::frame::LeadFrame;
use crate::types::{Lead, TestMode};
use std::collections::HashMap;
use std::collections::VecDeque;

/// Default window length for the grid views
pub const DEFAULT_BUFFER_SIZE: usize = 80;

/// Window length for the sequential single-lead view
pub const SEQUENTIAL_BUFFER_SIZE: usize = 500;

/// Point budget for the mini-graph downsampling
pub const MINI_VIEW_POINTS: usize = 60;

/// Fixed-capacity rolling window of samples for one lead
#[derive(Debug, Clone)]
pub struct LeadBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl LeadBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when full
    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples in arrival order
    pub fn samples(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Samples with the window mean removed (baseline centering)
    pub fn centered(&self) -> Vec<f64> {
        let mean = self.mean();
        self.samples.iter().map(|s| s - mean).collect()
    }

    /// Index-spaced reduction to at most `n` points for mini views
    pub fn downsample(&self, n: usize) -> Vec<f64> {
        let data = self.samples();
        if n == 0 || data.len() <= n {
            return data;
        }
        let last = (data.len() - 1) as f64;
        (0..n)
            .map(|i| {
                let idx = (i as f64 * last / (n - 1) as f64).round() as usize;
                data[idx]
            })
            .collect()
    }

    /// Successive-sample pairs (x[n], x[n+1]) over centered data
    ///
    /// Source data for the Lorenz (Poincare) scatter. Empty when the
    /// window has fewer than two samples.
    pub fn lorenz_pairs(&self) -> Vec<(f64, f64)> {
        let centered = self.centered();
        if centered.len() < 2 {
            return Vec::new();
        }
        centered
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .collect()
    }

    pub fn min(&self) -> Option<f64> {
        self.samples.iter().copied().fold(None, |acc, s| match acc {
            None => Some(s),
            Some(m) => Some(m.min(s)),
        })
    }

    pub fn max(&self) -> Option<f64> {
        self.samples.iter().copied().fold(None, |acc, s| match acc {
            None => Some(s),
            Some(m) => Some(m.max(s)),
        })
    }
}

/// One rolling window per lead of a test mode
#[derive(Debug, Clone)]
pub struct LeadBufferSet {
    mode: TestMode,
    buffers: HashMap<Lead, LeadBuffer>,
    order: Vec<Lead>,
    capacity: usize,
}

impl LeadBufferSet {
    pub fn new(mode: TestMode, capacity: usize) -> Self {
        let order = mode.leads();
        let buffers = order
            .iter()
            .map(|lead| (*lead, LeadBuffer::new(capacity)))
            .collect();
        Self {
            mode,
            buffers,
            order,
            capacity,
        }
    }

    pub fn mode(&self) -> TestMode {
        self.mode
    }

    /// Window length shared by every lead in the set
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Leads in this set, in mode order
    pub fn leads(&self) -> &[Lead] {
        &self.order
    }

    /// Fan a decoded frame out to every lead in the mode
    pub fn push_frame(&mut self, frame: &LeadFrame) {
        for lead in &self.order {
            if let Some(buf) = self.buffers.get_mut(lead) {
                buf.push(frame.get(*lead));
            }
        }
    }

    /// Push a bare sample into a single lead (live-monitoring mode)
    pub fn push_sample(&mut self, lead: Lead, value: f64) {
        if let Some(buf) = self.buffers.get_mut(&lead) {
            buf.push(value);
        }
    }

    pub fn buffer(&self, lead: Lead) -> Option<&LeadBuffer> {
        self.buffers.get(&lead)
    }
}
