use chrono::Utc;
use pulsemon_core::error::{Error, Result};
use pulsemon_core::frame::{parse_single_value, RawFrame};
use pulsemon_core::store::live::{LiveLeadFile, LiveSnapshot};
use pulsemon_core::{AcquisitionStats, Lead, LeadBufferSet, SampleSource, TestMode};
use tracing::{debug, info, warn};

/// Result of one session tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was accepted into the buffers
    Frame,
    /// Nothing arrived before the read timeout
    Idle,
    /// A line arrived but was rejected
    Dropped,
}

/// One acquisition run over a `SampleSource`
///
/// Owns the source, the per-lead buffers and the statistics counters,
/// and periodically publishes the Lead II window to the live file.
pub struct AcquisitionSession {
    source: Box<dyn SampleSource>,
    buffers: LeadBufferSet,
    stats: AcquisitionStats,
    live: LiveLeadFile,

    // Live file cadence
    write_every_frames: u64,

    // Read-error budget
    max_consecutive_errors: u32,
    consecutive_errors: u32,

    sample_rate_hz: Option<f64>,
}

impl AcquisitionSession {
    pub fn new(
        source: Box<dyn SampleSource>,
        mode: TestMode,
        buffer_capacity: usize,
        live: LiveLeadFile,
        write_every_frames: u64,
        max_consecutive_errors: u32,
    ) -> Self {
        Self {
            source,
            buffers: LeadBufferSet::new(mode, buffer_capacity),
            stats: AcquisitionStats::new(),
            live,
            write_every_frames: write_every_frames.max(1),
            max_consecutive_errors: max_consecutive_errors.max(1),
            consecutive_errors: 0,
            sample_rate_hz: None,
        }
    }

    /// Declared sample rate published in live snapshots
    pub fn set_sample_rate_hz(&mut self, rate: f64) {
        self.sample_rate_hz = Some(rate);
    }

    pub fn buffers(&self) -> &LeadBufferSet {
        &self.buffers
    }

    pub fn stats(&self) -> &AcquisitionStats {
        &self.stats
    }

    pub fn is_running(&self) -> bool {
        self.source.is_running()
    }

    /// Send the start command and begin streaming
    pub fn start(&mut self) -> Result<()> {
        self.source.start()?;
        info!("Acquisition started ({})", self.buffers.mode().title());
        Ok(())
    }

    /// Best-effort shutdown after a fatal read error
    ///
    /// The stop command and the final live write go over the same
    /// links that just failed, so their errors are logged rather than
    /// propagated over the original failure.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Stop command failed during shutdown: {}", e);
        }
        if let Err(e) = self.publish_live() {
            warn!("Final live write failed during shutdown: {}", e);
        }
    }

    /// Send the stop command
    pub fn stop(&mut self) -> Result<()> {
        self.source.stop()?;
        info!(
            "Acquisition stopped: {} frames, {} dropped, {} parse errors",
            self.stats.frames_received, self.stats.frames_dropped, self.stats.parse_errors
        );
        Ok(())
    }

    /// Read and process one line from the source
    ///
    /// A timeout is not an error. Read failures consume the
    /// consecutive-error budget; once it is spent the error is
    /// returned and the caller should stop the session.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        let line = match self.source.read_line() {
            Ok(line) => line,
            Err(e) => {
                self.consecutive_errors += 1;
                if self.consecutive_errors >= self.max_consecutive_errors {
                    return Err(Error::Serial(format!(
                        "{} consecutive read failures, last: {}",
                        self.consecutive_errors, e
                    )));
                }
                warn!(
                    "Read failed ({}/{}): {}",
                    self.consecutive_errors, self.max_consecutive_errors, e
                );
                return Ok(TickOutcome::Idle);
            }
        };

        let line = match line {
            Some(line) => line,
            None => return Ok(TickOutcome::Idle),
        };
        self.consecutive_errors = 0;

        // Live monitoring boards emit one value per line
        if self.buffers.mode() == TestMode::LiveMonitoring {
            if let Some(value) = parse_single_value(&line) {
                self.buffers.push_sample(Lead::II, value as f64);
                self.record_accepted()?;
                return Ok(TickOutcome::Frame);
            }
        }

        let frame = match RawFrame::parse(&line) {
            Ok(frame) => frame,
            Err(Error::Frame(msg)) => {
                self.stats.record_drop();
                debug!("Dropped frame: {}", msg);
                return Ok(TickOutcome::Dropped);
            }
            Err(e) => {
                self.stats.record_parse_error();
                debug!("Unparseable line '{}': {}", line, e);
                return Ok(TickOutcome::Dropped);
            }
        };

        self.buffers.push_frame(&frame.derive());
        self.record_accepted()?;
        Ok(TickOutcome::Frame)
    }

    fn record_accepted(&mut self) -> Result<()> {
        self.stats.record_frame(Utc::now().timestamp() as u64);

        if self.stats.frames_received % self.write_every_frames == 0 {
            self.publish_live()?;
        }
        Ok(())
    }

    /// Write the current Lead II window to the live file
    pub fn publish_live(&mut self) -> Result<()> {
        let samples = match self.buffers.buffer(Lead::II) {
            Some(buffer) => buffer.samples(),
            None => return Ok(()),
        };

        let snapshot = LiveSnapshot::new(Lead::II, samples, self.sample_rate_hz);
        self.live.write(&snapshot)?;
        self.stats.record_live_write();
        debug!(
            "Live file updated: {} samples at {}",
            snapshot.samples.len(),
            snapshot.updated_at
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    // ===== Test source =====

    /// Scripted source replaying a fixed sequence of read results
    struct ScriptedSource {
        lines: VecDeque<Result<Option<String>>>,
        running: bool,
    }

    impl ScriptedSource {
        fn new(lines: Vec<Result<Option<String>>>) -> Self {
            Self {
                lines: lines.into(),
                running: false,
            }
        }
    }

    impl SampleSource for ScriptedSource {
        fn start(&mut self) -> Result<()> {
            self.running = true;
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            self.running = false;
            Ok(())
        }

        fn read_line(&mut self) -> Result<Option<String>> {
            self.lines.pop_front().unwrap_or(Ok(None))
        }

        fn is_running(&self) -> bool {
            self.running
        }
    }

    fn session_with(
        mode: TestMode,
        lines: Vec<Result<Option<String>>>,
        dir: &tempfile::TempDir,
    ) -> AcquisitionSession {
        AcquisitionSession::new(
            Box::new(ScriptedSource::new(lines)),
            mode,
            80,
            LiveLeadFile::new(dir.path().join("lead_ii_live.json")),
            2,
            3,
        )
    }

    // ===== Frame handling =====

    #[test]
    fn test_accepted_frame_fills_buffers() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(
            TestMode::TwelveLead,
            vec![Ok(Some("100 40 50 200 30 60 10 20".to_string()))],
            &dir,
        );
        session.start().unwrap();

        assert_eq!(session.tick().unwrap(), TickOutcome::Frame);
        assert_eq!(session.stats().frames_received, 1);

        let ii = session.buffers().buffer(Lead::II).unwrap();
        assert_eq!(ii.samples(), vec![200.0]);
        // III = II - I
        let iii = session.buffers().buffer(Lead::III).unwrap();
        assert_eq!(iii.samples(), vec![100.0]);
    }

    #[test]
    fn test_timeout_is_idle_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(TestMode::TwelveLead, vec![Ok(None), Ok(None)], &dir);
        session.start().unwrap();

        assert_eq!(session.tick().unwrap(), TickOutcome::Idle);
        assert_eq!(session.tick().unwrap(), TickOutcome::Idle);
        assert_eq!(session.stats().frames_received, 0);
        assert_eq!(session.stats().parse_errors, 0);
    }

    #[test]
    fn test_wrong_arity_dropped_and_counted() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(
            TestMode::TwelveLead,
            vec![Ok(Some("1 2 3".to_string()))],
            &dir,
        );
        session.start().unwrap();

        assert_eq!(session.tick().unwrap(), TickOutcome::Dropped);
        assert_eq!(session.stats().frames_dropped, 1);
        assert_eq!(session.stats().parse_errors, 0);
    }

    #[test]
    fn test_garbage_counts_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(
            TestMode::TwelveLead,
            vec![Ok(Some("a b c d e f g h".to_string()))],
            &dir,
        );
        session.start().unwrap();

        assert_eq!(session.tick().unwrap(), TickOutcome::Dropped);
        assert_eq!(session.stats().parse_errors, 1);
        assert_eq!(session.stats().frames_dropped, 0);
    }

    // ===== Error budget =====

    #[test]
    fn test_read_errors_consume_budget() {
        let dir = tempfile::tempdir().unwrap();
        let lines = vec![
            Err(Error::Serial("boom".to_string())),
            Err(Error::Serial("boom".to_string())),
            Err(Error::Serial("boom".to_string())),
        ];
        let mut session = session_with(TestMode::TwelveLead, lines, &dir);
        session.start().unwrap();

        // Budget of 3: two tolerated, the third is fatal
        assert_eq!(session.tick().unwrap(), TickOutcome::Idle);
        assert_eq!(session.tick().unwrap(), TickOutcome::Idle);
        assert!(session.tick().is_err());
    }

    #[test]
    fn test_good_frame_resets_budget() {
        let dir = tempfile::tempdir().unwrap();
        let lines = vec![
            Err(Error::Serial("boom".to_string())),
            Err(Error::Serial("boom".to_string())),
            Ok(Some("100 40 50 200 30 60 10 20".to_string())),
            Err(Error::Serial("boom".to_string())),
        ];
        let mut session = session_with(TestMode::TwelveLead, lines, &dir);
        session.start().unwrap();

        session.tick().unwrap();
        session.tick().unwrap();
        assert_eq!(session.tick().unwrap(), TickOutcome::Frame);
        // Counter restarted, so this one is tolerated again
        assert_eq!(session.tick().unwrap(), TickOutcome::Idle);
    }

    // ===== Live file =====

    #[test]
    fn test_live_file_written_on_cadence() {
        let dir = tempfile::tempdir().unwrap();
        let frame = "100 40 50 200 30 60 10 20".to_string();
        let lines = (0..4).map(|_| Ok(Some(frame.clone()))).collect();
        let mut session = session_with(TestMode::TwelveLead, lines, &dir);
        session.start().unwrap();

        for _ in 0..4 {
            session.tick().unwrap();
        }

        // Cadence of 2 frames: writes after frames 2 and 4
        assert_eq!(session.stats().live_writes, 2);
        let live = LiveLeadFile::new(dir.path().join("lead_ii_live.json"));
        let snapshot = live.read().unwrap().expect("live file should exist");
        assert_eq!(snapshot.lead, Lead::II);
        assert_eq!(snapshot.samples.len(), 4);
    }

    #[test]
    fn test_publish_live_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(
            TestMode::TwelveLead,
            vec![Ok(Some("100 40 50 200 30 60 10 20".to_string()))],
            &dir,
        );
        session.set_sample_rate_hz(100.0);
        session.start().unwrap();
        session.tick().unwrap();

        session.publish_live().unwrap();

        let live = LiveLeadFile::new(dir.path().join("lead_ii_live.json"));
        let snapshot = live.read().unwrap().unwrap();
        assert_eq!(snapshot.sample_rate_hz, Some(100.0));
    }

    // ===== Live monitoring mode =====

    #[test]
    fn test_live_monitoring_single_values() {
        let dir = tempfile::tempdir().unwrap();
        let lines = vec![
            Ok(Some("1712".to_string())),
            Ok(Some("945".to_string())),
            Ok(Some("not a number".to_string())),
        ];
        let mut session = session_with(TestMode::LiveMonitoring, lines, &dir);
        session.start().unwrap();

        assert_eq!(session.tick().unwrap(), TickOutcome::Frame);
        assert_eq!(session.tick().unwrap(), TickOutcome::Frame);
        assert_eq!(session.tick().unwrap(), TickOutcome::Dropped);

        let ii = session.buffers().buffer(Lead::II).unwrap();
        // Long readings keep only their last three digits
        assert_eq!(ii.samples(), vec![712.0, 945.0]);
    }

    #[test]
    fn test_twelve_lead_ignores_single_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(
            TestMode::TwelveLead,
            vec![Ok(Some("945".to_string()))],
            &dir,
        );
        session.start().unwrap();

        // A lone value is a short frame in grid modes
        assert_eq!(session.tick().unwrap(), TickOutcome::Dropped);
        assert_eq!(session.stats().frames_dropped, 1);
    }

    /// Source whose stop command always fails, like a vanished port
    struct DeadPortSource;

    impl SampleSource for DeadPortSource {
        fn start(&mut self) -> Result<()> {
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            Err(Error::Serial("device disconnected".to_string()))
        }

        fn read_line(&mut self) -> Result<Option<String>> {
            Err(Error::Serial("device disconnected".to_string()))
        }

        fn is_running(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_shutdown_swallows_stop_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = AcquisitionSession::new(
            Box::new(DeadPortSource),
            TestMode::TwelveLead,
            80,
            LiveLeadFile::new(dir.path().join("lead_ii_live.json")),
            2,
            1,
        );
        session.start().unwrap();

        // Budget of 1: the first read failure is fatal
        assert!(session.tick().is_err());

        // Shutdown must not panic or propagate the failing stop, and
        // still leaves the final window on disk
        session.shutdown();
        let live = LiveLeadFile::new(dir.path().join("lead_ii_live.json"));
        assert!(live.read().unwrap().is_some());
    }

    #[test]
    fn test_stop_reports_counts() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(
            TestMode::TwelveLead,
            vec![Ok(Some("100 40 50 200 30 60 10 20".to_string()))],
            &dir,
        );
        session.start().unwrap();
        assert!(session.is_running());

        session.tick().unwrap();
        session.stop().unwrap();
        assert!(!session.is_running());
    }
}
