//! Running frame statistics
//!
//! Timestamps are passed in by the caller so the bookkeeping can be driven
//! deterministically from tests.

use std::time::{Duration, Instant};

/// Default number of frames between summaries
pub const DEFAULT_SUMMARY_INTERVAL: u64 = 100;

/// Timing of a single recorded frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    /// Frame count including this frame
    pub frame_count: u64,
    /// Instantaneous FPS from the gap to the previous frame, `0` for the first
    pub fps: f64,
}

/// Aggregate emitted every summary interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Frames received so far
    pub frame_count: u64,
    /// Time since the first frame
    pub elapsed: Duration,
    /// `frame_count / elapsed`, `0` when no time has passed
    pub average_fps: f64,
}

/// Frame counters for one monitor session
#[derive(Debug, Clone)]
pub struct RunningStats {
    frame_count: u64,
    start_time: Option<Instant>,
    last_frame_time: Option<Instant>,
    summary_interval: u64,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new(DEFAULT_SUMMARY_INTERVAL)
    }
}

impl RunningStats {
    /// Create empty statistics emitting a summary every `summary_interval` frames
    #[must_use]
    pub fn new(summary_interval: u64) -> Self {
        Self {
            frame_count: 0,
            start_time: None,
            last_frame_time: None,
            summary_interval: summary_interval.max(1),
        }
    }

    /// Record a frame received at `now`
    ///
    /// FPS is computed against the previous frame time before it is replaced.
    pub fn record_frame(&mut self, now: Instant) -> FrameTiming {
        self.frame_count += 1;
        if self.start_time.is_none() {
            self.start_time = Some(now);
        }

        let fps = self
            .last_frame_time
            .map_or(0.0, |last| rate(1, now.saturating_duration_since(last)));
        self.last_frame_time = Some(now);

        FrameTiming {
            frame_count: self.frame_count,
            fps,
        }
    }

    /// Summary for the current frame count, if it falls on the interval
    #[must_use]
    pub fn summary_due(&self, now: Instant) -> Option<Summary> {
        if self.frame_count == 0 || self.frame_count % self.summary_interval != 0 {
            return None;
        }
        Some(self.summary(now))
    }

    /// Summary of everything recorded so far
    #[must_use]
    pub fn summary(&self, now: Instant) -> Summary {
        let elapsed = self
            .start_time
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default();

        Summary {
            frame_count: self.frame_count,
            elapsed,
            average_fps: rate(self.frame_count, elapsed),
        }
    }

    /// Frames recorded so far
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Time of the first frame
    #[must_use]
    pub fn start_time(&self) -> Option<Instant> {
        self.start_time
    }

    /// Time of the most recent frame
    #[must_use]
    pub fn last_frame_time(&self) -> Option<Instant> {
        self.last_frame_time
    }

    /// Frames between summaries
    #[must_use]
    pub fn summary_interval(&self) -> u64 {
        self.summary_interval
    }
}

#[allow(clippy::cast_precision_loss)]
fn rate(frames: u64, over: Duration) -> f64 {
    let secs = over.as_secs_f64();
    if secs > 0.0 {
        frames as f64 / secs
    } else {
        0.0
    }
}
