//! Per-message handling for a viewer connection
//!
//! [`StreamMonitor`] owns the running statistics and the console. The
//! connection loop feeds it one text frame at a time; it never fails; a
//! bad message is reported and the connection carries on.

use crate::console::Console;
use crate::frame::FramePayload;
use crate::protocol::{InboundMessage, VideoFrame};
use crate::stats::{FrameTiming, RunningStats, Summary};
use std::io::{self, Write};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Everything reported for one `video_frame` message
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Sender side frame number
    pub frame_number: i64,
    /// Count and instantaneous FPS after this frame
    pub timing: FrameTiming,
    /// Decode outcome
    pub payload: FramePayload,
    /// Aggregate, present on every summary interval
    pub summary: Option<Summary>,
}

/// What a single inbound text frame turned out to be
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Not JSON; nothing counted
    Malformed,
    /// A video frame went through the frame pipeline
    Frame(FrameReport),
    /// Any other message, identified by its `type`
    Message(String),
}

/// Viewer side frame monitor
#[derive(Debug)]
pub struct StreamMonitor<W: Write = io::Stdout> {
    stats: RunningStats,
    console: Console<W>,
}

impl StreamMonitor<io::Stdout> {
    /// Monitor reporting to standard output
    #[must_use]
    pub fn new(summary_interval: u64) -> Self {
        Self::with_console(summary_interval, Console::stdout())
    }
}

impl<W: Write> StreamMonitor<W> {
    /// Monitor reporting to a custom console
    pub fn with_console(summary_interval: u64, console: Console<W>) -> Self {
        Self {
            stats: RunningStats::new(summary_interval),
            console,
        }
    }

    /// Statistics so far
    pub fn stats(&self) -> &RunningStats {
        &self.stats
    }

    /// Console used for reporting
    pub fn console(&mut self) -> &mut Console<W> {
        &mut self.console
    }

    /// Consume the monitor, returning its console
    pub fn into_console(self) -> Console<W> {
        self.console
    }

    /// Handle an inbound text frame received now
    pub fn handle_text(&mut self, text: &str) -> Dispatch {
        self.handle_text_at(text, Instant::now())
    }

    /// Handle an inbound text frame received at `now`
    pub fn handle_text_at(&mut self, text: &str, now: Instant) -> Dispatch {
        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                debug!("Dropping malformed message ({} bytes): {}", text.len(), e);
                let result = self.console.parse_error(&e);
                report_write(result);
                return Dispatch::Malformed;
            }
        };

        let result = match &message {
            InboundMessage::VideoFrame(frame) => {
                return Dispatch::Frame(self.handle_frame(frame, now));
            }
            InboundMessage::Welcome(welcome) => self.console.welcome(welcome),
            InboundMessage::ViewerJoined(joined) => self.console.viewer_joined(joined),
            InboundMessage::StreamStarted(started) => self.console.stream_started(started),
            InboundMessage::StreamStopped(stopped) => self.console.stream_stopped(stopped),
            InboundMessage::Other(_) => self.console.other(message.kind()),
        };
        report_write(result);

        Dispatch::Message(message.kind().to_string())
    }

    /// Run the frame pipeline for one `video_frame`
    fn handle_frame(&mut self, frame: &VideoFrame, now: Instant) -> FrameReport {
        let timing = self.stats.record_frame(now);

        if let Some(latency_ms) = frame.timestamp.and_then(transit_ms) {
            debug!(
                "Frame #{} transit time {:.0}ms",
                frame.frame_number, latency_ms
            );
        }

        let payload = FramePayload::inspect(frame.frame_data.as_deref());
        if let FramePayload::DecodeError { error, .. } = &payload {
            warn!("Frame #{} failed to decode: {}", frame.frame_number, error);
        }

        let result = self.console.frame(frame.frame_number, timing.fps, &payload);
        report_write(result);

        let summary = self.stats.summary_due(now);
        if let Some(summary) = &summary {
            let result = self.console.summary(summary);
            report_write(result);
        }

        FrameReport {
            frame_number: frame.frame_number,
            timing,
            payload,
            summary,
        }
    }
}

/// Milliseconds between a sender timestamp and the local wall clock
#[allow(clippy::cast_precision_loss)]
fn transit_ms(sent_ms: f64) -> Option<f64> {
    let now_ms = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_millis() as f64;
    let transit = now_ms - sent_ms;
    (transit >= 0.0).then_some(transit)
}

fn report_write(result: io::Result<()>) {
    if let Err(e) = result {
        warn!("Failed to write console output: {}", e);
    }
}
