//! Human readable console report
//!
//! Lines are prefixed with a local `[HH:MM:SS]` stamp where a timestamp is
//! useful. The format is for people, not parsers.

use crate::frame::{FramePayload, JpegSignature};
use crate::protocol::{StreamStarted, StreamStopped, ViewerJoined, Welcome};
use crate::stats::Summary;
use std::fmt::Display;
use std::io::{self, Write};

/// Current local time as `HH:MM:SS`
#[must_use]
pub fn clock() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Line oriented report writer
#[derive(Debug)]
pub struct Console<W: Write> {
    out: W,
}

impl Console<io::Stdout> {
    /// Console writing to standard output
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Console<W> {
    /// Wrap a writer
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Borrow the underlying writer
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Unwrap the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    fn stamped(&mut self, text: impl Display) -> io::Result<()> {
        self.line(format_args!("[{}] {}", clock(), text))
    }

    /// Startup banner
    pub fn banner(&mut self, endpoint: &str) -> io::Result<()> {
        self.line("Starting WebSocket video stream test...")?;
        self.line(format_args!("Endpoint: {endpoint}"))?;
        self.line("Press Ctrl+C to stop\n")
    }

    /// Socket open
    pub fn connected(&mut self, endpoint: &str) -> io::Result<()> {
        self.stamped(format_args!("WebSocket connection established to: {endpoint}"))
    }

    /// Join request sent
    pub fn join_sent(&mut self, client_id: &str) -> io::Result<()> {
        self.stamped(format_args!("Sent viewer join request as {client_id}"))
    }

    /// Inbound `welcome`
    pub fn welcome(&mut self, welcome: &Welcome) -> io::Result<()> {
        match &welcome.client_id {
            Some(id) => self.line(format_args!(
                "Received welcome message: {} (assigned id {id})",
                welcome.message
            )),
            None => self.line(format_args!("Received welcome message: {}", welcome.message)),
        }
    }

    /// Inbound `viewer_joined`
    pub fn viewer_joined(&mut self, joined: &ViewerJoined) -> io::Result<()> {
        match joined.viewer_count {
            Some(count) => self.line(format_args!(
                "Joined as viewer, stream active: {} ({count} viewers)",
                joined.is_streaming
            )),
            None => self.line(format_args!(
                "Joined as viewer, stream active: {}",
                joined.is_streaming
            )),
        }
    }

    /// Inbound `stream_started`
    pub fn stream_started(&mut self, started: &StreamStarted) -> io::Result<()> {
        let info = &started.stream_info;
        self.stamped(format_args!(
            "Stream started by {} ({} @ {} fps, {})",
            started.streamer_id.as_deref().unwrap_or("unknown"),
            info.resolution.as_deref().unwrap_or("?"),
            info.fps.map_or_else(|| "?".to_string(), |fps| fps.to_string()),
            info.codec.as_deref().unwrap_or("?"),
        ))
    }

    /// Inbound `stream_stopped`
    pub fn stream_stopped(&mut self, stopped: &StreamStopped) -> io::Result<()> {
        self.stamped(format_args!(
            "Stream stopped by {}",
            stopped.streamer_id.as_deref().unwrap_or("unknown")
        ))
    }

    /// Inbound message with an unrecognized `type`
    pub fn other(&mut self, kind: &str) -> io::Result<()> {
        self.line(format_args!("Other message type: {kind}"))
    }

    /// Text frame that is not JSON
    pub fn parse_error(&mut self, error: &serde_json::Error) -> io::Result<()> {
        self.line(format_args!("JSON parse error: {error}"))
    }

    /// Binary frame, which the stream never sends
    pub fn binary(&mut self, len: usize) -> io::Result<()> {
        self.line(format_args!("Ignoring binary message ({len} bytes)"))
    }

    /// Per-frame diagnostics
    pub fn frame(&mut self, frame_number: i64, fps: f64, payload: &FramePayload) -> io::Result<()> {
        match payload {
            FramePayload::Empty => {
                self.stamped(format_args!("Frame #{frame_number} - empty data"))
            }
            FramePayload::DecodeError { error, .. } => self.stamped(format_args!(
                "Frame #{frame_number} - Base64 decode error: {error}"
            )),
            FramePayload::Decoded(decoded) => {
                self.stamped(format_args!(
                    "Frame #{frame_number} | FPS: {fps:.1} | Base64 length: {} | Decoded size: {} bytes | JPEG header: {}",
                    decoded.base64_len,
                    decoded.len(),
                    decoded.header().as_deref().unwrap_or("N/A"),
                ))?;

                match decoded.signature() {
                    JpegSignature::Valid => self.line("  \u{2713} Valid JPEG data"),
                    JpegSignature::Invalid(header) => {
                        self.line(format_args!("  \u{2717} Invalid JPEG data, header: {header}"))
                    }
                    JpegSignature::TooShort => Ok(()),
                }
            }
        }
    }

    /// Periodic aggregate block
    pub fn summary(&mut self, summary: &Summary) -> io::Result<()> {
        self.line("\n=== Statistics ===")?;
        self.line(format_args!("Total frames: {}", summary.frame_count))?;
        self.line(format_args!("Elapsed: {:.1}s", summary.elapsed.as_secs_f64()))?;
        self.line(format_args!("Average FPS: {:.1}", summary.average_fps))?;
        self.line("==================\n")
    }

    /// Transport failure
    pub fn transport_error(&mut self, error: impl Display) -> io::Result<()> {
        self.line(format_args!("WebSocket error: {error}"))
    }

    /// Connection closed by the peer or the stream ended
    pub fn closed(&mut self, code: Option<u16>, reason: Option<&str>) -> io::Result<()> {
        self.line(format_args!(
            "WebSocket connection closed. Status code: {}, message: {}",
            code.map_or_else(|| "None".to_string(), |c| c.to_string()),
            reason.filter(|r| !r.is_empty()).unwrap_or("None"),
        ))
    }

    /// User interrupt
    pub fn interrupted(&mut self) -> io::Result<()> {
        self.line("\nTest stopped by user")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::DecodedFrame;
    use std::time::Duration;

    fn render(f: impl FnOnce(&mut Console<Vec<u8>>) -> io::Result<()>) -> String {
        let mut console = Console::new(Vec::new());
        f(&mut console).unwrap();
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn test_clock_format() {
        let stamp = clock();
        assert_eq!(stamp.len(), 8);
        assert_eq!(stamp.as_bytes()[2], b':');
        assert_eq!(stamp.as_bytes()[5], b':');
    }

    #[test]
    fn test_decoded_frame_line() {
        let payload = FramePayload::Decoded(DecodedFrame {
            base64_len: 12,
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46],
        });
        let out = render(|c| c.frame(42, 24.96, &payload));

        assert!(out.contains("Frame #42 | FPS: 25.0 | Base64 length: 12 | Decoded size: 8 bytes | JPEG header: ffd8ffe0"));
        assert!(out.contains("Valid JPEG data"));
        assert!(out.starts_with('['));
    }

    #[test]
    fn test_invalid_frame_line() {
        let payload = FramePayload::Decoded(DecodedFrame {
            base64_len: 8,
            bytes: vec![0x00, 0x00, 0x12, 0x34],
        });
        let out = render(|c| c.frame(1, 0.0, &payload));
        assert!(out.contains("Invalid JPEG data, header: 00001234"));
    }

    #[test]
    fn test_short_frame_reports_na_without_signature_line() {
        let payload = FramePayload::Decoded(DecodedFrame {
            base64_len: 4,
            bytes: vec![0xFF, 0xD8, 0xFF],
        });
        let out = render(|c| c.frame(3, 0.0, &payload));
        assert!(out.contains("JPEG header: N/A"));
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn test_empty_and_error_lines() {
        let out = render(|c| c.frame(5, 0.0, &FramePayload::Empty));
        assert!(out.contains("Frame #5 - empty data"));

        let payload = FramePayload::DecodeError {
            base64_len: 18,
            error: "Invalid symbol 45, offset 3.".to_string(),
        };
        let out = render(|c| c.frame(6, 0.0, &payload));
        assert!(out.contains("Frame #6 - Base64 decode error: Invalid symbol 45, offset 3."));
    }

    #[test]
    fn test_summary_block() {
        let summary = Summary {
            frame_count: 100,
            elapsed: Duration::from_millis(4000),
            average_fps: 25.0,
        };
        let out = render(|c| c.summary(&summary));
        assert!(out.contains("Total frames: 100"));
        assert!(out.contains("Elapsed: 4.0s"));
        assert!(out.contains("Average FPS: 25.0"));
    }

    #[test]
    fn test_closed_line() {
        let out = render(|c| c.closed(Some(1000), Some("bye")));
        assert!(out.contains("Status code: 1000, message: bye"));

        let out = render(|c| c.closed(None, None));
        assert!(out.contains("Status code: None, message: None"));
    }

    #[test]
    fn test_welcome_and_viewer_lines() {
        let out = render(|c| {
            c.welcome(&Welcome {
                message: "hi".to_string(),
                client_id: None,
            })
        });
        assert!(out.contains("Received welcome message: hi"));

        let out = render(|c| {
            c.viewer_joined(&ViewerJoined {
                is_streaming: true,
                viewer_count: Some(2),
            })
        });
        assert!(out.contains("stream active: true (2 viewers)"));
    }
}
