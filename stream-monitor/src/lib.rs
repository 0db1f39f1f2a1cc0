//! Stream Monitor - Viewer Side Diagnostics for WebSocket Video Streams
//!
//! This crate connects to a `/video-stream` WebSocket endpoint as a viewer
//! and reports on every JPEG frame it receives, which makes it useful for
//! checking a camera broadcaster end to end without a browser.
//!
//! ## Architecture
//!
//! ### Connection
//! - One WebSocket connection, no reconnection
//! - A `join_viewer` request is sent as soon as the socket opens
//! - Frames are handled strictly in order on a single task
//!
//! ### Frame Pipeline
//! - Each `video_frame` is counted, even when its payload is broken
//! - The base64 payload is decoded after stripping a data URI header
//! - The first bytes are checked for the JPEG `FF D8` marker
//! - Instantaneous FPS per frame, average FPS every summary interval
//!
//! ## Usage Example
//!
//! ```no_run
//! use stream_monitor::{MonitorConfig, StreamMonitor, ViewerClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MonitorConfig::new("ws://192.168.56.1:5000/video-stream")
//!         .with_summary_interval(100);
//!
//!     let client = ViewerClient::new(config)?;
//!     let mut monitor = StreamMonitor::new(client.config().summary_interval);
//!
//!     // Runs until the server closes the socket or Ctrl+C is pressed
//!     client.run(&mut monitor).await?;
//!
//!     println!("Frames received: {}", monitor.stats().frame_count());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod connection;
pub mod console;
pub mod error;
pub mod frame;
pub mod monitor;
pub mod protocol;
pub mod stats;

pub use config::MonitorConfig;
pub use connection::{Shutdown, ViewerClient};
pub use console::Console;
pub use error::{MonitorError, Result};
pub use frame::{DecodedFrame, FramePayload, JpegSignature};
pub use monitor::{Dispatch, FrameReport, StreamMonitor};
pub use protocol::{InboundMessage, JoinRequest, VideoFrame};
pub use stats::{FrameTiming, RunningStats, Summary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
