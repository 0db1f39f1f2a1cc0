//! Viewer connection loop
//!
//! Connects to the stream endpoint, joins as a viewer and feeds every
//! inbound text frame to a [`StreamMonitor`], one at a time.
//!
//! ```text
//! ┌──────────────┐  join_viewer   ┌──────────────────┐
//! │ ViewerClient │───────────────▶│ /video-stream    │
//! │              │◀───────────────│ (WebSocket)      │
//! └──────┬───────┘  video_frame   └──────────────────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │StreamMonitor │  decode, validate, count, report
//! └──────────────┘
//! ```
//!
//! There is no reconnection. The loop ends when the server closes the
//! socket, the transport fails, or the shutdown future resolves (Ctrl+C in
//! the binary), in which case a normal close frame is sent first.
//!
//! ## Example
//!
//! ```no_run
//! use stream_monitor::{MonitorConfig, StreamMonitor, ViewerClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MonitorConfig::new("ws://192.168.56.1:5000/video-stream");
//! let client = ViewerClient::new(config)?;
//! let mut monitor = StreamMonitor::new(client.config().summary_interval);
//!
//! let shutdown = client.run(&mut monitor).await?;
//! println!("Stopped: {shutdown:?} after {} frames", monitor.stats().frame_count());
//! # Ok(())
//! # }
//! ```

use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::monitor::StreamMonitor;
use crate::protocol::JoinRequest;
use futures_util::{Sink, SinkExt, StreamExt};
use std::future::Future;
use std::io::Write;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};

/// How long to wait for the server to acknowledge our close frame
const CLOSE_ACK_TIMEOUT: Duration = Duration::from_secs(3);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why the connection loop ended without a transport error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shutdown {
    /// Local interrupt; a close frame was sent
    Interrupted,
    /// The server closed the connection
    Closed {
        /// Close status code, if the server sent one
        code: Option<u16>,
        /// Close reason, if the server sent one
        reason: Option<String>,
    },
}

/// Single connection WebSocket viewer
#[derive(Debug, Clone)]
pub struct ViewerClient {
    config: MonitorConfig,
}

impl ViewerClient {
    /// Create a client after validating the configuration
    pub fn new(config: MonitorConfig) -> Result<Self> {
        config.validate()?;
        info!("Creating viewer client for {}", config.endpoint);
        Ok(Self { config })
    }

    /// Client configuration
    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run until the server closes, the transport fails or Ctrl+C is pressed
    pub async fn run<W: Write>(&self, monitor: &mut StreamMonitor<W>) -> Result<Shutdown> {
        self.run_until(monitor, ctrl_c()).await
    }

    /// Run until the server closes, the transport fails or `shutdown` resolves
    pub async fn run_until<W, F>(&self, monitor: &mut StreamMonitor<W>, shutdown: F) -> Result<Shutdown>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let endpoint = self.config.endpoint.as_str();

        let socket = tokio::select! {
            biased;

            () = &mut shutdown => {
                info!("Interrupted before connection to {} was established", endpoint);
                report(monitor.console().interrupted());
                return Ok(Shutdown::Interrupted);
            }
            socket = self.connect() => match socket {
                Ok(socket) => socket,
                Err(e) => {
                    error!("Failed to connect to {}: {}", endpoint, e);
                    report(monitor.console().transport_error(&e));
                    return Err(e);
                }
            },
        };

        info!("Connected to {}", endpoint);
        report(monitor.console().connected(endpoint));

        let (mut sender, mut receiver) = socket.split();

        let join = JoinRequest::new(
            self.config.join_type.as_str(),
            &self.config.client_id_prefix,
            unix_seconds(),
        );
        if let Err(e) = send_json(&mut sender, &join).await {
            error!("Failed to send join request: {}", e);
            report(monitor.console().transport_error(&e));
            return Err(e);
        }
        debug!("Join request sent as {}", join.client_id);
        report(monitor.console().join_sent(&join.client_id));

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!("Shutdown requested, closing connection");
                    report(monitor.console().interrupted());
                    close_gracefully(&mut sender, &mut receiver).await;
                    return Ok(Shutdown::Interrupted);
                }
                msg = receiver.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        trace!("Received text frame ({} bytes)", text.len());
                        monitor.handle_text(text.as_str());
                    }
                    Some(Ok(Message::Binary(data))) => {
                        debug!("Received binary frame ({} bytes)", data.len());
                        report(monitor.console().binary(data.len()));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = match frame {
                            Some(frame) => (
                                Some(u16::from(frame.code)),
                                Some(frame.reason.as_str().to_string()),
                            ),
                            None => (None, None),
                        };
                        info!("Server closed connection (code: {:?}, reason: {:?})", code, reason);
                        report(monitor.console().closed(code, reason.as_deref()));

                        // Flush the close reply queued by tungstenite
                        if let Err(e) = sender.close().await {
                            debug!("Error completing close handshake: {}", e);
                        }
                        return Ok(Shutdown::Closed { code, reason });
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        report(monitor.console().transport_error(&e));
                        return Err(e.into());
                    }
                    None => {
                        info!("Connection stream ended");
                        report(monitor.console().closed(None, None));
                        return Ok(Shutdown::Closed { code: None, reason: None });
                    }
                },
            }
        }
    }

    /// Open the WebSocket, bounded by the configured handshake timeout
    async fn connect(&self) -> Result<Socket> {
        let endpoint = self.config.endpoint.as_str();
        debug!("Connecting to {}", endpoint);

        let handshake = connect_async(endpoint);
        let (socket, response) = match self.config.connect_timeout() {
            Some(limit) => tokio::time::timeout(limit, handshake)
                .await
                .map_err(|_| MonitorError::ConnectTimeout(endpoint.to_string()))??,
            None => handshake.await?,
        };

        debug!("Handshake complete (HTTP {})", response.status());
        Ok(socket)
    }
}

/// Send a normal close frame and wait briefly for the server's reply
async fn close_gracefully<S, R>(sender: &mut S, receiver: &mut R)
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
    R: futures_util::Stream<Item = std::result::Result<Message, tungstenite::Error>> + Unpin,
{
    let frame = CloseFrame {
        code: CloseCode::Normal,
        reason: "viewer stopped".into(),
    };
    if let Err(e) = sender.send(Message::Close(Some(frame))).await {
        warn!("Failed to send close frame: {}", e);
        return;
    }

    let drain = async {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    };
    if tokio::time::timeout(CLOSE_ACK_TIMEOUT, drain).await.is_err() {
        warn!("Server did not acknowledge close within {:?}", CLOSE_ACK_TIMEOUT);
    }
}

/// Serialize and send a JSON text frame
async fn send_json<S, T>(sender: &mut S, msg: &T) -> Result<()>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
    T: serde::Serialize,
{
    let json = serde_json::to_string(msg)?;
    sender.send(Message::Text(json.into())).await?;
    Ok(())
}

/// Resolves on Ctrl+C; never resolves if the handler cannot be installed
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn report(result: std::io::Result<()>) {
    if let Err(e) = result {
        warn!("Failed to write console output: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_rejects_invalid_config() {
        let config = MonitorConfig::new("http://localhost/video-stream");
        assert!(matches!(
            ViewerClient::new(config),
            Err(MonitorError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_unix_seconds_is_recent() {
        // 2023-11-14
        assert!(unix_seconds() > 1_700_000_000);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ViewerClient::new(MonitorConfig::new(format!("ws://{addr}/video-stream")))
            .unwrap();
        let mut monitor = StreamMonitor::with_console(100, crate::Console::new(Vec::new()));

        let result = client.run_until(&mut monitor, std::future::pending()).await;
        assert!(matches!(result, Err(MonitorError::Transport(_))));
    }

    #[tokio::test]
    async fn test_shutdown_before_connect() {
        let client = ViewerClient::new(MonitorConfig::default()).unwrap();
        let mut monitor = StreamMonitor::with_console(100, crate::Console::new(Vec::new()));

        let result = client.run_until(&mut monitor, async {}).await.unwrap();
        assert_eq!(result, Shutdown::Interrupted);
    }
}
