//! Wire messages exchanged with the `/video-stream` endpoint
//!
//! Every message is a JSON object carrying a `type` discriminant. Inbound
//! messages are read field by field from a [`serde_json::Value`] so that a
//! malformed field in one message never hides the message type: a
//! `video_frame` with a broken `frameNumber` is still a video frame and is
//! still counted.
//!
//! ## Inbound
//!
//! | `type`           | Fields                                            |
//! |------------------|---------------------------------------------------|
//! | `welcome`        | `message`, `clientId`                             |
//! | `viewer_joined`  | `isStreaming`, `viewerCount`                      |
//! | `video_frame`    | `frameData`, `frameNumber`, `timestamp`, `streamerId` |
//! | `stream_started` | `streamerId`, `streamInfo`                        |
//! | `stream_stopped` | `streamerId`                                      |
//!
//! ## Outbound
//!
//! A single join request is sent once the socket is open:
//!
//! ```json
//! {"type": "join_viewer", "clientId": "test_client_1700000000"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `type` value of a video frame message
pub const VIDEO_FRAME: &str = "video_frame";
/// `type` value of the server greeting
pub const WELCOME: &str = "welcome";
/// `type` value acknowledging the join request
pub const VIEWER_JOINED: &str = "viewer_joined";
/// `type` value announcing a new broadcaster
pub const STREAM_STARTED: &str = "stream_started";
/// `type` value announcing the broadcaster went away
pub const STREAM_STOPPED: &str = "stream_stopped";

/// Default `type` of the join request
pub const DEFAULT_JOIN_TYPE: &str = "join_viewer";

/// A decoded inbound message, dispatched on its `type` field
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Server greeting
    Welcome(Welcome),
    /// Join acknowledgement with the current stream state
    ViewerJoined(ViewerJoined),
    /// One encoded video frame
    VideoFrame(VideoFrame),
    /// A broadcaster started streaming
    StreamStarted(StreamStarted),
    /// The broadcaster stopped streaming
    StreamStopped(StreamStopped),
    /// Anything else; `None` when `type` is missing or not a string
    Other(Option<String>),
}

impl InboundMessage {
    /// Parse a text frame
    ///
    /// Only invalid JSON is an error. Unknown or missing `type` values map to
    /// [`InboundMessage::Other`].
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }

    /// Dispatch an already decoded JSON value on its `type` field
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value.get("type").and_then(Value::as_str) {
            Some(VIDEO_FRAME) => Self::VideoFrame(VideoFrame::from_value(value)),
            Some(WELCOME) => Self::Welcome(Welcome::from_value(value)),
            Some(VIEWER_JOINED) => Self::ViewerJoined(ViewerJoined::from_value(value)),
            Some(STREAM_STARTED) => Self::StreamStarted(StreamStarted::from_value(value)),
            Some(STREAM_STOPPED) => Self::StreamStopped(StreamStopped::from_value(value)),
            other => Self::Other(other.map(str::to_owned)),
        }
    }

    /// The `type` discriminant, `"unknown"` when absent
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Welcome(_) => WELCOME,
            Self::ViewerJoined(_) => VIEWER_JOINED,
            Self::VideoFrame(_) => VIDEO_FRAME,
            Self::StreamStarted(_) => STREAM_STARTED,
            Self::StreamStopped(_) => STREAM_STOPPED,
            Self::Other(Some(kind)) => kind,
            Self::Other(None) => "unknown",
        }
    }
}

/// Server greeting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Welcome {
    /// Human readable greeting
    #[serde(default)]
    pub message: String,
    /// Identifier the server assigned to this connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl Welcome {
    fn from_value(value: &Value) -> Self {
        Self {
            message: string_field(value, "message").unwrap_or_default(),
            client_id: string_field(value, "clientId"),
        }
    }
}

/// Join acknowledgement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerJoined {
    /// Whether a broadcaster is currently streaming
    #[serde(default)]
    pub is_streaming: bool,
    /// Number of viewers including this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_count: Option<u64>,
}

impl ViewerJoined {
    fn from_value(value: &Value) -> Self {
        Self {
            is_streaming: value
                .get("isStreaming")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            viewer_count: value.get("viewerCount").and_then(Value::as_u64),
        }
    }
}

/// One video frame envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFrame {
    /// Base64 JPEG, optionally behind a `data:image/jpeg;base64,` header
    #[serde(default)]
    pub frame_data: Option<String>,
    /// Sender side frame counter, `0` when absent
    #[serde(default)]
    pub frame_number: i64,
    /// Sender side capture time in milliseconds since the unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    /// Broadcaster the frame was relayed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streamer_id: Option<String>,
}

impl VideoFrame {
    fn from_value(value: &Value) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let frame_number = value
            .get("frameNumber")
            .and_then(|n| n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)));

        Self {
            frame_data: string_field(value, "frameData"),
            frame_number: frame_number.unwrap_or(0),
            timestamp: value.get("timestamp").and_then(Value::as_f64),
            streamer_id: string_field(value, "streamerId"),
        }
    }

    /// Build an outbound frame envelope (used by test servers and tools)
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            map.insert("type".to_string(), Value::from(VIDEO_FRAME));
        }
        value
    }
}

/// Stream parameters announced with `stream_started`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// e.g. `1920x1080`
    #[serde(default)]
    pub resolution: Option<String>,
    /// Nominal frame rate
    #[serde(default)]
    pub fps: Option<f64>,
    /// e.g. `H264`
    #[serde(default)]
    pub codec: Option<String>,
}

/// A broadcaster started streaming
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStarted {
    /// Broadcaster id
    #[serde(default)]
    pub streamer_id: Option<String>,
    /// Announced stream parameters
    #[serde(default)]
    pub stream_info: StreamInfo,
}

impl StreamStarted {
    fn from_value(value: &Value) -> Self {
        let stream_info = value
            .get("streamInfo")
            .map(|info| StreamInfo {
                resolution: string_field(info, "resolution"),
                fps: info.get("fps").and_then(Value::as_f64),
                codec: string_field(info, "codec"),
            })
            .unwrap_or_default();

        Self {
            streamer_id: string_field(value, "streamerId"),
            stream_info,
        }
    }
}

/// The broadcaster stopped streaming
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStopped {
    /// Broadcaster id
    #[serde(default)]
    pub streamer_id: Option<String>,
}

impl StreamStopped {
    fn from_value(value: &Value) -> Self {
        Self {
            streamer_id: string_field(value, "streamerId"),
        }
    }
}

/// Request to join the stream as a viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// Join message type, `join_viewer` unless configured otherwise
    #[serde(rename = "type")]
    pub kind: String,
    /// Self-assigned client id
    pub client_id: String,
}

impl JoinRequest {
    /// Create a join request identifying as `<prefix><unix_seconds>`
    #[must_use]
    pub fn new(kind: impl Into<String>, client_id_prefix: &str, unix_seconds: u64) -> Self {
        Self {
            kind: kind.into(),
            client_id: format!("{client_id_prefix}{unix_seconds}"),
        }
    }

    /// Serialize to the JSON text frame payload
    pub fn to_text(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_request_wire_format() {
        let join = JoinRequest::new(DEFAULT_JOIN_TYPE, "test_client_", 1_700_000_000);
        let text = join.to_text().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["type"], "join_viewer");
        assert_eq!(value["clientId"], "test_client_1700000000");
    }

    #[test]
    fn test_parse_welcome() {
        let msg = InboundMessage::parse(r#"{"type":"welcome","message":"hi"}"#).unwrap();
        assert_eq!(
            msg,
            InboundMessage::Welcome(Welcome {
                message: "hi".to_string(),
                client_id: None,
            })
        );
        assert_eq!(msg.kind(), "welcome");
    }

    #[test]
    fn test_parse_viewer_joined() {
        let msg =
            InboundMessage::parse(r#"{"type":"viewer_joined","isStreaming":true,"viewerCount":3}"#)
                .unwrap();
        match msg {
            InboundMessage::ViewerJoined(joined) => {
                assert!(joined.is_streaming);
                assert_eq!(joined.viewer_count, Some(3));
            }
            other => panic!("Wrong message type: {other:?}"),
        }
    }

    #[test]
    fn test_parse_video_frame() {
        let msg = InboundMessage::parse(
            r#"{"type":"video_frame","frameData":"/9j/","frameNumber":7,"timestamp":1700000000000,"streamerId":"client_abc"}"#,
        )
        .unwrap();
        match msg {
            InboundMessage::VideoFrame(frame) => {
                assert_eq!(frame.frame_data.as_deref(), Some("/9j/"));
                assert_eq!(frame.frame_number, 7);
                assert_eq!(frame.timestamp, Some(1_700_000_000_000.0));
                assert_eq!(frame.streamer_id.as_deref(), Some("client_abc"));
            }
            other => panic!("Wrong message type: {other:?}"),
        }
    }

    #[test]
    fn test_video_frame_with_malformed_fields_is_still_a_frame() {
        let msg =
            InboundMessage::parse(r#"{"type":"video_frame","frameNumber":"seven","frameData":42}"#)
                .unwrap();
        match msg {
            InboundMessage::VideoFrame(frame) => {
                assert_eq!(frame.frame_number, 0);
                assert!(frame.frame_data.is_none());
            }
            other => panic!("Wrong message type: {other:?}"),
        }
    }

    #[test]
    fn test_parse_stream_started() {
        let msg = InboundMessage::parse(
            r#"{"type":"stream_started","streamerId":"s1","streamInfo":{"resolution":"1920x1080","fps":30,"codec":"H264"}}"#,
        )
        .unwrap();
        match msg {
            InboundMessage::StreamStarted(started) => {
                assert_eq!(started.streamer_id.as_deref(), Some("s1"));
                assert_eq!(started.stream_info.resolution.as_deref(), Some("1920x1080"));
                assert_eq!(started.stream_info.fps, Some(30.0));
                assert_eq!(started.stream_info.codec.as_deref(), Some("H264"));
            }
            other => panic!("Wrong message type: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_and_missing_type() {
        let msg = InboundMessage::parse(r#"{"type":"camera_control"}"#).unwrap();
        assert_eq!(msg, InboundMessage::Other(Some("camera_control".to_string())));
        assert_eq!(msg.kind(), "camera_control");

        let msg = InboundMessage::parse(r#"{"message":"no type"}"#).unwrap();
        assert_eq!(msg, InboundMessage::Other(None));
        assert_eq!(msg.kind(), "unknown");

        let msg = InboundMessage::parse(r#"{"type":5}"#).unwrap();
        assert_eq!(msg.kind(), "unknown");

        let msg = InboundMessage::parse("[1,2,3]").unwrap();
        assert_eq!(msg.kind(), "unknown");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(InboundMessage::parse("{not json").is_err());
    }

    #[test]
    fn test_video_frame_to_json_carries_type() {
        let frame = VideoFrame {
            frame_data: Some("AAAA".to_string()),
            frame_number: 12,
            timestamp: None,
            streamer_id: None,
        };
        let value = frame.to_json();
        assert_eq!(value["type"], "video_frame");
        assert_eq!(value["frameNumber"], 12);

        let parsed = InboundMessage::from_value(&value);
        assert_eq!(parsed, InboundMessage::VideoFrame(frame));
    }
}
