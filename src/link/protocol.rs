//! JSON line protocol between console and actuator
//!
//! Every frame is a single JSON object on its own line. The `type` field
//! selects the shape; `seq` is informational and echoed back in replies so
//! log lines on both ends can be matched up. Unknown frame types are not
//! fatal: they parse into `Unknown` and the receiver answers with an error
//! frame instead of dropping the connection.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Protocol version
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Whether a peer's protocol version can talk to ours (same major).
pub fn is_compatible(version: &str) -> bool {
    version.starts_with("1.")
}

/// Message type for client hello
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HelloType {
    #[serde(rename = "hello")]
    Hello,
}

impl Default for HelloType {
    fn default() -> Self {
        HelloType::Hello
    }
}

/// Message type for actuator welcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

impl Default for WelcomeType {
    fn default() -> Self {
        WelcomeType::Welcome
    }
}

/// Message type for a move signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalType {
    #[serde(rename = "signal")]
    Signal,
}

impl Default for SignalType {
    fn default() -> Self {
        SignalType::Signal
    }
}

/// Message type for error replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

impl Default for ErrorType {
    fn default() -> Self {
        ErrorType::Error
    }
}

/// Error codes carried in error frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "invalid_frame")]
    InvalidFrame,
    #[serde(rename = "protocol_mismatch")]
    ProtocolMismatch,
    #[serde(rename = "handshake_required")]
    HandshakeRequired,
}

/// Client identification in hello messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Client hello message (console -> actuator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type", default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
}

/// Actuator welcome message (actuator -> console)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type", default)]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    /// BCM pin the actuator pulses.
    pub pin: u8,
}

/// Move signal message (console -> actuator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalMessage {
    #[serde(rename = "type", default)]
    pub msg_type: SignalType,
    pub seq: u64,
    pub ts: u64,
    /// Text to pulse out, one character at a time.
    pub text: String,
}

/// Error message (actuator -> console)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type", default)]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

/// Frame with an unrecognized type; only the seq survives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

/// A parsed inbound frame on the actuator side.
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Signal(SignalMessage),
    Unknown(UnknownMessage),
}

/// A parsed inbound frame on the console side.
#[derive(Debug, Clone)]
pub enum ReplyMessage {
    Welcome(WelcomeMessage),
    Error(ErrorMessage),
    Unknown(UnknownMessage),
}

/// Parse a frame arriving at the actuator.
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    // Inspect the type tag first so unknown frames stay non-fatal.
    let value: serde_json::Value = serde_json::from_str(json)?;
    let msg_type = value.get("type").and_then(|t| t.as_str()).unwrap_or("");

    match msg_type {
        "hello" => Ok(ParsedMessage::Hello(serde_json::from_value(value)?)),
        "signal" => Ok(ParsedMessage::Signal(serde_json::from_value(value)?)),
        _ => {
            let seq = value.get("seq").and_then(|s| s.as_u64()).unwrap_or(0);
            Ok(ParsedMessage::Unknown(UnknownMessage { seq }))
        }
    }
}

/// Parse a frame arriving at the console.
pub fn parse_reply(json: &str) -> Result<ReplyMessage, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let msg_type = value.get("type").and_then(|t| t.as_str()).unwrap_or("");

    match msg_type {
        "welcome" => Ok(ReplyMessage::Welcome(serde_json::from_value(value)?)),
        "error" => Ok(ReplyMessage::Error(serde_json::from_value(value)?)),
        _ => {
            let seq = value.get("seq").and_then(|s| s.as_u64()).unwrap_or(0);
            Ok(ReplyMessage::Unknown(UnknownMessage { seq }))
        }
    }
}

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str, protocol_version: &str) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: protocol_version.to_string(),
    }
}

/// Create a welcome message
pub fn create_welcome(seq: u64, protocol_version: &str, pin: u8) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: protocol_version.to_string(),
        pin,
    }
}

/// Create a signal message
pub fn create_signal(seq: u64, text: &str) -> SignalMessage {
    SignalMessage {
        msg_type: SignalType::Signal,
        seq,
        ts: current_timestamp_ms(),
        text: text.to_string(),
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Get current timestamp in milliseconds
fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_hello() {
        let json = r#"{"type":"hello","seq":1,"ts":1700000000000,"client":{"name":"telegraph-console","version":"0.1.0"},"protocol_version":"1.0.0"}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Hello(hello) => {
                assert_eq!(hello.seq, 1);
                assert_eq!(hello.client.name, "telegraph-console");
                assert_eq!(hello.protocol_version, "1.0.0");
            }
            other => panic!("expected hello, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_signal() {
        let json = r#"{"type":"signal","seq":7,"ts":1700000000000,"text":"E2E4"}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Signal(signal) => {
                assert_eq!(signal.seq, 7);
                assert_eq!(signal.text, "E2E4");
            }
            other => panic!("expected signal, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_type_keeps_seq() {
        let json = r#"{"type":"undo","seq":42,"ts":0}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Unknown(unknown) => assert_eq!(unknown.seq, 42),
            other => panic!("expected unknown, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_type_is_unknown() {
        let json = r#"{"seq":3,"text":"E2E4"}"#;
        assert!(matches!(
            parse_message(json).unwrap(),
            ParsedMessage::Unknown(UnknownMessage { seq: 3 })
        ));
    }

    #[test]
    fn test_parse_malformed_json_is_an_error() {
        assert!(parse_message("{not json").is_err());
        assert!(parse_reply("").is_err());
    }

    #[test]
    fn test_parse_reply_welcome() {
        let json = r#"{"type":"welcome","seq":1,"ts":0,"protocol_version":"1.0.0","pin":17}"#;
        match parse_reply(json).unwrap() {
            ReplyMessage::Welcome(welcome) => {
                assert_eq!(welcome.pin, 17);
                assert!(is_compatible(&welcome.protocol_version));
            }
            other => panic!("expected welcome, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_reply_error() {
        let json = r#"{"type":"error","seq":9,"ts":0,"code":"handshake_required","message":"send hello first"}"#;
        match parse_reply(json).unwrap() {
            ReplyMessage::Error(err) => {
                assert_eq!(err.code, ErrorCode::HandshakeRequired);
                assert_eq!(err.message, "send hello first");
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_signal_roundtrip() {
        let signal = create_signal(5, "A1");
        let json = serde_json::to_string(&signal).unwrap();
        match parse_message(&json).unwrap() {
            ParsedMessage::Signal(parsed) => {
                assert_eq!(parsed.seq, signal.seq);
                assert_eq!(parsed.text, "A1");
            }
            other => panic!("expected signal, got {:?}", other),
        }
    }

    #[test]
    fn test_hello_carries_package_version() {
        let hello = create_hello(1, "tester", PROTOCOL_VERSION);
        assert_eq!(hello.client.version, env!("CARGO_PKG_VERSION"));
        let json = serde_json::to_string(&hello).unwrap();
        assert!(json.contains(r#""type":"hello""#));
    }

    #[test]
    fn test_error_code_serializes_snake_case() {
        let err = create_error(2, ErrorCode::ProtocolMismatch, "major version differs");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains(r#""code":"protocol_mismatch""#));
    }

    #[test]
    fn test_version_compatibility() {
        assert!(is_compatible("1.0.0"));
        assert!(is_compatible("1.3.7"));
        assert!(!is_compatible("2.0.0"));
        assert!(!is_compatible("0.9.0"));
        assert!(!is_compatible("10.0.0"));
    }
}
