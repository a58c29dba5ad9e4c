//! Single-session TCP server for the actuator
//!
//! Accepts exactly one connection, then stops listening: the daemon serves
//! one operator per process and exits when that session ends. Frames are
//! read one line at a time and pulse emission happens inline, so a long
//! plan simply delays the next read. A supervisor restarts the process for
//! the next session.

use std::env;
use std::net::SocketAddr;

use anyhow::Result;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use crate::error::DecodeError;
use crate::link::protocol::{self, ErrorCode, ParsedMessage};
use crate::transcoder::pin::OutputPin;
use crate::transcoder::pulse::{pulse_plan, Pulser};

/// Actuator configuration
#[derive(Debug, Clone)]
pub struct ActuatorConfig {
    pub host: String,
    pub port: u16,
    /// BCM pin number announced to the operator.
    pub pin: u8,
    pub protocol_version: String,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        ActuatorConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            pin: 17,
            protocol_version: protocol::PROTOCOL_VERSION.to_string(),
        }
    }
}

impl ActuatorConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = ActuatorConfig::default();
        let host = env::var("TELEGRAPH_BIND").unwrap_or(defaults.host);
        let port = env::var("TELEGRAPH_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let pin = env::var("TELEGRAPH_PIN")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.pin);
        ActuatorConfig {
            host,
            port,
            pin,
            protocol_version: defaults.protocol_version,
        }
    }
}

/// Listen, accept one operator, serve the session to its end.
///
/// `ready_tx` reports the bound address once listening, so tests can bind
/// port 0 and learn the real port.
pub async fn run_actuator<P: OutputPin>(
    config: ActuatorConfig,
    pin: P,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let bound = listener.local_addr()?;
    println!("[Actuator] listening on {}", bound);

    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let (socket, peer) = listener.accept().await?;
    // Single operator per process: stop listening before serving.
    drop(listener);
    println!("[Actuator] operator connected from {}", peer);

    serve_session(socket, &config, pin).await
}

/// Frame loop for the one accepted connection.
async fn serve_session<P: OutputPin>(
    socket: TcpStream,
    config: &ActuatorConfig,
    pin: P,
) -> Result<()> {
    let (read_half, mut write_half) = tokio::io::split(socket);
    let mut reader = BufReader::new(read_half);
    let mut pulser = Pulser::new(pin);
    let mut greeted = false;
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf).await?;
        if n == 0 {
            println!("[Actuator] operator disconnected");
            return Ok(());
        }

        // Bad bytes cost one frame, not the session.
        let text = match std::str::from_utf8(&buf) {
            Ok(text) => text.trim(),
            Err(err) => {
                eprintln!("[Actuator] undecodable frame: {}", err);
                continue;
            }
        };
        if text.is_empty() {
            continue;
        }

        match protocol::parse_message(text) {
            Ok(ParsedMessage::Hello(hello)) => {
                if !protocol::is_compatible(&hello.protocol_version) {
                    let error = protocol::create_error(
                        hello.seq,
                        ErrorCode::ProtocolMismatch,
                        &format!(
                            "protocol version {} not supported",
                            hello.protocol_version
                        ),
                    );
                    write_frame(&mut write_half, &error).await?;
                    println!(
                        "[Actuator] rejected {} (protocol {})",
                        hello.client.name, hello.protocol_version
                    );
                    return Ok(());
                }
                let welcome =
                    protocol::create_welcome(hello.seq, &config.protocol_version, config.pin);
                write_frame(&mut write_half, &welcome).await?;
                greeted = true;
                println!(
                    "[Actuator] operator {} v{} ready",
                    hello.client.name, hello.client.version
                );
            }
            Ok(ParsedMessage::Signal(signal)) => {
                if !greeted {
                    let error = protocol::create_error(
                        signal.seq,
                        ErrorCode::HandshakeRequired,
                        "send hello before signal",
                    );
                    write_frame(&mut write_half, &error).await?;
                    continue;
                }
                let plan = pulse_plan(&signal.text);
                for c in &plan.skipped {
                    eprintln!("[Actuator] {}", DecodeError::UnknownSymbol(*c));
                }
                if plan.is_empty() {
                    continue;
                }
                println!(
                    "[Actuator] signaling {:?} (seq {}, {:.1}s)",
                    signal.text,
                    signal.seq,
                    plan.duration().as_secs_f32()
                );
                // Strictly sequential: the next frame is not read until the
                // last hold has elapsed.
                pulser.emit(&plan).await;
            }
            Ok(ParsedMessage::Unknown(unknown)) => {
                let error = protocol::create_error(
                    unknown.seq,
                    ErrorCode::InvalidFrame,
                    "unknown message type",
                );
                write_frame(&mut write_half, &error).await?;
            }
            Err(err) => {
                eprintln!("[Actuator] bad frame: {}", err);
                let error = protocol::create_error(
                    0,
                    ErrorCode::InvalidFrame,
                    &format!("malformed frame: {}", err),
                );
                write_frame(&mut write_half, &error).await?;
            }
        }
    }
}

async fn write_frame<W, M>(writer: &mut W, message: &M) -> Result<()>
where
    W: AsyncWrite + Unpin,
    M: Serialize,
{
    if let Ok(json) = serde_json::to_string(message) {
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}
