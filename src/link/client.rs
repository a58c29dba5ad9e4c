//! Resilient TCP client for the signaling link
//!
//! One background task owns the socket for its whole life. It cycles
//! Connecting -> Connected, sleeping a fixed backoff between failed
//! attempts, until the stop signal flips the state to Closed for good.
//! The synchronous handle passes moves to the task and waits for the
//! write to complete, so a successful `transmit` means the bytes reached
//! the socket, not a queue.

use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep, timeout};

use crate::error::LinkError;
use crate::link::protocol::{self, ReplyMessage, WelcomeMessage};
use crate::link::SignalLink;

/// Connection state of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Never started, or momentarily between states.
    Disconnected,
    /// Trying to reach the actuator, including backoff pauses.
    Connecting,
    Connected,
    /// Shut down; the link will not reconnect.
    Closed,
}

impl LinkState {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
            LinkState::Closed => "closed",
        }
    }
}

/// Link client configuration
#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub host: String,
    pub port: u16,
    /// Pause between failed connection attempts.
    pub retry_backoff: Duration,
    /// How long to wait for the welcome frame.
    pub handshake_timeout: Duration,
    /// Name announced in the hello frame.
    pub client_name: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            retry_backoff: Duration::from_secs(5),
            handshake_timeout: Duration::from_secs(5),
            client_name: "telegraph-console".to_string(),
        }
    }
}

impl LinkConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = LinkConfig::default();
        let host = env::var("TELEGRAPH_HOST").unwrap_or(defaults.host);
        let port = env::var("TELEGRAPH_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let retry_backoff = env::var("TELEGRAPH_RETRY_MS")
            .ok()
            .and_then(|ms| ms.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_backoff);
        LinkConfig {
            host,
            port,
            retry_backoff,
            handshake_timeout: defaults.handshake_timeout,
            client_name: defaults.client_name,
        }
    }
}

/// One move on its way to the connection task.
struct TransmitRequest {
    line: String,
    reply: oneshot::Sender<Result<(), LinkError>>,
}

/// Synchronous handle to the link for the console thread.
pub struct LinkHandle {
    /// Runtime for async operations
    #[allow(dead_code)]
    runtime: Runtime,
    request_tx: mpsc::Sender<TransmitRequest>,
    state_rx: watch::Receiver<LinkState>,
    stop_tx: watch::Sender<bool>,
    seq: AtomicU64,
}

impl LinkHandle {
    /// Spawn the runtime and the connection task.
    pub fn start(config: LinkConfig) -> Self {
        let runtime = Runtime::new().expect("Failed to create tokio runtime");
        let (request_tx, request_rx) = mpsc::channel(16);
        let (state_tx, state_rx) = watch::channel(LinkState::Disconnected);
        let (stop_tx, stop_rx) = watch::channel(false);

        runtime.spawn(run_link(config, request_rx, state_tx, stop_rx));

        LinkHandle {
            runtime,
            request_tx,
            state_rx,
            stop_tx,
            seq: AtomicU64::new(1),
        }
    }

    /// Latest state published by the connection task.
    pub fn state(&self) -> LinkState {
        *self.state_rx.borrow()
    }

    /// Block until the link reaches `state` or the timeout passes.
    pub fn wait_for_state(&self, state: LinkState, wait: Duration) -> bool {
        let deadline = std::time::Instant::now() + wait;
        loop {
            if self.state() == state {
                return true;
            }
            if std::time::Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// Stop reconnecting and close the connection for good.
    pub fn shutdown(&self) {
        let _ = self.stop_tx.send(true);
    }
}

impl SignalLink for LinkHandle {
    fn state(&self) -> LinkState {
        LinkHandle::state(self)
    }

    fn transmit(&self, move_text: &str) -> Result<(), LinkError> {
        // Fail fast while reconnecting; nothing is ever queued for later.
        match self.state() {
            LinkState::Connected => {}
            LinkState::Closed => return Err(LinkError::Closed),
            _ => return Err(LinkError::Unavailable),
        }

        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let signal = protocol::create_signal(seq, move_text);
        let line = serde_json::to_string(&signal).map_err(|e| LinkError::Transport(e.into()))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.request_tx
            .blocking_send(TransmitRequest {
                line,
                reply: reply_tx,
            })
            .map_err(|_| LinkError::Closed)?;
        reply_rx.blocking_recv().map_err(|_| LinkError::Unavailable)?
    }
}

/// Connection task: owns the socket and publishes state transitions.
async fn run_link(
    config: LinkConfig,
    mut request_rx: mpsc::Receiver<TransmitRequest>,
    state_tx: watch::Sender<LinkState>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let addr = format!("{}:{}", config.host, config.port);

    'reconnect: loop {
        if *stop_rx.borrow() {
            break;
        }
        let _ = state_tx.send(LinkState::Connecting);

        let stream = tokio::select! {
            result = TcpStream::connect(&addr) => result,
            _ = stop_rx.changed() => break 'reconnect,
        };
        let stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                eprintln!("[Link] connect to {} failed: {}", addr, err);
                if !backoff(&config, &mut request_rx, &mut stop_rx).await {
                    break 'reconnect;
                }
                continue 'reconnect;
            }
        };

        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let welcome = tokio::select! {
            result = perform_handshake(&mut reader, &mut write_half, &config) => result,
            _ = stop_rx.changed() => break 'reconnect,
        };
        let welcome = match welcome {
            Ok(welcome) => welcome,
            Err(err) => {
                eprintln!("[Link] handshake with {} failed: {}", addr, err);
                if !backoff(&config, &mut request_rx, &mut stop_rx).await {
                    break 'reconnect;
                }
                continue 'reconnect;
            }
        };

        println!(
            "[Link] connected to {} (protocol {}, pin {})",
            addr, welcome.protocol_version, welcome.pin
        );
        let _ = state_tx.send(LinkState::Connected);

        // The frame buffer outlives the select: read_until keeps the bytes
        // it already pulled when a transmit or the stop signal wins the
        // race mid-frame, and the next pass finishes the frame.
        let mut frame = Vec::with_capacity(256);
        loop {
            tokio::select! {
                _ = stop_rx.changed() => break 'reconnect,
                request = request_rx.recv() => {
                    let request = match request {
                        Some(request) => request,
                        // All handles are gone; nobody is left to transmit.
                        None => break 'reconnect,
                    };
                    match write_frame(&mut write_half, &request.line).await {
                        Ok(()) => {
                            let _ = request.reply.send(Ok(()));
                        }
                        Err(err) => {
                            eprintln!("[Link] write failed: {}", err);
                            let _ = request.reply.send(Err(LinkError::Transport(err)));
                            break;
                        }
                    }
                }
                n = reader.read_until(b'\n', &mut frame) => {
                    match n {
                        Ok(0) => {
                            println!("[Link] actuator closed the connection");
                            break;
                        }
                        Ok(_) => {
                            match std::str::from_utf8(&frame) {
                                Ok(text) => handle_reply(text.trim()),
                                Err(err) => {
                                    eprintln!("[Link] undecodable frame from actuator: {}", err);
                                }
                            }
                            frame.clear();
                        }
                        Err(err) => {
                            eprintln!("[Link] read failed: {}", err);
                            break;
                        }
                    }
                }
            }
        }

        println!("[Link] reconnecting to {}", addr);
    }

    let _ = state_tx.send(LinkState::Closed);

    // Fail anything still queued, then stop accepting.
    request_rx.close();
    while let Ok(request) = request_rx.try_recv() {
        let _ = request.reply.send(Err(LinkError::Closed));
    }
    println!("[Link] closed");
}

/// Sleep out the retry backoff, failing any transmit that arrives meanwhile.
/// Returns false when shutdown was requested.
async fn backoff(
    config: &LinkConfig,
    request_rx: &mut mpsc::Receiver<TransmitRequest>,
    stop_rx: &mut watch::Receiver<bool>,
) -> bool {
    let wait = sleep(config.retry_backoff);
    tokio::pin!(wait);
    loop {
        tokio::select! {
            _ = &mut wait => return true,
            _ = stop_rx.changed() => return false,
            request = request_rx.recv() => match request {
                Some(request) => {
                    let _ = request.reply.send(Err(LinkError::Unavailable));
                }
                None => return false,
            },
        }
    }
}

/// Send hello and wait for a compatible welcome.
async fn perform_handshake<R, W>(
    reader: &mut R,
    writer: &mut W,
    config: &LinkConfig,
) -> Result<WelcomeMessage, LinkError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let hello = protocol::create_hello(1, &config.client_name, protocol::PROTOCOL_VERSION);
    let line = serde_json::to_string(&hello).map_err(|e| LinkError::Transport(e.into()))?;
    write_frame(writer, &line).await?;

    let mut reply = String::new();
    let n = timeout(config.handshake_timeout, reader.read_line(&mut reply))
        .await
        .map_err(|_| LinkError::Handshake("timed out waiting for welcome".to_string()))??;
    if n == 0 {
        return Err(LinkError::Handshake(
            "actuator closed the connection".to_string(),
        ));
    }

    match protocol::parse_reply(reply.trim()) {
        Ok(ReplyMessage::Welcome(welcome)) => {
            if !protocol::is_compatible(&welcome.protocol_version) {
                return Err(LinkError::Handshake(format!(
                    "protocol version {} not supported",
                    welcome.protocol_version
                )));
            }
            Ok(welcome)
        }
        Ok(ReplyMessage::Error(err)) => Err(LinkError::Handshake(err.message)),
        Ok(ReplyMessage::Unknown(_)) => {
            Err(LinkError::Handshake("unexpected reply to hello".to_string()))
        }
        Err(err) => Err(LinkError::Handshake(format!("bad welcome frame: {}", err))),
    }
}

async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    line: &str,
) -> Result<(), std::io::Error> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

/// Log a frame the actuator pushed outside the handshake.
fn handle_reply(json: &str) {
    if json.is_empty() {
        return;
    }
    match protocol::parse_reply(json) {
        Ok(ReplyMessage::Error(err)) => {
            eprintln!(
                "[Link] actuator error (seq {}): {:?} {}",
                err.seq, err.code, err.message
            );
        }
        Ok(ReplyMessage::Welcome(welcome)) => {
            println!(
                "[Link] duplicate welcome (protocol {})",
                welcome.protocol_version
            );
        }
        Ok(ReplyMessage::Unknown(unknown)) => {
            println!("[Link] unknown frame from actuator (seq {})", unknown.seq);
        }
        Err(err) => eprintln!("[Link] unparseable frame from actuator: {}", err),
    }
}
