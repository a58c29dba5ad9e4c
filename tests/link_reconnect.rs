//! Integration tests for link resilience
//!
//! The scripted actuator here runs on a plain thread with std networking;
//! the client under test runs on the runtime inside `LinkHandle`. The
//! listener stays bound across sessions so a reconnecting client lands in
//! the accept backlog instead of racing the next `accept`.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use chess_telegraph::engine::{RuleEngine, ScoredMove, Snapshot};
use chess_telegraph::error::{EngineError, LinkError};
use chess_telegraph::link::protocol::{self, ParsedMessage};
use chess_telegraph::link::{LinkConfig, LinkHandle, LinkState, SignalLink};
use chess_telegraph::session::SessionController;

struct FakeEngine {
    position: String,
}

impl FakeEngine {
    fn new() -> Self {
        FakeEngine {
            position: "start".to_string(),
        }
    }
}

impl RuleEngine for FakeEngine {
    fn is_move_legal(&mut self, move_text: &str) -> Result<bool, EngineError> {
        Ok(!move_text.is_empty())
    }

    fn apply_move(&mut self, move_text: &str) -> Result<(), EngineError> {
        self.position = format!("{} {}", self.position, move_text);
        Ok(())
    }

    fn current_position(&mut self) -> Result<Snapshot, EngineError> {
        Ok(Snapshot::new(self.position.clone()))
    }

    fn set_position(&mut self, snapshot: &Snapshot) -> Result<(), EngineError> {
        self.position = snapshot.as_str().to_string();
        Ok(())
    }

    fn reset(&mut self) -> Result<(), EngineError> {
        self.position = "start".to_string();
        Ok(())
    }

    fn best_moves(&mut self, _count: usize) -> Result<Vec<ScoredMove>, EngineError> {
        Ok(Vec::new())
    }
}

/// Serve one connection: welcome the client, forward signal texts, and hang
/// up after `drop_after` signals (or stay until EOF when `None`).
fn serve_session(
    listener: &TcpListener,
    session_no: u32,
    sessions: &mpsc::Sender<u32>,
    signals: &mpsc::Sender<String>,
    drop_after: Option<usize>,
) {
    let (mut stream, _) = listener.accept().expect("accept failed");
    let mut reader = BufReader::new(stream.try_clone().expect("clone failed"));
    let mut line = String::new();
    let mut seen = 0usize;
    loop {
        line.clear();
        let n = match reader.read_line(&mut line) {
            Ok(n) => n,
            Err(_) => return,
        };
        if n == 0 {
            return;
        }
        match protocol::parse_message(line.trim()).expect("bad frame from client") {
            ParsedMessage::Hello(hello) => {
                let welcome =
                    protocol::create_welcome(hello.seq, protocol::PROTOCOL_VERSION, 17);
                let frame = format!("{}\n", serde_json::to_string(&welcome).unwrap());
                stream.write_all(frame.as_bytes()).expect("write failed");
                let _ = sessions.send(session_no);
            }
            ParsedMessage::Signal(signal) => {
                let _ = signals.send(signal.text);
                seen += 1;
                if drop_after == Some(seen) {
                    return;
                }
            }
            ParsedMessage::Unknown(_) => {}
        }
    }
}

fn quick_config(addr: std::net::SocketAddr, name: &str) -> LinkConfig {
    LinkConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        retry_backoff: Duration::from_millis(50),
        handshake_timeout: Duration::from_secs(2),
        client_name: name.to_string(),
    }
}

#[test]
fn session_history_survives_actuator_restart() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind failed");
    let addr = listener.local_addr().expect("no local addr");
    let (session_tx, session_rx) = mpsc::channel();
    let (signal_tx, signal_rx) = mpsc::channel();

    let server = thread::spawn(move || {
        // First session dies after one signal; the second lives until EOF.
        serve_session(&listener, 1, &session_tx, &signal_tx, Some(1));
        serve_session(&listener, 2, &session_tx, &signal_tx, None);
    });

    let link = LinkHandle::start(quick_config(addr, "restart-test"));
    let mut session = SessionController::new(FakeEngine::new(), link);

    assert_eq!(
        session_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("no first welcome"),
        1
    );
    assert!(session
        .link()
        .wait_for_state(LinkState::Connected, Duration::from_secs(2)));

    session.commit_move("e2e4").expect("first commit failed");
    assert_eq!(
        signal_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("no first signal"),
        "e2e4"
    );

    // The actuator hung up; wait for the client to come back on its own.
    assert_eq!(
        session_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("client never reconnected"),
        2
    );
    assert!(session
        .link()
        .wait_for_state(LinkState::Connected, Duration::from_secs(2)));

    session
        .commit_move("e7e5")
        .expect("commit after reconnect failed");
    assert_eq!(
        signal_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("no second signal"),
        "e7e5"
    );

    // Two moves on the board and in history, one reconnect in between.
    assert_eq!(session.history_len(), 2);
    assert_eq!(session.position().unwrap().as_str(), "start e2e4 e7e5");

    session.link().shutdown();
    assert!(session
        .link()
        .wait_for_state(LinkState::Closed, Duration::from_secs(2)));
    server.join().expect("server thread panicked");
}

#[test]
fn transmit_fails_fast_while_actuator_is_down() {
    // Claim a port, then leave it dead until later in the test.
    let placeholder = TcpListener::bind("127.0.0.1:0").expect("bind failed");
    let addr = placeholder.local_addr().expect("no local addr");
    drop(placeholder);

    let link = LinkHandle::start(quick_config(addr, "outage-test"));

    // Nothing is listening: a transmit fails without waiting out a backoff.
    let started = Instant::now();
    let err = link.transmit("e2e4").unwrap_err();
    assert!(matches!(err, LinkError::Unavailable));
    assert!(
        started.elapsed() < Duration::from_secs(1),
        "transmit blocked instead of failing fast"
    );

    // Bring the actuator up on the same port; the client finds it within a
    // few backoff cycles.
    let listener = TcpListener::bind(addr).expect("rebind failed");
    let (session_tx, session_rx) = mpsc::channel();
    let (signal_tx, signal_rx) = mpsc::channel();
    let server = thread::spawn(move || {
        serve_session(&listener, 1, &session_tx, &signal_tx, None);
    });

    assert_eq!(
        session_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("client never found the actuator"),
        1
    );
    assert!(link.wait_for_state(LinkState::Connected, Duration::from_secs(2)));
    link.transmit("g1f3").expect("transmit after recovery failed");
    assert_eq!(
        signal_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("no signal after recovery"),
        "g1f3"
    );

    link.shutdown();
    assert!(link.wait_for_state(LinkState::Closed, Duration::from_secs(2)));
    server.join().expect("server thread panicked");
}

#[test]
fn shutdown_interrupts_the_retry_backoff() {
    let placeholder = TcpListener::bind("127.0.0.1:0").expect("bind failed");
    let addr = placeholder.local_addr().expect("no local addr");
    drop(placeholder);

    let mut config = quick_config(addr, "shutdown-test");
    config.retry_backoff = Duration::from_secs(60);
    let link = LinkHandle::start(config);
    assert!(link.wait_for_state(LinkState::Connecting, Duration::from_secs(2)));

    // Let the first connect fail so the task is sitting in the backoff.
    thread::sleep(Duration::from_millis(200));
    let started = Instant::now();
    link.shutdown();
    assert!(link.wait_for_state(LinkState::Closed, Duration::from_secs(2)));
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "shutdown waited out the backoff"
    );

    // Closed is terminal.
    assert!(matches!(link.transmit("e2e4").unwrap_err(), LinkError::Closed));
}
