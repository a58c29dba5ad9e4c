//! UCI rule engine adapter
//!
//! Drives a UCI chess engine (Stockfish) over stdin/stdout. Legality checks
//! use a depth-1 search restricted to the candidate move: the engine answers
//! `bestmove (none)` when the move is not playable. Positions are read back
//! with the `d` debug command after every change so the stored FEN is always
//! the engine's own normalized form.

use std::collections::BTreeMap;
use std::env;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use crate::engine::{RuleEngine, Score, ScoredMove, Snapshot};
use crate::error::EngineError;

/// Rule engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Engine executable, looked up on PATH if not absolute.
    pub path: String,
    /// Search depth for move evaluation.
    pub depth: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            path: "stockfish".to_string(),
            depth: 20,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = EngineConfig::default();
        let path = env::var("TELEGRAPH_ENGINE").unwrap_or(defaults.path);
        let depth = env::var("TELEGRAPH_ENGINE_DEPTH")
            .ok()
            .and_then(|d| d.parse().ok())
            .unwrap_or(defaults.depth);
        EngineConfig { path, depth }
    }
}

/// Handle to a running UCI engine process.
pub struct UciEngine {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    /// Engine-normalized FEN of the current position.
    fen: String,
    depth: u32,
}

impl UciEngine {
    /// Spawn the engine and bring it to the starting position.
    pub fn start(config: &EngineConfig) -> Result<Self, EngineError> {
        let mut child = Command::new(&config.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: config.path.clone(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Protocol("engine stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Protocol("engine stdout unavailable".to_string()))?;

        let mut engine = UciEngine {
            child,
            stdin,
            reader: BufReader::new(stdout),
            fen: String::new(),
            depth: config.depth,
        };

        engine.send("uci")?;
        engine.wait_for("uciok")?;
        engine.send("isready")?;
        engine.wait_for("readyok")?;
        engine.send("position startpos")?;
        engine.fen = engine.read_fen()?;

        println!("[Engine] {} ready, search depth {}", config.path, config.depth);
        Ok(engine)
    }

    fn send(&mut self, command: &str) -> Result<(), EngineError> {
        writeln!(self.stdin, "{}", command)?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            return Err(EngineError::Protocol(
                "engine closed its output stream".to_string(),
            ));
        }
        Ok(line.trim().to_string())
    }

    /// Discard output until a line starting with `token` arrives.
    fn wait_for(&mut self, token: &str) -> Result<(), EngineError> {
        loop {
            if self.read_line()?.starts_with(token) {
                return Ok(());
            }
        }
    }

    /// Ask for the current position via `d` and pull the FEN out of the dump.
    fn read_fen(&mut self) -> Result<String, EngineError> {
        self.send("d")?;
        let mut fen = None;
        loop {
            let line = self.read_line()?;
            if let Some(f) = parse_fen_line(&line) {
                fen = Some(f.to_string());
            }
            // "Checkers:" is the last line of the dump.
            if line.starts_with("Checkers:") {
                break;
            }
        }
        fen.ok_or_else(|| EngineError::Protocol("no Fen line in position dump".to_string()))
    }

    /// Read until `bestmove`; `None` means the engine found nothing to play.
    fn read_bestmove(&mut self) -> Result<Option<String>, EngineError> {
        loop {
            let line = self.read_line()?;
            if line.starts_with("bestmove") {
                return Ok(parse_bestmove(&line));
            }
        }
    }
}

impl RuleEngine for UciEngine {
    fn is_move_legal(&mut self, move_text: &str) -> Result<bool, EngineError> {
        // Reject anything that is not a single UCI move token before it can
        // reach the command stream.
        if !is_uci_move_syntax(move_text) {
            return Ok(false);
        }
        self.send(&format!("position fen {}", self.fen))?;
        self.send(&format!("go depth 1 searchmoves {}", move_text))?;
        Ok(self.read_bestmove()?.is_some())
    }

    fn apply_move(&mut self, move_text: &str) -> Result<(), EngineError> {
        self.send(&format!("position fen {} moves {}", self.fen, move_text))?;
        self.fen = self.read_fen()?;
        Ok(())
    }

    fn current_position(&mut self) -> Result<Snapshot, EngineError> {
        Ok(Snapshot::new(self.fen.clone()))
    }

    fn set_position(&mut self, snapshot: &Snapshot) -> Result<(), EngineError> {
        self.send(&format!("position fen {}", snapshot.as_str()))?;
        self.fen = self.read_fen()?;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), EngineError> {
        self.send("ucinewgame")?;
        self.send("isready")?;
        self.wait_for("readyok")?;
        self.send("position startpos")?;
        self.fen = self.read_fen()?;
        Ok(())
    }

    fn best_moves(&mut self, count: usize) -> Result<Vec<ScoredMove>, EngineError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        self.send(&format!("setoption name MultiPV value {}", count))?;
        self.send(&format!("position fen {}", self.fen))?;
        self.send(&format!("go depth {}", self.depth))?;

        // Keep the deepest line seen for each multipv slot.
        let mut lines: BTreeMap<usize, PvLine> = BTreeMap::new();
        loop {
            let line = self.read_line()?;
            if line.starts_with("bestmove") {
                break;
            }
            if let Some(pv) = parse_info_line(&line) {
                match lines.get(&pv.multipv) {
                    Some(prev) if prev.depth > pv.depth => {}
                    _ => {
                        lines.insert(pv.multipv, pv);
                    }
                }
            }
        }
        self.send("setoption name MultiPV value 1")?;

        Ok(lines
            .into_values()
            .take(count)
            .map(|pv| ScoredMove {
                move_text: pv.move_text,
                score: pv.score,
            })
            .collect())
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        // Ask the engine to exit so we do not leave a zombie behind.
        let _ = self.send("quit");
        let _ = self.child.wait();
    }
}

/// One parsed `info ... multipv ... pv ...` line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PvLine {
    multipv: usize,
    depth: u32,
    move_text: String,
    score: Score,
}

/// Extract the FEN from a `Fen: ...` line of the `d` dump.
fn parse_fen_line(line: &str) -> Option<&str> {
    line.strip_prefix("Fen:").map(str::trim)
}

/// Extract the move from a `bestmove` line; `(none)` maps to None.
fn parse_bestmove(line: &str) -> Option<String> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("bestmove") {
        return None;
    }
    match tokens.next() {
        Some("(none)") | None => None,
        Some(mv) => Some(mv.to_string()),
    }
}

/// Parse a search info line into a scored principal variation, if it has one.
fn parse_info_line(line: &str) -> Option<PvLine> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "info" {
        return None;
    }
    let mut multipv = 1;
    let mut depth = 0;
    let mut score = None;
    let mut move_text = None;
    while let Some(token) = tokens.next() {
        match token {
            "depth" => depth = tokens.next()?.parse().ok()?,
            "multipv" => multipv = tokens.next()?.parse().ok()?,
            "score" => {
                let kind = tokens.next()?;
                let value: i32 = tokens.next()?.parse().ok()?;
                score = Some(match kind {
                    "cp" => Score::Centipawns(value),
                    "mate" => Score::Mate(value),
                    _ => return None,
                });
            }
            "pv" => {
                // First pv token is the move to play.
                move_text = Some(tokens.next()?.to_string());
                break;
            }
            _ => {}
        }
    }
    Some(PvLine {
        multipv,
        depth,
        move_text: move_text?,
        score: score?,
    })
}

/// Strict single-token UCI move shape: from square, to square, optional
/// promotion piece.
fn is_uci_move_syntax(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() != 4 && bytes.len() != 5 {
        return false;
    }
    let file = |b: u8| (b'a'..=b'h').contains(&b);
    let rank = |b: u8| (b'1'..=b'8').contains(&b);
    if !(file(bytes[0]) && rank(bytes[1]) && file(bytes[2]) && rank(bytes[3])) {
        return false;
    }
    bytes.len() == 4 || matches!(bytes[4], b'q' | b'r' | b'b' | b'n')
}
