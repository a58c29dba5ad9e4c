//! Console view - plain text board and status rendering
//!
//! Pure string builders; the main loop decides where they go. The board
//! comes straight from the FEN placement field of the current snapshot.
//! Anything unparseable renders as a placeholder instead of failing the
//! console.

use crate::engine::{ScoredMove, Snapshot};
use crate::link::LinkState;

/// Board rows as the operator sees them, rank 8 at the top by default.
pub fn board_lines(snapshot: &Snapshot, flipped: bool) -> Vec<String> {
    let placement = match snapshot.as_str().split_whitespace().next() {
        Some(placement) => placement,
        None => return vec!["(no position)".to_string()],
    };
    let rows = match parse_placement(placement) {
        Some(rows) => rows,
        None => return vec!["(no position)".to_string()],
    };

    let mut lines = Vec::with_capacity(10);
    for display_row in 0..8 {
        let (rank_label, row) = if flipped {
            (display_row + 1, rows[7 - display_row])
        } else {
            (8 - display_row, rows[display_row])
        };
        let mut line = format!("{} |", rank_label);
        for file in 0..8 {
            let cell = if flipped { row[7 - file] } else { row[file] };
            line.push(' ');
            line.push(cell);
        }
        lines.push(line);
    }
    lines.push("  +----------------".to_string());
    lines.push(if flipped {
        "    h g f e d c b a".to_string()
    } else {
        "    a b c d e f g h".to_string()
    });
    lines
}

/// Expand the placement field into 8 rows of 8 characters, rank 8 first.
fn parse_placement(placement: &str) -> Option<[[char; 8]; 8]> {
    let mut rows = [['.'; 8]; 8];
    let mut rank_count = 0;
    for (i, rank) in placement.split('/').enumerate() {
        if i >= 8 {
            return None;
        }
        let mut file = 0usize;
        for c in rank.chars() {
            if let Some(n) = c.to_digit(10) {
                for _ in 0..n {
                    if file >= 8 {
                        return None;
                    }
                    rows[i][file] = '.';
                    file += 1;
                }
            } else {
                if file >= 8 {
                    return None;
                }
                rows[i][file] = c;
                file += 1;
            }
        }
        if file != 8 {
            return None;
        }
        rank_count = i + 1;
    }
    if rank_count != 8 {
        return None;
    }
    Some(rows)
}

/// Status block printed under the board.
pub fn status_lines(
    addr: &str,
    state: LinkState,
    history_len: usize,
    snapshot: &Snapshot,
) -> [String; 4] {
    let turn = match snapshot.as_str().split_whitespace().nth(1) {
        Some("w") => "WHITE",
        Some("b") => "BLACK",
        _ => "-",
    };
    [
        format!("TARGET {}", addr),
        format!("LINK {}", state.as_str().to_uppercase()),
        format!("TURN {}", turn),
        format!("MOVES {}", history_len),
    ]
}

/// Table of candidate moves from the engine.
pub fn score_lines(moves: &[ScoredMove]) -> Vec<String> {
    if moves.is_empty() {
        return vec!["(no moves)".to_string()];
    }
    let mut lines = Vec::with_capacity(moves.len() + 1);
    lines.push("MOVE   SCORE".to_string());
    for candidate in moves {
        lines.push(format!("{:<6} {}", candidate.move_text, candidate.score));
    }
    lines
}
