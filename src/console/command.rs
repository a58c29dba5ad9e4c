//! Operator input parsing
//!
//! Two small parsers: command line flags at startup and REPL commands
//! while running. REPL errors are plain strings destined for the prompt,
//! not error values to handle.

use anyhow::{anyhow, Result};

/// Command line overrides for the console.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub engine: Option<String>,
    pub depth: Option<u32>,
}

pub fn parse_console_args(args: &[String]) -> Result<ConsoleArgs> {
    let mut parsed = ConsoleArgs::default();
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--host" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --host"))?;
                parsed.host = Some(v.clone());
            }
            "--port" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --port"))?;
                parsed.port = Some(
                    v.parse::<u16>()
                        .map_err(|_| anyhow!("invalid --port value: {}", v))?,
                );
            }
            "--engine" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --engine"))?;
                parsed.engine = Some(v.clone());
            }
            "--depth" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --depth"))?;
                parsed.depth = Some(
                    v.parse::<u32>()
                        .map_err(|_| anyhow!("invalid --depth value: {}", v))?,
                );
            }
            other => {
                return Err(anyhow!("unknown argument: {}", other));
            }
        }
        i += 1;
    }
    Ok(parsed)
}

/// One operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Validate, signal and play a move.
    Commit(String),
    /// Signal a move without playing it locally.
    Send(String),
    Undo,
    Reset,
    Flip,
    /// Show the engine's top candidate moves.
    Best,
    Help,
    Quit,
}

/// Parse one input line. Empty input is no command.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let mut tokens = line.split_whitespace();
    let verb = match tokens.next() {
        Some(verb) => verb,
        None => return Ok(None),
    };
    let arg = tokens.next();
    if let Some(extra) = tokens.next() {
        return Err(format!("unexpected argument: {}", extra));
    }

    let command = match (verb, arg) {
        ("move" | "m", Some(mv)) => ConsoleCommand::Commit(mv.to_string()),
        ("move" | "m", None) => return Err("usage: move <uci>".to_string()),
        ("send" | "s", Some(mv)) => ConsoleCommand::Send(mv.to_string()),
        ("send" | "s", None) => return Err("usage: send <uci>".to_string()),
        ("undo" | "u", None) => ConsoleCommand::Undo,
        ("reset", None) => ConsoleCommand::Reset,
        ("flip", None) => ConsoleCommand::Flip,
        ("best" | "b", None) => ConsoleCommand::Best,
        ("help" | "?", None) => ConsoleCommand::Help,
        ("quit" | "q" | "exit", None) => ConsoleCommand::Quit,
        ("undo" | "u" | "reset" | "flip" | "best" | "b" | "help" | "?" | "quit" | "q" | "exit", Some(_)) => {
            return Err(format!("{} takes no argument", verb))
        }
        _ => return Err(format!("unknown command: {} (try help)", verb)),
    };
    Ok(Some(command))
}

/// Lines printed by the help command.
pub fn help_lines() -> [&'static str; 8] {
    [
        "move <uci>  validate, signal and play a move (alias: m)",
        "send <uci>  signal a move without playing it (alias: s)",
        "undo        take back the last committed move (alias: u)",
        "reset       back to the starting position",
        "flip        flip the board view",
        "best        show the engine's top moves (alias: b)",
        "help        this text (alias: ?)",
        "quit        close the link and exit (alias: q)",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_console_args_parses_overrides() {
        let args: Vec<String> = ["--host", "10.0.0.5", "--port", "9001", "--depth", "12"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let parsed = parse_console_args(&args).unwrap();
        assert_eq!(
            parsed,
            ConsoleArgs {
                host: Some("10.0.0.5".to_string()),
                port: Some(9001),
                engine: None,
                depth: Some(12),
            }
        );
    }

    #[test]
    fn parse_console_args_defaults_to_no_overrides() {
        let parsed = parse_console_args(&[]).unwrap();
        assert_eq!(parsed, ConsoleArgs::default());
    }

    #[test]
    fn parse_console_args_rejects_unknown_flags() {
        let args = vec!["--verbose".to_string()];
        assert!(parse_console_args(&args).is_err());
    }

    #[test]
    fn parse_console_args_rejects_missing_values() {
        let args = vec!["--port".to_string()];
        assert!(parse_console_args(&args).is_err());
        let args = vec!["--port".to_string(), "many".to_string()];
        assert!(parse_console_args(&args).is_err());
    }

    #[test]
    fn parse_command_accepts_verbs_and_aliases() {
        assert_eq!(
            parse_command("move e2e4").unwrap(),
            Some(ConsoleCommand::Commit("e2e4".to_string()))
        );
        assert_eq!(
            parse_command("m e2e4").unwrap(),
            Some(ConsoleCommand::Commit("e2e4".to_string()))
        );
        assert_eq!(
            parse_command("s g1f3").unwrap(),
            Some(ConsoleCommand::Send("g1f3".to_string()))
        );
        assert_eq!(parse_command("undo").unwrap(), Some(ConsoleCommand::Undo));
        assert_eq!(parse_command("u").unwrap(), Some(ConsoleCommand::Undo));
        assert_eq!(parse_command("reset").unwrap(), Some(ConsoleCommand::Reset));
        assert_eq!(parse_command("flip").unwrap(), Some(ConsoleCommand::Flip));
        assert_eq!(parse_command("b").unwrap(), Some(ConsoleCommand::Best));
        assert_eq!(parse_command("?").unwrap(), Some(ConsoleCommand::Help));
        assert_eq!(parse_command("quit").unwrap(), Some(ConsoleCommand::Quit));
        assert_eq!(parse_command("exit").unwrap(), Some(ConsoleCommand::Quit));
    }

    #[test]
    fn parse_command_requires_a_move_argument() {
        assert!(parse_command("move").is_err());
        assert!(parse_command("send").is_err());
    }

    #[test]
    fn parse_command_rejects_extra_tokens() {
        assert!(parse_command("move e2e4 e7e5").is_err());
        assert!(parse_command("undo now").is_err());
    }

    #[test]
    fn parse_command_ignores_blank_lines() {
        assert_eq!(parse_command("").unwrap(), None);
        assert_eq!(parse_command("   \n").unwrap(), None);
    }

    #[test]
    fn parse_command_rejects_unknown_verbs() {
        let err = parse_command("attack").unwrap_err();
        assert!(err.contains("unknown command"));
    }
}
