//! Interactive telegraph console (default binary).
//!
//! This is the operator entrypoint: a line-oriented prompt in front of the
//! session controller. The link client reconnects in the background on its
//! own; the prompt only ever sees connected or not.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use crossterm::style::Stylize;

use chess_telegraph::console::command::{self, parse_command, ConsoleCommand};
use chess_telegraph::console::view;
use chess_telegraph::engine::{EngineConfig, UciEngine};
use chess_telegraph::error::SessionError;
use chess_telegraph::link::{LinkConfig, LinkHandle, LinkState};
use chess_telegraph::session::SessionController;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let overrides = command::parse_console_args(&args)?;

    let mut engine_config = EngineConfig::from_env();
    if let Some(path) = overrides.engine {
        engine_config.path = path;
    }
    if let Some(depth) = overrides.depth {
        engine_config.depth = depth;
    }

    let mut link_config = LinkConfig::from_env();
    if let Some(host) = overrides.host {
        link_config.host = host;
    }
    if let Some(port) = overrides.port {
        link_config.port = port;
    }
    let addr = format!("{}:{}", link_config.host, link_config.port);

    let engine = UciEngine::start(&engine_config)
        .with_context(|| format!("failed to start rule engine {:?}", engine_config.path))?;
    let link = LinkHandle::start(link_config);
    let mut session = SessionController::new(engine, link);

    println!("chess-telegraph {} -> {}", env!("CARGO_PKG_VERSION"), addr);

    let result = run(&mut session, &addr);

    // Always close the link before exiting.
    session.link().shutdown();
    result
}

fn run(session: &mut SessionController<UciEngine, LinkHandle>, addr: &str) -> Result<()> {
    let mut flipped = false;

    println!();
    for line in command::help_lines() {
        println!("  {}", line);
    }
    draw(session, addr, flipped)?;

    let stdin = io::stdin();
    let mut input = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let parsed = match parse_command(&input) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => continue,
            Err(msg) => {
                println!("{}", msg.red());
                continue;
            }
        };

        match parsed {
            ConsoleCommand::Commit(mv) => match session.commit_move(&mv) {
                Ok(()) => {
                    println!("{}", format!("signaled and played {}", mv).green());
                    draw(session, addr, flipped)?;
                }
                Err(err) => println!("{}", err.to_string().red()),
            },
            ConsoleCommand::Send(mv) => match session.send_raw(&mv) {
                Ok(()) => println!("{}", format!("signaled {}", mv).green()),
                Err(err) => println!("{}", err.to_string().red()),
            },
            ConsoleCommand::Undo => match session.undo() {
                // Nothing to undo is not worth an error message.
                Ok(()) | Err(SessionError::EmptyHistory) => draw(session, addr, flipped)?,
                Err(err) => println!("{}", err.to_string().red()),
            },
            ConsoleCommand::Reset => match session.reset() {
                Ok(()) => draw(session, addr, flipped)?,
                Err(err) => println!("{}", err.to_string().red()),
            },
            ConsoleCommand::Flip => {
                flipped = !flipped;
                draw(session, addr, flipped)?;
            }
            ConsoleCommand::Best => match session.best_moves(3) {
                Ok(moves) => {
                    for line in view::score_lines(&moves) {
                        println!("  {}", line);
                    }
                }
                Err(err) => println!("{}", err.to_string().red()),
            },
            ConsoleCommand::Help => {
                for line in command::help_lines() {
                    println!("  {}", line);
                }
            }
            ConsoleCommand::Quit => break,
        }
    }

    Ok(())
}

fn draw(
    session: &mut SessionController<UciEngine, LinkHandle>,
    addr: &str,
    flipped: bool,
) -> Result<()> {
    let snapshot = session.position()?;

    println!();
    for line in view::board_lines(&snapshot, flipped) {
        println!("  {}", line);
    }
    println!();

    let state = session.link_state();
    for line in view::status_lines(addr, state, session.history_len(), &snapshot) {
        if line.starts_with("LINK") {
            let styled = match state {
                LinkState::Connected => line.green(),
                LinkState::Closed => line.red(),
                _ => line.yellow(),
            };
            println!("  {}", styled);
        } else {
            println!("  {}", line);
        }
    }
    println!();
    Ok(())
}
