use std::io::{stdin, BufRead};
use std::thread;

use tracing::info;

use crate::connect::Shutdown;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Exit,
    Help,
    Unknown(String),
    Empty,
}

pub fn parse_command(line: &str) -> Command {
    let cmd = line.trim();
    if cmd.is_empty() {
        return Command::Empty;
    }
    if cmd.eq_ignore_ascii_case("exit") || cmd.eq_ignore_ascii_case("quit") || cmd.eq_ignore_ascii_case("q") {
        return Command::Exit;
    }
    if cmd.eq_ignore_ascii_case("help") || cmd.eq_ignore_ascii_case("h") {
        return Command::Help;
    }
    Command::Unknown(cmd.to_string())
}

/// Spawn a thread reading console commands. `exit` requests shutdown; end of
/// input just ends the thread so the relay keeps running detached.
pub fn spawn_stdin_handler(shutdown: Shutdown) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for line in stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Command::Exit => {
                    info!("exit requested from console");
                    shutdown.request();
                    break;
                }
                Command::Help => {
                    println!("Commands:");
                    println!("  help/h       - Show this help");
                    println!("  exit/quit/q  - Send pending noteoffs and exit");
                }
                Command::Unknown(cmd) => {
                    println!("Unrecognized command: '{}'. Type 'help' for available commands.", cmd);
                }
                Command::Empty => {}
            }
            if shutdown.is_requested() {
                break;
            }
        }
    })
}
