//! Coloured one-line banners for the console.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn banner(color: Color, text: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_intense(true));
    let _ = writeln!(&mut stdout, "{}", text);
    let _ = stdout.reset();
}

pub fn print_connecting(input: &str) {
    banner(Color::Yellow, &format!("Connecting to {}", input));
}

pub fn print_waiting(input: &str, wait_ms: u128) {
    banner(Color::Red, &format!("{} not available | retrying every {} ms", input, wait_ms));
}

pub fn print_relay_active(input: &str, output: &str) {
    banner(Color::Green, &format!("Relaying {} -> {}", input, output));
    print_quick_help();
}

pub fn print_quick_help() {
    banner(Color::Blue, "Type 'help' for commands, 'exit' to quit");
}

pub fn print_device_list(names: &[String]) {
    println!("Available MIDI devices...");
    for name in names {
        println!(" - {}", name);
    }
}
