use std::process;
use std::sync::mpsc::channel;

use clap::Parser;
use tracing::info;

use midi_note_delay::config::{Cli, Settings};
use midi_note_delay::connect::{self, Shutdown};
use midi_note_delay::driver::Driver;
use midi_note_delay::io::input::{list_input_names, open_input};
use midi_note_delay::io::output::open_output;
use midi_note_delay::{logging, status, stdin_handler, Relay, RelayError, Result, CLIENT_NAME};

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) | Err(RelayError::Cancelled) => (),
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.list {
        logging::init(cli.verbose);
        status::print_device_list(&list_input_names(CLIENT_NAME)?);
        return Ok(());
    }

    let settings = Settings::from_cli(&cli)?;
    logging::init(settings.verbose);
    info!(
        delay_ms = settings.delay.as_millis() as u64,
        wait_ms = settings.wait.as_millis() as u64,
        debounce = settings.debounce,
        "starting"
    );

    let shutdown = Shutdown::new();
    // Detached: it blocks on stdin and dies with the process.
    let _stdin = stdin_handler::spawn_stdin_handler(shutdown.clone());

    status::print_connecting(&settings.input);
    let (tx, rx) = channel::<Vec<u8>>();
    let input = connect::establish(&settings.retry_policy(), &shutdown, |attempt| {
        let opened = open_input(CLIENT_NAME, &settings.input, tx.clone());
        if opened.is_err() && attempt == 1 && !settings.wait.is_zero() {
            status::print_waiting(&settings.input, settings.wait.as_millis());
        }
        opened
    })?;
    // The connection holds the only remaining sender.
    drop(tx);
    info!(port = %input.name(), "Connected");

    info!(port = %settings.output, "Setting up virtual MIDI output");
    let output = open_output(CLIENT_NAME, &settings.output, true)?;
    status::print_relay_active(input.name(), output.name());

    let mut driver = Driver::new(Relay::new(settings.relay_config()), output, shutdown);
    driver.run(&rx);
    drop(input);
    Ok(())
}
