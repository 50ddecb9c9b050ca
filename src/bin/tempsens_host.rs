//! Host CLI for the NTC temperature sensor board.
//!
//! ```bash
//! # Read channels 0, 1 and 5 once
//! cargo run --features host --bin tempsens-host -- --port /dev/ttyUSB0 0 1 5
//!
//! # Keep reading every two seconds
//! cargo run --features host --bin tempsens-host -- --port /dev/ttyUSB0 --interval-ms 2000 0 1
//! ```

use std::thread;
use std::time::Duration;

use clap::Parser;
use log::{error, info};
use ntc_tempsens::config::BAUD_RATE;
use ntc_tempsens::host::TempSensClient;

/// Reads NTC thermistor temperatures from the sensor board over serial.
#[derive(Parser)]
struct Cli {
    /// Serial port
    #[arg(short, long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Serial baud rate
    #[arg(short, long, default_value_t = BAUD_RATE)]
    baud: u32,

    /// Read timeout per reply, in seconds
    #[arg(short, long, default_value_t = 5)]
    timeout_secs: u64,

    /// Time the board needs to reboot after the port is opened, in milliseconds
    #[arg(long, default_value_t = 2000)]
    settle_ms: u64,

    /// Keep polling at this interval instead of reading once
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Channels to read
    #[arg(required = true, allow_negative_numbers = true)]
    channels: Vec<i32>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();

    let port = serialport::new(&cli.port, cli.baud)
        .timeout(Duration::from_secs(cli.timeout_secs))
        .open()
        .inspect_err(|e| {
            error!(
                "Could not connect to port {}. Maybe it is used by another process? ({})",
                cli.port, e
            )
        })?;

    // Opening the port resets the board
    thread::sleep(Duration::from_millis(cli.settle_ms));

    let mut client = TempSensClient::new(port);
    client.probe()?;
    info!("Connected to {} at {} baud", cli.port, cli.baud);

    loop {
        let temps = client.get_temp(&cli.channels)?;
        for (channel, celsius) in &temps {
            println!("{channel}\t{celsius:.2}");
        }

        match cli.interval_ms {
            Some(interval) => thread::sleep(Duration::from_millis(interval)),
            None => return Ok(()),
        }
    }
}
