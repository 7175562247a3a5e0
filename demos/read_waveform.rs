// Capture one waveform from an analog channel and print a short summary.

use clap::Parser;
use sds1072cml_rs::{ChannelId, Sds1072Cml};

#[derive(Parser)]
struct Args {
    /// Serial port the scope is attached to
    #[arg(long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Baud rate
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Channel to capture (1 or 2)
    #[arg(long, default_value_t = 1)]
    channel: u8,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut scope = Sds1072Cml::open(&args.port, args.baud)?;
    println!("timebase: {} s/div", scope.time_division()?);

    let id = if args.channel == 2 {
        ChannelId::Ch2
    } else {
        ChannelId::Ch1
    };
    let mut channel = scope.channel(id);
    println!(
        "channel {}: {} V/div, {:?} coupling",
        channel.id().as_str(),
        channel.vertical_division()?,
        channel.coupling()?
    );

    let waveform = channel.waveform()?;
    println!("captured {} samples", waveform.len());
    for (t, v) in waveform.time.iter().zip(&waveform.voltage).take(8) {
        println!("{t:>14.6e} s  {v:>9.4} V");
    }

    Ok(())
}
