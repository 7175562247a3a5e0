// Read the trigger configuration, move it to an edge capture on the given
// source, and report whether the scope adopted every field.

use clap::Parser;
use sds1072cml_rs::{Sds1072Cml, TriggerMode, TriggerSlope, TriggerSource, TriggerUpdate};

#[derive(Parser)]
struct Args {
    /// Serial port the scope is attached to
    #[arg(long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Baud rate
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Trigger source (EX, EX/5, C1, C2)
    #[arg(long, default_value = "C1")]
    source: TriggerSource,

    /// Trigger level in volts
    #[arg(long, default_value_t = 0.5)]
    level: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut scope = Sds1072Cml::open(&args.port, args.baud)?;
    let mut trigger = scope.trigger();

    let current = trigger.read()?;
    println!("current trigger: {current:?}");

    let update = TriggerUpdate::new()
        .source(args.source)
        .slope(TriggerSlope::Positive)
        .level(args.level)
        .mode(TriggerMode::Single);

    if trigger.write(&update)? {
        println!("trigger converged");
    } else {
        println!("scope rejected part of the update: {:?}", trigger.read()?);
    }

    Ok(())
}
