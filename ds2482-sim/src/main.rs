use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use ds2482_emu::{BridgeBuilder, SharedBridge};

mod script;

use script::{Master, Op, parse_byte};

/// Drive an emulated DS2482 bridge with a script of I2C transactions
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Transactions: `w:<hex bytes>` (e.g. `w:e1,f0`) or `r[:count]`
    #[arg(required = true)]
    ops: Vec<Op>,

    /// I2C address the bridge answers to
    #[arg(short, long, default_value = "18", value_parser = parse_byte)]
    address: u8,

    /// I2C address the master sends to (defaults to the bridge address)
    #[arg(short, long, value_parser = parse_byte)]
    target: Option<u8>,

    /// Scheduler ticks a command may wait for parameters (omit to wait forever)
    #[arg(long)]
    retries: Option<u8>,

    /// Scheduler sleep when there is nothing to do, in milliseconds
    #[arg(long, default_value_t = 100)]
    idle_ms: u32,

    /// Enable verbose logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    // Initialize the logger
    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let builder = BridgeBuilder::new()
        .with_address(args.address)
        .with_idle_delay_ms(args.idle_ms);
    let builder = match args.retries {
        Some(retries) => builder.with_retries(retries),
        None => builder.without_timeout(),
    };
    let bridge: SharedBridge = SharedBridge::new(builder.build());
    let done = AtomicBool::new(false);
    log::info!("I2C target active at {:#04x}", bridge.address());

    let read = std::thread::scope(|s| {
        // Main loop of the emulated microcontroller
        s.spawn(|| {
            let mut delay = linux_embedded_hal::Delay;
            while !done.load(Ordering::Acquire) {
                let _ = bridge.service(&mut delay);
            }
        });
        let master = Master::new(args.target.unwrap_or(args.address), usize::from(u8::MAX));
        let read = master.run(&mut &bridge, &args.ops);
        done.store(true, Ordering::Release);
        read
    });

    for byte in &read {
        println!("{byte:02x}");
    }
    let regs = bridge.registers();
    log::info!(
        "channel={:#04x} read pointer={:?} status={:#04x}",
        regs.channel(),
        regs.read_pointer(),
        regs.status().into_bits()
    );
}
