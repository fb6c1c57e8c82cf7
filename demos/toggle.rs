// SPDX-License-Identifier: MPL-2.0

//! Toggle example.
//!
//! Reads the relay, flips it, and then watches for changes made elsewhere
//! (the physical button, another client) until the watch period ends.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example toggle -- <device_ip> [device_id] [watch_secs]
//! ```
//!
//! # Examples
//!
//! ```bash
//! # Toggle and watch for 30 seconds
//! cargo run --example toggle -- 192.168.1.40
//!
//! # With a device id, watching for 2 minutes
//! cargo run --example toggle -- 192.168.1.40 1000abcdef 120
//! ```

use std::env;
use std::time::Duration;

use sonoff_diy::subscription::Subscribable;
use sonoff_diy::{DispatcherConfig, Switch};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <device_ip> [device_id] [watch_secs]", args[0]);
        std::process::exit(1);
    }

    let device_ip = &args[1];
    let watch = args
        .get(3)
        .map(|secs| secs.parse::<u64>())
        .transpose()?
        .map_or(Duration::from_secs(30), Duration::from_secs);

    println!("=== Sonoff DIY Toggle ===");
    println!("Device: {device_ip}");
    println!();

    let mut builder = Switch::http(device_ip)
        .with_dispatcher(DispatcherConfig::new(2)?.with_cooldown(Duration::from_millis(100)))
        .with_poll_interval(Duration::from_secs(2));
    if let Some(device_id) = args.get(2) {
        builder = builder.with_device_id(device_id);
    }
    let switch = builder.build()?;

    switch.on_switch_changed(|state| {
        println!("  -> switch is now {state}");
    });
    switch.start();

    let current = switch.refresh().await?;
    println!("Current state: {current}");

    let target = current.inverted();
    println!("Setting switch {target}...");
    switch.request_set(target).await?;
    println!("Cached state: {:?}", switch.read_cached());

    println!();
    println!("Watching for changes for {}s (press the device button)...", watch.as_secs());
    tokio::time::sleep(watch).await;

    switch.stop();
    println!("Done.");
    Ok(())
}
