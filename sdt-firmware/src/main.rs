//! SDT configuration firmware
//!
//! Main firmware binary for RP2040-based SDT control boards. Brings the
//! persisted configuration up from emulated EEPROM, probes the band-pass
//! filter board and hands both to the config task.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::i2c::{Config as I2cConfig, I2c};
use {defmt_rtt as _, panic_probe as _};

use sdt_core::ConfigStore;
use sdt_drivers::bpf::{Mcp23017Bpf, DEFAULT_ADDRESS};
use sdt_hal::NoCard;
use sdt_hal_rp2040::eeprom::Rp2040Eeprom;

use crate::channels::{ConfigRequest, CONFIG_REQUEST};

mod channels;
mod tasks;

/// Filter board I2C clock
const BPF_I2C_FREQUENCY: u32 = 100_000;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("SDT config firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Load configuration from emulated EEPROM
    let eeprom = Rp2040Eeprom::new(p.FLASH, p.DMA_CH0).await;
    let (store, report) = ConfigStore::startup(eeprom, None);
    info!(
        "Configuration loaded: {} (stored tag {})",
        report.source, report.stored_tag
    );
    if report.recalibrated {
        warn!("Switch calibration reset to defaults, recalibrate the front panel");
    }

    // Band-pass filter board on I2C1 (GP2 = SDA, GP3 = SCL)
    let mut i2c_config = I2cConfig::default();
    i2c_config.frequency = BPF_I2C_FREQUENCY;
    let i2c = I2c::new_blocking(p.I2C1, p.PIN_3, p.PIN_2, i2c_config);
    let mut relay = Mcp23017Bpf::new(i2c, DEFAULT_ADDRESS);
    match relay.init() {
        Ok(()) => info!("BPF board found at 0x{:02x}", DEFAULT_ADDRESS),
        Err(e) => warn!("BPF board not found at 0x{:02x}: {}", DEFAULT_ADDRESS, e),
    }

    // No card interface on this board yet; the slot always reads as empty
    spawner.spawn(unwrap!(tasks::config_task(store, relay, NoCard)));
    info!("All tasks spawned, firmware running");

    CONFIG_REQUEST.send(ConfigRequest::Dump).await;

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
