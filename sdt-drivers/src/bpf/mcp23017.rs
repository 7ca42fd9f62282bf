//! MCP23017 band-pass filter board
//!
//! The filter board switches its relays from a 16-bit MCP23017 I2C port
//! expander. Every pin is an output; exactly one relay pattern is driven at
//! a time.
//!
//! # Register access
//!
//! With the power-on `IOCON.BANK = 0` mapping, A and B registers alternate
//! and the address pointer auto-increments, so one write of
//! `[reg_a, value_a, value_b]` sets both ports.

use embedded_hal::i2c::I2c;
use sdt_core::config::{Band, NUMBER_OF_BANDS};
use sdt_core::traits::BandRelay;

/// I2C address with A2..A0 strapped to `100`
pub const DEFAULT_ADDRESS: u8 = 0x24;

/// MCP23017 register addresses (`IOCON.BANK = 0`)
pub mod reg {
    /// Port A direction
    pub const IODIRA: u8 = 0x00;
    /// Port B direction
    pub const IODIRB: u8 = 0x01;
    /// Port A level
    pub const GPIOA: u8 = 0x12;
    /// Port B level
    pub const GPIOB: u8 = 0x13;
}

/// Relay pattern per band, port A in the low byte
const BAND_PATTERNS: [u16; NUMBER_OF_BANDS] = [
    0x0001, // 80m
    0x0002, // 60m
    0x0004, // 40m
    0x0008, // 30m
    0x0010, // 20m
    0x0020, // 17m
    0x0040, // 15m
    0x0080, // 12m
    0x0100, // 10m
    0x0200, // 6m
];

/// Relay pattern routing around every filter
pub const BYPASS: u16 = 0x0400;

/// Relay pattern for `band`
pub fn band_pattern(band: Band) -> u16 {
    BAND_PATTERNS[band.index()]
}

/// Filter board driven through an MCP23017
pub struct Mcp23017Bpf<I> {
    i2c: I,
    address: u8,
    present: bool,
    /// Last pattern written
    state: u16,
}

impl<I: I2c> Mcp23017Bpf<I> {
    /// Create the driver; nothing is sent until [`init`](Self::init)
    pub fn new(i2c: I, address: u8) -> Self {
        Self {
            i2c,
            address,
            present: false,
            state: BYPASS,
        }
    }

    /// Probe the board, make every pin an output and select bypass
    ///
    /// A board that does not acknowledge is recorded as absent and later
    /// band changes are skipped.
    pub fn init(&mut self) -> Result<(), I::Error> {
        let result = self
            .i2c
            .write(self.address, &[reg::IODIRA, 0x00, 0x00])
            .and_then(|()| self.write_pattern(BYPASS));

        self.present = result.is_ok();
        self.state = BYPASS;
        result
    }

    /// Last relay pattern written
    pub fn state(&self) -> u16 {
        self.state
    }

    /// Give back the bus
    pub fn release(self) -> I {
        self.i2c
    }

    fn write_pattern(&mut self, pattern: u16) -> Result<(), I::Error> {
        let [low, high] = pattern.to_le_bytes();
        self.i2c.write(self.address, &[reg::GPIOA, low, high])
    }
}

impl<I: I2c> BandRelay for Mcp23017Bpf<I> {
    fn set_active_band(&mut self, band: Band) {
        if !self.present {
            return;
        }

        let pattern = band_pattern(band);
        // A failed write keeps the previous relays; the next band change retries
        if self.write_pattern(pattern).is_ok() {
            self.state = pattern;
        }
    }

    fn is_present(&self) -> bool {
        self.present
    }
}
