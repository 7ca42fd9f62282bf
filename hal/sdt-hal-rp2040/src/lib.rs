//! RP2040-specific HAL for the SDT configuration firmware
//!
//! The RP2040 has no EEPROM, so this crate emulates one in the upper part
//! of the QSPI flash (implements `sdt_hal::Eeprom`).

#![no_std]

pub mod eeprom;

// Re-export shared traits from sdt-hal for convenience
pub use sdt_hal::{Eeprom, EepromError, PageKey};
