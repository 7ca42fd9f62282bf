//! Peripheral drivers
//!
//! Concrete implementations of the collaborator traits defined in
//! sdt-core:
//!
//! - Band-pass filter relay board (MCP23017 port expander)

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod bpf;
