//! Board-agnostic configuration store for the SDT control board
//!
//! This crate holds everything about persisted configuration that does not
//! depend on a specific chip:
//!
//! - The configuration record, its defaults and its binary layout
//! - Schema version tags and migration of legacy layouts
//! - The working-variable mirror the rest of the firmware operates on
//! - The line-oriented text mirror kept on removable storage
//! - Startup sequencing and the store facade tying it together
//! - Traits for the collaborators the store drives (band relays, display)

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod config;
pub mod store;
pub mod text;
pub mod traits;
pub mod working;

pub use config::{Band, ConfigRecord, Region, SchemaTag, Vfo};
pub use store::{ConfigStore, StartupReport, StoreError};
pub use working::WorkingState;
