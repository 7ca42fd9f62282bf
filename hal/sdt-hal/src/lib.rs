//! SDT Hardware Abstraction Layer
//!
//! Traits for the storage devices the configuration store persists to.
//! Chip-specific crates implement them on real hardware; the RAM-backed
//! implementations here serve as shadows and test doubles.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (sdt-core, sdt-firmware)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  sdt-hal (this crate - traits)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │  sdt-hal-     │
//!             │   rp2040      │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`eeprom::Eeprom`] - Byte-addressable non-volatile memory
//! - [`card::Card`] - Removable volume holding text files
//!
//! With the `std` feature, [`dir::DirCard`] serves a host directory as a
//! card volume.

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod card;
#[cfg(feature = "std")]
pub mod dir;
pub mod eeprom;

pub use card::{Card, CardError, NoCard, RamCard};
#[cfg(feature = "std")]
pub use dir::DirCard;
pub use eeprom::{Eeprom, EepromError, PageKey, RamEeprom};
