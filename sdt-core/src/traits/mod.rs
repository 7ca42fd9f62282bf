//! Collaborator traits
//!
//! The store drives these; board crates implement them.

pub mod panel;
pub mod relay;

pub use panel::{DisplayNotifier, NoDisplay, SwitchCalibrator};
pub use relay::BandRelay;
