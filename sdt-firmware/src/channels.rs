//! Inter-task communication channels
//!
//! Everything that touches persisted configuration goes through
//! [`CONFIG_REQUEST`], so only the config task ever holds the store.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use sdt_core::Band;

/// Channel capacity for config requests
const CONFIG_CHANNEL_SIZE: usize = 4;

/// Operations on the persisted configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum ConfigRequest {
    /// Write the working variables to EEPROM
    Save,
    /// Move the active VFO to a band and switch the filter relays
    SelectBand(Band),
    /// Store the live frequency in a favorite slot
    StoreFavorite(usize),
    /// Tune to a favorite slot
    RecallFavorite(usize),
    /// Log every configuration line
    Dump,
    /// Replace the stored record with defaults
    FactoryReset,
    /// Save, then write the text mirror to the card
    ExportToCard,
    /// Load the text mirror from the card and make it active
    ImportFromCard,
}

/// Requests for the config task, handled strictly in order
pub static CONFIG_REQUEST: Channel<CriticalSectionRawMutex, ConfigRequest, CONFIG_CHANNEL_SIZE> =
    Channel::new();
