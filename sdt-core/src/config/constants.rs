//! Compile-time dimensions of the configuration schema
//!
//! Changing any of these changes the record size and therefore the schema
//! tag, which resets every device to defaults on its next boot.

/// Number of bands every per-band table covers
pub const NUMBER_OF_BANDS: usize = 10;

/// Receive and transmit equalizer cells
pub const EQUALIZER_CELL_COUNT: usize = 14;

/// Thresholds of the front-panel resistor-ladder switch matrix
pub const NUMBER_OF_SWITCHES: usize = 18;

/// User-curated favorite frequencies
pub const MAX_FAVORITES: usize = 13;

/// Tunable channels (VFO A and B)
pub const NUMBER_OF_VFOS: usize = 2;

/// Width of the schema tag at the start of the record
pub const TAG_LEN: usize = 10;

/// Human-assigned part of the schema tag
pub const SCHEMA_LABEL: &str = "V050";

/// Address of the record in the binary store
pub const EEPROM_BASE_ADDRESS: u32 = 0;

/// Stored widths of the text fields
pub const MAP_FILE_NAME_LEN: usize = 50;
pub const CALL_LEN: usize = 10;
pub const TIME_ZONE_LEN: usize = 10;

/// Upper bound on lines read from the text mirror
pub const MAX_SD_ITEMS: usize = 400;

/// Name of the text mirror on the card
pub const TEXT_MIRROR_FILE: &str = "SDEEPROMData.txt";

/// Switch-calibration sanity window, checked at [`SWITCH_SANITY_INDEX`]
pub const SWITCH_SANITY_INDEX: usize = 9;
pub const SWITCH_SANITY_MIN: i32 = 440;
pub const SWITCH_SANITY_MAX: i32 = 480;

/// Full-scale reading of the switch-matrix ADC
pub const SWITCH_ADC_MAX: i32 = 1023;
