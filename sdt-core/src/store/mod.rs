//! Configuration store
//!
//! [`ConfigStore`] owns the active record, the working variables derived
//! from it and the binary store backing both. The text mirror on a card is
//! reached only through explicit export and import calls.
//!
//! # Usage
//!
//! ```ignore
//! let (mut store, report) = ConfigStore::startup(eeprom, None);
//! store.working_mut().audio_volume = 40;
//! store.save()?;
//! store.export_to_card(&mut card)?;
//! ```

pub mod binary;
pub mod startup;

pub use binary::BinaryStore;
pub use startup::{RecordSource, StartupEvent, StartupReport, StartupState};

use sdt_hal::{Card, CardError, Eeprom, EepromError};

use crate::config::record::ConfigRecord;
use crate::config::version::CURRENT_TAG;
use crate::config::{Band, MAX_FAVORITES, TEXT_MIRROR_FILE};
use crate::text::{self, ImportReport};
use crate::traits::{BandRelay, DisplayNotifier, SwitchCalibrator};
use crate::working::WorkingState;

/// Errors from store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Card missing or not mountable
    DeviceUnavailable,
    /// Text mirror file not on the card
    NotFound,
    /// Binary store access failed
    Eeprom(EepromError),
    /// Card access failed after mounting
    Card(CardError),
    /// Favorite slot out of range
    InvalidSlot,
}

impl From<EepromError> for StoreError {
    fn from(e: EepromError) -> Self {
        StoreError::Eeprom(e)
    }
}

impl From<CardError> for StoreError {
    fn from(e: CardError) -> Self {
        match e {
            CardError::NotMounted => StoreError::DeviceUnavailable,
            CardError::NotFound => StoreError::NotFound,
            other => StoreError::Card(other),
        }
    }
}

/// Persisted configuration and its working copy
pub struct ConfigStore<E> {
    binary: BinaryStore<E>,
    record: ConfigRecord,
    working: WorkingState,
    card_in_sync: bool,
}

impl<E: Eeprom> ConfigStore<E> {
    /// Run the startup sequence on `eeprom` and load the working variables
    pub fn startup(
        eeprom: E,
        calibrator: Option<&mut dyn SwitchCalibrator>,
    ) -> (Self, StartupReport) {
        let mut binary = BinaryStore::new(eeprom);
        let (record, report) = startup::run(&mut binary, calibrator);
        let working = WorkingState::from_record(&record);

        let store = Self {
            binary,
            record,
            working,
            card_in_sync: false,
        };
        (store, report)
    }

    /// The in-memory record, as last saved or loaded
    pub fn record(&self) -> &ConfigRecord {
        &self.record
    }

    pub fn working(&self) -> &WorkingState {
        &self.working
    }

    pub fn working_mut(&mut self) -> &mut WorkingState {
        &mut self.working
    }

    /// Whether the card mirror matches the binary store
    pub fn is_card_in_sync(&self) -> bool {
        self.card_in_sync
    }

    /// Copy the working variables into the record and write it out
    pub fn save(&mut self) -> Result<(), StoreError> {
        self.working.save_to_record(&mut self.record);
        self.binary.write_record(&self.record)?;
        self.card_in_sync = false;
        debug!("Config saved");
        Ok(())
    }

    /// Save, then write the text mirror to `card`
    ///
    /// Returns the number of lines written.
    pub fn export_to_card<C: Card>(&mut self, card: &mut C) -> Result<usize, StoreError> {
        card.mount()?;
        self.save()?;

        let mut file = card.create(TEXT_MIRROR_FILE)?;
        let lines = text::export(&self.record, &mut file).map_err(|_e| {
            error!("Text mirror write failed");
            StoreError::Card(CardError::Io)
        })?;

        self.card_in_sync = true;
        info!("Exported {} config lines to card", lines);
        Ok(lines)
    }

    /// Load the text mirror from `card` and make it the active configuration
    ///
    /// The file is applied to a copy of the record; on any error the active
    /// configuration is left as it was. On success the result is written to
    /// the binary store, the working variables reload and the display is
    /// redrawn.
    pub fn import_from_card<C: Card>(
        &mut self,
        card: &mut C,
        display: &mut dyn DisplayNotifier,
    ) -> Result<ImportReport, StoreError> {
        card.mount()?;

        let mut imported = self.record.clone();
        let report = {
            let mut file = card.open(TEXT_MIRROR_FILE)?;
            text::import(&mut imported, &mut file).map_err(|_e| {
                error!("Text mirror read failed");
                StoreError::Card(CardError::Io)
            })?
        };

        if report.truncated() {
            warn!(
                "Text mirror covers {} of {} lines",
                report.lines_read,
                text::line_count()
            );
        }

        imported.version_settings = CURRENT_TAG;
        self.binary.write_record(&imported)?;
        self.record = imported;
        self.working.load_from_record(&self.record);
        self.card_in_sync = true;
        display.redraw();

        info!("Imported config from card: {}", report);
        Ok(report)
    }

    /// Log every line of the text rendering of the record
    ///
    /// Returns the number of lines logged.
    pub fn dump(&self) -> usize {
        let mut lines = 0;
        for (field, index) in text::entries() {
            let _line = text::fields::render_line(&self.record, field, index);
            info!("{=str}", _line.as_str());
            lines += 1;
        }
        lines
    }

    /// Store the live frequency in favorite `slot` and save
    pub fn store_favorite(&mut self, slot: usize) -> Result<(), StoreError> {
        if slot >= MAX_FAVORITES {
            return Err(StoreError::InvalidSlot);
        }

        let freq = self.working.tx_rx_freq();
        self.record.favorite_freqs[slot] = freq;
        self.working.favorite_frequencies[slot] = freq;
        self.working.tune_active_vfo(freq);
        info!("Favorite {} = {} Hz", slot, freq);
        self.save()
    }

    /// Tune to favorite `slot`, switching bands if needed
    ///
    /// Returns the band tuned to. Nothing is saved.
    pub fn recall_favorite(
        &mut self,
        slot: usize,
        relay: &mut dyn BandRelay,
    ) -> Result<Band, StoreError> {
        let freq = *self
            .record
            .favorite_freqs
            .get(slot)
            .ok_or(StoreError::InvalidSlot)?;

        let band = self.working.tune_to(freq);
        relay.set_active_band(band);
        debug!("Recalled favorite {}: {} Hz on {}", slot, freq, band);
        Ok(band)
    }

    /// Move the active VFO to `band` and route the filters for it
    pub fn select_band(&mut self, band: Band, relay: &mut dyn BandRelay) {
        self.working.select_band(band);
        relay.set_active_band(band);
        debug!("Band {} at {} Hz", band, self.working.tx_rx_freq());
    }

    /// Erase the stored record and replace it with defaults
    ///
    /// The switch calibration survives so the panel keeps working.
    pub fn factory_reset(&mut self) -> Result<(), StoreError> {
        warn!("Factory reset");
        self.binary.clear()?;

        let mut defaults = ConfigRecord::defaults();
        defaults.switch_values = self.record.switch_values;
        self.binary.write_record(&defaults)?;

        self.record = defaults;
        self.working.load_from_record(&self.record);
        self.card_in_sync = false;
        Ok(())
    }

    /// Give back the EEPROM
    pub fn release(self) -> E {
        self.binary.release()
    }
}
