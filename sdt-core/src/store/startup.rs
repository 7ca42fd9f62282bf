//! Startup orchestration
//!
//! Decides, once per boot, where the configuration comes from. The tag is
//! read on its own first so a record in a foreign layout is never decoded
//! into typed fields.
//!
//! ```text
//! Uninitialized ──TagRead(Current)──────────────────────────────▶ Valid
//!       │  └──────TagRead(Legacy)──▶ LegacyDetected ─TagRewritten─▶ Valid
//!       └─────────TagRead(Foreign)─▶ VersionMismatch ─DefaultsWritten▶ Valid
//! ```

use sdt_hal::{Eeprom, EepromError};

use super::binary::BinaryStore;
use crate::config::record::ConfigRecord;
use crate::config::version::{LegacyVersion, SchemaTag, TagCheck, CURRENT_TAG};
use crate::traits::SwitchCalibrator;

/// Startup states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartupState {
    /// Nothing read yet
    Uninitialized,
    /// Stored tag is a migratable legacy tag
    LegacyDetected(LegacyVersion),
    /// Stored tag is neither current nor legacy
    VersionMismatch,
    /// Stored data (or freshly written defaults) has the current layout
    Valid,
}

/// Events that advance startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartupEvent {
    /// Stored tag read and classified
    TagRead(TagCheck),
    /// Legacy tag replaced by the current one
    TagRewritten,
    /// Defaults written over a mismatched record
    DefaultsWritten,
}

impl StartupState {
    /// Process an event and return the next state
    pub fn transition(self, event: StartupEvent) -> Self {
        use StartupEvent::*;
        use StartupState::*;

        match (self, event) {
            (Uninitialized, TagRead(TagCheck::Current)) => Valid,
            (Uninitialized, TagRead(TagCheck::Legacy(version))) => LegacyDetected(version),
            (Uninitialized, TagRead(TagCheck::Foreign)) => VersionMismatch,

            (LegacyDetected(_), TagRewritten) => Valid,
            (VersionMismatch, DefaultsWritten) => Valid,

            // Default: stay in current state
            _ => self,
        }
    }

    /// Whether the configuration can be loaded
    pub fn is_terminal(&self) -> bool {
        matches!(self, StartupState::Valid)
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordSource {
    /// Read back unchanged
    Stored,
    /// Read back from a legacy layout and migrated
    Migrated(LegacyVersion),
    /// Schema changed; defaults generated and written
    Defaulted,
    /// Device access failed; defaults in use
    Fallback,
}

/// Summary of a startup run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StartupReport {
    pub source: RecordSource,
    /// Tag found on the device before startup touched it
    pub stored_tag: SchemaTag,
    /// Switch calibration was unusable and the record was reset
    pub recalibrated: bool,
}

/// Bring the binary store to a usable state and return the active record
///
/// Never fails: device errors and unusable data end in defaults.
pub fn run<E: Eeprom>(
    store: &mut BinaryStore<E>,
    calibrator: Option<&mut dyn SwitchCalibrator>,
) -> (ConfigRecord, StartupReport) {
    let (mut record, source, stored_tag) = match load(store) {
        Ok(loaded) => loaded,
        Err(_e) => {
            error!("Config EEPROM access failed: {}, using defaults", _e);
            let defaults = ConfigRecord::defaults();
            if let Err(_e) = store.write_record(&defaults) {
                error!("Writing defaults failed: {}", _e);
            }
            (defaults, RecordSource::Fallback, SchemaTag::EMPTY)
        }
    };

    let mut recalibrated = false;
    if !record.is_valid() || !record.switches_calibrated() || !record.switches_ordered() {
        warn!(
            "Switch calibration unusable (first {}, probe {}), resetting to defaults",
            record.switch_values[0],
            record.switch_values[crate::config::SWITCH_SANITY_INDEX]
        );
        record = ConfigRecord::defaults();
        if let Some(calibrator) = calibrator {
            info!("Capturing switch thresholds");
            calibrator.capture(&mut record.switch_values);
        }
        if let Err(_e) = store.write_record(&record) {
            error!("Writing recalibrated config failed: {}", _e);
        }
        recalibrated = true;
    }

    let report = StartupReport {
        source,
        stored_tag,
        recalibrated,
    };
    info!("Config ready: {}", report);
    (record, report)
}

fn load<E: Eeprom>(
    store: &mut BinaryStore<E>,
) -> Result<(ConfigRecord, RecordSource, SchemaTag), EepromError> {
    let stored_tag = store.read_tag()?;
    let mut state = StartupState::Uninitialized.transition(StartupEvent::TagRead(stored_tag.check()));
    debug!("Stored config tag {}, state {}", stored_tag, state);

    let mut legacy = None;
    if let StartupState::LegacyDetected(version) = state {
        info!("Legacy config {} (ordinal {}), migrating", version.tag(), version.ordinal());
        store.write_tag(&CURRENT_TAG)?;
        legacy = Some(version);
        state = state.transition(StartupEvent::TagRewritten);
    }

    if state == StartupState::VersionMismatch {
        warn!("Config schema mismatch: stored {}, expected {}", stored_tag, CURRENT_TAG);
        let defaults = ConfigRecord::defaults();
        store.write_record(&defaults)?;
        state = state.transition(StartupEvent::DefaultsWritten);
        debug_assert!(state.is_terminal());
        return Ok((defaults, RecordSource::Defaulted, stored_tag));
    }

    let mut record = store.read_record()?;
    let source = match legacy {
        Some(version) => {
            record.migrate_from(version);
            RecordSource::Migrated(version)
        }
        None => RecordSource::Stored,
    };
    Ok((record, source, stored_tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::layout::RECORD_SIZE;
    use crate::config::{NUMBER_OF_SWITCHES, TAG_LEN};
    use sdt_hal::RamEeprom;

    type Ram = RamEeprom<2048>;

    fn store_with(record: &ConfigRecord) -> BinaryStore<Ram> {
        let mut store = BinaryStore::new(Ram::new());
        store.write_record(record).unwrap();
        store
    }

    struct FixedCalibrator([i32; NUMBER_OF_SWITCHES]);

    impl SwitchCalibrator for FixedCalibrator {
        fn capture(&mut self, values: &mut [i32; NUMBER_OF_SWITCHES]) {
            *values = self.0;
        }
    }

    /// Fails every access
    struct DeadEeprom;

    impl Eeprom for DeadEeprom {
        fn capacity(&self) -> usize {
            4096
        }

        fn read(&mut self, _address: u32, _buf: &mut [u8]) -> Result<(), EepromError> {
            Err(EepromError::Device)
        }

        fn write(&mut self, _address: u32, _data: &[u8]) -> Result<(), EepromError> {
            Err(EepromError::Device)
        }
    }

    #[test]
    fn test_transitions() {
        use StartupEvent::*;
        use StartupState::*;

        assert_eq!(Uninitialized.transition(TagRead(TagCheck::Current)), Valid);
        assert_eq!(
            Uninitialized.transition(TagRead(TagCheck::Legacy(LegacyVersion::V049_2))),
            LegacyDetected(LegacyVersion::V049_2)
        );
        assert_eq!(Uninitialized.transition(TagRead(TagCheck::Foreign)), VersionMismatch);
        assert_eq!(LegacyDetected(LegacyVersion::V049_1).transition(TagRewritten), Valid);
        assert_eq!(VersionMismatch.transition(DefaultsWritten), Valid);
    }

    #[test]
    fn test_unexpected_events_ignored() {
        use StartupEvent::*;
        use StartupState::*;

        assert_eq!(Uninitialized.transition(TagRewritten), Uninitialized);
        assert_eq!(VersionMismatch.transition(TagRewritten), VersionMismatch);
        assert_eq!(Valid.transition(TagRead(TagCheck::Foreign)), Valid);
        assert!(!VersionMismatch.is_terminal());
    }

    #[test]
    fn test_current_record_loaded() {
        let mut stored = ConfigRecord::defaults();
        stored.audio_volume = 61;
        let mut store = store_with(&stored);

        let (record, report) = run(&mut store, None);
        assert_eq!(record, stored);
        assert_eq!(report.source, RecordSource::Stored);
        assert!(!report.recalibrated);
    }

    #[test]
    fn test_legacy_v049_1_migrated() {
        let mut stored = ConfigRecord::defaults();
        stored.compressor_flag = 1;
        stored.audio_volume = 23;
        let mut store = store_with(&stored);
        store.write_tag(&SchemaTag::from_text("V049.1")).unwrap();

        let (record, report) = run(&mut store, None);

        assert_eq!(report.source, RecordSource::Migrated(LegacyVersion::V049_1));
        assert_eq!(report.stored_tag, SchemaTag::from_text("V049.1"));
        assert_eq!(record.compressor_flag, 0);
        assert_eq!(record.audio_volume, 23);
        assert!(record.version_settings.is_current());
        // Tag rewritten on the device, body left alone
        assert!(store.read_tag().unwrap().is_current());
        assert_eq!(store.read_record().unwrap().compressor_flag, 1);
    }

    #[test]
    fn test_legacy_v049_2_keeps_fields() {
        let mut stored = ConfigRecord::defaults();
        stored.compressor_flag = 1;
        let mut store = store_with(&stored);
        store.write_tag(&SchemaTag::from_text("V049.2")).unwrap();

        let (record, report) = run(&mut store, None);
        assert_eq!(report.source, RecordSource::Migrated(LegacyVersion::V049_2));
        assert_eq!(record.compressor_flag, 1);
    }

    #[test]
    fn test_foreign_tag_resets_to_defaults() {
        let mut stored = ConfigRecord::defaults();
        stored.audio_volume = 99;
        stored.my_call.set("DB2OO");
        let mut store = store_with(&stored);
        store.write_tag(&SchemaTag::from_text("V048_1200")).unwrap();

        let (record, report) = run(&mut store, None);

        assert_eq!(report.source, RecordSource::Defaulted);
        assert_eq!(record, ConfigRecord::defaults());
        assert_eq!(store.read_record().unwrap(), ConfigRecord::defaults());
    }

    #[test]
    fn test_blank_device_gets_defaults() {
        let mut store = BinaryStore::new(Ram::new());

        let (record, report) = run(&mut store, None);
        assert_eq!(report.source, RecordSource::Defaulted);
        assert_eq!(report.stored_tag, SchemaTag::from_bytes([0xFF; TAG_LEN]));
        assert_eq!(record, ConfigRecord::defaults());
    }

    #[test]
    fn test_uncalibrated_switches_force_recalibration() {
        let mut stored = ConfigRecord::defaults();
        stored.switch_values[crate::config::SWITCH_SANITY_INDEX] = 0;
        stored.audio_volume = 70;
        let mut store = store_with(&stored);

        let mut captured = crate::config::defaults::DEFAULT_SWITCH_VALUES;
        captured[0] = 930;
        let mut calibrator = FixedCalibrator(captured);

        let (record, report) = run(&mut store, Some(&mut calibrator));

        assert!(report.recalibrated);
        assert_eq!(report.source, RecordSource::Stored);
        assert_eq!(record.switch_values, captured);
        assert_eq!(record.audio_volume, ConfigRecord::defaults().audio_volume);
        assert_eq!(store.read_record().unwrap(), record);
    }

    #[test]
    fn test_invalid_first_switch_forces_defaults() {
        let mut stored = ConfigRecord::defaults();
        stored.switch_values[0] = 1023;
        let mut store = store_with(&stored);

        let (record, report) = run(&mut store, None);
        assert!(report.recalibrated);
        assert_eq!(record, ConfigRecord::defaults());
    }

    #[test]
    fn test_unordered_switch_table_forces_defaults() {
        let mut stored = ConfigRecord::defaults();
        stored.switch_values.swap(0, 1);
        let mut store = store_with(&stored);

        let (record, report) = run(&mut store, None);
        assert!(report.recalibrated);
        assert!(record.switches_ordered());
    }

    #[test]
    fn test_device_failure_falls_back() {
        let mut store = BinaryStore::new(DeadEeprom);

        let (record, report) = run(&mut store, None);
        assert_eq!(report.source, RecordSource::Fallback);
        assert_eq!(record, ConfigRecord::defaults());
    }

    #[test]
    fn test_device_too_small_falls_back() {
        let mut store = BinaryStore::new(RamEeprom::<{ RECORD_SIZE - 1 }>::new());
        let (_, report) = run(&mut store, None);
        assert_eq!(report.source, RecordSource::Fallback);
    }
}
