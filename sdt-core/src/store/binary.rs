//! Binary store backend
//!
//! The record is kept as one fixed-size block at a fixed EEPROM address.
//! There is no checksum; validity is judged from the schema tag and the
//! switch-calibration sanity checks.

use sdt_hal::{Eeprom, EepromError};

use crate::config::layout::{self, RecordBytes, RECORD_SIZE};
use crate::config::record::ConfigRecord;
use crate::config::version::SchemaTag;
use crate::config::{EEPROM_BASE_ADDRESS, TAG_LEN};

/// Configuration record block on an EEPROM
pub struct BinaryStore<E> {
    eeprom: E,
    base: u32,
}

impl<E: Eeprom> BinaryStore<E> {
    /// Store at the standard base address
    pub fn new(eeprom: E) -> Self {
        Self::with_base(eeprom, EEPROM_BASE_ADDRESS)
    }

    /// Store at a custom base address
    pub fn with_base(eeprom: E, base: u32) -> Self {
        Self { eeprom, base }
    }

    /// Read only the schema tag, leaving the rest of the block untouched
    pub fn read_tag(&mut self) -> Result<SchemaTag, EepromError> {
        let mut bytes = [0u8; TAG_LEN];
        self.eeprom.read(self.base, &mut bytes)?;
        Ok(SchemaTag::from_bytes(bytes))
    }

    /// Overwrite only the schema tag
    pub fn write_tag(&mut self, tag: &SchemaTag) -> Result<(), EepromError> {
        self.eeprom.write(self.base, tag.as_bytes())
    }

    /// Read the whole block
    pub fn read_record(&mut self) -> Result<ConfigRecord, EepromError> {
        let mut bytes: RecordBytes = [0u8; RECORD_SIZE];
        self.eeprom.read(self.base, &mut bytes)?;
        Ok(layout::decode(&bytes))
    }

    /// Write the whole block
    pub fn write_record(&mut self, record: &ConfigRecord) -> Result<(), EepromError> {
        self.eeprom.write(self.base, &layout::encode(record))
    }

    /// Erase the block
    pub fn clear(&mut self) -> Result<(), EepromError> {
        self.eeprom.erase(self.base, RECORD_SIZE)
    }

    /// The underlying device
    pub fn eeprom(&self) -> &E {
        &self.eeprom
    }

    /// Give back the underlying device
    pub fn release(self) -> E {
        self.eeprom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdt_hal::RamEeprom;

    type Ram = RamEeprom<2048>;

    #[test]
    fn test_record_round_trip() {
        let mut store = BinaryStore::new(Ram::new());
        let mut record = ConfigRecord::defaults();
        record.cw_tone_index = 3;

        store.write_record(&record).unwrap();
        assert_eq!(store.read_record().unwrap(), record);
    }

    #[test]
    fn test_tag_only_access() {
        let mut store = BinaryStore::new(Ram::new());
        store.write_record(&ConfigRecord::defaults()).unwrap();

        let tag = SchemaTag::from_text("V049.2");
        store.write_tag(&tag).unwrap();
        assert_eq!(store.read_tag().unwrap(), tag);

        // Body untouched by the tag write
        let record = store.read_record().unwrap();
        assert_eq!(record.audio_volume, ConfigRecord::defaults().audio_volume);
    }

    #[test]
    fn test_base_address_offset() {
        let mut store = BinaryStore::with_base(Ram::new(), 100);
        store.write_record(&ConfigRecord::defaults()).unwrap();

        let bytes = store.eeprom().as_bytes();
        assert!(bytes[..100].iter().all(|&b| b == 0xFF));
        assert_eq!(&bytes[100..100 + TAG_LEN], ConfigRecord::defaults().version_settings.as_bytes());
    }

    #[test]
    fn test_device_too_small() {
        let mut store = BinaryStore::new(RamEeprom::<64>::new());
        assert_eq!(store.read_record(), Err(EepromError::OutOfRange));
        assert!(store.read_tag().is_ok());
    }

    #[test]
    fn test_clear() {
        let mut store = BinaryStore::new(Ram::new());
        store.write_record(&ConfigRecord::defaults()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.read_tag().unwrap(), SchemaTag::from_bytes([0xFF; TAG_LEN]));
    }
}
