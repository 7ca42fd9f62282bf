//! Flash-emulated EEPROM for RP2040
//!
//! The EEPROM contents live in a RAM shadow. Each 256-byte page of the
//! shadow is persisted as one item of a sequential-storage map in the
//! last 64KB of flash, keyed by page number, so rewriting a page only
//! appends a new item and wear is spread across the partition.

use embassy_futures::block_on;
use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

use sdt_hal::eeprom::{Eeprom, EepromError, PageKey, RamEeprom};

#[cfg(feature = "defmt")]
use defmt::{debug, warn};

/// Flash storage configuration
pub const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2MB flash on the Pico
pub const EEPROM_PARTITION_SIZE: usize = 64 * 1024;
pub const EEPROM_PARTITION_START: usize = FLASH_SIZE - EEPROM_PARTITION_SIZE;

/// Flash range for the EEPROM partition
pub const EEPROM_RANGE: core::ops::Range<u32> =
    (EEPROM_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Emulated EEPROM size
pub const EEPROM_SIZE: usize = 4096;

/// Bytes per persisted page
pub const PAGE_SIZE: usize = 256;

/// Number of pages in the emulated EEPROM
pub const PAGE_COUNT: usize = EEPROM_SIZE / PAGE_SIZE;

/// Scratch space for one map item (page + key + item header)
const ITEM_BUFFER_SIZE: usize = PAGE_SIZE + 32;

/// RP2040 emulated EEPROM
///
/// Reads are served from the shadow. A write updates the shadow one page
/// at a time and commits each page before moving on.
pub struct Rp2040Eeprom<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
    shadow: RamEeprom<EEPROM_SIZE>,
}

impl<'d> Rp2040Eeprom<'d> {
    /// Create the EEPROM and load all persisted pages into the shadow
    ///
    /// Pages never written read as erased.
    pub async fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        let mut eeprom = Self {
            flash: Flash::new(flash, dma),
            shadow: RamEeprom::new(),
        };
        eeprom.load().await;
        eeprom
    }

    async fn load(&mut self) {
        let mut buffer = [0u8; ITEM_BUFFER_SIZE];

        for page in 0..PAGE_COUNT {
            let key = PageKey(page as u8);
            let result = map::fetch_item::<PageKey, &[u8], _>(
                &mut self.flash,
                EEPROM_RANGE,
                &mut NoCache::new(),
                &mut buffer,
                &key,
            )
            .await;

            match result {
                Ok(Some(data)) if data.len() == PAGE_SIZE => {
                    let start = page * PAGE_SIZE;
                    self.shadow.as_bytes_mut()[start..start + PAGE_SIZE].copy_from_slice(data);
                }
                Ok(Some(_data)) => {
                    #[cfg(feature = "defmt")]
                    warn!("EEPROM page {} has wrong length {}, ignoring", page, _data.len());
                }
                Ok(None) => {}
                Err(_) => {
                    #[cfg(feature = "defmt")]
                    warn!("EEPROM page {} unreadable, treating as erased", page);
                }
            }
        }

        #[cfg(feature = "defmt")]
        debug!("Emulated EEPROM loaded ({} pages)", PAGE_COUNT);
    }
}

/// Persist one shadow page as a map item
async fn store_page(
    flash: &mut Flash<'_, FLASH, Async, FLASH_SIZE>,
    page: usize,
    data: &[u8],
) -> Result<(), EepromError> {
    let mut buffer = [0u8; ITEM_BUFFER_SIZE];

    map::store_item(
        flash,
        EEPROM_RANGE,
        &mut NoCache::new(),
        &mut buffer,
        &PageKey(page as u8),
        &data,
    )
    .await
    .map_err(|_| EepromError::Device)
}

impl Eeprom for Rp2040Eeprom<'_> {
    fn capacity(&self) -> usize {
        EEPROM_SIZE
    }

    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<(), EepromError> {
        self.shadow.read(address, buf)
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<(), EepromError> {
        // A page whose commit fails is rolled back in the shadow
        let flash = &mut self.flash;
        self.shadow
            .write_paged::<PAGE_SIZE, _>(address, data, |page, bytes| {
                block_on(store_page(flash, page, bytes))
            })
    }
}
