//! Byte-addressable non-volatile memory
//!
//! Models the classic EEPROM interface: random-access reads and writes at
//! byte addresses, with erased cells reading back as `0xFF`.

/// Value of an erased cell
pub const ERASED: u8 = 0xFF;

/// Errors from EEPROM access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EepromError {
    /// Access extends past the end of the device
    OutOfRange,
    /// The device reported a failure
    Device,
    /// Device is still committing a previous write
    Busy,
}

/// Byte-addressable non-volatile memory
///
/// Reads and writes are blocking. A write returns once the data is
/// committed, so a subsequent power loss does not lose it.
pub trait Eeprom {
    /// Size of the device in bytes
    fn capacity(&self) -> usize;

    /// Read `buf.len()` bytes starting at `address`
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<(), EepromError>;

    /// Write `data` starting at `address`
    fn write(&mut self, address: u32, data: &[u8]) -> Result<(), EepromError>;

    /// Reset `len` bytes starting at `address` to the erased state
    fn erase(&mut self, address: u32, len: usize) -> Result<(), EepromError> {
        const CHUNK: usize = 64;
        let blank = [ERASED; CHUNK];
        let mut offset = 0;
        while offset < len {
            let n = (len - offset).min(CHUNK);
            let at = u32::try_from(offset)
                .ok()
                .and_then(|offset| address.checked_add(offset))
                .ok_or(EepromError::OutOfRange)?;
            self.write(at, &blank[..n])?;
            offset += n;
        }
        Ok(())
    }
}

/// Validate an access and return its byte range
pub fn check_range(
    capacity: usize,
    address: u32,
    len: usize,
) -> Result<core::ops::Range<usize>, EepromError> {
    let start = address as usize;
    let end = start.checked_add(len).ok_or(EepromError::OutOfRange)?;
    if end > capacity {
        return Err(EepromError::OutOfRange);
    }
    Ok(start..end)
}

/// EEPROM held entirely in RAM
///
/// Starts fully erased. Used as the write-back shadow of flash-emulated
/// EEPROM and as a stand-in device on the host.
pub struct RamEeprom<const N: usize> {
    cells: [u8; N],
}

impl<const N: usize> RamEeprom<N> {
    /// Create an erased device
    pub const fn new() -> Self {
        Self { cells: [ERASED; N] }
    }

    /// Raw contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    /// Raw contents, mutable
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.cells
    }

    /// Write `data`, committing every touched page of `P` bytes in turn
    ///
    /// `commit` receives the page index and its new contents. If it fails,
    /// that page is restored to its previous contents and the error is
    /// returned, so the cells always match what was committed. Pages
    /// committed before the failure keep the new data. `P` must be nonzero.
    pub fn write_paged<const P: usize, F>(
        &mut self,
        address: u32,
        data: &[u8],
        mut commit: F,
    ) -> Result<(), EepromError>
    where
        F: FnMut(usize, &[u8]) -> Result<(), EepromError>,
    {
        let range = check_range(N, address, data.len())?;
        let mut pos = range.start;
        let mut rest = data;

        while !rest.is_empty() {
            let page = pos / P;
            let page_start = page * P;
            let page_end = (page_start + P).min(N);
            let n = (page_end - pos).min(rest.len());

            let mut saved = [0u8; P];
            let saved = &mut saved[..page_end - page_start];
            saved.copy_from_slice(&self.cells[page_start..page_end]);

            self.cells[pos..pos + n].copy_from_slice(&rest[..n]);
            if let Err(e) = commit(page, &self.cells[page_start..page_end]) {
                self.cells[page_start..page_end].copy_from_slice(saved);
                return Err(e);
            }

            pos += n;
            rest = &rest[n..];
        }
        Ok(())
    }
}

impl<const N: usize> Default for RamEeprom<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Eeprom for RamEeprom<N> {
    fn capacity(&self) -> usize {
        N
    }

    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<(), EepromError> {
        let range = check_range(N, address, buf.len())?;
        buf.copy_from_slice(&self.cells[range]);
        Ok(())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<(), EepromError> {
        let range = check_range(N, address, data.len())?;
        self.cells[range].copy_from_slice(data);
        Ok(())
    }
}

/// Key of one emulated-EEPROM page in a flash key-value store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PageKey(pub u8);

impl PageKey {
    /// Page index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for PageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        buffer[0] = self.0;
        Ok(1)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        match buffer.first() {
            Some(&page) => Ok((PageKey(page), 1)),
            None => Err(sequential_storage::map::SerializationError::BufferTooSmall),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_device_is_erased() {
        let mut eeprom = RamEeprom::<32>::new();
        let mut buf = [0u8; 32];
        eeprom.read(0, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == ERASED));
    }

    #[test]
    fn test_write_then_read() {
        let mut eeprom = RamEeprom::<32>::new();
        eeprom.write(4, &[1, 2, 3]).unwrap();

        let mut buf = [0u8; 5];
        eeprom.read(3, &mut buf).unwrap();
        assert_eq!(buf, [ERASED, 1, 2, 3, ERASED]);
    }

    #[test]
    fn test_out_of_range() {
        let mut eeprom = RamEeprom::<16>::new();
        let mut buf = [0u8; 4];
        assert_eq!(eeprom.read(13, &mut buf), Err(EepromError::OutOfRange));
        assert_eq!(eeprom.write(16, &[0]), Err(EepromError::OutOfRange));
        assert_eq!(eeprom.write(u32::MAX, &[0]), Err(EepromError::OutOfRange));
        // Exactly filling the device is fine
        assert!(eeprom.read(12, &mut buf).is_ok());
    }

    #[test]
    fn test_erase_spans_chunks() {
        let mut eeprom = RamEeprom::<256>::new();
        eeprom.as_bytes_mut().fill(0);
        eeprom.erase(10, 150).unwrap();

        let bytes = eeprom.as_bytes();
        assert_eq!(bytes[9], 0);
        assert!(bytes[10..160].iter().all(|&b| b == ERASED));
        assert_eq!(bytes[160], 0);
    }

    /// Accepts any address; counts writes
    struct Unbounded {
        writes: usize,
    }

    impl Eeprom for Unbounded {
        fn capacity(&self) -> usize {
            usize::MAX
        }

        fn read(&mut self, _address: u32, _buf: &mut [u8]) -> Result<(), EepromError> {
            Ok(())
        }

        fn write(&mut self, _address: u32, _data: &[u8]) -> Result<(), EepromError> {
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_erase_past_address_space() {
        let mut eeprom = Unbounded { writes: 0 };
        assert_eq!(eeprom.erase(u32::MAX - 10, 100), Err(EepromError::OutOfRange));
        // First chunk fits below the limit, the second would wrap
        assert_eq!(eeprom.writes, 1);

        assert!(eeprom.erase(u32::MAX - 63, 64).is_ok());
    }

    #[test]
    fn test_write_paged_commits_each_page() {
        let mut eeprom = RamEeprom::<64>::new();
        let mut commits = std::vec::Vec::new();
        eeprom
            .write_paged::<16, _>(14, &[1, 2, 3, 4], |page, bytes| {
                commits.push((page, bytes.to_vec()));
                Ok(())
            })
            .unwrap();

        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].0, 0);
        assert_eq!(&commits[0].1[14..], &[1, 2]);
        assert_eq!(commits[1].0, 1);
        assert_eq!(&commits[1].1[..2], &[3, 4]);
        assert_eq!(&eeprom.as_bytes()[14..18], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_write_paged_failed_commit_restores_page() {
        let mut eeprom = RamEeprom::<64>::new();
        eeprom.as_bytes_mut().fill(0);

        let result = eeprom.write_paged::<16, _>(14, &[1, 2, 3, 4], |page, _| {
            if page == 1 {
                Err(EepromError::Device)
            } else {
                Ok(())
            }
        });
        assert_eq!(result, Err(EepromError::Device));

        // Page 0 was committed, page 1 reads back as before
        let mut buf = [0xAAu8; 4];
        eeprom.read(14, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 0, 0]);
    }

    #[test]
    fn test_write_paged_out_of_range_commits_nothing() {
        let mut eeprom = RamEeprom::<32>::new();
        let result = eeprom.write_paged::<16, _>(30, &[1, 2, 3], |_, _| panic!("no commit"));
        assert_eq!(result, Err(EepromError::OutOfRange));
        assert!(eeprom.as_bytes().iter().all(|&b| b == ERASED));
    }
}
