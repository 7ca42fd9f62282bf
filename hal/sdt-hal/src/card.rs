//! Removable storage volume
//!
//! A card holds flat, named text files. Files are handed out as
//! `embedded-io` streams so codecs can work against any medium.

use embedded_io::{ErrorKind, ErrorType, Read, Write};
use heapless::{String, Vec};

/// Errors from card operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CardError {
    /// No card inserted, or it could not be mounted
    NotMounted,
    /// The requested file does not exist
    NotFound,
    /// Read or write failure on an open file
    Io,
}

/// Removable volume
pub trait Card {
    /// Open file handle; closed when dropped
    type File<'a>: Read + Write
    where
        Self: 'a;

    /// Initialize the card and its filesystem
    fn mount(&mut self) -> Result<(), CardError>;

    /// Open an existing file for reading
    fn open(&mut self, name: &str) -> Result<Self::File<'_>, CardError>;

    /// Create a file for writing, truncating any existing contents
    fn create(&mut self, name: &str) -> Result<Self::File<'_>, CardError>;
}

/// Longest file name a [`RamCard`] stores
pub const MAX_NAME_LEN: usize = 32;

/// Single-file volume held in RAM
pub struct RamCard<const N: usize> {
    present: bool,
    mounted: bool,
    name: Option<String<MAX_NAME_LEN>>,
    data: Vec<u8, N>,
}

impl<const N: usize> RamCard<N> {
    /// An inserted, empty card
    pub const fn new() -> Self {
        Self {
            present: true,
            mounted: false,
            name: None,
            data: Vec::new(),
        }
    }

    /// A slot with no card in it; mounting always fails
    pub const fn absent() -> Self {
        Self {
            present: false,
            mounted: false,
            name: None,
            data: Vec::new(),
        }
    }

    /// Place a file on the card, replacing whatever was there
    pub fn insert_file(&mut self, name: &str, contents: &[u8]) -> Result<(), CardError> {
        self.name = Some(String::try_from(name).map_err(|_| CardError::Io)?);
        self.data.clear();
        self.data
            .extend_from_slice(contents)
            .map_err(|_| CardError::Io)
    }

    /// Contents of the named file, if present
    pub fn file(&self, name: &str) -> Option<&[u8]> {
        match &self.name {
            Some(n) if n.as_str() == name => Some(&self.data),
            _ => None,
        }
    }

    fn check_mounted(&self) -> Result<(), CardError> {
        if self.mounted {
            Ok(())
        } else {
            Err(CardError::NotMounted)
        }
    }
}

impl<const N: usize> Default for RamCard<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Card for RamCard<N> {
    type File<'a>
        = RamFile<'a, N>
    where
        Self: 'a;

    fn mount(&mut self) -> Result<(), CardError> {
        self.mounted = self.present;
        self.check_mounted()
    }

    fn open(&mut self, name: &str) -> Result<RamFile<'_, N>, CardError> {
        self.check_mounted()?;
        if self.file(name).is_none() {
            return Err(CardError::NotFound);
        }
        Ok(RamFile {
            data: &mut self.data,
            pos: 0,
        })
    }

    fn create(&mut self, name: &str) -> Result<RamFile<'_, N>, CardError> {
        self.check_mounted()?;
        self.name = Some(String::try_from(name).map_err(|_| CardError::Io)?);
        self.data.clear();
        Ok(RamFile {
            data: &mut self.data,
            pos: 0,
        })
    }
}

/// Empty card slot for boards without a card interface
///
/// Never mounts, so every operation reports [`CardError::NotMounted`].
pub struct NoCard;

impl Card for NoCard {
    type File<'a>
        = RamFile<'a, 0>
    where
        Self: 'a;

    fn mount(&mut self) -> Result<(), CardError> {
        Err(CardError::NotMounted)
    }

    fn open(&mut self, _name: &str) -> Result<RamFile<'_, 0>, CardError> {
        Err(CardError::NotMounted)
    }

    fn create(&mut self, _name: &str) -> Result<RamFile<'_, 0>, CardError> {
        Err(CardError::NotMounted)
    }
}

/// Open file on a [`RamCard`]
pub struct RamFile<'a, const N: usize> {
    data: &'a mut Vec<u8, N>,
    pos: usize,
}

impl<const N: usize> ErrorType for RamFile<'_, N> {
    type Error = ErrorKind;
}

impl<const N: usize> Read for RamFile<'_, N> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let remaining = &self.data[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl<const N: usize> Write for RamFile<'_, N> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        let room = N - self.data.len();
        if room == 0 {
            return Err(ErrorKind::OutOfMemory);
        }
        let n = room.min(buf.len());
        // Cannot fail: n never exceeds the remaining capacity
        let _ = self.data.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_card_does_not_mount() {
        let mut card = RamCard::<64>::absent();
        assert_eq!(card.mount(), Err(CardError::NotMounted));
        assert!(matches!(card.open("a.txt"), Err(CardError::NotMounted)));
    }

    #[test]
    fn test_open_requires_mount() {
        let mut card = RamCard::<64>::new();
        card.insert_file("a.txt", b"x").unwrap();
        assert!(matches!(card.open("a.txt"), Err(CardError::NotMounted)));
        card.mount().unwrap();
        assert!(card.open("a.txt").is_ok());
    }

    #[test]
    fn test_missing_file() {
        let mut card = RamCard::<64>::new();
        card.mount().unwrap();
        assert!(matches!(card.open("a.txt"), Err(CardError::NotFound)));
    }

    #[test]
    fn test_create_truncates_and_reads_back() {
        let mut card = RamCard::<64>::new();
        card.insert_file("a.txt", b"old contents").unwrap();
        card.mount().unwrap();

        {
            let mut file = card.create("a.txt").unwrap();
            file.write_all(b"new").unwrap();
        }
        assert_eq!(card.file("a.txt"), Some(&b"new"[..]));

        let mut file = card.open("a.txt").unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(file.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"new");
        assert_eq!(file.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_empty_slot_never_mounts() {
        let mut card = NoCard;
        assert_eq!(card.mount(), Err(CardError::NotMounted));
        assert!(matches!(card.open("a.txt"), Err(CardError::NotMounted)));
        assert!(matches!(card.create("a.txt"), Err(CardError::NotMounted)));
    }

    #[test]
    fn test_write_past_capacity() {
        let mut card = RamCard::<4>::new();
        card.mount().unwrap();
        let mut file = card.create("a.txt").unwrap();
        assert_eq!(file.write(b"abcdef").unwrap(), 4);
        assert_eq!(file.write(b"g"), Err(ErrorKind::OutOfMemory));
    }
}
