//! Host directory volume
//!
//! Serves a directory on the host filesystem as a card, so configuration
//! files can be exported and imported by host tools and tests.

use std::fs::File;
use std::io::{self, ErrorKind as IoErrorKind};
use std::path::{Path, PathBuf};

use embedded_io::{ErrorType, Read, Write};

use crate::card::{Card, CardError};

/// Directory standing in for a card
pub struct DirCard {
    root: PathBuf,
    mounted: bool,
}

impl DirCard {
    /// Volume rooted at `root`; the directory must exist when mounting
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mounted: false,
        }
    }

    /// Directory backing the volume
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> Result<PathBuf, CardError> {
        if !self.mounted {
            return Err(CardError::NotMounted);
        }
        // Flat volume: no separators or parent references
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            return Err(CardError::NotFound);
        }
        Ok(self.root.join(name))
    }
}

impl Card for DirCard {
    type File<'a>
        = DirFile
    where
        Self: 'a;

    fn mount(&mut self) -> Result<(), CardError> {
        self.mounted = self.root.is_dir();
        if self.mounted {
            Ok(())
        } else {
            Err(CardError::NotMounted)
        }
    }

    fn open(&mut self, name: &str) -> Result<DirFile, CardError> {
        let path = self.path(name)?;
        File::open(path).map(DirFile).map_err(map_open_error)
    }

    fn create(&mut self, name: &str) -> Result<DirFile, CardError> {
        let path = self.path(name)?;
        File::create(path).map(DirFile).map_err(map_open_error)
    }
}

fn map_open_error(e: io::Error) -> CardError {
    match e.kind() {
        IoErrorKind::NotFound => CardError::NotFound,
        _ => CardError::Io,
    }
}

/// Open file on a [`DirCard`]
pub struct DirFile(File);

impl ErrorType for DirFile {
    type Error = io::Error;
}

impl Read for DirFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
        io::Read::read(&mut self.0, buf)
    }
}

impl Write for DirFile {
    fn write(&mut self, buf: &[u8]) -> Result<usize, io::Error> {
        io::Write::write(&mut self.0, buf)
    }

    fn flush(&mut self) -> Result<(), io::Error> {
        io::Write::flush(&mut self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_does_not_mount() {
        let dir = tempfile::tempdir().unwrap();
        let mut card = DirCard::new(dir.path().join("absent"));
        assert_eq!(card.mount(), Err(CardError::NotMounted));
        assert!(matches!(card.open("a.txt"), Err(CardError::NotMounted)));
    }

    #[test]
    fn test_create_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut card = DirCard::new(dir.path());
        card.mount().unwrap();

        card.create("a.txt").unwrap().write_all(b"old contents").unwrap();
        card.create("a.txt").unwrap().write_all(b"new").unwrap();

        let mut file = card.open("a.txt").unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(file.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"new");
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"new");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut card = DirCard::new(dir.path());
        card.mount().unwrap();
        assert!(matches!(card.open("a.txt"), Err(CardError::NotFound)));
    }

    #[test]
    fn test_names_stay_inside_volume() {
        let dir = tempfile::tempdir().unwrap();
        let mut card = DirCard::new(dir.path());
        card.mount().unwrap();
        assert!(matches!(card.create("../a.txt"), Err(CardError::NotFound)));
        assert!(matches!(card.create(".."), Err(CardError::NotFound)));
    }
}
