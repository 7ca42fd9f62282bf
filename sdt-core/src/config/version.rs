//! Schema version tags
//!
//! The tag at the start of a stored record binds it to one exact layout:
//! a human-assigned label followed by the record's byte size, for example
//! `V050_1320`. Any change to the record's fields changes its size and
//! therefore the tag. Two pre-size tags from earlier releases are still
//! recognized so their data can be migrated instead of discarded.

use super::constants::{SCHEMA_LABEL, TAG_LEN};
use super::layout::RECORD_SIZE;

/// Raw schema tag as stored in the first [`TAG_LEN`] bytes of the record
///
/// Compared like a C string: bytes after the first NUL do not count.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SchemaTag([u8; TAG_LEN]);

/// Tag of the record layout compiled into this firmware
pub const CURRENT_TAG: SchemaTag = SchemaTag::for_schema(SCHEMA_LABEL, RECORD_SIZE);

impl SchemaTag {
    /// All-NUL tag
    pub const EMPTY: SchemaTag = SchemaTag([0; TAG_LEN]);

    /// Build the tag for a label and record size
    ///
    /// `_<size>` is appended only while more than five bytes of the tag
    /// remain after the label. One byte is always left for the NUL.
    pub const fn for_schema(label: &str, size: usize) -> SchemaTag {
        let mut out = [0u8; TAG_LEN];
        let label = label.as_bytes();
        let limit = TAG_LEN - 1;

        let mut len = 0;
        while len < label.len() && len < limit {
            out[len] = label[len];
            len += 1;
        }

        if TAG_LEN - len > 5 {
            // Decimal digits of size, most significant first
            let mut digits = [0u8; 20];
            let mut count = 0;
            let mut n = size;
            loop {
                digits[count] = b'0' + (n % 10) as u8;
                count += 1;
                n /= 10;
                if n == 0 {
                    break;
                }
            }

            out[len] = b'_';
            len += 1;
            while count > 0 && len < limit {
                count -= 1;
                out[len] = digits[count];
                len += 1;
            }
        }

        SchemaTag(out)
    }

    /// Wrap tag bytes read from a device
    pub const fn from_bytes(bytes: [u8; TAG_LEN]) -> SchemaTag {
        SchemaTag(bytes)
    }

    /// Tag from text, truncated to the tag width
    ///
    /// ASCII control bytes are skipped.
    pub fn from_text(text: &str) -> SchemaTag {
        let mut out = [0u8; TAG_LEN];
        let bytes = text.bytes().filter(|b| !b.is_ascii_control());
        for (slot, b) in out.iter_mut().zip(bytes) {
            *slot = b;
        }
        SchemaTag(out)
    }

    /// Raw bytes
    pub const fn as_bytes(&self) -> &[u8; TAG_LEN] {
        &self.0
    }

    /// Significant bytes, up to the first NUL or the full width
    pub fn significant(&self) -> &[u8] {
        let len = self.0.iter().position(|&b| b == 0).unwrap_or(TAG_LEN);
        &self.0[..len]
    }

    /// Significant bytes as text, or `None` for non-UTF-8 junk
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.significant()).ok()
    }

    /// Whether two tags are equal as C strings over the tag width
    pub fn matches(&self, other: &SchemaTag) -> bool {
        self.significant() == other.significant()
    }

    /// Whether this is the tag of the compiled layout
    pub fn is_current(&self) -> bool {
        self.matches(&CURRENT_TAG)
    }

    /// Classify a stored tag
    pub fn check(&self) -> TagCheck {
        if let Some(legacy) = LegacyVersion::from_tag(self) {
            TagCheck::Legacy(legacy)
        } else if self.is_current() {
            TagCheck::Current
        } else {
            TagCheck::Foreign
        }
    }
}

impl core::fmt::Debug for SchemaTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.as_str() {
            Some(s) => core::fmt::Debug::fmt(s, f),
            None => core::fmt::Debug::fmt(&self.0, f),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SchemaTag {
    fn format(&self, f: defmt::Formatter) {
        match self.as_str() {
            Some(s) => defmt::write!(f, "{=str}", s),
            None => defmt::write!(f, "{=[u8]:x}", &self.0[..]),
        }
    }
}

/// The tag of the compiled layout
///
/// Pure: depends only on the label and the record size fixed at build time.
pub fn current_tag() -> SchemaTag {
    CURRENT_TAG
}

/// Recognized tags from releases before size-suffixed tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LegacyVersion {
    /// No compressor flag in the layout
    V049_1 = 1,
    /// Compressor flag present
    V049_2 = 2,
}

impl LegacyVersion {
    /// The stored tag text of this release
    pub const fn tag(self) -> &'static str {
        match self {
            LegacyVersion::V049_1 => "V049.1",
            LegacyVersion::V049_2 => "V049.2",
        }
    }

    /// Migration ordinal
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Recognize a legacy tag
    ///
    /// Only an exact, NUL-terminated match counts; anything else that is not
    /// the current tag is foreign.
    pub fn from_tag(tag: &SchemaTag) -> Option<LegacyVersion> {
        if !tag.as_bytes().contains(&0) {
            return None;
        }
        [LegacyVersion::V049_1, LegacyVersion::V049_2]
            .into_iter()
            .find(|legacy| tag.significant() == legacy.tag().as_bytes())
    }
}

/// Outcome of comparing a stored tag with the compiled one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TagCheck {
    /// Stored record has the compiled layout
    Current,
    /// Stored record has a migratable legacy layout
    Legacy(LegacyVersion),
    /// Anything else: another schema, erased memory or garbage
    Foreign,
}
