//! Text mirror of the configuration record
//!
//! One `label = value` line per persisted value, in a fixed order. Lines are
//! matched back to fields by position only; labels are informational and a
//! mismatch is logged but does not stop the import.

pub mod codec;
pub mod fields;

pub use codec::{export, import, ImportReport};
pub use fields::{entries, line_count, Field, ParseError, FIELDS};
