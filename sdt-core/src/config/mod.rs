//! Configuration types
//!
//! The persisted configuration record, its defaults and the fixed binary
//! layout it is stored in.

pub mod band;
pub mod constants;
pub mod defaults;
pub mod layout;
pub mod record;
pub mod version;

pub use band::{Band, Vfo};
pub use constants::*;
pub use defaults::Region;
pub use record::{ConfigRecord, FixedStr};
pub use version::{LegacyVersion, SchemaTag, TagCheck};
