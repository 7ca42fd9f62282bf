//! Band-pass filter relay selection

use crate::config::Band;

/// Band-pass filter relay board
///
/// Selects the filter path for a band. Boards without a relay board can
/// still implement this and report themselves as absent.
pub trait BandRelay {
    /// Route the signal through the filter for `band`
    fn set_active_band(&mut self, band: Band);

    /// Whether the relay board answered at initialization
    fn is_present(&self) -> bool;
}
