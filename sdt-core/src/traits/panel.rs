//! Front panel: display refresh and switch-matrix calibration

use crate::config::NUMBER_OF_SWITCHES;

/// Display that must be redrawn after bulk configuration changes
pub trait DisplayNotifier {
    /// Redraw everything that depends on configuration
    fn redraw(&mut self);
}

/// Display notifier for headless builds
pub struct NoDisplay;

impl DisplayNotifier for NoDisplay {
    fn redraw(&mut self) {}
}

/// Captures the ADC reading of each front-panel switch
///
/// Typically prompts the operator to press every switch in turn.
pub trait SwitchCalibrator {
    /// Fill `values` with one reading per switch, highest first
    fn capture(&mut self, values: &mut [i32; NUMBER_OF_SWITCHES]);
}
