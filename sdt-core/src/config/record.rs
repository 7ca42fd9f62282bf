//! Persisted configuration record
//!
//! Every setting that survives a power cycle lives in [`ConfigRecord`]. The
//! field order here is the order of the binary layout; see
//! [`super::layout`].

use super::constants::*;
use super::version::{LegacyVersion, SchemaTag};

/// NUL-padded fixed-width text field
///
/// Always written with at least one trailing NUL. Contents read back from
/// a device may fill all `N` bytes, so readers never rely on the NUL.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FixedStr<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> FixedStr<N> {
    /// Empty field
    pub const fn new() -> Self {
        Self { bytes: [0; N] }
    }

    /// Field holding `s`, truncated to `N - 1` bytes
    pub fn with_text(s: &str) -> Self {
        let mut field = Self::new();
        field.set(s);
        field
    }

    /// Wrap raw stored bytes
    pub const fn from_bytes(bytes: [u8; N]) -> Self {
        Self { bytes }
    }

    /// Raw stored bytes
    pub const fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Replace the contents, truncating to `N - 1` bytes on a char boundary
    ///
    /// Control characters are dropped: the text mirror stores one value per
    /// line, so a stored line break would shift every later field.
    pub fn set(&mut self, s: &str) {
        let max = N.saturating_sub(1);
        self.bytes = [0; N];
        let mut len = 0;
        for c in s.chars().filter(|c| !c.is_control()) {
            let width = c.len_utf8();
            if len + width > max {
                break;
            }
            c.encode_utf8(&mut self.bytes[len..len + width]);
            len += width;
        }
    }

    /// Text up to the first NUL
    ///
    /// Stored bytes that are not valid UTF-8 end the string at the first
    /// invalid byte.
    pub fn as_str(&self) -> &str {
        let len = self.bytes.iter().position(|&b| b == 0).unwrap_or(N);
        let raw = &self.bytes[..len];
        match core::str::from_utf8(raw) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&raw[..e.valid_up_to()]).unwrap_or_default(),
        }
    }
}

impl<const N: usize> Default for FixedStr<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::fmt::Debug for FixedStr<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(self.as_str(), f)
    }
}

/// Longest prefix of `s` no longer than `max` bytes that ends on a char
/// boundary
pub fn truncate_str(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Per-band table
pub type PerBand<T> = [T; NUMBER_OF_BANDS];

/// Complete persisted configuration
///
/// Values keep their stored representation (band and VFO selectors are
/// plain integers) so a record read from a device can be inspected before
/// it is trusted. [`crate::working::WorkingState`] holds the validated,
/// typed view.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigRecord {
    /// Schema tag; must stay the first field
    pub version_settings: SchemaTag,

    // Receiver and display
    pub agc_mode: i32,
    pub audio_volume: i32,
    pub rf_gain_all_bands: i32,
    pub spectrum_noise_floor: i32,
    pub tune_index: i32,
    pub step_fine_tune: i32,
    pub power_level: i32,
    pub xmt_mode: i32,
    pub nr_option_select: i32,
    pub current_scale: i32,
    pub spectrum_zoom: i32,
    pub spectrum_display_scale: f32,

    // CW
    pub cw_filter_index: i32,
    pub paddle_dit: i32,
    pub paddle_dah: i32,
    pub decoder_flag: i32,
    pub key_type: i32,
    pub current_wpm: i32,
    pub sidetone_volume: f32,
    /// Milliseconds
    pub cw_transmit_delay: u32,

    // Tuning
    pub active_vfo: i32,
    pub freq_increment: i32,
    pub current_band: i32,
    pub current_band_a: i32,
    pub current_band_b: i32,
    pub current_freq_a: u32,
    pub current_freq_b: u32,
    pub freq_correction_factor: i32,

    // Audio
    pub equalizer_rec: [i32; EQUALIZER_CELL_COUNT],
    pub equalizer_xmt: [i32; EQUALIZER_CELL_COUNT],
    pub current_mic_threshold: i32,
    pub current_mic_comp_ratio: f32,
    pub current_mic_attack: f32,
    pub current_mic_release: f32,
    pub current_mic_gain: i32,

    /// Front-panel switch-matrix ADC thresholds, highest first
    pub switch_values: [i32; NUMBER_OF_SWITCHES],

    // Noise reduction and PLL
    pub lpf_coeff: f32,
    pub nr_psi: f32,
    pub nr_alpha: f32,
    pub nr_beta: f32,
    pub omega_n: f32,
    pub pll_fmax: f32,

    // Per-band calibration
    pub power_out_cw: PerBand<f32>,
    pub power_out_ssb: PerBand<f32>,
    pub cw_power_calibration_factor: PerBand<f32>,
    pub ssb_power_calibration_factor: PerBand<f32>,
    pub iq_amp_correction_factor: PerBand<f32>,
    pub iq_phase_correction_factor: PerBand<f32>,
    pub iqx_amp_correction_factor: PerBand<f32>,
    pub iqx_phase_correction_factor: PerBand<f32>,
    pub iqx_rec_amp_correction_factor: PerBand<f32>,
    pub iqx_rec_phase_correction_factor: PerBand<f32>,
    pub x_atten_cw: PerBand<i32>,
    pub x_atten_ssb: PerBand<i32>,
    pub r_atten: PerBand<i32>,
    pub antenna_selection: PerBand<i32>,
    pub swr_power_adj: PerBand<f32>,
    pub swr_slope_adj: PerBand<f32>,
    pub swr_r_offset: PerBand<f32>,

    // Frequencies
    pub favorite_freqs: [u32; MAX_FAVORITES],
    /// Last frequency used per band, one column per VFO
    pub last_frequencies: PerBand<[u32; NUMBER_OF_VFOS]>,
    pub center_freq: u32,

    // Station
    pub map_file_name: FixedStr<MAP_FILE_NAME_LEN>,
    pub my_call: FixedStr<CALL_LEN>,
    pub my_time_zone: FixedStr<TIME_ZONE_LEN>,
    pub separation_character: i32,
    pub paddle_flip: i32,
    pub sd_card_present: i32,
    pub my_lat: f32,
    pub my_long: f32,

    pub current_noise_floor: PerBand<i32>,
    pub compressor_flag: i32,
    pub receive_eq_flag: i32,
    pub xmit_eq_flag: i32,
    pub cw_tone_index: i32,
    pub transmit_power_level_cw: f32,
    pub transmit_power_level_ssb: f32,
}

impl ConfigRecord {
    /// Record with every field zero and an empty tag
    pub const fn zeroed() -> Self {
        Self {
            version_settings: SchemaTag::EMPTY,
            agc_mode: 0,
            audio_volume: 0,
            rf_gain_all_bands: 0,
            spectrum_noise_floor: 0,
            tune_index: 0,
            step_fine_tune: 0,
            power_level: 0,
            xmt_mode: 0,
            nr_option_select: 0,
            current_scale: 0,
            spectrum_zoom: 0,
            spectrum_display_scale: 0.0,
            cw_filter_index: 0,
            paddle_dit: 0,
            paddle_dah: 0,
            decoder_flag: 0,
            key_type: 0,
            current_wpm: 0,
            sidetone_volume: 0.0,
            cw_transmit_delay: 0,
            active_vfo: 0,
            freq_increment: 0,
            current_band: 0,
            current_band_a: 0,
            current_band_b: 0,
            current_freq_a: 0,
            current_freq_b: 0,
            freq_correction_factor: 0,
            equalizer_rec: [0; EQUALIZER_CELL_COUNT],
            equalizer_xmt: [0; EQUALIZER_CELL_COUNT],
            current_mic_threshold: 0,
            current_mic_comp_ratio: 0.0,
            current_mic_attack: 0.0,
            current_mic_release: 0.0,
            current_mic_gain: 0,
            switch_values: [0; NUMBER_OF_SWITCHES],
            lpf_coeff: 0.0,
            nr_psi: 0.0,
            nr_alpha: 0.0,
            nr_beta: 0.0,
            omega_n: 0.0,
            pll_fmax: 0.0,
            power_out_cw: [0.0; NUMBER_OF_BANDS],
            power_out_ssb: [0.0; NUMBER_OF_BANDS],
            cw_power_calibration_factor: [0.0; NUMBER_OF_BANDS],
            ssb_power_calibration_factor: [0.0; NUMBER_OF_BANDS],
            iq_amp_correction_factor: [0.0; NUMBER_OF_BANDS],
            iq_phase_correction_factor: [0.0; NUMBER_OF_BANDS],
            iqx_amp_correction_factor: [0.0; NUMBER_OF_BANDS],
            iqx_phase_correction_factor: [0.0; NUMBER_OF_BANDS],
            iqx_rec_amp_correction_factor: [0.0; NUMBER_OF_BANDS],
            iqx_rec_phase_correction_factor: [0.0; NUMBER_OF_BANDS],
            x_atten_cw: [0; NUMBER_OF_BANDS],
            x_atten_ssb: [0; NUMBER_OF_BANDS],
            r_atten: [0; NUMBER_OF_BANDS],
            antenna_selection: [0; NUMBER_OF_BANDS],
            swr_power_adj: [0.0; NUMBER_OF_BANDS],
            swr_slope_adj: [0.0; NUMBER_OF_BANDS],
            swr_r_offset: [0.0; NUMBER_OF_BANDS],
            favorite_freqs: [0; MAX_FAVORITES],
            last_frequencies: [[0; NUMBER_OF_VFOS]; NUMBER_OF_BANDS],
            center_freq: 0,
            map_file_name: FixedStr::new(),
            my_call: FixedStr::new(),
            my_time_zone: FixedStr::new(),
            separation_character: 0,
            paddle_flip: 0,
            sd_card_present: 0,
            my_lat: 0.0,
            my_long: 0.0,
            current_noise_floor: [0; NUMBER_OF_BANDS],
            compressor_flag: 0,
            receive_eq_flag: 0,
            xmit_eq_flag: 0,
            cw_tone_index: 0,
            transmit_power_level_cw: 0.0,
            transmit_power_level_ssb: 0.0,
        }
    }

    /// Whether the record looks like it was ever written by this firmware
    ///
    /// The first switch threshold must be a real ADC reading, strictly
    /// inside the converter's range. Erased (`0xFF..`) or cleared memory
    /// fails this.
    pub fn is_valid(&self) -> bool {
        let first = self.switch_values[0];
        first > 0 && first < SWITCH_ADC_MAX
    }

    /// Whether the switch thresholds have been captured for this panel
    pub fn switches_calibrated(&self) -> bool {
        let probe = self.switch_values[SWITCH_SANITY_INDEX];
        (SWITCH_SANITY_MIN..=SWITCH_SANITY_MAX).contains(&probe)
    }

    /// Whether the switch thresholds form a usable resistor-ladder table
    ///
    /// Every reading lies inside the converter's range and the table is
    /// strictly decreasing.
    pub fn switches_ordered(&self) -> bool {
        self.switch_values
            .iter()
            .all(|&v| v > 0 && v < SWITCH_ADC_MAX)
            && self.switch_values.windows(2).all(|pair| pair[0] > pair[1])
    }

    /// Fill in what a legacy layout did not carry
    pub fn migrate_from(&mut self, legacy: LegacyVersion) {
        match legacy {
            // No compressor flag yet; whatever occupies its bytes is junk
            LegacyVersion::V049_1 => self.compressor_flag = 0,
            LegacyVersion::V049_2 => {}
        }
    }
}

impl Default for ConfigRecord {
    fn default() -> Self {
        Self::zeroed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_str_truncates() {
        let s = FixedStr::<10>::with_text("ABCDEFGHIJKL");
        assert_eq!(s.as_str(), "ABCDEFGHI");
        assert_eq!(s.as_bytes()[9], 0);
    }

    #[test]
    fn test_fixed_str_respects_char_boundary() {
        // 'é' is two bytes; it would straddle the cut at 3
        let s = FixedStr::<4>::with_text("abé");
        assert_eq!(s.as_str(), "ab");
    }

    #[test]
    fn test_fixed_str_drops_control_chars() {
        let s = FixedStr::<10>::with_text("KF5N\r\nX\tY\0Z");
        assert_eq!(s.as_str(), "KF5NXYZ");

        // Dropped characters do not count against the width
        let s = FixedStr::<5>::with_text("\n\nABCDE");
        assert_eq!(s.as_str(), "ABCD");
    }

    #[test]
    fn test_fixed_str_without_nul() {
        let s = FixedStr::<4>::from_bytes(*b"KF5N");
        assert_eq!(s.as_str(), "KF5N");
    }

    #[test]
    fn test_fixed_str_invalid_utf8() {
        let s = FixedStr::<4>::from_bytes([b'A', 0xFF, b'B', 0]);
        assert_eq!(s.as_str(), "A");
    }

    #[test]
    fn test_is_valid_boundaries() {
        let mut record = ConfigRecord::zeroed();
        assert!(!record.is_valid());

        record.switch_values[0] = 1;
        assert!(record.is_valid());
        record.switch_values[0] = 1022;
        assert!(record.is_valid());
        record.switch_values[0] = 1023;
        assert!(!record.is_valid());
        record.switch_values[0] = -1;
        assert!(!record.is_valid());
    }

    #[test]
    fn test_switches_ordered() {
        let mut record = ConfigRecord::defaults();
        assert!(record.switches_ordered());

        record.switch_values.swap(4, 5);
        assert!(!record.switches_ordered());

        let mut record = ConfigRecord::defaults();
        record.switch_values[NUMBER_OF_SWITCHES - 1] = 0;
        assert!(!record.switches_ordered());
    }

    #[test]
    fn test_switches_calibrated_window() {
        let mut record = ConfigRecord::zeroed();
        for (value, expected) in [(439, false), (440, true), (459, true), (480, true), (481, false)] {
            record.switch_values[SWITCH_SANITY_INDEX] = value;
            assert_eq!(record.switches_calibrated(), expected, "value {}", value);
        }
    }

    #[test]
    fn test_migrate_v049_1_clears_compressor() {
        let mut record = ConfigRecord::zeroed();
        record.compressor_flag = 0x5A5A;
        record.audio_volume = 33;

        record.migrate_from(LegacyVersion::V049_1);
        assert_eq!(record.compressor_flag, 0);
        assert_eq!(record.audio_volume, 33);
    }

    #[test]
    fn test_migrate_v049_2_keeps_compressor() {
        let mut record = ConfigRecord::zeroed();
        record.compressor_flag = 1;
        record.migrate_from(LegacyVersion::V049_2);
        assert_eq!(record.compressor_flag, 1);
    }
}
