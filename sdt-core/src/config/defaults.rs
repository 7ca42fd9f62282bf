//! Factory defaults
//!
//! Used on first boot, after a schema change, and whenever the stored
//! switch calibration is unusable. Everything here is a literal, so
//! generating defaults twice yields byte-identical records.

use super::band::Band;
use super::constants::*;
use super::record::{ConfigRecord, FixedStr};
use super::version::CURRENT_TAG;

/// ITU region, which decides the default 40m frequency of VFO A
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Region {
    /// Europe, Africa, Middle East
    Itu1,
    /// The Americas
    Itu2,
}

impl Region {
    /// Region selected at build time through the `itu-region-1` feature
    #[cfg(feature = "itu-region-1")]
    pub const COMPILED: Region = Region::Itu1;
    #[cfg(not(feature = "itu-region-1"))]
    pub const COMPILED: Region = Region::Itu2;

    /// Default frequency of VFO A on the default band
    pub const fn default_freq_a(self) -> u32 {
        match self {
            Region::Itu1 => 7_100_000,
            Region::Itu2 => 7_200_000,
        }
    }
}

pub const SPECTRUM_NOISE_FLOOR: i32 = 247;
pub const MAP_FILE_NAME: &str = "Cincinnati.bmp";
pub const MY_CALL: &str = "Your Call";
pub const MY_TIMEZONE: &str = "EST";
pub const FREQ_SEP_CHARACTER: u8 = b'.';
pub const MY_LAT: f32 = 39.07466;
pub const MY_LON: f32 = -84.42677;
pub const DEFAULT_CENTER_FREQ: u32 = 7_150_000;
pub const DEFAULT_FREQ_B: u32 = 7_030_000;

/// Switch-matrix thresholds of an uncalibrated reference panel
pub const DEFAULT_SWITCH_VALUES: [i32; NUMBER_OF_SWITCHES] = [
    924, 870, 817, 769, 713, 669, 616, 565, 513, 459, 407, 356, 298, 242, 183, 131, 67, 10,
];

/// Initial favorites, band by band plus WWV
pub const DEFAULT_FAVORITES: [u32; MAX_FAVORITES] = [
    3_560_000, 5_300_000, 7_030_000, 7_200_000, 10_100_000, 14_200_000, 21_060_000, 21_285_000,
    28_060_000, 28_365_000, 50_100_000, 5_000_000, 10_000_000,
];

/// Starting frequency of each band, both VFOs
pub const DEFAULT_BAND_FREQS: [u32; NUMBER_OF_BANDS] = [
    3_560_000, 5_300_000, 7_200_000, 10_100_000, 14_060_000, 18_096_000, 21_060_000, 24_906_000,
    28_060_000, 50_100_000,
];

pub const DEFAULT_CW_CALIBRATION: [f32; NUMBER_OF_BANDS] = [
    0.023, 0.023, 0.023, 0.023, 0.038, 0.052, 0.051, 0.028, 0.028, 0.028,
];

pub const DEFAULT_SSB_CALIBRATION: [f32; NUMBER_OF_BANDS] = [
    0.017, 0.017, 0.017, 0.019, 0.017, 0.019, 0.021, 0.020, 0.022, 0.022,
];

/// Transmit equalizer: cut the lowest and highest cells, flat mid band
pub const DEFAULT_XMT_EQ: [i32; EQUALIZER_CELL_COUNT] =
    [0, 0, 0, 0, 0, 0, 100, 100, 100, 100, 100, 0, 0, 0];

impl ConfigRecord {
    /// Defaults for the region compiled into this build
    pub fn defaults() -> Self {
        Self::defaults_for(Region::COMPILED)
    }

    /// Defaults for a given ITU region
    pub fn defaults_for(region: Region) -> Self {
        let band = Band::DEFAULT.index() as i32;

        let mut last_frequencies = [[0; NUMBER_OF_VFOS]; NUMBER_OF_BANDS];
        for (slot, freq) in last_frequencies.iter_mut().zip(DEFAULT_BAND_FREQS) {
            *slot = [freq, freq];
        }
        last_frequencies[Band::DEFAULT.index()][0] = region.default_freq_a();

        ConfigRecord {
            version_settings: CURRENT_TAG,
            agc_mode: 1,
            audio_volume: 40,
            rf_gain_all_bands: 0,
            spectrum_noise_floor: SPECTRUM_NOISE_FLOOR,
            tune_index: 5,
            step_fine_tune: 50,
            power_level: 10,
            xmt_mode: 0,
            nr_option_select: 0,
            current_scale: 1,
            spectrum_zoom: 1,
            spectrum_display_scale: 20.0,

            cw_filter_index: 5,
            paddle_dit: 36,
            paddle_dah: 35,
            decoder_flag: 0,
            key_type: 0,
            current_wpm: 15,
            sidetone_volume: 50.0,
            cw_transmit_delay: 750,

            active_vfo: 0,
            freq_increment: 5,
            current_band: band,
            current_band_a: band,
            current_band_b: band,
            current_freq_a: region.default_freq_a(),
            current_freq_b: DEFAULT_FREQ_B,
            freq_correction_factor: 0,

            equalizer_rec: [100; EQUALIZER_CELL_COUNT],
            equalizer_xmt: DEFAULT_XMT_EQ,
            current_mic_threshold: -10,
            current_mic_comp_ratio: 8.0,
            current_mic_attack: 0.1,
            current_mic_release: 0.1,
            current_mic_gain: 20,

            switch_values: DEFAULT_SWITCH_VALUES,

            lpf_coeff: 0.0,
            nr_psi: 0.0,
            nr_alpha: 0.0,
            nr_beta: 0.0,
            omega_n: 0.0,
            pll_fmax: 4000.0,

            power_out_cw: [0.0; NUMBER_OF_BANDS],
            power_out_ssb: [1.0; NUMBER_OF_BANDS],
            cw_power_calibration_factor: DEFAULT_CW_CALIBRATION,
            ssb_power_calibration_factor: DEFAULT_SSB_CALIBRATION,
            iq_amp_correction_factor: [1.0; NUMBER_OF_BANDS],
            iq_phase_correction_factor: [0.0; NUMBER_OF_BANDS],
            iqx_amp_correction_factor: [1.0; NUMBER_OF_BANDS],
            iqx_phase_correction_factor: [0.0; NUMBER_OF_BANDS],
            iqx_rec_amp_correction_factor: [1.0; NUMBER_OF_BANDS],
            iqx_rec_phase_correction_factor: [0.0; NUMBER_OF_BANDS],
            x_atten_cw: [0; NUMBER_OF_BANDS],
            x_atten_ssb: [10; NUMBER_OF_BANDS],
            r_atten: [0; NUMBER_OF_BANDS],
            antenna_selection: [0; NUMBER_OF_BANDS],
            swr_power_adj: [0.0; NUMBER_OF_BANDS],
            swr_slope_adj: [0.0; NUMBER_OF_BANDS],
            swr_r_offset: [0.0; NUMBER_OF_BANDS],

            favorite_freqs: DEFAULT_FAVORITES,
            last_frequencies,
            center_freq: DEFAULT_CENTER_FREQ,

            map_file_name: FixedStr::with_text(MAP_FILE_NAME),
            my_call: FixedStr::with_text(MY_CALL),
            my_time_zone: FixedStr::with_text(MY_TIMEZONE),
            separation_character: FREQ_SEP_CHARACTER as i32,
            paddle_flip: 0,
            sd_card_present: 0,
            my_lat: MY_LAT,
            my_long: MY_LON,

            current_noise_floor: [0; NUMBER_OF_BANDS],
            compressor_flag: 0,
            receive_eq_flag: 0,
            xmit_eq_flag: 0,
            cw_tone_index: 0,
            transmit_power_level_cw: 0.0,
            transmit_power_level_ssb: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::layout;

    #[test]
    fn test_defaults_are_idempotent() {
        let a = layout::encode(&ConfigRecord::defaults());
        let b = layout::encode(&ConfigRecord::defaults());
        assert_eq!(a, b);
    }

    #[test]
    fn test_defaults_carry_current_tag() {
        assert!(ConfigRecord::defaults().version_settings.is_current());
    }

    #[test]
    fn test_defaults_pass_sanity_checks() {
        let record = ConfigRecord::defaults();
        assert!(record.is_valid());
        assert!(record.switches_calibrated());
    }

    #[test]
    fn test_switch_defaults_decrease() {
        for pair in DEFAULT_SWITCH_VALUES.windows(2) {
            assert!(pair[0] > pair[1]);
        }
    }

    #[test]
    fn test_region_selects_vfo_a_frequency() {
        let r1 = ConfigRecord::defaults_for(Region::Itu1);
        let r2 = ConfigRecord::defaults_for(Region::Itu2);

        assert_eq!(r1.current_freq_a, 7_100_000);
        assert_eq!(r2.current_freq_a, 7_200_000);
        assert_eq!(r1.last_frequencies[Band::M40.index()][0], 7_100_000);
        assert_eq!(r2.last_frequencies[Band::M40.index()][0], 7_200_000);

        // Everything else is shared
        assert_eq!(r1.current_freq_b, r2.current_freq_b);
        assert_eq!(r1.favorite_freqs, r2.favorite_freqs);
        assert_eq!(r1.last_frequencies[Band::M20.index()], r2.last_frequencies[Band::M20.index()]);
    }

    #[test]
    fn test_default_band_is_40m() {
        let record = ConfigRecord::defaults();
        assert_eq!(Band::from_index(record.current_band), Some(Band::M40));
        assert_eq!(record.active_vfo, 0);
    }

    #[test]
    fn test_default_strings() {
        let record = ConfigRecord::defaults();
        assert_eq!(record.my_call.as_str(), MY_CALL);
        assert_eq!(record.my_time_zone.as_str(), MY_TIMEZONE);
        assert_eq!(record.map_file_name.as_str(), MAP_FILE_NAME);
    }
}
