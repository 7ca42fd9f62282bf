//! Working-variable mirror
//!
//! The rest of the firmware reads and tunes through [`WorkingState`], not the
//! raw record. Loading validates band and VFO selectors and derives the
//! live frequencies; saving copies everything back and restamps the tag.

use heapless::String;

use crate::config::defaults::FREQ_SEP_CHARACTER;
use crate::config::record::{truncate_str, ConfigRecord, PerBand};
use crate::config::version::CURRENT_TAG;
use crate::config::{
    Band, Vfo, CALL_LEN, EQUALIZER_CELL_COUNT, MAP_FILE_NAME_LEN, MAX_FAVORITES,
    NUMBER_OF_BANDS, NUMBER_OF_SWITCHES, NUMBER_OF_VFOS, TIME_ZONE_LEN,
};

/// Extra capacity on text buffers beyond the stored width
const TEXT_MARGIN: usize = 2;

/// Runtime view of the configuration
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingState {
    pub agc_mode: i32,
    pub audio_volume: i32,
    pub rf_gain_all_bands: i32,
    pub spectrum_noise_floor: i32,
    pub tune_index: i32,
    pub step_fine_tune: i32,
    pub transmit_power_level: i32,
    pub xmt_mode: i32,
    pub nr_option_select: i32,
    pub current_scale: i32,
    pub spectrum_zoom: i32,
    pub spectrum_display_scale: f32,

    pub cw_filter_index: i32,
    pub paddle_dit: i32,
    pub paddle_dah: i32,
    pub decoder_flag: i32,
    pub key_type: i32,
    pub current_wpm: i32,
    pub sidetone_volume: f32,
    pub cw_transmit_delay: u32,

    pub active_vfo: Vfo,
    pub freq_increment: i32,
    pub current_band: Band,
    pub current_band_a: Band,
    pub current_band_b: Band,
    pub current_freq_a: u32,
    pub current_freq_b: u32,
    pub freq_correction_factor: i32,
    // Only ever changed together, see `set_frequency`
    center_freq: u32,
    tx_rx_freq: u32,

    pub rec_eq_level: [i32; EQUALIZER_CELL_COUNT],
    pub xmt_eq_level: [i32; EQUALIZER_CELL_COUNT],
    pub current_mic_threshold: i32,
    pub current_mic_comp_ratio: f32,
    pub current_mic_attack: f32,
    pub current_mic_release: f32,
    pub current_mic_gain: i32,

    /// Read-only copy; thresholds are written by calibration, not by saves
    pub switch_thresholds: [i32; NUMBER_OF_SWITCHES],

    pub lpf_coeff: f32,
    pub nr_psi: f32,
    pub nr_alpha: f32,
    pub nr_beta: f32,
    pub omega_n: f32,
    pub pll_fmax: f32,

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

    /// Read-only copy; favorites are stored one at a time by the store
    pub favorite_frequencies: [u32; MAX_FAVORITES],
    pub last_frequencies: PerBand<[u32; NUMBER_OF_VFOS]>,

    pub map_file_name: String<{ MAP_FILE_NAME_LEN + TEXT_MARGIN }>,
    pub my_call: String<{ CALL_LEN + TEXT_MARGIN }>,
    pub my_time_zone: String<{ TIME_ZONE_LEN + TEXT_MARGIN }>,
    pub freq_separation_char: u8,
    pub paddle_flip: i32,
    /// Never persisted as true; the card is probed after every boot
    pub sd_card_present: bool,
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

/// Copy `src` into a fresh buffer, keeping at most `max` bytes
fn bounded<const N: usize>(src: &str, max: usize) -> String<N> {
    let mut out = String::new();
    // Cannot fail: N leaves room beyond max
    let _ = out.push_str(truncate_str(src, max.min(N)));
    out
}

fn band_or_default(stored: i32, _what: &str) -> Band {
    Band::from_index(stored).unwrap_or_else(|| {
        warn!("Stored {} index {} out of range, using default", _what, stored);
        Band::DEFAULT
    })
}

impl WorkingState {
    /// Build the working variables from a record
    pub fn from_record(record: &ConfigRecord) -> Self {
        let active_vfo = Vfo::from_index(record.active_vfo).unwrap_or_else(|| {
            warn!("Stored VFO {} out of range, using A", record.active_vfo);
            Vfo::A
        });
        let current_band = band_or_default(record.current_band, "band");
        let current_band_a = band_or_default(record.current_band_a, "VFO A band");
        let current_band_b = band_or_default(record.current_band_b, "VFO B band");

        let freq = record.last_frequencies[current_band.index()][active_vfo.index()];

        WorkingState {
            agc_mode: record.agc_mode,
            audio_volume: record.audio_volume,
            rf_gain_all_bands: record.rf_gain_all_bands,
            spectrum_noise_floor: record.spectrum_noise_floor,
            tune_index: record.tune_index,
            step_fine_tune: record.step_fine_tune,
            transmit_power_level: record.power_level,
            xmt_mode: record.xmt_mode,
            nr_option_select: record.nr_option_select,
            current_scale: record.current_scale,
            spectrum_zoom: record.spectrum_zoom,
            spectrum_display_scale: record.spectrum_display_scale,

            cw_filter_index: record.cw_filter_index,
            paddle_dit: record.paddle_dit,
            paddle_dah: record.paddle_dah,
            decoder_flag: record.decoder_flag,
            key_type: record.key_type,
            current_wpm: record.current_wpm,
            sidetone_volume: record.sidetone_volume,
            cw_transmit_delay: record.cw_transmit_delay,

            active_vfo,
            freq_increment: record.freq_increment,
            current_band,
            current_band_a,
            current_band_b,
            current_freq_a: record.last_frequencies[current_band_a.index()][Vfo::A.index()],
            current_freq_b: record.last_frequencies[current_band_b.index()][Vfo::B.index()],
            freq_correction_factor: record.freq_correction_factor,
            center_freq: freq,
            tx_rx_freq: freq,

            rec_eq_level: record.equalizer_rec,
            xmt_eq_level: record.equalizer_xmt,
            current_mic_threshold: record.current_mic_threshold,
            current_mic_comp_ratio: record.current_mic_comp_ratio,
            current_mic_attack: record.current_mic_attack,
            current_mic_release: record.current_mic_release,
            current_mic_gain: record.current_mic_gain,

            switch_thresholds: record.switch_values,

            lpf_coeff: record.lpf_coeff,
            nr_psi: record.nr_psi,
            nr_alpha: record.nr_alpha,
            nr_beta: record.nr_beta,
            omega_n: record.omega_n,
            pll_fmax: record.pll_fmax,

            power_out_cw: record.power_out_cw,
            power_out_ssb: record.power_out_ssb,
            cw_power_calibration_factor: record.cw_power_calibration_factor,
            ssb_power_calibration_factor: record.ssb_power_calibration_factor,
            iq_amp_correction_factor: record.iq_amp_correction_factor,
            iq_phase_correction_factor: record.iq_phase_correction_factor,
            iqx_amp_correction_factor: record.iqx_amp_correction_factor,
            iqx_phase_correction_factor: record.iqx_phase_correction_factor,
            iqx_rec_amp_correction_factor: record.iqx_rec_amp_correction_factor,
            iqx_rec_phase_correction_factor: record.iqx_rec_phase_correction_factor,
            x_atten_cw: record.x_atten_cw,
            x_atten_ssb: record.x_atten_ssb,
            r_atten: record.r_atten,
            antenna_selection: record.antenna_selection,
            swr_power_adj: record.swr_power_adj,
            swr_slope_adj: record.swr_slope_adj,
            swr_r_offset: record.swr_r_offset,

            favorite_frequencies: record.favorite_freqs,
            last_frequencies: record.last_frequencies,

            map_file_name: bounded(record.map_file_name.as_str(), MAP_FILE_NAME_LEN - 1),
            my_call: bounded(record.my_call.as_str(), CALL_LEN - 1),
            my_time_zone: bounded(record.my_time_zone.as_str(), TIME_ZONE_LEN - 1),
            freq_separation_char: u8::try_from(record.separation_character)
                .unwrap_or(FREQ_SEP_CHARACTER),
            paddle_flip: record.paddle_flip,
            sd_card_present: false,
            my_lat: record.my_lat,
            my_long: record.my_long,

            current_noise_floor: record.current_noise_floor,
            compressor_flag: record.compressor_flag,
            receive_eq_flag: record.receive_eq_flag,
            xmit_eq_flag: record.xmit_eq_flag,
            cw_tone_index: record.cw_tone_index,
            transmit_power_level_cw: record.transmit_power_level_cw,
            transmit_power_level_ssb: record.transmit_power_level_ssb,
        }
    }

    /// Replace every working variable from `record`
    pub fn load_from_record(&mut self, record: &ConfigRecord) {
        *self = Self::from_record(record);
    }

    /// Copy the working variables back into `record`
    ///
    /// The current schema tag is stamped first. Switch thresholds, favorites
    /// and the stored center frequency are left untouched.
    pub fn save_to_record(&self, record: &mut ConfigRecord) {
        record.version_settings = CURRENT_TAG;

        record.agc_mode = self.agc_mode;
        record.audio_volume = self.audio_volume;
        record.rf_gain_all_bands = self.rf_gain_all_bands;
        record.spectrum_noise_floor = self.spectrum_noise_floor;
        record.tune_index = self.tune_index;
        record.step_fine_tune = self.step_fine_tune;
        record.power_level = self.transmit_power_level;
        record.xmt_mode = self.xmt_mode;
        record.nr_option_select = self.nr_option_select;
        record.current_scale = self.current_scale;
        record.spectrum_zoom = self.spectrum_zoom;
        record.spectrum_display_scale = self.spectrum_display_scale;

        record.cw_filter_index = self.cw_filter_index;
        record.paddle_dit = self.paddle_dit;
        record.paddle_dah = self.paddle_dah;
        record.decoder_flag = self.decoder_flag;
        record.key_type = self.key_type;
        record.current_wpm = self.current_wpm;
        record.sidetone_volume = self.sidetone_volume;
        record.cw_transmit_delay = self.cw_transmit_delay;

        record.active_vfo = self.active_vfo.index() as i32;
        record.freq_increment = self.freq_increment;
        record.current_band = self.current_band.index() as i32;
        record.current_band_a = self.current_band_a.index() as i32;
        record.current_band_b = self.current_band_b.index() as i32;
        record.current_freq_a = self.current_freq_a;
        record.current_freq_b = self.current_freq_b;
        record.freq_correction_factor = self.freq_correction_factor;

        record.equalizer_rec = self.rec_eq_level;
        record.equalizer_xmt = self.xmt_eq_level;
        record.current_mic_threshold = self.current_mic_threshold;
        record.current_mic_comp_ratio = self.current_mic_comp_ratio;
        record.current_mic_attack = self.current_mic_attack;
        record.current_mic_release = self.current_mic_release;
        record.current_mic_gain = self.current_mic_gain;

        record.lpf_coeff = self.lpf_coeff;
        record.nr_psi = self.nr_psi;
        record.nr_alpha = self.nr_alpha;
        record.nr_beta = self.nr_beta;
        record.omega_n = self.omega_n;
        record.pll_fmax = self.pll_fmax;

        record.power_out_cw = self.power_out_cw;
        record.power_out_ssb = self.power_out_ssb;
        record.cw_power_calibration_factor = self.cw_power_calibration_factor;
        record.ssb_power_calibration_factor = self.ssb_power_calibration_factor;
        record.iq_amp_correction_factor = self.iq_amp_correction_factor;
        record.iq_phase_correction_factor = self.iq_phase_correction_factor;
        record.iqx_amp_correction_factor = self.iqx_amp_correction_factor;
        record.iqx_phase_correction_factor = self.iqx_phase_correction_factor;
        record.iqx_rec_amp_correction_factor = self.iqx_rec_amp_correction_factor;
        record.iqx_rec_phase_correction_factor = self.iqx_rec_phase_correction_factor;
        record.x_atten_cw = self.x_atten_cw;
        record.x_atten_ssb = self.x_atten_ssb;
        record.r_atten = self.r_atten;
        record.antenna_selection = self.antenna_selection;
        record.swr_power_adj = self.swr_power_adj;
        record.swr_slope_adj = self.swr_slope_adj;
        record.swr_r_offset = self.swr_r_offset;

        record.last_frequencies = self.last_frequencies;
        record.last_frequencies[self.current_band.index()][self.active_vfo.index()] =
            self.tx_rx_freq;
        record.last_frequencies[self.current_band_a.index()][Vfo::A.index()] = self.current_freq_a;
        record.last_frequencies[self.current_band_b.index()][Vfo::B.index()] = self.current_freq_b;

        record.map_file_name.set(self.map_file_name.as_str());
        record.my_call.set(self.my_call.as_str());
        record.my_time_zone.set(self.my_time_zone.as_str());
        record.separation_character = self.freq_separation_char as i32;
        record.paddle_flip = self.paddle_flip;
        record.sd_card_present = self.sd_card_present as i32;
        record.my_lat = self.my_lat;
        record.my_long = self.my_long;

        record.current_noise_floor = self.current_noise_floor;
        record.compressor_flag = self.compressor_flag;
        record.receive_eq_flag = self.receive_eq_flag;
        record.xmit_eq_flag = self.xmit_eq_flag;
        record.cw_tone_index = self.cw_tone_index;
        record.transmit_power_level_cw = self.transmit_power_level_cw;
        record.transmit_power_level_ssb = self.transmit_power_level_ssb;
    }

    /// Center of the displayed spectrum
    pub fn center_freq(&self) -> u32 {
        self.center_freq
    }

    /// Live transmit/receive frequency
    pub fn tx_rx_freq(&self) -> u32 {
        self.tx_rx_freq
    }

    // Center and live frequency always move together. Callers go through
    // `tune_active_vfo` so the VFO that gets saved moves with them.
    fn set_frequency(&mut self, freq: u32) {
        self.center_freq = freq;
        self.tx_rx_freq = freq;
    }

    /// Band of the active VFO
    pub fn active_band(&self) -> Band {
        match self.active_vfo {
            Vfo::A => self.current_band_a,
            Vfo::B => self.current_band_b,
        }
    }

    /// Retune the active VFO and the live frequency
    pub fn tune_active_vfo(&mut self, freq: u32) {
        self.set_frequency(freq);
        match self.active_vfo {
            Vfo::A => self.current_freq_a = freq,
            Vfo::B => self.current_freq_b = freq,
        }
    }

    /// Move the active VFO to `band`, resuming where it was last used there
    pub fn select_band(&mut self, band: Band) {
        let vfo = self.active_vfo.index();
        self.last_frequencies[self.current_band.index()][vfo] = self.tx_rx_freq;

        self.set_active_band(band);
        let freq = self.last_frequencies[band.index()][vfo];
        self.tune_active_vfo(freq);
    }

    /// Tune the active VFO to `freq`, switching to the band that contains it
    ///
    /// Frequencies outside every band (WWV, for instance) stay on the current
    /// band. Returns the band tuned to.
    pub fn tune_to(&mut self, freq: u32) -> Band {
        let band = Band::containing(freq).unwrap_or(self.current_band);
        self.set_active_band(band);
        self.last_frequencies[band.index()][self.active_vfo.index()] = freq;
        self.tune_active_vfo(freq);
        band
    }

    fn set_active_band(&mut self, band: Band) {
        self.current_band = band;
        match self.active_vfo {
            Vfo::A => self.current_band_a = band,
            Vfo::B => self.current_band_b = band,
        }
    }
}

impl Default for WorkingState {
    fn default() -> Self {
        Self::from_record(&ConfigRecord::defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NUMBER_OF_BANDS, SCHEMA_LABEL};

    #[test]
    fn test_center_and_live_frequency_from_table() {
        let mut record = ConfigRecord::defaults();
        record.current_band = Band::M20.index() as i32;
        record.active_vfo = Vfo::B.index() as i32;
        record.last_frequencies[Band::M20.index()][Vfo::B.index()] = 14_074_000;

        let working = WorkingState::from_record(&record);
        assert_eq!(working.center_freq(), 14_074_000);
        assert_eq!(working.tx_rx_freq(), 14_074_000);
    }

    #[test]
    fn test_vfo_frequencies_follow_their_bands() {
        let mut record = ConfigRecord::defaults();
        record.current_band_a = Band::M80.index() as i32;
        record.current_band_b = Band::M6.index() as i32;

        let working = WorkingState::from_record(&record);
        assert_eq!(working.current_freq_a, record.last_frequencies[Band::M80.index()][0]);
        assert_eq!(working.current_freq_b, record.last_frequencies[Band::M6.index()][1]);
    }

    #[test]
    fn test_bad_selectors_are_clamped() {
        let mut record = ConfigRecord::defaults();
        record.current_band = 57;
        record.current_band_b = -3;
        record.active_vfo = 9;

        let working = WorkingState::from_record(&record);
        assert_eq!(working.current_band, Band::DEFAULT);
        assert_eq!(working.current_band_b, Band::DEFAULT);
        assert_eq!(working.active_vfo, Vfo::A);
    }

    #[test]
    fn test_strings_bounded_on_load() {
        let mut record = ConfigRecord::defaults();
        record.my_call = crate::config::FixedStr::from_bytes(*b"ABCDEFGHIJ");

        let working = WorkingState::from_record(&record);
        assert_eq!(working.my_call.as_str(), "ABCDEFGHI");
    }

    #[test]
    fn test_card_presence_not_restored() {
        let mut record = ConfigRecord::defaults();
        record.sd_card_present = 1;
        assert!(!WorkingState::from_record(&record).sd_card_present);
    }

    #[test]
    fn test_save_stamps_current_tag() {
        let mut record = ConfigRecord::defaults();
        record.version_settings = crate::config::SchemaTag::from_text("V049.2");

        WorkingState::from_record(&record).save_to_record(&mut record);
        assert!(record.version_settings.is_current());
        assert!(record.version_settings.as_str().unwrap().starts_with(SCHEMA_LABEL));
    }

    #[test]
    fn test_save_then_load_is_stable() {
        let defaults = ConfigRecord::defaults();
        let mut first = defaults.clone();
        WorkingState::from_record(&defaults).save_to_record(&mut first);

        let mut second = first.clone();
        WorkingState::from_record(&first).save_to_record(&mut second);
        assert_eq!(first, second);
    }

    #[test]
    fn test_save_keeps_switches_and_favorites() {
        let mut record = ConfigRecord::defaults();
        let mut working = WorkingState::from_record(&record);
        working.switch_thresholds[0] = 1;
        working.favorite_frequencies[0] = 1;

        working.save_to_record(&mut record);
        assert_eq!(record.switch_values[0], ConfigRecord::defaults().switch_values[0]);
        assert_eq!(record.favorite_freqs[0], ConfigRecord::defaults().favorite_freqs[0]);
    }

    #[test]
    fn test_save_records_live_frequency() {
        let mut record = ConfigRecord::defaults();
        let mut working = WorkingState::from_record(&record);
        working.tune_active_vfo(7_074_000);

        working.save_to_record(&mut record);
        assert_eq!(record.last_frequencies[Band::M40.index()][Vfo::A.index()], 7_074_000);
        assert_eq!(record.current_freq_a, 7_074_000);
    }

    #[test]
    fn test_retune_on_vfo_b_survives_save() {
        let mut record = ConfigRecord::defaults();
        let mut working = WorkingState::from_record(&record);
        working.active_vfo = Vfo::B;
        working.tune_active_vfo(7_020_000);

        working.save_to_record(&mut record);
        let reloaded = WorkingState::from_record(&record);
        assert_eq!(reloaded.active_vfo, Vfo::B);
        assert_eq!(reloaded.tx_rx_freq(), 7_020_000);
        assert_eq!(reloaded.center_freq(), 7_020_000);
        assert_eq!(reloaded.current_freq_b, 7_020_000);
    }

    #[test]
    fn test_select_band_restores_last_frequency() {
        let mut working = WorkingState::default();
        working.tune_active_vfo(7_012_000);

        working.select_band(Band::M20);
        assert_eq!(working.current_band, Band::M20);
        assert_eq!(working.current_band_a, Band::M20);
        assert_eq!(working.tx_rx_freq(), 14_060_000);
        assert_eq!(working.center_freq(), 14_060_000);

        working.select_band(Band::M40);
        assert_eq!(working.tx_rx_freq(), 7_012_000);
    }

    #[test]
    fn test_select_band_on_vfo_b() {
        let mut working = WorkingState::default();
        working.active_vfo = Vfo::B;
        working.select_band(Band::M10);
        assert_eq!(working.current_band_b, Band::M10);
        assert_eq!(working.current_band_a, Band::M40);
        assert_eq!(working.current_freq_b, 28_060_000);
        assert_eq!(working.active_band(), Band::M10);
    }

    #[test]
    fn test_tune_to_switches_band() {
        let mut working = WorkingState::default();
        assert_eq!(working.tune_to(21_285_000), Band::M15);
        assert_eq!(working.current_band, Band::M15);
        assert_eq!(working.last_frequencies[Band::M15.index()][0], 21_285_000);
        assert_eq!(working.current_freq_a, 21_285_000);
    }

    #[test]
    fn test_tune_outside_bands_keeps_band() {
        let mut working = WorkingState::default();
        assert_eq!(working.tune_to(10_000_000), Band::M40);
        assert_eq!(working.tx_rx_freq(), 10_000_000);
    }

    #[test]
    fn test_per_band_tables_copied() {
        let mut record = ConfigRecord::defaults();
        for i in 0..NUMBER_OF_BANDS {
            record.swr_slope_adj[i] = i as f32;
        }
        let working = WorkingState::from_record(&record);
        assert_eq!(working.swr_slope_adj, record.swr_slope_adj);
    }
}
