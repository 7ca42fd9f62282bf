//! Binary layout of the configuration record
//!
//! Fields are stored in declaration order, little-endian, without padding.
//! Text fields occupy their full fixed width. The schema tag fills the
//! first [`TAG_LEN`] bytes so it can be read on its own before the rest of
//! the record is trusted.

use super::constants::*;
use super::record::{ConfigRecord, FixedStr};
use super::version::SchemaTag;

/// 4-byte scalar fields
const SCALAR_WORDS: usize = 51;

/// Per-band tables
const PER_BAND_TABLES: usize = 18;

/// Stored size of a [`ConfigRecord`] in bytes
pub const RECORD_SIZE: usize = TAG_LEN
    + 4 * SCALAR_WORDS
    + 4 * 2 * EQUALIZER_CELL_COUNT
    + 4 * NUMBER_OF_SWITCHES
    + 4 * PER_BAND_TABLES * NUMBER_OF_BANDS
    + 4 * MAX_FAVORITES
    + 4 * NUMBER_OF_VFOS * NUMBER_OF_BANDS
    + MAP_FILE_NAME_LEN
    + CALL_LEN
    + TIME_ZONE_LEN;

/// Encoded record
pub type RecordBytes = [u8; RECORD_SIZE];

struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl Writer<'_> {
    fn bytes(&mut self, data: &[u8]) {
        self.buf[self.pos..self.pos + data.len()].copy_from_slice(data);
        self.pos += data.len();
    }

    fn i32(&mut self, v: i32) {
        self.bytes(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.bytes(&v.to_le_bytes());
    }

    fn f32(&mut self, v: f32) {
        self.bytes(&v.to_le_bytes());
    }

    fn i32s(&mut self, values: &[i32]) {
        values.iter().for_each(|&v| self.i32(v));
    }

    fn u32s(&mut self, values: &[u32]) {
        values.iter().for_each(|&v| self.u32(v));
    }

    fn f32s(&mut self, values: &[f32]) {
        values.iter().for_each(|&v| self.f32(v));
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.array())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.array())
    }

    fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.array())
    }

    fn i32s<const N: usize>(&mut self) -> [i32; N] {
        core::array::from_fn(|_| self.i32())
    }

    fn u32s<const N: usize>(&mut self) -> [u32; N] {
        core::array::from_fn(|_| self.u32())
    }

    fn f32s<const N: usize>(&mut self) -> [f32; N] {
        core::array::from_fn(|_| self.f32())
    }

    fn text<const N: usize>(&mut self) -> FixedStr<N> {
        FixedStr::from_bytes(self.array())
    }
}

/// Serialize a record
pub fn encode(record: &ConfigRecord) -> RecordBytes {
    let mut out = [0u8; RECORD_SIZE];
    let written = encode_into(record, &mut out);
    debug_assert_eq!(written, RECORD_SIZE);
    out
}

fn encode_into(r: &ConfigRecord, buf: &mut RecordBytes) -> usize {
    let mut w = Writer { buf, pos: 0 };

    w.bytes(r.version_settings.as_bytes());
    w.i32(r.agc_mode);
    w.i32(r.audio_volume);
    w.i32(r.rf_gain_all_bands);
    w.i32(r.spectrum_noise_floor);
    w.i32(r.tune_index);
    w.i32(r.step_fine_tune);
    w.i32(r.power_level);
    w.i32(r.xmt_mode);
    w.i32(r.nr_option_select);
    w.i32(r.current_scale);
    w.i32(r.spectrum_zoom);
    w.f32(r.spectrum_display_scale);

    w.i32(r.cw_filter_index);
    w.i32(r.paddle_dit);
    w.i32(r.paddle_dah);
    w.i32(r.decoder_flag);
    w.i32(r.key_type);
    w.i32(r.current_wpm);
    w.f32(r.sidetone_volume);
    w.u32(r.cw_transmit_delay);

    w.i32(r.active_vfo);
    w.i32(r.freq_increment);
    w.i32(r.current_band);
    w.i32(r.current_band_a);
    w.i32(r.current_band_b);
    w.u32(r.current_freq_a);
    w.u32(r.current_freq_b);
    w.i32(r.freq_correction_factor);

    w.i32s(&r.equalizer_rec);
    w.i32s(&r.equalizer_xmt);
    w.i32(r.current_mic_threshold);
    w.f32(r.current_mic_comp_ratio);
    w.f32(r.current_mic_attack);
    w.f32(r.current_mic_release);
    w.i32(r.current_mic_gain);

    w.i32s(&r.switch_values);

    w.f32(r.lpf_coeff);
    w.f32(r.nr_psi);
    w.f32(r.nr_alpha);
    w.f32(r.nr_beta);
    w.f32(r.omega_n);
    w.f32(r.pll_fmax);

    w.f32s(&r.power_out_cw);
    w.f32s(&r.power_out_ssb);
    w.f32s(&r.cw_power_calibration_factor);
    w.f32s(&r.ssb_power_calibration_factor);
    w.f32s(&r.iq_amp_correction_factor);
    w.f32s(&r.iq_phase_correction_factor);
    w.f32s(&r.iqx_amp_correction_factor);
    w.f32s(&r.iqx_phase_correction_factor);
    w.f32s(&r.iqx_rec_amp_correction_factor);
    w.f32s(&r.iqx_rec_phase_correction_factor);
    w.i32s(&r.x_atten_cw);
    w.i32s(&r.x_atten_ssb);
    w.i32s(&r.r_atten);
    w.i32s(&r.antenna_selection);
    w.f32s(&r.swr_power_adj);
    w.f32s(&r.swr_slope_adj);
    w.f32s(&r.swr_r_offset);

    w.u32s(&r.favorite_freqs);
    for pair in &r.last_frequencies {
        w.u32s(pair);
    }
    w.u32(r.center_freq);

    w.bytes(r.map_file_name.as_bytes());
    w.bytes(r.my_call.as_bytes());
    w.bytes(r.my_time_zone.as_bytes());
    w.i32(r.separation_character);
    w.i32(r.paddle_flip);
    w.i32(r.sd_card_present);
    w.f32(r.my_lat);
    w.f32(r.my_long);

    w.i32s(&r.current_noise_floor);
    w.i32(r.compressor_flag);
    w.i32(r.receive_eq_flag);
    w.i32(r.xmit_eq_flag);
    w.i32(r.cw_tone_index);
    w.f32(r.transmit_power_level_cw);
    w.f32(r.transmit_power_level_ssb);

    w.pos
}

/// Deserialize a record
///
/// Any byte pattern decodes; whether the result is usable is decided by
/// the schema tag and [`ConfigRecord::is_valid`].
pub fn decode(buf: &RecordBytes) -> ConfigRecord {
    let mut r = Reader { buf, pos: 0 };

    ConfigRecord {
        version_settings: SchemaTag::from_bytes(r.array()),
        agc_mode: r.i32(),
        audio_volume: r.i32(),
        rf_gain_all_bands: r.i32(),
        spectrum_noise_floor: r.i32(),
        tune_index: r.i32(),
        step_fine_tune: r.i32(),
        power_level: r.i32(),
        xmt_mode: r.i32(),
        nr_option_select: r.i32(),
        current_scale: r.i32(),
        spectrum_zoom: r.i32(),
        spectrum_display_scale: r.f32(),

        cw_filter_index: r.i32(),
        paddle_dit: r.i32(),
        paddle_dah: r.i32(),
        decoder_flag: r.i32(),
        key_type: r.i32(),
        current_wpm: r.i32(),
        sidetone_volume: r.f32(),
        cw_transmit_delay: r.u32(),

        active_vfo: r.i32(),
        freq_increment: r.i32(),
        current_band: r.i32(),
        current_band_a: r.i32(),
        current_band_b: r.i32(),
        current_freq_a: r.u32(),
        current_freq_b: r.u32(),
        freq_correction_factor: r.i32(),

        equalizer_rec: r.i32s(),
        equalizer_xmt: r.i32s(),
        current_mic_threshold: r.i32(),
        current_mic_comp_ratio: r.f32(),
        current_mic_attack: r.f32(),
        current_mic_release: r.f32(),
        current_mic_gain: r.i32(),

        switch_values: r.i32s(),

        lpf_coeff: r.f32(),
        nr_psi: r.f32(),
        nr_alpha: r.f32(),
        nr_beta: r.f32(),
        omega_n: r.f32(),
        pll_fmax: r.f32(),

        power_out_cw: r.f32s(),
        power_out_ssb: r.f32s(),
        cw_power_calibration_factor: r.f32s(),
        ssb_power_calibration_factor: r.f32s(),
        iq_amp_correction_factor: r.f32s(),
        iq_phase_correction_factor: r.f32s(),
        iqx_amp_correction_factor: r.f32s(),
        iqx_phase_correction_factor: r.f32s(),
        iqx_rec_amp_correction_factor: r.f32s(),
        iqx_rec_phase_correction_factor: r.f32s(),
        x_atten_cw: r.i32s(),
        x_atten_ssb: r.i32s(),
        r_atten: r.i32s(),
        antenna_selection: r.i32s(),
        swr_power_adj: r.f32s(),
        swr_slope_adj: r.f32s(),
        swr_r_offset: r.f32s(),

        favorite_freqs: r.u32s(),
        last_frequencies: core::array::from_fn(|_| r.u32s()),
        center_freq: r.u32(),

        map_file_name: r.text(),
        my_call: r.text(),
        my_time_zone: r.text(),
        separation_character: r.i32(),
        paddle_flip: r.i32(),
        sd_card_present: r.i32(),
        my_lat: r.f32(),
        my_long: r.f32(),

        current_noise_floor: r.i32s(),
        compressor_flag: r.i32(),
        receive_eq_flag: r.i32(),
        xmit_eq_flag: r.i32(),
        cw_tone_index: r.i32(),
        transmit_power_level_cw: r.f32(),
        transmit_power_level_ssb: r.f32(),
    }
}
