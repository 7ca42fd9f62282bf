//! Field table shared by export, import and the parameter dump
//!
//! Every persisted value appears exactly once. Adding a field to the record
//! means adding one entry here; both directions pick it up.

use core::fmt::{self, Display, Write};

use heapless::String;

use crate::config::record::ConfigRecord;
use crate::config::version::SchemaTag;
use crate::config::{
    EQUALIZER_CELL_COUNT, MAX_FAVORITES, NUMBER_OF_BANDS, NUMBER_OF_SWITCHES, NUMBER_OF_VFOS,
};

/// Capacity of one rendered line, without line ending
pub const LINE_CAPACITY: usize = 150;

/// How many lines a field occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    List(usize),
    /// Band by VFO table, row-major
    PerVfo,
}

impl Shape {
    pub const fn len(self) -> usize {
        match self {
            Shape::Scalar => 1,
            Shape::List(n) => n,
            Shape::PerVfo => NUMBER_OF_BANDS * NUMBER_OF_VFOS,
        }
    }
}

/// Typed access to the record for one field
#[derive(Clone, Copy)]
pub enum Value {
    Tag,
    Int {
        get: fn(&ConfigRecord, usize) -> i32,
        set: fn(&mut ConfigRecord, usize, i32),
    },
    Uint {
        get: fn(&ConfigRecord, usize) -> u32,
        set: fn(&mut ConfigRecord, usize, u32),
    },
    Float {
        get: fn(&ConfigRecord, usize) -> f32,
        set: fn(&mut ConfigRecord, usize, f32),
        /// Digits after the decimal point
        precision: usize,
    },
    Text {
        get: fn(&ConfigRecord) -> &str,
        set: fn(&mut ConfigRecord, &str),
    },
}

/// Errors applying a text value to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Line has no ` = ` separator
    MissingSeparator,
    /// Value is not a number of the field's type
    InvalidNumber,
    /// Line is not valid UTF-8
    InvalidText,
}

/// One entry of the field table
pub struct Field {
    pub name: &'static str,
    pub shape: Shape,
    pub value: Value,
}

impl Field {
    /// Label of element `index`, as written in the text mirror
    pub fn label(&self, index: usize) -> Label<'_> {
        Label { field: self, index }
    }

    /// Value of element `index`, rendered at the field's precision
    pub fn render<'a>(&'a self, record: &'a ConfigRecord, index: usize) -> Rendered<'a> {
        Rendered {
            field: self,
            record,
            index,
        }
    }

    /// Parse `text` and store it in element `index` of `record`
    ///
    /// Numbers may carry surrounding whitespace; text values are taken as-is.
    /// On error the record is unchanged.
    pub fn apply(&self, record: &mut ConfigRecord, index: usize, text: &str) -> Result<(), ParseError> {
        match self.value {
            Value::Tag => record.version_settings = SchemaTag::from_text(text.trim()),
            Value::Int { set, .. } => {
                let v = text.trim().parse().map_err(|_| ParseError::InvalidNumber)?;
                set(record, index, v);
            }
            Value::Uint { set, .. } => {
                let v = text.trim().parse().map_err(|_| ParseError::InvalidNumber)?;
                set(record, index, v);
            }
            Value::Float { set, .. } => {
                let v: f32 = text.trim().parse().map_err(|_| ParseError::InvalidNumber)?;
                if !v.is_finite() {
                    return Err(ParseError::InvalidNumber);
                }
                set(record, index, v);
            }
            Value::Text { set, .. } => set(record, text),
        }
        Ok(())
    }
}

/// Display adapter for a field label
pub struct Label<'a> {
    field: &'a Field,
    index: usize,
}

impl Display for Label<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.field.name;
        match self.field.shape {
            Shape::Scalar => f.write_str(name),
            Shape::List(_) => write!(f, "{}[{}]", name, self.index),
            Shape::PerVfo => write!(
                f,
                "{}[{}][{}]",
                name,
                self.index / NUMBER_OF_VFOS,
                self.index % NUMBER_OF_VFOS
            ),
        }
    }
}

/// Display adapter for a field value
pub struct Rendered<'a> {
    field: &'a Field,
    record: &'a ConfigRecord,
    index: usize,
}

impl Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, i) = (self.record, self.index);
        match self.field.value {
            Value::Tag => f.write_str(r.version_settings.as_str().unwrap_or("")),
            Value::Int { get, .. } => write!(f, "{}", get(r, i)),
            Value::Uint { get, .. } => write!(f, "{}", get(r, i)),
            Value::Float { get, precision, .. } => write!(f, "{:.*}", precision, get(r, i)),
            Value::Text { get, .. } => f.write_str(get(r)),
        }
    }
}

/// Render `label = value` for one element into a line buffer
///
/// Overlong lines are cut at [`LINE_CAPACITY`].
pub fn render_line(record: &ConfigRecord, field: &Field, index: usize) -> String<LINE_CAPACITY> {
    let mut line = String::new();
    let _ = write!(line, "{} = {}", field.label(index), field.render(record, index));
    line
}

/// Every (field, element) pair in file order
pub fn entries() -> impl Iterator<Item = (&'static Field, usize)> {
    FIELDS
        .iter()
        .flat_map(|field| (0..field.shape.len()).map(move |index| (field, index)))
}

/// Number of lines in a complete text mirror
pub fn line_count() -> usize {
    FIELDS.iter().map(|field| field.shape.len()).sum()
}

macro_rules! int {
    ($name:ident) => {
        Field {
            name: stringify!($name),
            shape: Shape::Scalar,
            value: Value::Int {
                get: |r, _| r.$name,
                set: |r, _, v| r.$name = v,
            },
        }
    };
    ($name:ident, $len:expr) => {
        Field {
            name: stringify!($name),
            shape: Shape::List($len),
            value: Value::Int {
                get: |r, i| r.$name[i],
                set: |r, i, v| r.$name[i] = v,
            },
        }
    };
}

macro_rules! uint {
    ($name:ident) => {
        Field {
            name: stringify!($name),
            shape: Shape::Scalar,
            value: Value::Uint {
                get: |r, _| r.$name,
                set: |r, _, v| r.$name = v,
            },
        }
    };
    ($name:ident, $len:expr) => {
        Field {
            name: stringify!($name),
            shape: Shape::List($len),
            value: Value::Uint {
                get: |r, i| r.$name[i],
                set: |r, i, v| r.$name[i] = v,
            },
        }
    };
}

macro_rules! float {
    ($name:ident, $precision:expr) => {
        Field {
            name: stringify!($name),
            shape: Shape::Scalar,
            value: Value::Float {
                get: |r, _| r.$name,
                set: |r, _, v| r.$name = v,
                precision: $precision,
            },
        }
    };
    ($name:ident, $len:expr, $precision:expr) => {
        Field {
            name: stringify!($name),
            shape: Shape::List($len),
            value: Value::Float {
                get: |r, i| r.$name[i],
                set: |r, i, v| r.$name[i] = v,
                precision: $precision,
            },
        }
    };
}

macro_rules! text {
    ($name:ident) => {
        Field {
            name: stringify!($name),
            shape: Shape::Scalar,
            value: Value::Text {
                get: |r| r.$name.as_str(),
                set: |r, s| r.$name.set(s),
            },
        }
    };
}

const BANDS: usize = NUMBER_OF_BANDS;

/// The text mirror, in file order
pub static FIELDS: &[Field] = &[
    Field {
        name: "version_settings",
        shape: Shape::Scalar,
        value: Value::Tag,
    },
    int!(agc_mode),
    int!(audio_volume),
    int!(rf_gain_all_bands),
    int!(spectrum_noise_floor),
    int!(tune_index),
    int!(step_fine_tune),
    int!(power_level),
    int!(xmt_mode),
    int!(nr_option_select),
    int!(current_scale),
    int!(spectrum_zoom),
    float!(spectrum_display_scale, 1),
    int!(cw_filter_index),
    int!(paddle_dit),
    int!(paddle_dah),
    int!(decoder_flag),
    int!(key_type),
    int!(current_wpm),
    float!(sidetone_volume, 4),
    uint!(cw_transmit_delay),
    int!(active_vfo),
    int!(freq_increment),
    int!(current_band),
    int!(current_band_a),
    int!(current_band_b),
    uint!(current_freq_a),
    uint!(current_freq_b),
    int!(freq_correction_factor),
    int!(equalizer_rec, EQUALIZER_CELL_COUNT),
    int!(equalizer_xmt, EQUALIZER_CELL_COUNT),
    int!(current_mic_threshold),
    float!(current_mic_comp_ratio, 1),
    float!(current_mic_attack, 1),
    float!(current_mic_release, 1),
    int!(current_mic_gain),
    int!(switch_values, NUMBER_OF_SWITCHES),
    float!(lpf_coeff, 4),
    float!(nr_psi, 4),
    float!(nr_alpha, 4),
    float!(nr_beta, 4),
    float!(omega_n, 4),
    float!(pll_fmax, 1),
    float!(power_out_cw, BANDS, 5),
    float!(power_out_ssb, BANDS, 5),
    float!(cw_power_calibration_factor, BANDS, 5),
    float!(ssb_power_calibration_factor, BANDS, 5),
    float!(iq_amp_correction_factor, BANDS, 5),
    float!(iq_phase_correction_factor, BANDS, 5),
    float!(iqx_amp_correction_factor, BANDS, 5),
    float!(iqx_phase_correction_factor, BANDS, 5),
    float!(iqx_rec_amp_correction_factor, BANDS, 5),
    float!(iqx_rec_phase_correction_factor, BANDS, 5),
    int!(x_atten_cw, BANDS),
    int!(x_atten_ssb, BANDS),
    int!(r_atten, BANDS),
    int!(antenna_selection, BANDS),
    float!(swr_power_adj, BANDS, 5),
    float!(swr_slope_adj, BANDS, 5),
    float!(swr_r_offset, BANDS, 5),
    uint!(favorite_freqs, MAX_FAVORITES),
    Field {
        name: "last_frequencies",
        shape: Shape::PerVfo,
        value: Value::Uint {
            get: |r, i| r.last_frequencies[i / NUMBER_OF_VFOS][i % NUMBER_OF_VFOS],
            set: |r, i, v| r.last_frequencies[i / NUMBER_OF_VFOS][i % NUMBER_OF_VFOS] = v,
        },
    },
    uint!(center_freq),
    text!(map_file_name),
    text!(my_call),
    text!(my_time_zone),
    int!(separation_character),
    int!(paddle_flip),
    int!(sd_card_present),
    float!(my_lat, 5),
    float!(my_long, 5),
    int!(current_noise_floor, BANDS),
    int!(compressor_flag),
    int!(receive_eq_flag),
    int!(xmit_eq_flag),
    int!(cw_tone_index),
    float!(transmit_power_level_cw, 4),
    float!(transmit_power_level_ssb, 4),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> &'static Field {
        FIELDS.iter().find(|f| f.name == name).unwrap()
    }

    #[test]
    fn test_line_count() {
        assert_eq!(line_count(), 314);
        assert_eq!(entries().count(), line_count());
    }

    #[test]
    fn test_names_unique() {
        for (i, a) in FIELDS.iter().enumerate() {
            for b in &FIELDS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_first_line_is_tag() {
        let (first, index) = entries().next().unwrap();
        assert_eq!(first.name, "version_settings");
        assert_eq!(index, 0);
    }

    #[test]
    fn test_render_lines() {
        let record = ConfigRecord::defaults();

        assert_eq!(render_line(&record, field("audio_volume"), 0).as_str(), "audio_volume = 40");
        assert_eq!(
            render_line(&record, field("cw_power_calibration_factor"), 4).as_str(),
            "cw_power_calibration_factor[4] = 0.03800"
        );
        assert_eq!(
            render_line(&record, field("spectrum_display_scale"), 0).as_str(),
            "spectrum_display_scale = 20.0"
        );
        assert_eq!(
            render_line(&record, field("last_frequencies"), 5).as_str(),
            "last_frequencies[2][1] = 7200000"
        );
        assert_eq!(render_line(&record, field("my_call"), 0).as_str(), "my_call = Your Call");
        assert_eq!(
            render_line(&record, field("version_settings"), 0).as_str(),
            "version_settings = V050_1320"
        );
    }

    #[test]
    fn test_apply_numbers() {
        let mut record = ConfigRecord::zeroed();

        field("audio_volume").apply(&mut record, 0, " 55 ").unwrap();
        assert_eq!(record.audio_volume, 55);

        field("x_atten_ssb").apply(&mut record, 3, "-7").unwrap();
        assert_eq!(record.x_atten_ssb[3], -7);

        field("my_lat").apply(&mut record, 0, "51.4779").unwrap();
        assert_eq!(record.my_lat, 51.4779);

        field("last_frequencies").apply(&mut record, 19, "50313000").unwrap();
        assert_eq!(record.last_frequencies[9][1], 50_313_000);
    }

    #[test]
    fn test_apply_rejects_bad_numbers() {
        let mut record = ConfigRecord::defaults();

        assert_eq!(
            field("audio_volume").apply(&mut record, 0, "loud"),
            Err(ParseError::InvalidNumber)
        );
        assert_eq!(
            field("center_freq").apply(&mut record, 0, "-1"),
            Err(ParseError::InvalidNumber)
        );
        assert_eq!(field("nr_psi").apply(&mut record, 0, "inf"), Err(ParseError::InvalidNumber));
        assert_eq!(record, ConfigRecord::defaults());
    }

    #[test]
    fn test_apply_text_is_verbatim_and_bounded() {
        let mut record = ConfigRecord::zeroed();
        field("my_call").apply(&mut record, 0, " DB2OO/P long").unwrap();
        assert_eq!(record.my_call.as_str(), " DB2OO/P ");
    }
}
