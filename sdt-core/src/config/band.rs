//! Band and VFO enumerations

use super::constants::NUMBER_OF_BANDS;

/// Amateur band
///
/// The discriminant is the index used by every per-band table in the
/// configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Band {
    M80 = 0,
    M60 = 1,
    M40 = 2,
    M30 = 3,
    M20 = 4,
    M17 = 5,
    M15 = 6,
    M12 = 7,
    M10 = 8,
    M6 = 9,
}

impl Band {
    /// All bands in table order
    pub const ALL: [Band; NUMBER_OF_BANDS] = [
        Band::M80,
        Band::M60,
        Band::M40,
        Band::M30,
        Band::M20,
        Band::M17,
        Band::M15,
        Band::M12,
        Band::M10,
        Band::M6,
    ];

    /// Band used when a stored index is out of range
    pub const DEFAULT: Band = Band::M40;

    /// Table index of this band
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a band from a stored index
    pub fn from_index(index: i32) -> Option<Band> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Lowest and highest frequency of the band in Hz
    pub const fn edges(self) -> (u32, u32) {
        match self {
            Band::M80 => (3_500_000, 4_000_000),
            Band::M60 => (5_330_500, 5_406_400),
            Band::M40 => (7_000_000, 7_300_000),
            Band::M30 => (10_100_000, 10_150_000),
            Band::M20 => (14_000_000, 14_350_000),
            Band::M17 => (18_068_000, 18_168_000),
            Band::M15 => (21_000_000, 21_450_000),
            Band::M12 => (24_890_000, 24_990_000),
            Band::M10 => (28_000_000, 29_700_000),
            Band::M6 => (50_000_000, 54_000_000),
        }
    }

    /// Band whose edges contain `freq`, if any
    pub fn containing(freq: u32) -> Option<Band> {
        Self::ALL.iter().copied().find(|band| {
            let (low, high) = band.edges();
            (low..=high).contains(&freq)
        })
    }

    /// Wavelength in meters, for display and logs
    pub const fn meters(self) -> u8 {
        match self {
            Band::M80 => 80,
            Band::M60 => 60,
            Band::M40 => 40,
            Band::M30 => 30,
            Band::M20 => 20,
            Band::M17 => 17,
            Band::M15 => 15,
            Band::M12 => 12,
            Band::M10 => 10,
            Band::M6 => 6,
        }
    }
}

/// Tunable channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Vfo {
    A = 0,
    B = 1,
}

impl Vfo {
    /// Column in the last-frequency table
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a VFO from a stored index
    pub fn from_index(index: i32) -> Option<Vfo> {
        match index {
            0 => Some(Vfo::A),
            1 => Some(Vfo::B),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for (i, band) in Band::ALL.iter().enumerate() {
            assert_eq!(band.index(), i);
            assert_eq!(Band::from_index(i as i32), Some(*band));
        }
    }

    #[test]
    fn test_from_index_rejects_out_of_range() {
        assert_eq!(Band::from_index(-1), None);
        assert_eq!(Band::from_index(NUMBER_OF_BANDS as i32), None);
        assert_eq!(Vfo::from_index(2), None);
        assert_eq!(Vfo::from_index(-1), None);
    }

    #[test]
    fn test_containing() {
        assert_eq!(Band::containing(7_200_000), Some(Band::M40));
        assert_eq!(Band::containing(3_500_000), Some(Band::M80));
        assert_eq!(Band::containing(54_000_000), Some(Band::M6));
        assert_eq!(Band::containing(28_060_000), Some(Band::M10));
        // WWV is outside every amateur band
        assert_eq!(Band::containing(10_000_000), None);
    }

    #[test]
    fn test_bands_do_not_overlap() {
        for pair in Band::ALL.windows(2) {
            assert!(pair[0].edges().1 < pair[1].edges().0);
        }
    }
}
