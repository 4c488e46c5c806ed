//! Dictionaries compiled into the crate.

use crate::Dictionary;

/// The four board markers: ids `0..=3` of OpenCV's `DICT_4X4_50`.
///
/// Codes are the unrotated inner 4×4 patterns with black = 1, so a marker
/// printed from that dictionary decodes to the same id here.
pub const DARTCAM_4X4: Dictionary = Dictionary {
    name: "DARTCAM_4X4",
    marker_size: 4,
    max_correction_bits: 1,
    codes: &[0xB352, 0xA60F, 0x4B33, 0xA566],
};

const ALL: &[Dictionary] = &[DARTCAM_4X4];

/// Look up a built-in dictionary by name.
pub fn builtin_dictionary(name: &str) -> Option<Dictionary> {
    ALL.iter().copied().find(|d| d.name.eq_ignore_ascii_case(name))
}
