//! Code matching against a dictionary, with rotations.

use crate::Dictionary;

/// Raised when a dictionary cannot be used for matching.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DictionaryError {
    #[error("marker_size {marker_size} needs {bits} bits, more than a u64 holds")]
    TooManyBits { marker_size: usize, bits: usize },
    #[error("dictionary {0} has no codes")]
    Empty(&'static str),
}

/// Best dictionary entry for an observed code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    pub id: u32,
    /// `observed == rotate_code_u64(dict_code, n, rotation)`.
    pub rotation: u8,
    pub hamming: u8,
}

/// Brute-force matcher over all ids and the four rotations.
#[derive(Clone, Debug)]
pub struct Matcher {
    dict: Dictionary,
    max_hamming: u8,
    rotated: Vec<[u64; 4]>,
}

impl Matcher {
    pub fn new(dict: Dictionary, max_hamming: u8) -> Result<Self, DictionaryError> {
        if !dict.fits_u64() {
            return Err(DictionaryError::TooManyBits {
                marker_size: dict.marker_size,
                bits: dict.bit_count(),
            });
        }
        if dict.is_empty() {
            return Err(DictionaryError::Empty(dict.name));
        }

        let n = dict.marker_size;
        let rotated = dict
            .codes
            .iter()
            .map(|&code| [0u8, 1, 2, 3].map(|r| rotate_code_u64(code, n, r)))
            .collect();

        Ok(Self {
            dict,
            max_hamming,
            rotated,
        })
    }

    /// Matcher that accepts up to the dictionary's own correction capacity.
    pub fn with_dictionary_correction(dict: Dictionary) -> Result<Self, DictionaryError> {
        Self::new(dict, dict.max_correction_bits)
    }

    #[inline]
    pub fn dictionary(&self) -> Dictionary {
        self.dict
    }

    #[inline]
    pub fn max_hamming(&self) -> u8 {
        self.max_hamming
    }

    /// Closest `(id, rotation)` within `max_hamming`; exact hits win early,
    /// ties keep the lowest id and rotation.
    pub fn match_code(&self, observed: u64) -> Option<Match> {
        let mut best: Option<Match> = None;
        for (id, rots) in self.rotated.iter().enumerate() {
            for (rot, &cand) in rots.iter().enumerate() {
                let hamming = (observed ^ cand).count_ones() as u8;
                if hamming > self.max_hamming {
                    continue;
                }
                if best.is_some_and(|b| b.hamming <= hamming) {
                    continue;
                }
                best = Some(Match {
                    id: id as u32,
                    rotation: rot as u8,
                    hamming,
                });
                if hamming == 0 {
                    return best;
                }
            }
        }
        best
    }
}

/// Rotate an `n × n` code (row-major, `idx = y * n + x`) clockwise by
/// `rot` quarter turns as seen in a y-down image.
pub fn rotate_code_u64(code: u64, n: usize, rot: u8) -> u64 {
    let rot = rot & 3;
    if rot == 0 {
        return code;
    }

    let mut out = 0u64;
    for y in 0..n {
        for x in 0..n {
            let (sx, sy) = match rot {
                1 => (y, n - 1 - x),
                2 => (n - 1 - x, n - 1 - y),
                _ => (n - 1 - y, x),
            };
            let bit = (code >> (sy * n + sx)) & 1;
            out |= bit << (y * n + x);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::DARTCAM_4X4;

    #[test]
    fn four_quarter_turns_are_identity() {
        let code = 0xA60F;
        let r = (0..4).fold(code, |c, _| rotate_code_u64(c, 4, 1));
        assert_eq!(code, r);
        assert_eq!(rotate_code_u64(rotate_code_u64(code, 4, 1), 4, 3), code);
    }

    #[test]
    fn quarter_turn_moves_top_left_to_top_right() {
        // only (0,0) set in a 2x2 code
        assert_eq!(rotate_code_u64(0b0001, 2, 1), 0b0010);
    }

    #[test]
    fn matcher_finds_rotated_code() {
        let matcher = Matcher::new(DARTCAM_4X4, 0).expect("matcher");
        let observed = rotate_code_u64(DARTCAM_4X4.codes[2], 4, 3);
        let m = matcher.match_code(observed).expect("match");
        assert_eq!(
            m,
            Match {
                id: 2,
                rotation: 3,
                hamming: 0
            }
        );
    }

    #[test]
    fn matcher_corrects_one_flipped_bit() {
        let matcher = Matcher::with_dictionary_correction(DARTCAM_4X4).expect("matcher");
        let observed = DARTCAM_4X4.codes[1] ^ (1 << 5);
        let m = matcher.match_code(observed).expect("match");
        assert_eq!((m.id, m.rotation, m.hamming), (1, 0, 1));
        assert!(matcher.match_code(DARTCAM_4X4.codes[1] ^ 0b11).is_none());
    }
}
