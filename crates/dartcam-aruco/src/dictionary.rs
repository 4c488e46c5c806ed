//! Dictionary metadata and packed marker codes.

/// A fixed set of square binary markers.
#[derive(Clone, Copy, Debug)]
pub struct Dictionary {
    /// Name used in logs.
    pub name: &'static str,
    /// Inner bits per side (the black border is not counted).
    pub marker_size: usize,
    /// Largest Hamming distance the dictionary can correct.
    pub max_correction_bits: u8,
    /// One code per marker id, inner bits row-major (`idx = y * n + x`),
    /// **black = 1**.
    pub codes: &'static [u64],
}

impl Dictionary {
    #[inline]
    pub fn bit_count(&self) -> usize {
        self.marker_size * self.marker_size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn code(&self, id: u32) -> Option<u64> {
        self.codes.get(id as usize).copied()
    }

    /// Whether the inner bits fit into a `u64`.
    #[inline]
    pub fn fits_u64(&self) -> bool {
        self.bit_count() <= 64
    }
}
