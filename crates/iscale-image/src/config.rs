/// Devices with fewer levels than this per channel are treated as halftone devices.
pub const HALFTONE_LEVEL_THRESHOLD: u32 = 15;

/// Minimum enlargement on both axes before a halftone device gets the standard filter.
pub const HALFTONE_MIN_ENLARGEMENT: usize = 4;

/// Configuration for choosing and sizing an interpolated render.
///
/// The halftone thresholds are visual-quality heuristics; keep them in sync
/// with the visual regression suite when changing them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterpolationConfig {
    /// Level count below which a device is halftone class.
    pub halftone_level_threshold: u32,
    /// Enlargement ratio a halftone device needs on both axes.
    pub halftone_min_enlargement: usize,
    /// Optional cap on the row buffer size in bytes.
    pub scratch_limit: Option<usize>,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            halftone_level_threshold: HALFTONE_LEVEL_THRESHOLD,
            halftone_min_enlargement: HALFTONE_MIN_ENLARGEMENT,
            scratch_limit: None,
        }
    }
}

impl InterpolationConfig {
    /// Set the row buffer size cap.
    pub fn with_scratch_limit(mut self, limit: usize) -> Self {
        self.scratch_limit = Some(limit);
        self
    }

    /// Whether a device quantizing to `levels` per channel is halftone class.
    pub fn is_halftone(&self, levels: u32) -> bool {
        levels < self.halftone_level_threshold
    }
}
