//! Tuning knobs for fitting and emoji synthesis

use crate::error::{BoxfitError, Result};

/// Fitting and synthesis parameters
#[derive(Debug, Clone, PartialEq)]
pub struct FitConfig {
    /// Smallest size tried by normal scaling
    pub min_font_size: u32,
    /// Smallest size tried by aggressive scaling; truncation retries here
    pub aggressive_floor: u32,
    /// Character budgets tried in order when no size fits
    pub truncation_steps: Vec<usize>,
    /// Emoji canvas padding as a fraction of the requested size
    pub emoji_padding_ratio: f32,
    /// Emoji are drawn at this multiple and downscaled
    pub supersample_factor: u32,
    /// Cap on cached emoji bitmaps; `None` keeps everything
    pub emoji_cache_capacity: Option<usize>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            min_font_size: 6,
            aggressive_floor: 2,
            truncation_steps: vec![100, 50, 25],
            emoji_padding_ratio: 0.1,
            supersample_factor: 2,
            emoji_cache_capacity: None,
        }
    }
}

impl FitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.aggressive_floor == 0 {
            return Err(BoxfitError::ConfigError(
                "aggressive_floor must be at least 1".into(),
            ));
        }
        if self.min_font_size < self.aggressive_floor {
            return Err(BoxfitError::ConfigError(format!(
                "min_font_size ({}) is below aggressive_floor ({})",
                self.min_font_size, self.aggressive_floor
            )));
        }
        if self.supersample_factor == 0 {
            return Err(BoxfitError::ConfigError(
                "supersample_factor must be at least 1".into(),
            ));
        }
        if !self.emoji_padding_ratio.is_finite() || self.emoji_padding_ratio < 0.0 {
            return Err(BoxfitError::ConfigError(format!(
                "emoji_padding_ratio must be a non-negative number, got {}",
                self.emoji_padding_ratio
            )));
        }
        Ok(())
    }

    /// Emoji canvas padding in pixels at `size`
    pub fn emoji_padding(&self, size: u32) -> u32 {
        ((size as f32 * self.emoji_padding_ratio).round() as u32).max(4)
    }
}

/// Optional behaviors of the single fitter/compositor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub emoji_support: bool,
    pub hashtag_support: bool,
    pub aggressive_scaling: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            emoji_support: true,
            hashtag_support: true,
            aggressive_scaling: true,
        }
    }
}

impl Capabilities {
    /// Plain text only: no emoji images, no hashtag color, stop at min size
    pub const fn basic() -> Self {
        Self {
            emoji_support: false,
            hashtag_support: false,
            aggressive_scaling: false,
        }
    }
}
