//! Map configuration.
//!
//! A flat [`MapConfig`] with the raster dimensions and label sampling stride,
//! plus a [`RenderTuning`] record holding every threshold of the influence
//! and shading kernels.

// ============================================================================
// Render tuning
// ============================================================================

/// Thresholds of the influence propagation, pixel scoring, and shading
/// kernels. The defaults reproduce the reference map exactly; changing any of
/// them changes the rendered output.
#[derive(Debug, Clone, Copy)]
pub struct RenderTuning {
    /// Influence retained per jump during propagation. 0.3 = reduced to 30%
    /// per jump.
    pub power_falloff: f64,
    /// Propagation stops descending once a diffusion reaches this hop count.
    pub hop_limit: u32,
    /// Squared pixel distance beyond which a seed system does not contribute
    /// to a pixel.
    pub seed_range_sq: f64,
    /// Additive bias in the inverse-square kernel `p / (bias + d^2)`. Keeps
    /// the contribution finite at the seed center (capped at `p / bias`).
    pub distance_bias: f64,
    /// Aggregated scores below this value leave the pixel unowned.
    pub influence_cutoff: f64,
    /// Upper bound for the shading alpha.
    pub alpha_cap: u8,
    /// Minimum alpha applied to border pixels.
    pub border_alpha_floor: u8,
    /// Multiplier in the double-log alpha curve
    /// `min(alpha_cap, ln(ln(s + 1) + 1) * alpha_scale)`.
    pub alpha_scale: f64,
    /// Stride of the diagonal hatch pattern drawn where the previous owner
    /// differs from the current one.
    pub hatch_stride: u32,
}

impl Default for RenderTuning {
    fn default() -> Self {
        Self {
            power_falloff: 0.3,
            hop_limit: 4,
            seed_range_sq: 160_000.0,
            distance_bias: 500.0,
            influence_cutoff: 0.023,
            alpha_cap: 190,
            border_alpha_floor: 0x48,
            alpha_scale: 700.0,
            hatch_stride: 5,
        }
    }
}

impl RenderTuning {
    /// Validate the tuning, panicking if invalid.
    pub fn validate(&self) {
        assert!(
            self.power_falloff.is_finite() && (0.0..=1.0).contains(&self.power_falloff),
            "power_falloff must be in [0, 1], got {}",
            self.power_falloff
        );
        assert!(
            self.hop_limit >= 1,
            "hop_limit must be at least 1, got {}",
            self.hop_limit
        );
        assert!(
            self.seed_range_sq > 0.0,
            "seed_range_sq must be positive, got {}",
            self.seed_range_sq
        );
        assert!(
            self.distance_bias > 0.0,
            "distance_bias must be positive, got {}",
            self.distance_bias
        );
        assert!(
            self.influence_cutoff > 0.0,
            "influence_cutoff must be positive, got {}",
            self.influence_cutoff
        );
        assert!(
            self.alpha_scale > 0.0,
            "alpha_scale must be positive, got {}",
            self.alpha_scale
        );
        assert!(
            self.hatch_stride >= 1,
            "hatch_stride must be at least 1, got {}",
            self.hatch_stride
        );
    }
}

// ============================================================================
// Map configuration
// ============================================================================

/// Configuration for a [`crate::Map`].
#[derive(Debug, Clone, Copy)]
pub struct MapConfig {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Grid stride used by the label extractor when scanning the owner index.
    pub sample_rate: u32,
    /// Kernel thresholds.
    pub tuning: RenderTuning,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 928 * 2,
            height: 1024 * 2,
            sample_rate: 8,
            tuning: RenderTuning::default(),
        }
    }
}

impl MapConfig {
    /// Validate the configuration, panicking if invalid.
    pub fn validate(&self) {
        assert!(self.width > 0, "width must be positive");
        assert!(self.height > 0, "height must be positive");
        assert!(
            self.sample_rate >= 1,
            "sample_rate must be at least 1, got {}",
            self.sample_rate
        );
        self.tuning.validate();
    }
}

// ============================================================================
// Tests
// ============================================================================
