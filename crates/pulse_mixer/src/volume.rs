//! Volume Conversion
//!
//! The server stores software volumes on a logarithmic scale. Scripts see a
//! linear 0-100 percentage. The two scales are joined by a fixed power law:
//!
//! ```text
//! linear  = round(100 * 10^(dB / 60))
//! dB      = 60 * log10(clamp(linear, 0, 100) / 100)
//! ```

/// Upper bound of the linear scale accepted by [`to_decibel`]
pub const LINEAR_MAX: f64 = 100.0;

/// Divisor of the power law (dB per decade of linear volume)
const DB_PER_DECADE: f64 = 60.0;

/// Convert a server volume in decibels to the linear 0-100 scale
///
/// The result is not clamped: software volumes above 0 dB map above 100.
/// A muted volume (negative infinity) maps to 0.
pub fn to_linear(db: f64) -> u32 {
    let linear = (LINEAR_MAX * 10f64.powf(db / DB_PER_DECADE)).round();
    if linear.is_nan() {
        return 0;
    }
    // Saturating float-to-int conversion
    linear as u32
}

/// Convert a linear 0-100 volume to decibels
///
/// Inputs outside `[0, 100]` are clamped first, so `to_decibel(150.0)` is
/// 0 dB and `to_decibel(-5.0)` is negative infinity.
pub fn to_decibel(linear: f64) -> f64 {
    let linear = clamp_linear(linear);
    DB_PER_DECADE * (linear / LINEAR_MAX).log10()
}

/// Clamp a linear volume into `[0, 100]`
pub fn clamp_linear(linear: f64) -> f64 {
    linear.clamp(0.0, LINEAR_MAX)
}
