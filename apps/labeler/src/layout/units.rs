//! Physical-unit conversion. The internal length unit is the PostScript
//! point; all paper geometry is declared in millimeters and converted once,
//! at profile resolution.

/// Points per millimeter. Fixed constant — golden-output tests depend on the
/// exact value, so it must never be recomputed from higher-precision sources.
pub const MM_TO_PT: f32 = 2.83465;

/// Converts millimeters to internal units (points).
#[inline]
pub fn mm(millimeters: f32) -> f32 {
    millimeters * MM_TO_PT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_constant_is_bit_stable() {
        // 70mm is the most common label edge; the resolved value feeds every
        // coordinate downstream.
        assert_eq!(mm(70.0), 70.0 * 2.83465);
        assert_eq!(mm(0.0), 0.0);
    }

    #[test]
    fn test_mm_is_linear() {
        assert!((mm(10.0) * 2.0 - mm(20.0)).abs() < 1e-4);
    }
}
