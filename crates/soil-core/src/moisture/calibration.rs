//! Per-sensor dry/wet calibration and the raw-to-percentage transform

/// Raw ADC values a sensor reports at 0% (dry) and 100% (wet) moisture.
///
/// Capacitive probes usually read lower when wet, resistive ones higher, so
/// either value may be the larger one. The two are never equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    dry: u16,
    wet: u16,
}

impl Calibration {
    /// Returns `None` when `dry == wet`, which would make every reading
    /// divide by zero.
    pub const fn new(dry: u16, wet: u16) -> Option<Self> {
        if dry == wet {
            None
        } else {
            Some(Self { dry, wet })
        }
    }

    pub const fn dry(&self) -> u16 {
        self.dry
    }

    pub const fn wet(&self) -> u16 {
        self.wet
    }

    /// True when wetter soil produces a lower raw value.
    pub const fn wet_reads_lower(&self) -> bool {
        self.wet < self.dry
    }

    /// Converts a raw reading to a moisture percentage.
    ///
    /// Computes `(raw - dry) / (wet - dry) * 100`, clamps it to `0..=100` and
    /// rounds half away from zero. Readings beyond either calibration point
    /// (drift, a probe pulled out of the soil) saturate instead of wrapping.
    /// Integer arithmetic only, so no float support is needed on the target.
    pub fn percentage(&self, raw: u16) -> u8 {
        let mut numerator = (i32::from(raw) - i32::from(self.dry)) * 100;
        let mut denominator = i32::from(self.wet) - i32::from(self.dry);

        if denominator < 0 {
            numerator = -numerator;
            denominator = -denominator;
        }

        if numerator <= 0 {
            0
        } else if numerator >= 100 * denominator {
            100
        } else {
            // 0 < numerator / denominator < 100 here, so the rounded value fits
            ((2 * numerator + denominator) / (2 * denominator)) as u8
        }
    }
}
