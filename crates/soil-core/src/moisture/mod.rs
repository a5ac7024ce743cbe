mod calibration;
mod store;

pub use calibration::Calibration;
pub use store::*;

/// Maximum number of moisture sensors a single device can track
pub const MAX_SENSORS: usize = 8;
