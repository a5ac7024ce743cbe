//! Moisture probe abstraction and the per-cycle sampling pass

use crate::error::MonitorError;
use crate::moisture::MoistureStore;

/// Source of raw moisture readings, one analog input per sensor index.
///
/// Readings carry no guarantee about noise or monotonicity; the store clamps
/// whatever it is given.
pub trait MoistureProbe {
    fn read_raw(&mut self, sensor: usize) -> u16;
}

impl<P: MoistureProbe + ?Sized> MoistureProbe for &mut P {
    fn read_raw(&mut self, sensor: usize) -> u16 {
        (**self).read_raw(sensor)
    }
}

/// Reads every sensor in index order and records the values in `store`.
pub fn sample_all<P>(store: &mut MoistureStore, probe: &mut P) -> Result<(), MonitorError>
where
    P: MoistureProbe + ?Sized,
{
    for sensor in 0..store.sensor_count() {
        let raw = probe.read_raw(sensor);
        store.update_reading(sensor, raw)?;
    }
    Ok(())
}
