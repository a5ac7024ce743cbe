//! Latest readings and min/max watermarks for every moisture sensor

use heapless::Vec;
use log::info;

use super::{Calibration, MAX_SENSORS};
use crate::config::MonitorConfig;
use crate::error::{CalibrationKind, ConfigError, MonitorError};

/// Running extreme of a sensor's raw readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Watermark {
    /// No reading has been recorded yet
    #[default]
    Unset,
    Set(u16),
}

impl Watermark {
    pub const fn get(self) -> Option<u16> {
        match self {
            Self::Unset => None,
            Self::Set(raw) => Some(raw),
        }
    }

    fn lower_to(&mut self, raw: u16) {
        match *self {
            Self::Set(current) if current <= raw => {}
            _ => *self = Self::Set(raw),
        }
    }

    fn raise_to(&mut self, raw: u16) {
        match *self {
            Self::Set(current) if current >= raw => {}
            _ => *self = Self::Set(raw),
        }
    }
}

/// Latest raw value and watermarks for one sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorReading {
    pub latest: u16,
    pub min: Watermark,
    pub max: Watermark,
}

impl SensorReading {
    fn record(&mut self, raw: u16) {
        self.latest = raw;
        self.min.lower_to(raw);
        self.max.raise_to(raw);
    }
}

/// Moisture readings for every sensor on the device.
///
/// Calibrations are fixed at construction; readings change only through
/// [`MoistureStore::update_reading`]. Both sequences always have one entry
/// per sensor.
#[derive(Debug, Clone)]
pub struct MoistureStore {
    readings: Vec<SensorReading, MAX_SENSORS>,
    calibrations: Vec<Calibration, MAX_SENSORS>,
}

impl MoistureStore {
    /// Builds a store for `sensor_count` sensors.
    ///
    /// Fails if either calibration list does not have exactly one entry per
    /// sensor, if a sensor has identical dry and wet values, or if there are
    /// more than [`MAX_SENSORS`] sensors.
    pub fn new(
        sensor_count: usize,
        dry_calibrations: &[u16],
        wet_calibrations: &[u16],
    ) -> Result<Self, ConfigError> {
        let too_many = ConfigError::TooManySensors {
            count: sensor_count,
            max: MAX_SENSORS,
        };

        if sensor_count > MAX_SENSORS {
            return Err(too_many);
        }

        if dry_calibrations.len() != sensor_count {
            return Err(ConfigError::CalibrationCount {
                kind: CalibrationKind::Dry,
                expected: sensor_count,
                actual: dry_calibrations.len(),
            });
        }

        if wet_calibrations.len() != sensor_count {
            return Err(ConfigError::CalibrationCount {
                kind: CalibrationKind::Wet,
                expected: sensor_count,
                actual: wet_calibrations.len(),
            });
        }

        let mut calibrations = Vec::new();
        for (index, (&dry, &wet)) in dry_calibrations.iter().zip(wet_calibrations).enumerate() {
            let calibration = Calibration::new(dry, wet).ok_or(ConfigError::IdenticalCalibration {
                sensor: index + 1,
                value: dry,
            })?;
            calibrations.push(calibration).map_err(|_| too_many)?;
        }

        let mut readings = Vec::new();
        readings
            .resize_default(sensor_count)
            .map_err(|_| too_many)?;

        Ok(Self {
            readings,
            calibrations,
        })
    }

    /// Builds a store from parsed settings.
    pub fn from_config(config: &MonitorConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.sensor_count(),
            &config.dry_calibrations,
            &config.wet_calibrations,
        )
    }

    pub fn sensor_count(&self) -> usize {
        self.readings.len()
    }

    fn check_index(&self, index: usize) -> Result<usize, MonitorError> {
        if index < self.readings.len() {
            Ok(index)
        } else {
            Err(MonitorError::Index {
                index,
                count: self.readings.len(),
            })
        }
    }

    pub fn calibration(&self, index: usize) -> Result<Calibration, MonitorError> {
        let index = self.check_index(index)?;
        Ok(self.calibrations[index])
    }

    pub fn reading(&self, index: usize) -> Result<SensorReading, MonitorError> {
        let index = self.check_index(index)?;
        Ok(self.readings[index])
    }

    /// Records a new raw reading and updates the sensor's watermarks.
    pub fn update_reading(&mut self, index: usize, raw: u16) -> Result<(), MonitorError> {
        let index = self.check_index(index)?;
        let reading = &mut self.readings[index];
        reading.record(raw);

        let calibration = self.calibrations[index];
        let min = reading.min.get().unwrap_or(raw);
        let max = reading.max.get().unwrap_or(raw);

        info!(
            "Reading updated for sensor {}: current {:>3}% ({}), min {:>3}% ({}), max {:>3}% ({})",
            index + 1,
            calibration.percentage(raw),
            raw,
            calibration.percentage(min),
            min,
            calibration.percentage(max),
            max,
        );

        Ok(())
    }

    /// Converts `raw` to a percentage using the calibration of sensor `index`.
    pub fn percentage_of(&self, index: usize, raw: u16) -> Result<u8, MonitorError> {
        let index = self.check_index(index)?;
        Ok(self.calibrations[index].percentage(raw))
    }

    /// Latest raw reading; 0 until the sensor is first sampled.
    pub fn latest_raw(&self, index: usize) -> Result<u16, MonitorError> {
        let index = self.check_index(index)?;
        Ok(self.readings[index].latest)
    }

    pub fn latest_percentage(&self, index: usize) -> Result<u8, MonitorError> {
        let raw = self.latest_raw(index)?;
        self.percentage_of(index, raw)
    }

    /// Smallest raw reading recorded since startup.
    pub fn min_raw(&self, index: usize) -> Result<u16, MonitorError> {
        let index = self.check_index(index)?;
        self.readings[index]
            .min
            .get()
            .ok_or(MonitorError::NotYetSampled { sensor: index })
    }

    /// Largest raw reading recorded since startup.
    pub fn max_raw(&self, index: usize) -> Result<u16, MonitorError> {
        let index = self.check_index(index)?;
        self.readings[index]
            .max
            .get()
            .ok_or(MonitorError::NotYetSampled { sensor: index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_sensor_store() -> MoistureStore {
        MoistureStore::new(2, &[3000, 1000], &[1200, 2800]).unwrap()
    }

    #[test]
    fn test_new_initializes_unset_watermarks() {
        let store = two_sensor_store();

        assert_eq!(store.sensor_count(), 2);
        for index in 0..2 {
            assert_eq!(store.latest_raw(index), Ok(0));
            assert_eq!(store.reading(index).unwrap().min, Watermark::Unset);
            assert_eq!(store.reading(index).unwrap().max, Watermark::Unset);
        }
    }

    #[test]
    fn test_new_rejects_calibration_length_mismatch() {
        assert_eq!(
            MoistureStore::new(2, &[3000], &[1200, 2800]).unwrap_err(),
            ConfigError::CalibrationCount {
                kind: CalibrationKind::Dry,
                expected: 2,
                actual: 1,
            }
        );
        assert_eq!(
            MoistureStore::new(2, &[3000, 1000], &[1200, 2800, 10]).unwrap_err(),
            ConfigError::CalibrationCount {
                kind: CalibrationKind::Wet,
                expected: 2,
                actual: 3,
            }
        );
    }

    #[test]
    fn test_new_rejects_identical_calibration() {
        assert_eq!(
            MoistureStore::new(2, &[3000, 1500], &[1200, 1500]).unwrap_err(),
            ConfigError::IdenticalCalibration {
                sensor: 2,
                value: 1500,
            }
        );
    }

    #[test]
    fn test_new_rejects_too_many_sensors() {
        let values = [1u16; MAX_SENSORS + 1];
        assert_eq!(
            MoistureStore::new(MAX_SENSORS + 1, &values, &values).unwrap_err(),
            ConfigError::TooManySensors {
                count: MAX_SENSORS + 1,
                max: MAX_SENSORS,
            }
        );
    }

    #[test]
    fn test_update_reading_out_of_range() {
        let mut store = two_sensor_store();
        assert_eq!(
            store.update_reading(2, 100),
            Err(MonitorError::Index { index: 2, count: 2 })
        );
        assert_eq!(
            store.percentage_of(5, 100),
            Err(MonitorError::Index { index: 5, count: 2 })
        );
    }

    #[test]
    fn test_watermarks_before_first_reading() {
        let store = two_sensor_store();
        assert_eq!(store.min_raw(0), Err(MonitorError::NotYetSampled { sensor: 0 }));
        assert_eq!(store.max_raw(1), Err(MonitorError::NotYetSampled { sensor: 1 }));
    }

    #[test]
    fn test_watermarks_track_extremes_in_any_order() {
        let sequences: [&[u16]; 3] = [
            &[1500, 2200, 1800, 2900, 1300],
            &[2900, 1300, 2200, 1500, 1800],
            &[1300, 1300, 2900, 2900, 1800],
        ];

        for sequence in sequences {
            let mut store = two_sensor_store();
            for &raw in sequence {
                store.update_reading(0, raw).unwrap();
            }
            assert_eq!(store.min_raw(0), Ok(1300));
            assert_eq!(store.max_raw(0), Ok(2900));
            assert_eq!(store.latest_raw(0), Ok(*sequence.last().unwrap()));
            // The other sensor is untouched
            assert_eq!(store.min_raw(1), Err(MonitorError::NotYetSampled { sensor: 1 }));
        }
    }

    #[test]
    fn test_single_reading_sets_both_watermarks() {
        let mut store = two_sensor_store();
        store.update_reading(1, 2000).unwrap();
        assert_eq!(store.min_raw(1), Ok(2000));
        assert_eq!(store.max_raw(1), Ok(2000));
    }

    #[test]
    fn test_latest_percentage_scenario() {
        let mut store = two_sensor_store();

        store.update_reading(0, 3000).unwrap();
        assert_eq!(store.latest_percentage(0), Ok(0));
        store.update_reading(0, 1200).unwrap();
        assert_eq!(store.latest_percentage(0), Ok(100));
        store.update_reading(1, 1000).unwrap();
        assert_eq!(store.latest_percentage(1), Ok(0));
        store.update_reading(1, 2800).unwrap();
        assert_eq!(store.latest_percentage(1), Ok(100));

        assert_eq!(store.min_raw(0), Ok(1200));
        assert_eq!(store.max_raw(0), Ok(3000));
    }

    #[test]
    fn test_unsampled_sensor_reports_raw_zero_percentage() {
        let store = two_sensor_store();
        // Raw 0 is beyond the wet point of sensor 0 and the dry point of sensor 1
        assert_eq!(store.latest_percentage(0), Ok(100));
        assert_eq!(store.latest_percentage(1), Ok(0));
    }
}
