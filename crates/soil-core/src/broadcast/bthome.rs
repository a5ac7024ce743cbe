//! BTHome v2 service-data encoding for moisture readings.
//!
//! Binary format (one fixed record per sensor, `RECORD_WIDTH` = 2):
//! - byte 0: device information (`0x40`: unencrypted, regular interval, v2)
//! - byte 1 + 2i: object id `0x2F` (moisture, uint8, 1% resolution)
//! - byte 2 + 2i: moisture percentage of sensor `i`, `0..=100`
//!
//! The layout is decided once, when the encoder is built. Refreshing only
//! rewrites the value bytes, so record boundaries never move between
//! advertisements.

use heapless::Vec;
use log::debug;
use thiserror_no_std::Error;

use crate::error::{ConfigError, MonitorError};
use crate::moisture::{MAX_SENSORS, MoistureStore};

/// 16-bit service UUID assigned to BTHome
pub const SERVICE_UUID: u16 = 0xFCD2;

/// Device information byte: no encryption, regular advertising, BTHome v2
pub const DEVICE_INFO: u8 = 0x40;

/// Object id for a one-byte moisture percentage
pub const MOISTURE_OBJECT_ID: u8 = 0x2F;

/// Bytes per sensor record (object id + value)
pub const RECORD_WIDTH: usize = 2;

pub const PAYLOAD_CAPACITY: usize = 1 + RECORD_WIDTH * MAX_SENSORS;

pub type Payload = Vec<u8, PAYLOAD_CAPACITY>;

/// Builds and refreshes the service-data payload for a [`MoistureStore`]
#[derive(Debug, Clone)]
pub struct BthomeEncoder {
    payload: Payload,
    sensor_count: usize,
}

impl BthomeEncoder {
    /// Lays out one record per sensor of `store` and fills in the current
    /// percentages.
    pub fn new(store: &MoistureStore) -> Result<Self, MonitorError> {
        let sensor_count = store.sensor_count();
        let too_many = ConfigError::TooManySensors {
            count: sensor_count,
            max: MAX_SENSORS,
        };

        let mut payload = Payload::new();
        payload.push(DEVICE_INFO).map_err(|_| too_many)?;
        for _ in 0..sensor_count {
            payload
                .extend_from_slice(&[MOISTURE_OBJECT_ID, 0])
                .map_err(|_| too_many)?;
        }

        let mut encoder = Self {
            payload,
            sensor_count,
        };
        encoder.refresh(store)?;
        Ok(encoder)
    }

    const fn value_offset(sensor: usize) -> usize {
        1 + sensor * RECORD_WIDTH + 1
    }

    /// Rewrites every value byte from the latest store readings.
    ///
    /// The returned bytes stay valid until the next refresh. `store` must have
    /// the sensor count the encoder was built for.
    pub fn refresh(&mut self, store: &MoistureStore) -> Result<&[u8], MonitorError> {
        if store.sensor_count() != self.sensor_count {
            return Err(ConfigError::PayloadLayout {
                expected: self.sensor_count,
                actual: store.sensor_count(),
            }
            .into());
        }

        for sensor in 0..self.sensor_count {
            self.payload[Self::value_offset(sensor)] = store.latest_percentage(sensor)?;
        }

        debug!("BTHome payload refreshed: {:02x?}", self.payload.as_slice());
        Ok(&self.payload)
    }

    /// Payload as of the last refresh
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn sensor_count(&self) -> usize {
        self.sensor_count
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("payload is empty")]
    Empty,
    #[error("unexpected device information byte {0:#04x}")]
    DeviceInfo(u8),
    #[error("unsupported object id {id:#04x} at offset {offset}")]
    UnknownObject { offset: usize, id: u8 },
    #[error("record at offset {offset} is truncated")]
    Truncated { offset: usize },
    #[error("moisture {value}% for sensor index {sensor} is above 100%")]
    OutOfRange { sensor: usize, value: u8 },
    #[error("payload has more than {max} records")]
    TooManyRecords { max: usize },
}

/// Reads the per-sensor percentages back out of a payload.
pub fn decode(payload: &[u8]) -> Result<Vec<u8, MAX_SENSORS>, DecodeError> {
    let (&device_info, records) = payload.split_first().ok_or(DecodeError::Empty)?;
    if device_info != DEVICE_INFO {
        return Err(DecodeError::DeviceInfo(device_info));
    }

    let mut percentages = Vec::new();
    for (sensor, record) in records.chunks(RECORD_WIDTH).enumerate() {
        let offset = 1 + sensor * RECORD_WIDTH;
        let &[id, value] = record else {
            return Err(DecodeError::Truncated { offset });
        };
        if id != MOISTURE_OBJECT_ID {
            return Err(DecodeError::UnknownObject { offset, id });
        }
        if value > 100 {
            return Err(DecodeError::OutOfRange { sensor, value });
        }
        percentages
            .push(value)
            .map_err(|_| DecodeError::TooManyRecords { max: MAX_SENSORS })?;
    }
    Ok(percentages)
}
