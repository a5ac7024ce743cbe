//! Simulated stand-ins for the ADC pins, the BLE radio and the status LED

use std::convert::Infallible;
use std::time::Duration;

use embedded_hal::digital::{ErrorType, OutputPin};
use log::{debug, info, warn};
use soil_core::broadcast::bthome;
use soil_core::{AdvertisementOptions, Advertiser, MonitorConfig, MoistureProbe};

/// Legacy advertising PDUs carry at most 31 bytes of AD structures
pub const MAX_ADVERTISEMENT_LEN: usize = 31;

/// Flags AD structure: length, type, value
const FLAGS_AD_LEN: usize = 3;

/// Length and type bytes in front of every AD structure
const AD_HEADER_LEN: usize = 2;

// ---------------------------------------------------------------------------
// Moisture probes
// ---------------------------------------------------------------------------

/// Generates readings that drift between each sensor's dry and wet points.
///
/// The swing overshoots both calibration points a little so the clamping in
/// the store gets exercised.
pub struct SimulatedProbe {
    calibrations: Vec<(u16, u16)>,
    elapsed_cycles: f64,
}

impl SimulatedProbe {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            calibrations: config
                .dry_calibrations
                .iter()
                .copied()
                .zip(config.wet_calibrations.iter().copied())
                .collect(),
            elapsed_cycles: 0.0,
        }
    }
}

impl MoistureProbe for SimulatedProbe {
    fn read_raw(&mut self, sensor: usize) -> u16 {
        if sensor == 0 {
            self.elapsed_cycles += 1.0;
        }
        let Some(&(dry, wet)) = self.calibrations.get(sensor) else {
            warn!("Simulated probe has no sensor {}", sensor + 1);
            return 0;
        };

        let t = self.elapsed_cycles;
        let phase = sensor as f64 * 1.7;
        let wetness = 0.5 + 0.55 * (t / 6.0 + phase).sin() + 0.03 * (t * 1.3).cos();

        let raw = f64::from(dry) + (f64::from(wet) - f64::from(dry)) * wetness;
        raw.round().clamp(0.0, f64::from(u16::MAX)) as u16
    }
}

// ---------------------------------------------------------------------------
// BLE radio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvertiserError {
    /// The AD structures do not fit in a legacy advertisement
    PacketTooLarge { len: usize },
    NotConfigured,
}

#[derive(Debug, Clone)]
struct ActiveConfiguration {
    local_name: String,
    service_uuid: u16,
    service_data: Vec<u8>,
    interval: Duration,
}

impl ActiveConfiguration {
    fn packet_len(&self) -> usize {
        packet_len(&self.local_name, &self.service_data)
    }
}

/// Size of flags + complete local name + 16-bit UUID service data.
pub fn packet_len(local_name: &str, service_data: &[u8]) -> usize {
    FLAGS_AD_LEN + AD_HEADER_LEN + local_name.len() + AD_HEADER_LEN + 2 + service_data.len()
}

/// Logs what a real radio would put on the air.
#[derive(Debug, Default)]
pub struct SimulatedAdvertiser {
    configuration: Option<ActiveConfiguration>,
    advertising: bool,
    published: usize,
}

impl SimulatedAdvertiser {
    pub fn is_advertising(&self) -> bool {
        self.advertising
    }

    /// Number of payloads that went on the air
    pub fn published(&self) -> usize {
        self.published
    }

    pub fn service_data(&self) -> Option<&[u8]> {
        self.configuration
            .as_ref()
            .map(|configuration| configuration.service_data.as_slice())
    }

    fn announce(&mut self) {
        self.published += 1;
        let Some(configuration) = &self.configuration else {
            return;
        };

        match bthome::decode(&configuration.service_data) {
            Ok(percentages) => info!(
                "Advertising \"{}\" (UUID {:#06x}) every {:?}: moisture {:?}%",
                configuration.local_name,
                configuration.service_uuid,
                configuration.interval,
                percentages.as_slice()
            ),
            Err(e) => warn!("Advertising undecodable service data: {}", e),
        }
        debug!("Service data: {:02x?}", configuration.service_data);
    }
}

impl Advertiser for SimulatedAdvertiser {
    type Error = AdvertiserError;

    fn configure(&mut self, options: &AdvertisementOptions<'_>) -> Result<(), Self::Error> {
        let configuration = ActiveConfiguration {
            local_name: options.local_name.to_string(),
            service_uuid: options.service_uuid,
            service_data: options.service_data.to_vec(),
            interval: options.interval,
        };

        let len = configuration.packet_len();
        if len > MAX_ADVERTISEMENT_LEN {
            return Err(AdvertiserError::PacketTooLarge { len });
        }

        self.configuration = Some(configuration);
        Ok(())
    }

    fn start(&mut self) -> Result<(), Self::Error> {
        if self.configuration.is_none() {
            return Err(AdvertiserError::NotConfigured);
        }
        self.advertising = true;
        self.announce();
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.advertising = false;
        Ok(())
    }

    fn update_service_data(&mut self, service_data: &[u8]) -> Result<(), Self::Error> {
        let configuration = self
            .configuration
            .as_mut()
            .ok_or(AdvertiserError::NotConfigured)?;

        let len = packet_len(&configuration.local_name, service_data);
        if len > MAX_ADVERTISEMENT_LEN {
            return Err(AdvertiserError::PacketTooLarge { len });
        }

        configuration.service_data = service_data.to_vec();
        if self.advertising {
            self.announce();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// LED that only exists in the log
#[derive(Debug, Default)]
pub struct ConsoleLed {
    lit: bool,
}

impl ConsoleLed {
    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

impl ErrorType for ConsoleLed {
    type Error = Infallible;
}

impl OutputPin for ConsoleLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.lit = false;
        debug!("LED off");
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.lit = true;
        debug!("LED on");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SimulatorSettings;
    use soil_core::broadcast::SERVICE_UUID;

    fn options<'a>(local_name: &'a str, service_data: &'a [u8]) -> AdvertisementOptions<'a> {
        AdvertisementOptions {
            local_name,
            service_uuid: SERVICE_UUID,
            service_data,
            interval: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_probe_stays_near_calibration_range() {
        let config = SimulatorSettings::default().monitor_config().unwrap();
        let mut probe = SimulatedProbe::new(&config);

        for _ in 0..200 {
            let first = probe.read_raw(0);
            let second = probe.read_raw(1);
            // 3000 -> 1200 and 1000 -> 2800 with at most ~8% overshoot
            assert!((1000..=3200).contains(&first), "{first}");
            assert!((800..=3000).contains(&second), "{second}");
        }
    }

    #[test]
    fn test_advertiser_requires_configuration() {
        let mut advertiser = SimulatedAdvertiser::default();
        assert_eq!(advertiser.start(), Err(AdvertiserError::NotConfigured));
        assert_eq!(
            advertiser.update_service_data(&[0x40]),
            Err(AdvertiserError::NotConfigured)
        );
    }

    #[test]
    fn test_advertiser_rejects_oversized_packet() {
        let mut advertiser = SimulatedAdvertiser::default();
        let payload = [0x40, 0x2F, 10, 0x2F, 20, 0x2F, 30, 0x2F, 40, 0x2F, 50];

        // 3 + 14 + 4 + 11 = 32 bytes
        assert_eq!(packet_len("soil-monitor", &payload), 32);
        assert_eq!(
            advertiser.configure(&options("soil-monitor", &payload)),
            Err(AdvertiserError::PacketTooLarge { len: 32 })
        );

        advertiser.configure(&options("soil", &payload)).unwrap();
        advertiser.start().unwrap();
        assert!(advertiser.is_advertising());
        assert_eq!(advertiser.published(), 1);
    }

    #[test]
    fn test_advertiser_update_swaps_service_data() {
        let mut advertiser = SimulatedAdvertiser::default();
        advertiser
            .configure(&options("soil-monitor", &[0x40, 0x2F, 10]))
            .unwrap();
        advertiser.start().unwrap();
        advertiser.update_service_data(&[0x40, 0x2F, 99]).unwrap();

        assert_eq!(advertiser.service_data(), Some(&[0x40, 0x2F, 99][..]));
        assert_eq!(advertiser.published(), 2);

        advertiser.stop().unwrap();
        assert!(!advertiser.is_advertising());
    }

    #[test]
    fn test_console_led_tracks_level() {
        let mut led = ConsoleLed::default();
        led.set_high().unwrap();
        assert!(led.is_lit());
        led.set_low().unwrap();
        assert!(!led.is_lit());
    }
}
