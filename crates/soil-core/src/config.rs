//! Startup settings and their parsed form
//!
//! The firmware bakes the settings in at build time; the simulator reads them
//! from a TOML file or the environment. Either way they arrive here as plain
//! strings and are validated once, before anything else is constructed.

use core::time::Duration;

use heapless::Vec;

use crate::broadcast::{DEFAULT_LOCAL_NAME, LocalName, MAX_LOCAL_NAME_LEN};
use crate::error::{CalibrationKind, ConfigError};
use crate::moisture::MAX_SENSORS;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Unparsed settings, borrowed from wherever they were loaded
#[derive(Debug, Clone, Copy, Default)]
pub struct Settings<'a> {
    /// Go-style duration such as `10s`, `1m30s` or `1.5s`
    pub broadcast_interval: &'a str,
    /// Comma-separated ADC pin numbers, one per sensor
    pub sensor_pins: &'a str,
    /// Comma-separated raw readings at 0% moisture, one per sensor
    pub dry_calibrations: &'a str,
    /// Comma-separated raw readings at 100% moisture, one per sensor
    pub wet_calibrations: &'a str,
    /// Advertised local name, defaults to `soil-monitor`
    pub local_name: Option<&'a str>,
}

/// Validated configuration for one run of the monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub broadcast_interval: Duration,
    pub sensor_pins: Vec<u8, MAX_SENSORS>,
    pub dry_calibrations: Vec<u16, MAX_SENSORS>,
    pub wet_calibrations: Vec<u16, MAX_SENSORS>,
    pub local_name: LocalName,
}

impl MonitorConfig {
    /// Parses and validates every setting.
    ///
    /// The sensor count is the number of pins; both calibration lists must
    /// have exactly that many entries.
    pub fn parse(settings: &Settings<'_>) -> Result<Self, ConfigError> {
        let broadcast_interval = parse_duration(settings.broadcast_interval)?;
        let sensor_pins = parse_sensor_pins(settings.sensor_pins)?;
        let dry_calibrations = parse_calibrations(
            settings.dry_calibrations,
            CalibrationKind::Dry,
            sensor_pins.len(),
        )?;
        let wet_calibrations = parse_calibrations(
            settings.wet_calibrations,
            CalibrationKind::Wet,
            sensor_pins.len(),
        )?;

        let mut local_name = LocalName::new();
        local_name
            .push_str(settings.local_name.unwrap_or(DEFAULT_LOCAL_NAME))
            .map_err(|_| ConfigError::LocalNameTooLong {
                max: MAX_LOCAL_NAME_LEN,
            })?;

        Ok(Self {
            broadcast_interval,
            sensor_pins,
            dry_calibrations,
            wet_calibrations,
            local_name,
        })
    }

    pub fn sensor_count(&self) -> usize {
        self.sensor_pins.len()
    }
}

/// Parses a comma-separated list of ADC pin numbers.
pub fn parse_sensor_pins(text: &str) -> Result<Vec<u8, MAX_SENSORS>, ConfigError> {
    if text.trim().is_empty() {
        return Err(ConfigError::NoSensors);
    }

    let count = text.split(',').count();
    if count > MAX_SENSORS {
        return Err(ConfigError::TooManySensors {
            count,
            max: MAX_SENSORS,
        });
    }

    let mut pins = Vec::new();
    for (index, item) in text.split(',').enumerate() {
        let invalid = ConfigError::InvalidPin { sensor: index + 1 };
        let pin = item.trim().parse::<u8>().map_err(|_| invalid)?;
        pins.push(pin).map_err(|_| invalid)?;
    }
    Ok(pins)
}

/// Parses a comma-separated list of raw calibration values.
///
/// The number of entries is checked against `expected` before any value is
/// parsed.
pub fn parse_calibrations(
    text: &str,
    kind: CalibrationKind,
    expected: usize,
) -> Result<Vec<u16, MAX_SENSORS>, ConfigError> {
    let actual = text.split(',').count();
    if actual != expected {
        return Err(ConfigError::CalibrationCount {
            kind,
            expected,
            actual,
        });
    }

    let mut calibrations = Vec::new();
    for (index, item) in text.split(',').enumerate() {
        let invalid = ConfigError::InvalidCalibration {
            kind,
            sensor: index + 1,
        };
        let value = item.trim().parse::<u16>().map_err(|_| invalid)?;
        calibrations.push(value).map_err(|_| invalid)?;
    }
    Ok(calibrations)
}

/// Parses a duration such as `10s`, `500ms`, `1h15m` or `1.5s`.
///
/// Accepts one or more `<number><unit>` terms with units `ns`, `us` (or
/// `µs`), `ms`, `s`, `m` and `h`. A zero total is rejected since it would
/// make the monitor spin.
pub fn parse_duration(text: &str) -> Result<Duration, ConfigError> {
    let mut rest = text.trim();
    if rest.is_empty() {
        return Err(ConfigError::InvalidDuration);
    }

    let mut total_nanos: u128 = 0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);

        let unit_nanos: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SECOND,
            "m" => 60 * NANOS_PER_SECOND,
            "h" => 3600 * NANOS_PER_SECOND,
            _ => return Err(ConfigError::InvalidDuration),
        };

        total_nanos = total_nanos
            .checked_add(scale_term(number, unit_nanos)?)
            .ok_or(ConfigError::InvalidDuration)?;
        rest = next;
    }

    if total_nanos == 0 {
        return Err(ConfigError::InvalidDuration);
    }

    let secs = u64::try_from(total_nanos / NANOS_PER_SECOND)
        .map_err(|_| ConfigError::InvalidDuration)?;
    // Always below one billion
    let nanos = (total_nanos % NANOS_PER_SECOND) as u32;
    Ok(Duration::new(secs, nanos))
}

/// Converts one decimal term to nanoseconds. Fraction digits finer than a
/// nanosecond are dropped.
fn scale_term(number: &str, unit_nanos: u128) -> Result<u128, ConfigError> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(ConfigError::InvalidDuration);
    }

    let whole = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u128>()
            .map_err(|_| ConfigError::InvalidDuration)?
    };
    let mut nanos = whole
        .checked_mul(unit_nanos)
        .ok_or(ConfigError::InvalidDuration)?;

    let mut place = unit_nanos;
    for digit in fraction.chars() {
        let digit = digit.to_digit(10).ok_or(ConfigError::InvalidDuration)?;
        place /= 10;
        nanos = nanos
            .checked_add(u128::from(digit) * place)
            .ok_or(ConfigError::InvalidDuration)?;
    }
    Ok(nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings<'a>(pins: &'a str, dry: &'a str, wet: &'a str) -> Settings<'a> {
        Settings {
            broadcast_interval: "10s",
            sensor_pins: pins,
            dry_calibrations: dry,
            wet_calibrations: wet,
            local_name: None,
        }
    }

    #[test]
    fn test_parse_duration_simple_units() {
        assert_eq!(parse_duration("10s"), Ok(Duration::from_secs(10)));
        assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_duration("250us"), Ok(Duration::from_micros(250)));
        assert_eq!(parse_duration("250µs"), Ok(Duration::from_micros(250)));
        assert_eq!(parse_duration("42ns"), Ok(Duration::from_nanos(42)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn test_parse_duration_compound_and_fractional() {
        assert_eq!(parse_duration("1m30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("1h15m"), Ok(Duration::from_secs(4500)));
        assert_eq!(parse_duration("1.5s"), Ok(Duration::from_millis(1500)));
        assert_eq!(parse_duration(".25s"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration(" 3s "), Ok(Duration::from_secs(3)));
    }

    #[test]
    fn test_parse_duration_rejects_invalid() {
        for text in ["", "10", "s", "-5s", "10x", "1.2.3s", "0s", "0.0ms", "."] {
            assert_eq!(
                parse_duration(text),
                Err(ConfigError::InvalidDuration),
                "{text:?}"
            );
        }
    }

    #[test]
    fn test_parse_duration_rejects_overflow() {
        // Whole part is u128::MAX / 1e9, so any fraction overflows
        assert_eq!(
            parse_duration("340282366920938463463374607431.9s"),
            Err(ConfigError::InvalidDuration)
        );
        assert_eq!(
            parse_duration("340282366920938463463374607432s"),
            Err(ConfigError::InvalidDuration)
        );
        // Fits in nanoseconds but not in a u64 of seconds
        assert_eq!(
            parse_duration("18446744073709551616s"),
            Err(ConfigError::InvalidDuration)
        );
    }

    #[test]
    fn test_parse_sensor_pins() {
        assert_eq!(parse_sensor_pins("26, 27,28").unwrap().as_slice(), &[26, 27, 28]);
        assert_eq!(parse_sensor_pins(""), Err(ConfigError::NoSensors));
        assert_eq!(
            parse_sensor_pins("26,abc"),
            Err(ConfigError::InvalidPin { sensor: 2 })
        );
        assert_eq!(
            parse_sensor_pins("256"),
            Err(ConfigError::InvalidPin { sensor: 1 })
        );
        assert_eq!(
            parse_sensor_pins("1,2,3,4,5,6,7,8,9"),
            Err(ConfigError::TooManySensors {
                count: 9,
                max: MAX_SENSORS,
            })
        );
    }

    #[test]
    fn test_parse_calibrations_checks_count_first() {
        assert_eq!(
            parse_calibrations("3000,oops,1", CalibrationKind::Dry, 2),
            Err(ConfigError::CalibrationCount {
                kind: CalibrationKind::Dry,
                expected: 2,
                actual: 3,
            })
        );
        assert_eq!(
            parse_calibrations("1200,70000", CalibrationKind::Wet, 2),
            Err(ConfigError::InvalidCalibration {
                kind: CalibrationKind::Wet,
                sensor: 2,
            })
        );
    }

    #[test]
    fn test_monitor_config_parse() {
        let config = MonitorConfig::parse(&settings("26,27", "3000,1000", "1200,2800")).unwrap();

        assert_eq!(config.broadcast_interval, Duration::from_secs(10));
        assert_eq!(config.sensor_count(), 2);
        assert_eq!(config.dry_calibrations.as_slice(), &[3000, 1000]);
        assert_eq!(config.wet_calibrations.as_slice(), &[1200, 2800]);
        assert_eq!(config.local_name.as_str(), DEFAULT_LOCAL_NAME);
    }

    #[test]
    fn test_monitor_config_calibration_mismatch() {
        assert_eq!(
            MonitorConfig::parse(&settings("26,27", "3000", "1200,2800")),
            Err(ConfigError::CalibrationCount {
                kind: CalibrationKind::Dry,
                expected: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn test_monitor_config_local_name() {
        let mut custom = settings("26", "3000", "1200");
        custom.local_name = Some("bed-3");
        assert_eq!(MonitorConfig::parse(&custom).unwrap().local_name.as_str(), "bed-3");

        custom.local_name = Some("a-name-that-is-far-too-long");
        assert_eq!(
            MonitorConfig::parse(&custom),
            Err(ConfigError::LocalNameTooLong {
                max: MAX_LOCAL_NAME_LEN,
            })
        );
    }
}
