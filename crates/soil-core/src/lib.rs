//! Hardware-independent core library for soil-monitor
//!
//! This crate contains all platform-agnostic logic of the moisture broadcaster:
//! calibrated moisture tracking, BTHome payload encoding, the advertisement
//! state machine, settings parsing and the poll cycle that ties them together.
//!
//! Hardware is only reached through injected collaborators
//! ([`sensors::MoistureProbe`], [`broadcast::Advertiser`] and an
//! `embedded-hal` output pin for the heartbeat LED). The crate is `no_std`
//! without an allocator so it compiles on both the microcontroller and
//! desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

pub mod broadcast;
pub mod config;
pub mod error;
pub mod heartbeat;
pub mod moisture;
pub mod monitor;
pub mod sensors;

pub use broadcast::{Advertiser, AdvertisementOptions, Broadcaster};
pub use config::{MonitorConfig, Settings};
pub use error::{ConfigError, MonitorError};
pub use moisture::{Calibration, MAX_SENSORS, MoistureStore, Watermark};
pub use monitor::Monitor;
pub use sensors::MoistureProbe;
