//! BLE advertisement of the latest moisture readings

pub mod bthome;

use core::fmt::Debug;
use core::time::Duration;

use log::{error, info};

use crate::config::MonitorConfig;
use crate::error::{MonitorError, RadioOperation};
use crate::moisture::MoistureStore;

pub use bthome::{BthomeEncoder, SERVICE_UUID};

pub const DEFAULT_LOCAL_NAME: &str = "soil-monitor";

/// Longest local name accepted in the settings
pub const MAX_LOCAL_NAME_LEN: usize = 20;

pub type LocalName = heapless::String<MAX_LOCAL_NAME_LEN>;

/// Everything the radio needs to (re)configure an advertisement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisementOptions<'a> {
    pub local_name: &'a str,
    pub service_uuid: u16,
    pub service_data: &'a [u8],
    pub interval: Duration,
}

/// Radio stack that broadcasts the service data.
///
/// Platform crates implement this on top of their BLE stack. Any call may
/// fail, for example when the radio is disabled or the packet does not fit.
pub trait Advertiser {
    type Error: Debug;

    fn configure(&mut self, options: &AdvertisementOptions<'_>) -> Result<(), Self::Error>;

    fn start(&mut self) -> Result<(), Self::Error>;

    fn stop(&mut self) -> Result<(), Self::Error>;

    /// Swaps the service data of a running advertisement in place
    fn update_service_data(&mut self, service_data: &[u8]) -> Result<(), Self::Error>;
}

/// Keeps an [`Advertiser`] publishing the latest payload.
///
/// Tracks whether an advertisement is running so that publishing new data
/// tears the old advertisement down first.
pub struct Broadcaster<A: Advertiser> {
    encoder: BthomeEncoder,
    advertiser: A,
    local_name: LocalName,
    interval: Duration,
    running: bool,
}

impl<A: Advertiser> Broadcaster<A> {
    /// Lays out the payload for `store`. Nothing is sent to the radio until
    /// [`Broadcaster::start`].
    pub fn new(
        store: &MoistureStore,
        advertiser: A,
        local_name: LocalName,
        interval: Duration,
    ) -> Result<Self, MonitorError> {
        Ok(Self {
            encoder: BthomeEncoder::new(store)?,
            advertiser,
            local_name,
            interval,
            running: false,
        })
    }

    pub fn from_config(
        store: &MoistureStore,
        advertiser: A,
        config: &MonitorConfig,
    ) -> Result<Self, MonitorError> {
        Self::new(
            store,
            advertiser,
            config.local_name.clone(),
            config.broadcast_interval,
        )
    }

    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Payload as of the last refresh
    pub fn payload(&self) -> &[u8] {
        self.encoder.payload()
    }

    pub fn advertiser(&self) -> &A {
        &self.advertiser
    }

    pub fn advertiser_mut(&mut self) -> &mut A {
        &mut self.advertiser
    }

    /// Starts advertising the latest readings of `store`.
    ///
    /// A running advertisement is stopped first, so this also serves as
    /// "publish the latest data".
    pub fn start(&mut self, store: &MoistureStore) -> Result<(), MonitorError> {
        if self.running {
            self.stop()?;
        }

        let service_data = self.encoder.refresh(store)?;
        let options = AdvertisementOptions {
            local_name: self.local_name.as_str(),
            service_uuid: SERVICE_UUID,
            service_data,
            interval: self.interval,
        };

        self.advertiser
            .configure(&options)
            .map_err(|e| radio_error(RadioOperation::Configure, e))?;
        self.advertiser
            .start()
            .map_err(|e| radio_error(RadioOperation::Start, e))?;

        self.running = true;
        info!("Started BLE advertisement using latest data");
        Ok(())
    }

    /// Stops a running advertisement. Does nothing when already stopped.
    pub fn stop(&mut self) -> Result<(), MonitorError> {
        if !self.running {
            return Ok(());
        }

        self.advertiser
            .stop()
            .map_err(|e| radio_error(RadioOperation::Stop, e))?;

        self.running = false;
        info!("Stopped BLE advertisement");
        Ok(())
    }

    pub fn restart(&mut self, store: &MoistureStore) -> Result<(), MonitorError> {
        self.stop()?;
        self.start(store)
    }

    /// Pushes fresh readings into the running advertisement without tearing
    /// it down. Starts one if none is running.
    pub fn update(&mut self, store: &MoistureStore) -> Result<(), MonitorError> {
        if !self.running {
            return self.start(store);
        }

        let service_data = self.encoder.refresh(store)?;
        self.advertiser
            .update_service_data(service_data)
            .map_err(|e| radio_error(RadioOperation::UpdateServiceData, e))
    }
}

fn radio_error<E: Debug>(operation: RadioOperation, error: E) -> MonitorError {
    error!("BLE {} failed: {:?}", operation, error);
    MonitorError::Radio { operation }
}
