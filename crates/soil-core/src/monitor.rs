//! One device's worth of state and the poll cycle that drives it

use core::time::Duration;

use embedded_hal::digital::OutputPin;
use log::info;

use crate::broadcast::{Advertiser, Broadcaster};
use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::heartbeat::Heartbeat;
use crate::moisture::MoistureStore;
use crate::sensors::{MoistureProbe, sample_all};

/// Owns the store, the broadcaster and the hardware collaborators.
///
/// The caller runs [`Monitor::poll_once`] and sleeps for
/// [`Monitor::broadcast_interval`] in a loop. Any error means this instance
/// should be dropped and rebuilt from the settings.
pub struct Monitor<P, A, L>
where
    P: MoistureProbe,
    A: Advertiser,
    L: OutputPin,
{
    store: MoistureStore,
    probe: P,
    broadcaster: Broadcaster<A>,
    heartbeat: Heartbeat<L>,
    broadcast_interval: Duration,
}

impl<P, A, L> Monitor<P, A, L>
where
    P: MoistureProbe,
    A: Advertiser,
    L: OutputPin,
{
    pub fn new(
        config: &MonitorConfig,
        probe: P,
        advertiser: A,
        led: L,
    ) -> Result<Self, MonitorError> {
        let store = MoistureStore::from_config(config)?;
        let broadcaster = Broadcaster::from_config(&store, advertiser, config)?;

        info!(
            "Initialization complete with {} moisture sensors",
            store.sensor_count()
        );

        Ok(Self {
            store,
            probe,
            broadcaster,
            heartbeat: Heartbeat::new(led),
            broadcast_interval: config.broadcast_interval,
        })
    }

    /// Blinks the heartbeat, samples every sensor and re-publishes the
    /// advertisement with the new readings.
    pub fn poll_once(&mut self) -> Result<(), MonitorError> {
        self.heartbeat.toggle();

        info!("Getting updated data from moisture sensors...");
        sample_all(&mut self.store, &mut self.probe)?;

        self.broadcaster.start(&self.store)
    }

    pub fn store(&self) -> &MoistureStore {
        &self.store
    }

    pub fn broadcaster(&self) -> &Broadcaster<A> {
        &self.broadcaster
    }

    pub fn heartbeat(&self) -> &Heartbeat<L> {
        &self.heartbeat
    }

    pub const fn broadcast_interval(&self) -> Duration {
        self.broadcast_interval
    }
}
