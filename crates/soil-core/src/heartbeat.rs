//! Status LED toggled once per poll cycle

use embedded_hal::digital::OutputPin;
use log::warn;

/// Blinks an LED so it is visible from outside that the poll loop is alive.
///
/// The LED is cosmetic: a pin failure is logged and the cycle carries on.
pub struct Heartbeat<L: OutputPin> {
    led: L,
    lit: bool,
}

impl<L: OutputPin> Heartbeat<L> {
    /// Takes the pin and switches the LED off.
    pub fn new(mut led: L) -> Self {
        if let Err(e) = led.set_low() {
            warn!("Failed to switch heartbeat LED off: {:?}", e);
        }
        Self { led, lit: false }
    }

    pub fn toggle(&mut self) {
        self.lit = !self.lit;
        let result = if self.lit {
            self.led.set_high()
        } else {
            self.led.set_low()
        };

        if let Err(e) = result {
            warn!("Failed to drive heartbeat LED: {:?}", e);
        }
    }

    pub const fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn led(&self) -> &L {
        &self.led
    }
}
