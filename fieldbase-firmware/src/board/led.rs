//! Status LED

use embassy_rp::gpio::Output;
use fieldbase_hal::OutputPin;

/// On-board LED, lit while a datagram is being handled
pub struct StatusLed(Output<'static>);

impl StatusLed {
    pub fn new(pin: Output<'static>) -> Self {
        Self(pin)
    }
}

impl OutputPin for StatusLed {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_high()
    }
}
