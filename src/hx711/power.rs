use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::trace;

use super::{Gain, Hx711};
use crate::error::Error;

/// The chip powers down once PD_SCK has been high for 60us, and needs the
/// same order of time to come back.
const POWER_HOLD_US: u32 = 100;

impl<SckPin, DTPin, Delay, E> Hx711<SckPin, DTPin, Delay>
where
    SckPin: OutputPin<Error = E>,
    DTPin: InputPin<Error = E>,
    Delay: DelayNs,
{
    /// Put the chip into its low power state by holding the clock high.
    pub fn power_down(&mut self) -> Result<(), Error<E>> {
        self.transaction(|hx| -> Result<(), Error<E>> {
            hx.sck_pin.set_low()?;
            hx.sck_pin.set_high()?;
            hx.delay.delay_us(POWER_HOLD_US);
            Ok(())
        })?;
        trace!("hx711 powered down");
        Ok(())
    }

    /// Wake the chip up.
    ///
    /// It always wakes on channel A at gain 128. For any other gain one
    /// reading is taken and thrown away, so the next one uses the configured
    /// gain.
    pub fn power_up(&mut self) -> Result<(), Error<E>> {
        self.transaction(|hx| -> Result<(), Error<E>> {
            hx.sck_pin.set_low()?;
            hx.delay.delay_us(POWER_HOLD_US);
            Ok(())
        })?;
        trace!("hx711 powered up");

        if self.gain != Gain::A128 {
            self.read_raw_sample()?;
        }
        Ok(())
    }

    /// Power cycle the chip.
    pub fn reset(&mut self) -> Result<(), Error<E>> {
        self.power_down()?;
        self.power_up()
    }
}
