//! Per channel offset and reference unit, and the gain register.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, trace};

use super::{Channel, Gain, Hx711};
use crate::error::Error;
use crate::LoadCell;

/// Readings averaged by a tare unless the caller asks otherwise.
pub const DEFAULT_TARE_SAMPLES: usize = 15;

/// Calibration of one input channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelState {
    /// Raw reading at zero load.
    pub offset: f32,
    /// Raw counts per unit of weight. Never zero.
    pub reference_unit: f32,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            offset: 0.0,
            reference_unit: 1.0,
        }
    }
}

impl Channel {
    fn index(self) -> usize {
        match self {
            Channel::A => 0,
            Channel::B => 1,
        }
    }
}

impl<SckPin, DTPin, Delay, E> Hx711<SckPin, DTPin, Delay>
where
    SckPin: OutputPin<Error = E>,
    DTPin: InputPin<Error = E>,
    Delay: DelayNs,
{
    /// Select the gain (and channel) of the following conversions.
    ///
    /// The chip applies a gain one conversion after it is requested, so one
    /// reading is taken and thrown away.
    pub fn set_gain(&mut self, gain: Gain) -> Result<(), Error<E>> {
        self.gain = gain;
        self.sck_pin.set_low()?;
        self.read_raw_sample()?;
        trace!("gain set to {}", gain.factor());
        Ok(())
    }

    pub fn gain(&self) -> Gain {
        self.gain
    }

    pub fn channel(&self, channel: Channel) -> ChannelState {
        self.channels[channel.index()]
    }

    pub fn offset(&self, channel: Channel) -> f32 {
        self.channels[channel.index()].offset
    }

    pub fn set_offset(&mut self, channel: Channel, offset: f32) {
        self.channels[channel.index()].offset = offset;
    }

    pub fn reference_unit(&self, channel: Channel) -> f32 {
        self.channels[channel.index()].reference_unit
    }

    /// Set the raw counts per unit of weight. Zero is rejected and the
    /// previous value kept.
    pub fn set_reference_unit(
        &mut self,
        channel: Channel,
        reference_unit: f32,
    ) -> Result<(), Error<E>> {
        if reference_unit == 0.0 {
            return Err(Error::ZeroReferenceUnit);
        }
        self.channels[channel.index()].reference_unit = reference_unit;
        Ok(())
    }

    /// Run `f` with the gain the channel needs. Channel B is only reachable
    /// at gain 32. The previous gain is selected again afterwards, even when
    /// switching to gain 32 or `f` fails; the first error is returned.
    fn on_channel<R>(
        &mut self,
        channel: Channel,
        f: impl FnOnce(&mut Self) -> Result<R, Error<E>>,
    ) -> Result<R, Error<E>> {
        match channel {
            Channel::A => f(self),
            Channel::B => {
                let previous = self.gain;
                let result = self.set_gain(Gain::B32).and_then(|()| f(self));
                let restored = self.set_gain(previous);
                let value = result?;
                restored?;
                Ok(value)
            }
        }
    }

    /// Median of `times` readings minus the channel offset.
    pub fn get_value(&mut self, channel: Channel, times: usize) -> Result<f32, Error<E>> {
        self.on_channel(channel, |hx| {
            let median = hx.read_median(times)?;
            Ok((median - f64::from(hx.offset(channel))) as f32)
        })
    }

    /// [`Hx711::get_value`] divided by the channel reference unit.
    pub fn get_weight(&mut self, channel: Channel, times: usize) -> Result<f32, Error<E>> {
        let value = self.get_value(channel, times)?;
        Ok(value / self.reference_unit(channel))
    }

    /// Zero the channel: average `times` readings and store them as the
    /// offset. Returns the new offset.
    pub fn tare(&mut self, channel: Channel, times: usize) -> Result<f32, Error<E>> {
        let backup = self.reference_unit(channel);
        self.channels[channel.index()].reference_unit = 1.0;

        let result = self.on_channel(channel, |hx| hx.read_average(times));
        self.channels[channel.index()].reference_unit = backup;

        let offset = result? as f32;
        debug!("tare {channel:?} value: {offset}");
        self.set_offset(channel, offset);
        Ok(offset)
    }
}

/// Channel A.
impl<SckPin, DTPin, Delay, E> LoadCell for Hx711<SckPin, DTPin, Delay>
where
    SckPin: OutputPin<Error = E>,
    DTPin: InputPin<Error = E>,
    Delay: DelayNs,
{
    type Error = Error<E>;

    fn read(&mut self) -> Result<i32, Self::Error> {
        self.read_long()
    }

    fn read_scaled(&mut self, num_samples: usize) -> Result<f32, Self::Error> {
        self.get_weight(Channel::A, num_samples)
    }

    fn tare(&mut self, num_samples: usize) -> Result<f32, Self::Error> {
        Hx711::tare(self, Channel::A, num_samples)
    }

    fn get_offset(&self) -> f32 {
        self.offset(Channel::A)
    }

    fn set_scale(&mut self, scale: f32) -> Result<(), Self::Error> {
        self.set_reference_unit(Channel::A, scale)
    }

    fn get_scale(&self) -> f32 {
        self.reference_unit(Channel::A)
    }
}
