use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::debug;

use crate::error::Error;
use crate::line_map::{Config, LineController};

mod calibration;
pub mod filter;
mod power;
#[cfg(test)]
mod sim;

pub use calibration::{ChannelState, DEFAULT_TARE_SAMPLES};

pub const HX711_MINIMUM: i32 = -(1 << (24 - 1));
pub const HX711_MAXIMUM: i32 = (1 << (24 - 1)) - 1;
const HX711_DELAY_TIME_US: u32 = 1;
/// Time the chip is given to settle after the first gain selection.
const SETTLE_TIME_MS: u32 = 100;

/// Input channel and gain for the next conversion. The discriminant is the
/// number of extra clock pulses that select it.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gain {
    A128 = 1,
    B32 = 2,
    A64 = 3,
}

impl Gain {
    pub fn pulses(self) -> u8 {
        self as u8
    }

    /// The amplification factor, 128, 64 or 32.
    pub fn factor(self) -> u8 {
        match self {
            Gain::A128 => 128,
            Gain::A64 => 64,
            Gain::B32 => 32,
        }
    }
}

impl From<u8> for Gain {
    /// Unrecognised factors select channel A at 128.
    fn from(factor: u8) -> Self {
        match factor {
            64 => Gain::A64,
            32 => Gain::B32,
            _ => Gain::A128,
        }
    }
}

/// One of the two inputs of the hx711.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    MsbFirst,
    LsbFirst,
}

/// Byte and bit order used to assemble the 24 bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadingFormat {
    pub byte_order: Order,
    pub bit_order: Order,
}

/// The three bytes of one conversion, in the configured byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample(pub [u8; 3]);

impl RawSample {
    pub fn bytes(&self) -> [u8; 3] {
        self.0
    }

    /// The bytes joined most significant first.
    pub fn word(&self) -> u32 {
        let [b0, b1, b2] = self.0;
        (u32::from(b0) << 16) | (u32::from(b1) << 8) | u32::from(b2)
    }
}

/// Convert a 24 bit two's complement word to a signed value.
pub fn decode(word: u32) -> i32 {
    -((word & 0x80_0000) as i32) + (word & 0x7f_ffff) as i32
}

pub struct Hx711<SckPin, DTPin, Delay> {
    sck_pin: SckPin,
    dt_pin: DTPin,
    delay: Delay,
    gain: Gain,
    channels: [ChannelState; 2],
    format: ReadingFormat,
    serialize_access: bool,
    last_reading: i32,
}

impl<SckPin, DTPin, Delay, E> Hx711<SckPin, DTPin, Delay>
where
    SckPin: OutputPin<Error = E>,
    DTPin: InputPin<Error = E>,
    Delay: DelayNs,
{
    /// Take ownership of the lines, select `gain` and wait for the chip to
    /// settle. This performs one (discarded) read, so it blocks until the
    /// chip is ready.
    pub fn new(
        sck_pin: SckPin,
        dt_pin: DTPin,
        delay: Delay,
        gain: Gain,
        serialize_access: bool,
    ) -> Result<Self, Error<E>> {
        let mut hx711 = Self::from_parts(sck_pin, dt_pin, delay, gain, serialize_access);
        hx711.set_gain(gain)?;
        hx711.delay.delay_ms(SETTLE_TIME_MS);
        Ok(hx711)
    }

    /// Resolve the configured pins through the line map, request the lines
    /// from `controller` and bring the chip up.
    ///
    /// Both pins are resolved before any line is requested.
    pub fn open<C>(
        controller: &mut C,
        config: &Config<'_>,
        delay: Delay,
    ) -> Result<Self, Error<E>>
    where
        C: LineController<Output = SckPin, Input = DTPin, Error = E>,
    {
        let lines = config.resolve_lines()?;
        debug!("hx711 data line {} clock line {}", lines.data, lines.clock);
        let sck_pin = controller.request_output(lines.clock)?;
        let dt_pin = controller.request_input(lines.data)?;
        Self::new(sck_pin, dt_pin, delay, config.gain, config.serialize_access)
    }

    fn from_parts(
        sck_pin: SckPin,
        dt_pin: DTPin,
        delay: Delay,
        gain: Gain,
        serialize_access: bool,
    ) -> Self {
        Self {
            sck_pin,
            dt_pin,
            delay,
            gain,
            channels: [ChannelState::default(); 2],
            format: ReadingFormat::default(),
            serialize_access,
            last_reading: 0,
        }
    }

    /// Give the lines and delay back.
    pub fn release(self) -> (SckPin, DTPin, Delay) {
        (self.sck_pin, self.dt_pin, self.delay)
    }

    pub fn set_reading_format(&mut self, byte_order: Order, bit_order: Order) {
        self.format = ReadingFormat {
            byte_order,
            bit_order,
        };
    }

    pub fn reading_format(&self) -> ReadingFormat {
        self.format
    }

    /// Run one hardware transaction, inside a critical section when access
    /// is serialized.
    fn transaction<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        if self.serialize_access {
            critical_section::with(|_| f(self))
        } else {
            f(self)
        }
    }

    pub fn is_ready(&mut self) -> Result<bool, Error<E>> {
        // if the dt pin is low, device is ready for read
        Ok(self.dt_pin.is_low()?)
    }

    /// Wait for the chip and clock out one sample.
    ///
    /// There is no timeout: a chip that never pulls the data line low blocks
    /// forever. Use [`Hx711::read_raw_sample_until`] to bail out.
    pub fn read_raw_sample(&mut self) -> Result<RawSample, Error<E>> {
        self.read_raw_sample_until(|| false)
    }

    /// Like [`Hx711::read_raw_sample`], but `cancel` is polled while waiting
    /// for the chip and the read fails with [`Error::Cancelled`] once it
    /// returns true.
    pub fn read_raw_sample_until(
        &mut self,
        mut cancel: impl FnMut() -> bool,
    ) -> Result<RawSample, Error<E>> {
        self.transaction(|hx| -> Result<RawSample, Error<E>> {
            while !hx.is_ready()? {
                if cancel() {
                    return Err(Error::Cancelled);
                }
            }

            let mut bytes = [0u8; 3];
            for byte in bytes.iter_mut() {
                *byte = hx.read_byte()?;
            }

            // send gain mode for next reading
            for _ in 0..hx.gain.pulses() {
                hx.read_bit()?;
            }

            if hx.format.byte_order == Order::LsbFirst {
                bytes.reverse();
            }
            Ok(RawSample(bytes))
        })
    }

    /// Read one sample and decode it.
    pub fn read_long(&mut self) -> Result<i32, Error<E>> {
        let sample = self.read_raw_sample()?;
        debug!("raw bytes {:?}", sample.bytes());
        let word = sample.word();
        debug!("twos: 0x{word:06x}");
        self.last_reading = decode(word);
        Ok(self.last_reading)
    }

    /// The most recent value returned by [`Hx711::read_long`].
    pub fn last_reading(&self) -> i32 {
        self.last_reading
    }

    fn read_byte(&mut self) -> Result<u8, Error<E>> {
        let mut byte = 0u8;
        for _ in 0..8 {
            let bit = self.read_bit()? as u8;
            byte = match self.format.bit_order {
                Order::MsbFirst => (byte << 1) | bit,
                Order::LsbFirst => (byte >> 1) | (bit << 7),
            };
        }
        Ok(byte)
    }

    /// One clock pulse. DOUT is stable once PD_SCK is low again, so sample
    /// after the falling edge.
    fn read_bit(&mut self) -> Result<bool, Error<E>> {
        self.sck_pin.set_high()?;
        self.delay.delay_us(HX711_DELAY_TIME_US);
        self.sck_pin.set_low()?;
        self.delay.delay_us(HX711_DELAY_TIME_US);
        Ok(self.dt_pin.is_high()?)
    }
}
