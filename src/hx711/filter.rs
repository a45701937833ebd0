//! Reducing repeated readings to one value.
//!
//! Results are `f64`: half counts of a median near full scale need more than
//! the 24 bits of an `f32` mantissa.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use super::Hx711;
use crate::error::Error;

/// Most readings [`Hx711::read_median`] and [`Hx711::read_trimmed_average`]
/// can take in one call.
pub const MAX_FILTER_SAMPLES: usize = 64;

/// Share of samples dropped from each end by [`trimmed_mean`].
const TRIM_RATIO: f64 = 0.2;

type SampleBuffer = heapless::Vec<i32, MAX_FILTER_SAMPLES>;

/// Arithmetic mean. An empty input averages to 0.
pub fn mean(samples: &[i32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: i64 = samples.iter().map(|&s| i64::from(s)).sum();
    sum as f64 / samples.len() as f64
}

/// Median of `samples`, sorting them in place. An even count gives the mean
/// of the two middle values. An empty input gives 0.
pub fn median(samples: &mut [i32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.sort_unstable();
    let mid = samples.len() / 2;
    if samples.len() % 2 == 1 {
        f64::from(samples[mid])
    } else {
        (i64::from(samples[mid - 1]) + i64::from(samples[mid])) as f64 / 2.0
    }
}

/// Mean after sorting and dropping the lowest and highest 20%.
pub fn trimmed_mean(samples: &mut [i32]) -> f64 {
    samples.sort_unstable();
    let trim = (samples.len() as f64 * TRIM_RATIO) as usize;
    mean(&samples[trim..samples.len() - trim])
}

impl<SckPin, DTPin, Delay, E> Hx711<SckPin, DTPin, Delay>
where
    SckPin: OutputPin<Error = E>,
    DTPin: InputPin<Error = E>,
    Delay: DelayNs,
{
    /// Take `times` readings into a buffer. Counts above
    /// [`MAX_FILTER_SAMPLES`] are refused before the chip is touched.
    fn read_samples(&mut self, times: usize) -> Result<SampleBuffer, Error<E>> {
        let times = times.max(1);
        if times > MAX_FILTER_SAMPLES {
            return Err(Error::TooManySamples(times));
        }
        let mut samples = SampleBuffer::new();
        for _ in 0..times {
            samples
                .push(self.read_long()?)
                .map_err(|_| Error::TooManySamples(times))?;
        }
        Ok(samples)
    }

    /// Mean of `times` readings. Zero is taken as one.
    pub fn read_average(&mut self, times: usize) -> Result<f64, Error<E>> {
        let times = times.max(1);
        let mut sum = 0i64;
        for _ in 0..times {
            sum += i64::from(self.read_long()?);
        }
        Ok(sum as f64 / times as f64)
    }

    /// Median of `times` readings, which helps against random spikes. Zero
    /// is taken as one, at most [`MAX_FILTER_SAMPLES`].
    pub fn read_median(&mut self, times: usize) -> Result<f64, Error<E>> {
        let mut samples = self.read_samples(times)?;
        Ok(median(&mut samples))
    }

    /// Mean of `times` readings with the outer 20% on each side removed.
    /// Zero is taken as one, at most [`MAX_FILTER_SAMPLES`].
    pub fn read_trimmed_average(&mut self, times: usize) -> Result<f64, Error<E>> {
        let mut samples = self.read_samples(times)?;
        Ok(trimmed_mean(&mut samples))
    }
}
