//! A simulated hx711 behind `embedded-hal` lines, for driving the driver in
//! tests.
//!
//! The chip serves queued values per channel (falling back to a steady value
//! when the queue is empty), counts clock pulses to learn the gain of the
//! next conversion, and powers down when the clock is held high for 60us.

use core::cell::RefCell;
use core::convert::Infallible;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use super::{Channel, Gain, Hx711};
use crate::line_map::LineController;

const POWER_DOWN_NS: u32 = 60_000;

struct State {
    clock_high: bool,
    powered_down: bool,
    disconnected: bool,
    /// Rising edges in the conversion being clocked out.
    pulses: u32,
    reads_since_pulse: u32,
    loaded: bool,
    word: u32,
    /// Gain the next conversion is taken with.
    gain: Gain,
    queue_a: VecDeque<i32>,
    queue_b: VecDeque<i32>,
    steady_a: i32,
    steady_b: i32,
    busy_polls: u32,
    busy_left: u32,
    rising_edges: u32,
    gains: Vec<Gain>,
    power_downs: u32,
}

impl State {
    fn data_high(&mut self) -> bool {
        let first_read = self.reads_since_pulse == 0;
        self.reads_since_pulse += 1;
        if self.disconnected || self.powered_down {
            return true;
        }
        match self.pulses {
            0 => self.poll(),
            1..=24 => {
                if !self.loaded {
                    self.load();
                }
                (self.word >> (24 - self.pulses)) & 1 == 1
            }
            // DOUT is pulled high after the 25th pulse until the next
            // conversion is ready.
            _ if first_read => true,
            _ => {
                self.finish();
                self.poll()
            }
        }
    }

    fn poll(&mut self) -> bool {
        if self.busy_left > 0 {
            self.busy_left -= 1;
            true
        } else {
            false
        }
    }

    fn load(&mut self) {
        let value = match channel_of(self.gain) {
            Channel::A => self.queue_a.pop_front().unwrap_or(self.steady_a),
            Channel::B => self.queue_b.pop_front().unwrap_or(self.steady_b),
        };
        self.word = (value as u32) & 0xff_ffff;
        self.loaded = true;
        self.gains.push(self.gain);
    }

    fn finish(&mut self) {
        self.gain = gain_of(self.pulses - 24);
        self.pulses = 0;
        self.reads_since_pulse = 0;
        self.loaded = false;
        self.busy_left = self.busy_polls;
    }

    fn set_clock(&mut self, high: bool) {
        if high && !self.clock_high && !self.powered_down {
            self.rising_edges += 1;
            self.pulses += 1;
            self.reads_since_pulse = 0;
        }
        if !high && self.clock_high && self.powered_down {
            // wakes up on channel A, gain 128
            self.powered_down = false;
            self.gain = Gain::A128;
            self.busy_left = self.busy_polls;
        }
        self.clock_high = high;
    }

    fn wait(&mut self, ns: u32) {
        if self.clock_high && ns >= POWER_DOWN_NS && !self.powered_down {
            self.powered_down = true;
            self.power_downs += 1;
            self.pulses = 0;
            self.reads_since_pulse = 0;
            self.loaded = false;
        }
    }
}

fn channel_of(gain: Gain) -> Channel {
    match gain {
        Gain::A128 | Gain::A64 => Channel::A,
        Gain::B32 => Channel::B,
    }
}

fn gain_of(extra_pulses: u32) -> Gain {
    match extra_pulses {
        2 => Gain::B32,
        3 => Gain::A64,
        _ => Gain::A128,
    }
}

#[derive(Clone)]
pub struct SimChip(Rc<RefCell<State>>);

impl SimChip {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(State {
            clock_high: false,
            powered_down: false,
            disconnected: false,
            pulses: 0,
            reads_since_pulse: 0,
            loaded: false,
            word: 0,
            gain: Gain::A128,
            queue_a: VecDeque::new(),
            queue_b: VecDeque::new(),
            steady_a: 0,
            steady_b: 0,
            busy_polls: 0,
            busy_left: 0,
            rising_edges: 0,
            gains: Vec::new(),
            power_downs: 0,
        })))
    }

    pub fn clock(&self) -> SimClock {
        SimClock(self.clone())
    }

    pub fn data(&self) -> SimData {
        SimData(self.clone())
    }

    pub fn controller(&self) -> SimController {
        SimController {
            chip: self.clone(),
            requested: Vec::new(),
        }
    }

    /// A driver wired to this chip, without the initial gain read.
    pub fn hx711(&self, gain: Gain) -> Hx711<SimClock, SimData, SimDelay> {
        Hx711::from_parts(self.clock(), self.data(), SimDelay::new(self), gain, false)
    }

    pub fn push_a(&self, value: i32) {
        self.0.borrow_mut().queue_a.push_back(value);
    }

    pub fn push_b(&self, value: i32) {
        self.0.borrow_mut().queue_b.push_back(value);
    }

    pub fn set_steady(&self, channel: Channel, value: i32) {
        let mut state = self.0.borrow_mut();
        match channel {
            Channel::A => state.steady_a = value,
            Channel::B => state.steady_b = value,
        }
    }

    /// Polls answered "not ready" before each conversion.
    pub fn set_busy_polls(&self, polls: u32) {
        let mut state = self.0.borrow_mut();
        state.busy_polls = polls;
        state.busy_left = polls;
    }

    pub fn disconnect(&self) {
        self.0.borrow_mut().disconnected = true;
    }

    pub fn clock_high(&self) -> bool {
        self.0.borrow().clock_high
    }

    pub fn powered_down(&self) -> bool {
        self.0.borrow().powered_down
    }

    pub fn power_downs(&self) -> u32 {
        self.0.borrow().power_downs
    }

    pub fn rising_edges(&self) -> u32 {
        self.0.borrow().rising_edges
    }

    /// Conversions clocked out so far.
    pub fn conversions(&self) -> usize {
        self.0.borrow().gains.len()
    }

    /// Gain each conversion was taken with, oldest first.
    pub fn gains(&self) -> Vec<Gain> {
        self.0.borrow().gains.clone()
    }

    /// Gain the next conversion will be taken with.
    pub fn pending_gain(&self) -> Gain {
        let state = self.0.borrow();
        if state.pulses > 24 {
            gain_of(state.pulses - 24)
        } else {
            state.gain
        }
    }
}

pub struct SimClock(SimChip);

impl ErrorType for SimClock {
    type Error = Infallible;
}

impl OutputPin for SimClock {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0 .0.borrow_mut().set_clock(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0 .0.borrow_mut().set_clock(true);
        Ok(())
    }
}

pub struct SimData(SimChip);

impl ErrorType for SimData {
    type Error = Infallible;
}

impl InputPin for SimData {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0 .0.borrow_mut().data_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0 .0.borrow_mut().data_high())
    }
}

pub struct SimDelay(SimChip);

impl SimDelay {
    pub fn new(chip: &SimChip) -> Self {
        Self(chip.clone())
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0 .0.borrow_mut().wait(ns);
    }
}

pub struct SimController {
    chip: SimChip,
    requested: Vec<u32>,
}

impl SimController {
    pub fn requested(&self) -> &[u32] {
        &self.requested
    }
}

impl LineController for SimController {
    type Error = Infallible;
    type Output = SimClock;
    type Input = SimData;

    fn request_output(&mut self, line: u32) -> Result<SimClock, Infallible> {
        self.requested.push(line);
        Ok(self.chip.clock())
    }

    fn request_input(&mut self, line: u32) -> Result<SimData, Infallible> {
        self.requested.push(line);
        Ok(self.chip.data())
    }
}
