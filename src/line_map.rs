//! Pin-to-line maps.
//!
//! Gpio controllers number their lines locally, while wiring diagrams talk
//! about connector pins. A [`LineMap`] translates one into the other for a
//! single board. Maps are plain values: pick a built-in profile by name with
//! [`LineMap::profile`], or pass your own table.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::Error;
use crate::hx711::Gain;

/// Name of the profile used when none is given.
pub const DEFAULT_PROFILE: &str = "RPI_5";

/// Lines per port bank for port-style names such as `H7`.
const LINES_PER_BANK: u32 = 8;

// from https://pinout.xyz
static RPI_5: [(u8, &str); 26] = [
    (3, "GPIO2"),  // SDA1
    (5, "GPIO3"),  // SCL1
    (7, "GPIO4"),
    (8, "GPIO14"), // TXD
    (10, "GPIO15"), // RXD
    (11, "GPIO17"),
    (12, "GPIO18"),
    (13, "GPIO27"),
    (15, "GPIO22"),
    (16, "GPIO23"),
    (18, "GPIO24"),
    (19, "GPIO10"), // MOSI
    (21, "GPIO9"),  // MISO
    (22, "GPIO25"),
    (23, "GPIO11"), // SCLK
    (24, "GPIO8"),  // CE0
    (26, "GPIO7"),  // CE1
    (29, "GPIO5"),
    (31, "GPIO6"),
    (32, "GPIO12"),
    (33, "GPIO13"),
    (35, "GPIO19"),
    (36, "GPIO16"),
    (37, "GPIO26"),
    (38, "GPIO20"),
    (40, "GPIO21"),
];

/// A table from connector pin number to controller line name.
///
/// Line names come in two shapes:
/// * `GPIO<n>`: line `n`.
/// * `<BANK><digit>`: a port bank and a line within it. `A`..`Z` are banks
///   0 to 25, doubled letters `AA`..`ZZ` are banks 26 to 51. The line is
///   `bank * 8 + digit`, so `digit` must be 0 to 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMap<'a> {
    entries: &'a [(u8, &'a str)],
}

impl<'a> LineMap<'a> {
    pub const fn new(entries: &'a [(u8, &'a str)]) -> Self {
        Self { entries }
    }

    /// Look up a built-in profile.
    pub fn profile(name: &str) -> Option<LineMap<'static>> {
        match name {
            "RPI_5" => Some(LineMap::new(&RPI_5)),
            _ => None,
        }
    }

    pub fn line_name(&self, pin: u8) -> Option<&'a str> {
        self.entries
            .iter()
            .find(|(p, _)| *p == pin)
            .map(|(_, name)| *name)
    }

    /// Translate a connector pin into a controller line number.
    pub fn line_number<E>(&self, pin: u8) -> Result<u32, Error<E>> {
        let name = self.line_name(pin).ok_or(Error::PinNotMapped(pin))?;
        parse_line_name(name).ok_or(Error::InvalidLineName(pin))
    }
}

fn parse_line_name(name: &str) -> Option<u32> {
    if let Some(number) = name.strip_prefix("GPIO") {
        return number.parse().ok();
    }

    let bytes = name.as_bytes();
    let (&digit, bank) = bytes.split_last()?;
    let offset = match digit {
        b'0'..=b'7' => u32::from(digit - b'0'),
        _ => return None,
    };
    let bank = match *bank {
        [letter] if letter.is_ascii_uppercase() => u32::from(letter - b'A'),
        [first, second] if first == second && first.is_ascii_uppercase() => {
            26 + u32::from(first - b'A')
        }
        _ => return None,
    };
    Some(bank * LINES_PER_BANK + offset)
}

/// Controller-local line numbers for the two hx711 lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lines {
    pub data: u32,
    pub clock: u32,
}

/// Something that owns gpio lines and can hand them out already set up as
/// inputs or outputs, e.g. a gpio character device.
pub trait LineController {
    type Error;
    type Output: OutputPin<Error = Self::Error>;
    type Input: InputPin<Error = Self::Error>;

    fn request_output(&mut self, line: u32) -> Result<Self::Output, Self::Error>;

    fn request_input(&mut self, line: u32) -> Result<Self::Input, Self::Error>;
}

/// How to find and set up the hx711 on a board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config<'a> {
    pub pin_data: u8,
    pub pin_clock: u8,
    pub gain: Gain,
    pub serialize_access: bool,
    pub line_map_profile: &'a str,
    pub custom_line_map: Option<LineMap<'a>>,
}

impl<'a> Config<'a> {
    pub fn new(pin_data: u8, pin_clock: u8) -> Self {
        Self {
            pin_data,
            pin_clock,
            gain: Gain::A128,
            serialize_access: false,
            line_map_profile: DEFAULT_PROFILE,
            custom_line_map: None,
        }
    }

    pub fn gain(mut self, gain: Gain) -> Self {
        self.gain = gain;
        self
    }

    pub fn serialize_access(mut self, serialize_access: bool) -> Self {
        self.serialize_access = serialize_access;
        self
    }

    pub fn line_map_profile(mut self, profile: &'a str) -> Self {
        self.line_map_profile = profile;
        self
    }

    /// Use `map` instead of any named profile.
    pub fn custom_line_map(mut self, map: LineMap<'a>) -> Self {
        self.custom_line_map = Some(map);
        self
    }

    /// The custom map if one was given, otherwise the named profile.
    pub fn line_map<E>(&self) -> Result<LineMap<'a>, Error<E>> {
        match self.custom_line_map {
            Some(map) => Ok(map),
            None => LineMap::profile(self.line_map_profile).ok_or(Error::UnknownLineMap),
        }
    }

    /// Resolve both pins to line numbers.
    pub fn resolve_lines<E>(&self) -> Result<Lines, Error<E>> {
        let map = self.line_map()?;
        Ok(Lines {
            data: map.line_number(self.pin_data)?,
            clock: map.line_number(self.pin_clock)?,
        })
    }
}
