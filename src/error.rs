use core::fmt;

/// Errors raised by the driver. `E` is the error type of the clock and data
/// lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Driving the clock, sampling the data line or requesting a line failed.
    Line(E),
    /// The pin has no entry in the resolved line map.
    PinNotMapped(u8),
    /// The line map entry for the pin is not a recognised line name.
    InvalidLineName(u8),
    /// The named line map profile is unknown and no custom map was given.
    UnknownLineMap,
    /// A reference unit of zero was rejected.
    ZeroReferenceUnit,
    /// More readings were requested than a filter buffer holds.
    TooManySamples(usize),
    /// The caller gave up waiting for the chip to become ready.
    Cancelled,
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Error::Line(err)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Line(err) => write!(f, "line error: {err:?}"),
            Error::PinNotMapped(pin) => write!(f, "pin {pin} is not found in line map"),
            Error::InvalidLineName(pin) => {
                write!(f, "line name for pin {pin} is not a gpio or port name")
            }
            Error::UnknownLineMap => f.write_str(
                "line map profile is unknown, specify a custom line map for your device",
            ),
            Error::ZeroReferenceUnit => f.write_str("reference unit can't be 0"),
            Error::TooManySamples(n) => write!(f, "{n} samples do not fit the filter buffer"),
            Error::Cancelled => f.write_str("read cancelled before the hx711 was ready"),
        }
    }
}
