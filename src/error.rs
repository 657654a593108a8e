//! Driver error type

use embedded_hal::{digital, spi};

/// Errors returned by the driver.
///
/// Validation errors are raised before any bus activity, so a failed setter
/// leaves both the chip and the transfer buffer untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The chip did not identify as the expected part.
    ///
    /// `version` is `None` when the part number already mismatched and the
    /// version register was never read.
    DeviceIdentity {
        /// Part number read from the chip
        part_number: u8,
        /// Version number read from the chip, if it got that far
        version: Option<u8>,
    },
    /// Channel outside of the chip's valid range.
    InvalidChannel(u8),
    /// IEEE identifier of the wrong width for this chip.
    InvalidIdentifierLength {
        /// Width the chip stores
        expected: usize,
        /// Width that was supplied
        actual: usize,
    },
    /// Register block or frame length out of range, or an undecodable register value.
    ///
    /// This indicates a programming error rather than a runtime condition.
    Protocol,
    /// The SPI transport failed.
    Bus(spi::ErrorKind),
    /// Driving a control line (sleep, reset, activity indicator) failed.
    Pin(digital::ErrorKind),
}

impl Error {
    pub(crate) fn bus<E: spi::Error>(err: E) -> Self {
        Error::Bus(err.kind())
    }

    pub(crate) fn pin<E: digital::Error>(err: E) -> Self {
        Error::Pin(err.kind())
    }

    /// Returns true for caller-side validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidChannel(_) | Error::InvalidIdentifierLength { .. }
        )
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::DeviceIdentity {
                part_number,
                version: None,
            } => write!(f, "unexpected part number {:#04x}", part_number),
            Error::DeviceIdentity {
                part_number,
                version: Some(version),
            } => write!(
                f,
                "unexpected chip identity: part {:#04x}, version {:#04x}",
                part_number, version
            ),
            Error::InvalidChannel(channel) => write!(f, "invalid channel {}", channel),
            Error::InvalidIdentifierLength { expected, actual } => write!(
                f,
                "IEEE address must be {} bytes, got {}",
                expected, actual
            ),
            Error::Protocol => f.write_str("register protocol violation"),
            Error::Bus(kind) => write!(f, "SPI bus error: {}", kind),
            Error::Pin(kind) => write!(f, "control line error: {}", kind),
        }
    }
}

/// Result type used throughout the driver.
pub type Result<T> = core::result::Result<T, Error>;
