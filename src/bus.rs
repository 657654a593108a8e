//! SPI transaction layer
//!
//! Every exchange with the transceiver happens inside one
//! [`SpiDevice::transaction`](embedded_hal::spi::SpiDevice::transaction): the
//! device implementation asserts chip-select, holds the bus exclusively for the
//! whole operation list and releases it again on every exit path, including
//! errors. Other devices sharing the bus are blocked until then, which is what
//! makes a register access atomic from their point of view.
//!
//! # Command Byte
//! - Bits 7:6: access mode
//! - Bits 5:0: register address (register accesses only)

use embedded_hal::spi::Operation;

use crate::error::{Error, Result};
use crate::registers::{RegisterAddress, ADDRESS_MASK};

/// Register read access mode
pub const REGISTER_READ: u8 = 0x80;
/// Register write access mode
pub const REGISTER_WRITE: u8 = 0xC0;
/// Frame buffer read access mode
pub const FRAME_READ: u8 = 0x20;

/// Command byte reading the register at `address`.
///
/// Addresses wrap within the 6-bit register space.
pub const fn read_command(address: RegisterAddress) -> u8 {
    REGISTER_READ | (address & ADDRESS_MASK)
}

/// Command byte writing the register at `address`.
pub const fn write_command(address: RegisterAddress) -> u8 {
    REGISTER_WRITE | (address & ADDRESS_MASK)
}

/// Runs `operations` as one exclusive bus transaction.
pub(crate) fn transaction<SPI>(spi: &mut SPI, operations: &mut [Operation<'_, u8>]) -> Result<()>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    spi.transaction(operations).map_err(Error::bus)
}

/// Async version of [`transaction`].
pub(crate) async fn transaction_async<SPI>(
    spi: &mut SPI,
    operations: &mut [embedded_hal_async::spi::Operation<'_, u8>],
) -> Result<()>
where
    SPI: embedded_hal_async::spi::SpiDevice,
{
    spi.transaction(operations).await.map_err(Error::bus)
}
