//! Register access layer
//!
//! Builds register accesses on top of the [`bus`](crate::bus) transaction
//! layer. Every register byte is its own transaction, either a 1-byte command
//! followed by a 1-byte read, or a 2-byte command+value write. Multi-byte
//! fields are accessed by repeating that with the address incremented by one
//! each time, the same way the chip's internal address pointer walks the
//! register file.
//!
//! The interface owns a single transfer buffer. Reads return a view into it,
//! and that view borrows the interface, so the borrow checker rules out
//! issuing another access while the previous result is still in use.

use core::convert::Infallible;

use embedded_hal::spi::Operation;
use regiface::{ByteArray, FromByteArray, ToByteArray};

use crate::bus::{self, read_command, write_command, FRAME_READ};
use crate::error::{Error, Result};
use crate::registers::{RegisterAddress, REGISTER_SPACE};

/// Command byte plus PHR length byte preceding the PSDU of a frame read.
pub const FRAME_HEADER_LEN: usize = 2;
/// Largest PSDU the chip can hold (aMaxPhyPacketSize).
pub const MAX_FRAME_LEN: usize = 127;
/// Size of the transfer buffer.
pub const BUFFER_LEN: usize = FRAME_HEADER_LEN + MAX_FRAME_LEN;

/// Bit 7 of the PHR is reserved.
const FRAME_LENGTH_MASK: u8 = 0x7F;

/// Register level interface to the transceiver.
pub struct Interface<SPI> {
    spi: SPI,
    buffer: [u8; BUFFER_LEN],
}

impl<SPI> Interface<SPI> {
    /// Wraps an SPI device. The transfer buffer is allocated here, once.
    pub fn new(spi: SPI) -> Self {
        Self {
            spi,
            buffer: [0; BUFFER_LEN],
        }
    }

    /// Releases the underlying SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

fn check_count(count: usize) -> Result<()> {
    if count == 0 || count > REGISTER_SPACE {
        return Err(Error::Protocol);
    }
    Ok(())
}

fn next_address(address: RegisterAddress, offset: usize) -> RegisterAddress {
    // Only the low 6 bits matter, truncation is harmless
    address.wrapping_add(offset as u8)
}

fn frame_length(header: &[u8]) -> usize {
    let len = header[1] & FRAME_LENGTH_MASK;
    if len != header[1] {
        warn!("reserved PHR bit set, length byte {:#x}", header[1]);
    }
    len as usize
}

impl<SPI> Interface<SPI>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    /// Writes `values` to consecutive registers starting at `address`.
    ///
    /// Each byte is written in its own transaction.
    ///
    /// # Errors
    /// * `Error::Protocol` - `values` is empty or exceeds the register space
    /// * `Error::Bus` - SPI communication failed
    pub fn write_register(&mut self, address: RegisterAddress, values: &[u8]) -> Result<()> {
        check_count(values.len())?;
        for (i, value) in values.iter().enumerate() {
            self.buffer[0] = write_command(next_address(address, i));
            self.buffer[1] = *value;
            bus::transaction(&mut self.spi, &mut [Operation::Write(&self.buffer[..2])])?;
        }
        Ok(())
    }

    /// Reads `count` consecutive registers starting at `address`.
    ///
    /// Each byte is read in its own transaction. The returned slice is a view of
    /// the transfer buffer and is only valid until the next access.
    ///
    /// # Errors
    /// * `Error::Protocol` - `count` is zero or exceeds the register space
    /// * `Error::Bus` - SPI communication failed
    pub fn read_register(&mut self, address: RegisterAddress, count: usize) -> Result<&[u8]> {
        check_count(count)?;
        for i in 0..count {
            let command = [read_command(next_address(address, i))];
            bus::transaction(
                &mut self.spi,
                &mut [
                    Operation::Write(&command),
                    Operation::Read(&mut self.buffer[i..i + 1]),
                ],
            )?;
        }
        Ok(&self.buffer[..count])
    }

    /// Reads the frame held in the chip's frame buffer.
    ///
    /// The first transaction fetches the PHR length byte, the second one
    /// restarts the frame read and clocks in exactly that many PSDU bytes. A
    /// zero length frame skips the second transaction.
    pub fn read_frame(&mut self) -> Result<&[u8]> {
        self.buffer[0] = FRAME_READ;
        self.buffer[1] = 0x00;
        bus::transaction(
            &mut self.spi,
            &mut [Operation::TransferInPlace(&mut self.buffer[..FRAME_HEADER_LEN])],
        )?;

        let len = frame_length(&self.buffer[..FRAME_HEADER_LEN]);
        if len == 0 {
            return Ok(&[]);
        }

        let header = [FRAME_READ, 0x00];
        let end = FRAME_HEADER_LEN + len;
        bus::transaction(
            &mut self.spi,
            &mut [
                Operation::Write(&header),
                Operation::Read(&mut self.buffer[FRAME_HEADER_LEN..end]),
            ],
        )?;

        Ok(&self.buffer[FRAME_HEADER_LEN..end])
    }

    /// Reads and decodes a register value starting at `address`.
    ///
    /// # Errors
    /// * `Error::Protocol` - the raw value could not be decoded
    /// * `Error::Bus` - SPI communication failed
    pub fn read<V>(&mut self, address: RegisterAddress) -> Result<V>
    where
        V: FromByteArray,
    {
        let mut raw_value = V::Array::new();
        let len = raw_value.as_ref().len();
        raw_value
            .as_mut()
            .copy_from_slice(self.read_register(address, len)?);

        V::from_bytes(raw_value).map_err(|_| Error::Protocol)
    }

    /// Encodes and writes a register value starting at `address`.
    pub fn write<V>(&mut self, address: RegisterAddress, value: V) -> Result<()>
    where
        V: ToByteArray<Error = Infallible>,
    {
        let raw_value = value.to_bytes().map_err(|_| Error::Protocol)?;
        self.write_register(address, raw_value.as_ref())
    }
}

impl<SPI> Interface<SPI>
where
    SPI: embedded_hal_async::spi::SpiDevice,
{
    /// Asynchronously writes consecutive registers.
    ///
    /// This is the async version of [`write_register`](Interface::write_register).
    pub async fn write_register_async(
        &mut self,
        address: RegisterAddress,
        values: &[u8],
    ) -> Result<()> {
        check_count(values.len())?;
        for (i, value) in values.iter().enumerate() {
            self.buffer[0] = write_command(next_address(address, i));
            self.buffer[1] = *value;
            bus::transaction_async(
                &mut self.spi,
                &mut [embedded_hal_async::spi::Operation::Write(&self.buffer[..2])],
            )
            .await?;
        }
        Ok(())
    }

    /// Asynchronously reads consecutive registers.
    ///
    /// This is the async version of [`read_register`](Interface::read_register).
    pub async fn read_register_async(
        &mut self,
        address: RegisterAddress,
        count: usize,
    ) -> Result<&[u8]> {
        check_count(count)?;
        for i in 0..count {
            let command = [read_command(next_address(address, i))];
            bus::transaction_async(
                &mut self.spi,
                &mut [
                    embedded_hal_async::spi::Operation::Write(&command),
                    embedded_hal_async::spi::Operation::Read(&mut self.buffer[i..i + 1]),
                ],
            )
            .await?;
        }
        Ok(&self.buffer[..count])
    }

    /// Asynchronously reads the frame buffer.
    ///
    /// This is the async version of [`read_frame`](Interface::read_frame).
    pub async fn read_frame_async(&mut self) -> Result<&[u8]> {
        self.buffer[0] = FRAME_READ;
        self.buffer[1] = 0x00;
        bus::transaction_async(
            &mut self.spi,
            &mut [embedded_hal_async::spi::Operation::TransferInPlace(
                &mut self.buffer[..FRAME_HEADER_LEN],
            )],
        )
        .await?;

        let len = frame_length(&self.buffer[..FRAME_HEADER_LEN]);
        if len == 0 {
            return Ok(&[]);
        }

        let header = [FRAME_READ, 0x00];
        let end = FRAME_HEADER_LEN + len;
        bus::transaction_async(
            &mut self.spi,
            &mut [
                embedded_hal_async::spi::Operation::Write(&header),
                embedded_hal_async::spi::Operation::Read(&mut self.buffer[FRAME_HEADER_LEN..end]),
            ],
        )
        .await?;

        Ok(&self.buffer[FRAME_HEADER_LEN..end])
    }

    /// Asynchronously reads and decodes a register value.
    ///
    /// This is the async version of [`read`](Interface::read).
    pub async fn read_async<V>(&mut self, address: RegisterAddress) -> Result<V>
    where
        V: FromByteArray,
    {
        let mut raw_value = V::Array::new();
        let len = raw_value.as_ref().len();
        raw_value
            .as_mut()
            .copy_from_slice(self.read_register_async(address, len).await?);

        V::from_bytes(raw_value).map_err(|_| Error::Protocol)
    }

    /// Asynchronously encodes and writes a register value.
    ///
    /// This is the async version of [`write`](Interface::write).
    pub async fn write_async<V>(&mut self, address: RegisterAddress, value: V) -> Result<()>
    where
        V: ToByteArray<Error = Infallible>,
    {
        let raw_value = value.to_bytes().map_err(|_| Error::Protocol)?;
        self.write_register_async(address, raw_value.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::{IrqFlags, TransceiverState, TrxCommand};
    use embedded_hal_mock::eh1::spi::{Mock as SpiDevice, Transaction as SpiTransaction};

    fn read_expectation(command: u8, value: u8) -> [SpiTransaction<u8>; 4] {
        [
            SpiTransaction::transaction_start(),
            SpiTransaction::write(command),
            SpiTransaction::read(value),
            SpiTransaction::transaction_end(),
        ]
    }

    fn write_expectation(command: u8, value: u8) -> [SpiTransaction<u8>; 3] {
        [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![command, value]),
            SpiTransaction::transaction_end(),
        ]
    }

    #[test]
    fn test_read_single_register() {
        let spi = SpiDevice::new(&read_expectation(0x9C, 0x0B));
        let mut interface = Interface::new(spi);

        assert_eq!(interface.read_register(0x1C, 1).unwrap(), &[0x0B]);

        interface.release().done();
    }

    #[test]
    fn test_read_auto_increments() {
        let mut expectations = vec![];
        expectations.extend(read_expectation(0xA0, 0x12));
        expectations.extend(read_expectation(0xA1, 0x34));
        let spi = SpiDevice::new(&expectations);
        let mut interface = Interface::new(spi);

        assert_eq!(interface.read_register(0x20, 2).unwrap(), &[0x12, 0x34]);

        interface.release().done();
    }

    #[test]
    fn test_read_wraps_within_register_space() {
        let mut expectations = vec![];
        expectations.extend(read_expectation(0xBF, 0x01));
        expectations.extend(read_expectation(0x80, 0x02));
        let spi = SpiDevice::new(&expectations);
        let mut interface = Interface::new(spi);

        assert_eq!(interface.read_register(0x3F, 2).unwrap(), &[0x01, 0x02]);

        interface.release().done();
    }

    #[test]
    fn test_high_address_is_masked() {
        let spi = SpiDevice::new(&write_expectation(0xC2, 0x08));
        let mut interface = Interface::new(spi);

        interface.write_register(0x42, &[0x08]).unwrap();

        interface.release().done();
    }

    #[test]
    fn test_write_one_transaction_per_byte() {
        let mut expectations = vec![];
        expectations.extend(write_expectation(0xE2, 0xBE));
        expectations.extend(write_expectation(0xE3, 0xEF));
        let spi = SpiDevice::new(&expectations);
        let mut interface = Interface::new(spi);

        interface.write_register(0x22, &[0xBE, 0xEF]).unwrap();

        interface.release().done();
    }

    #[test]
    fn test_read_count_out_of_range() {
        let spi: SpiDevice<u8> = SpiDevice::new(&[]);
        let mut interface = Interface::new(spi);

        assert_eq!(interface.read_register(0x00, 0), Err(Error::Protocol));
        assert_eq!(
            interface.read_register(0x00, REGISTER_SPACE + 1),
            Err(Error::Protocol)
        );

        interface.release().done();
    }

    #[test]
    fn test_write_count_out_of_range() {
        let spi: SpiDevice<u8> = SpiDevice::new(&[]);
        let mut interface = Interface::new(spi);

        assert_eq!(interface.write_register(0x00, &[]), Err(Error::Protocol));
        assert_eq!(
            interface.write_register(0x00, &[0; REGISTER_SPACE + 1]),
            Err(Error::Protocol)
        );
        pollster::block_on(async {
            assert_eq!(
                interface.write_register_async(0x00, &[]).await,
                Err(Error::Protocol)
            );
        });

        interface.release().done();
    }

    #[test]
    fn test_read_frame() {
        let spi = SpiDevice::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::transfer_in_place(vec![0x20, 0x00], vec![0x20, 0x03]),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x20, 0x00]),
            SpiTransaction::read_vec(vec![0x41, 0x88, 0x01]),
            SpiTransaction::transaction_end(),
        ]);
        let mut interface = Interface::new(spi);

        assert_eq!(interface.read_frame().unwrap(), &[0x41, 0x88, 0x01]);

        interface.release().done();
    }

    #[test]
    fn test_read_frame_masks_reserved_length_bit() {
        let spi = SpiDevice::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::transfer_in_place(vec![0x20, 0x00], vec![0x20, 0x81]),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x20, 0x00]),
            SpiTransaction::read_vec(vec![0xAA]),
            SpiTransaction::transaction_end(),
        ]);
        let mut interface = Interface::new(spi);

        assert_eq!(interface.read_frame().unwrap(), &[0xAA]);

        interface.release().done();
    }

    #[test]
    fn test_read_empty_frame() {
        let spi = SpiDevice::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::transfer_in_place(vec![0x20, 0x00], vec![0x20, 0x00]),
            SpiTransaction::transaction_end(),
        ]);
        let mut interface = Interface::new(spi);

        assert!(interface.read_frame().unwrap().is_empty());

        interface.release().done();
    }

    #[test]
    fn test_typed_access() {
        let mut expectations = vec![];
        expectations.extend(read_expectation(0x81, 0x16));
        expectations.extend(write_expectation(0xC2, 0x09));
        let spi = SpiDevice::new(&expectations);
        let mut interface = Interface::new(spi);

        let state: TransceiverState = interface.read(0x01).unwrap();
        assert_eq!(state, TransceiverState::RxAackOn);
        interface.write(0x02, TrxCommand::TxOn).unwrap();

        interface.release().done();
    }

    #[test]
    fn test_async_access() {
        let mut expectations = vec![];
        expectations.extend(write_expectation(0xCE, 0x01));
        expectations.extend(read_expectation(0x8F, 0x01));
        expectations.extend([
            SpiTransaction::transaction_start(),
            SpiTransaction::transfer_in_place(vec![0x20, 0x00], vec![0x20, 0x02]),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x20, 0x00]),
            SpiTransaction::read_vec(vec![0x02, 0x00]),
            SpiTransaction::transaction_end(),
        ]);
        let spi = SpiDevice::new(&expectations);
        let mut interface = Interface::new(spi);

        pollster::block_on(async {
            interface
                .write_async(0x0E, IrqFlags::PLL_LOCK)
                .await
                .unwrap();
            let irq: IrqFlags = interface.read_async(0x0F).await.unwrap();
            assert_eq!(irq, IrqFlags::PLL_LOCK);
            assert_eq!(interface.read_frame_async().await.unwrap(), &[0x02, 0x00]);
        });

        interface.release().done();
    }
}
