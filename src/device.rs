//! AT86RF2xx Device Interface
//!
//! This module provides the typed interface to the transceiver: addresses,
//! channel, transceiver state, interrupt flags and frame buffer access, all
//! built on the [`Interface`] register access layer.
//!
//! Construction performs the hardware bring-up and checks that the chip
//! identifies as the expected part. It is the only place where reset and wake
//! sequencing happens.
//!
//! # Example
//! ```no_run
//! use at86rf2xx::{Device, AT86RF233};
//! # fn demo<SPI, D>(spi: SPI, mut delay: D) -> Result<(), at86rf2xx::Error>
//! # where SPI: embedded_hal::spi::SpiDevice, D: embedded_hal::delay::DelayNs {
//! let mut device = Device::new(spi, &mut delay, &AT86RF233)?;
//! device.set_channel(25)?;
//! let state = device.status()?;
//! # Ok(()) }
//! ```

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::config::Chip;
use crate::error::{Error, Result};
use crate::interface::Interface;
use crate::registers::{
    CsmaSeed1, IrqFlags, PhyCcCca, RegisterAddress, TransceiverState, TrxCommand, TrxCtrl0,
    XahCtrl1,
};

/// Reset pulse width and post-reset settle time.
const BRINGUP_DELAY_MS: u32 = 10;

/// Stand-in for a control line that is not wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }
}

/// Main device interface for the transceiver.
///
/// The device exclusively owns the SPI device and the transfer buffer. Every
/// operation takes `&mut self`, so two accesses can never interleave on one
/// instance. Hosts that share a device between threads must put it behind
/// their own lock.
pub struct Device<SPI> {
    interface: Interface<SPI>,
    chip: &'static Chip,
}

impl<SPI> Device<SPI> {
    /// Chip description this device was probed with.
    pub fn chip(&self) -> &'static Chip {
        self.chip
    }

    /// Releases the underlying SPI device.
    pub fn release(self) -> SPI {
        self.interface.release()
    }
}

impl<SPI> Device<SPI>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    /// Creates a device without control lines.
    ///
    /// Waits for the chip to settle and checks its identity.
    ///
    /// # Errors
    /// * `Error::DeviceIdentity` - the chip is not the expected part
    /// * `Error::Bus` - SPI communication failed
    pub fn new<D: DelayNs>(spi: SPI, delay: &mut D, chip: &'static Chip) -> Result<Self> {
        Self::with_control_lines(spi, None::<&mut NoPin>, None::<&mut NoPin>, delay, chip)
    }

    /// Creates a device, waking and resetting the chip first.
    ///
    /// The sleep line (SLP_TR) is driven low to leave sleep, the reset line is
    /// held low for 10 ms and released, then the chip gets another 10 ms to
    /// settle before its identity is read.
    ///
    /// # Errors
    /// * `Error::Pin` - driving a control line failed
    /// * `Error::DeviceIdentity` - the chip is not the expected part
    /// * `Error::Bus` - SPI communication failed
    pub fn with_control_lines<SLP, RST, D>(
        spi: SPI,
        sleep: Option<&mut SLP>,
        reset: Option<&mut RST>,
        delay: &mut D,
        chip: &'static Chip,
    ) -> Result<Self>
    where
        SLP: OutputPin,
        RST: OutputPin,
        D: DelayNs,
    {
        if let Some(sleep) = sleep {
            sleep.set_low().map_err(Error::pin)?;
        }
        if let Some(reset) = reset {
            reset.set_low().map_err(Error::pin)?;
            delay.delay_ms(BRINGUP_DELAY_MS);
            reset.set_high().map_err(Error::pin)?;
        }
        delay.delay_ms(BRINGUP_DELAY_MS);

        let mut device = Self {
            interface: Interface::new(spi),
            chip,
        };
        device.verify_identity()?;
        Ok(device)
    }

    fn verify_identity(&mut self) -> Result<()> {
        let part_number = self.part_number()?;
        if part_number != self.chip.part_number {
            error!(
                "part number {:#x} does not match {} ({:#x})",
                part_number, self.chip.name, self.chip.part_number
            );
            return Err(Error::DeviceIdentity {
                part_number,
                version: None,
            });
        }

        let version = self.version_number()?;
        if version != self.chip.version_number {
            error!(
                "version {:#x} does not match {} ({:#x})",
                version, self.chip.name, self.chip.version_number
            );
            return Err(Error::DeviceIdentity {
                part_number,
                version: Some(version),
            });
        }

        debug!(
            "{} found: part {:#x}, version {:#x}",
            self.chip.name, part_number, version
        );
        Ok(())
    }

    /// Reads PART_NUM.
    pub fn part_number(&mut self) -> Result<u8> {
        let address = self.chip.registers.part_num;
        Ok(self.interface.read_register(address, 1)?[0])
    }

    /// Reads VERSION_NUM.
    pub fn version_number(&mut self) -> Result<u8> {
        let address = self.chip.registers.version_num;
        Ok(self.interface.read_register(address, 1)?[0])
    }

    /// Writes consecutive registers, one transaction per byte.
    pub fn write_register(&mut self, address: RegisterAddress, values: &[u8]) -> Result<()> {
        self.interface.write_register(address, values)
    }

    /// Reads consecutive registers, one transaction per byte.
    ///
    /// The returned view is only valid until the next access.
    pub fn read_register(&mut self, address: RegisterAddress, count: usize) -> Result<&[u8]> {
        self.interface.read_register(address, count)
    }

    /// Reads the 16-bit short address.
    pub fn short_addr(&mut self) -> Result<u16> {
        let address = self.chip.registers.short_addr;
        self.read_u16(address)
    }

    /// Writes the 16-bit short address.
    pub fn set_short_addr(&mut self, short_addr: u16) -> Result<()> {
        let address = self.chip.registers.short_addr;
        self.interface
            .write_register(address, &short_addr.to_be_bytes())
    }

    /// Reads the 16-bit PAN identifier.
    pub fn pan_id(&mut self) -> Result<u16> {
        let address = self.chip.registers.pan_id;
        self.read_u16(address)
    }

    /// Writes the 16-bit PAN identifier.
    pub fn set_pan_id(&mut self, pan_id: u16) -> Result<()> {
        let address = self.chip.registers.pan_id;
        self.interface.write_register(address, &pan_id.to_be_bytes())
    }

    fn read_u16(&mut self, address: RegisterAddress) -> Result<u16> {
        let bytes = self.interface.read_register(address, 2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads the extended (IEEE) address.
    ///
    /// The view is exactly [`Chip::ieee_addr_len`] bytes long and only valid
    /// until the next access.
    pub fn ieee_addr(&mut self) -> Result<&[u8]> {
        let address = self.chip.registers.ieee_addr;
        self.interface.read_register(address, self.chip.ieee_addr_len)
    }

    /// Writes the extended (IEEE) address.
    ///
    /// # Errors
    /// * `Error::InvalidIdentifierLength` - `addr` is not exactly
    ///   [`Chip::ieee_addr_len`] bytes; nothing is written
    /// * `Error::Bus` - SPI communication failed
    pub fn set_ieee_addr(&mut self, addr: &[u8]) -> Result<()> {
        if addr.len() != self.chip.ieee_addr_len {
            return Err(Error::InvalidIdentifierLength {
                expected: self.chip.ieee_addr_len,
                actual: addr.len(),
            });
        }
        let address = self.chip.registers.ieee_addr;
        self.interface.write_register(address, addr)
    }

    /// Reads the current channel.
    pub fn channel(&mut self) -> Result<u8> {
        let address = self.chip.registers.phy_cc_cca;
        let reg: PhyCcCca = self.interface.read(address)?;
        Ok(reg.channel)
    }

    /// Sets the channel.
    ///
    /// The CCA mode bits are preserved, a pending CCA request is not re-issued.
    ///
    /// # Errors
    /// * `Error::InvalidChannel` - outside of the chip's channel range; nothing
    ///   is read or written
    /// * `Error::Bus` - SPI communication failed
    pub fn set_channel(&mut self, channel: u8) -> Result<()> {
        if !self.chip.supports_channel(channel) {
            return Err(Error::InvalidChannel(channel));
        }
        let address = self.chip.registers.phy_cc_cca;
        let current: PhyCcCca = self.interface.read(address)?;
        self.interface.write(
            address,
            PhyCcCca {
                cca_request: false,
                channel,
                ..current
            },
        )
    }

    /// Reads the transceiver state from TRX_STATUS.
    ///
    /// Reserved values are reported as [`TransceiverState::Unknown`].
    pub fn status(&mut self) -> Result<TransceiverState> {
        let address = self.chip.registers.trx_status;
        self.interface.read(address)
    }

    /// Reads IRQ_STATUS.
    ///
    /// The chip clears the register on read, the result is a snapshot of the
    /// events since the previous read.
    pub fn irq(&mut self) -> Result<IrqFlags> {
        let address = self.chip.registers.irq_status;
        self.interface.read(address)
    }

    /// Reads IRQ_MASK.
    pub fn irq_mask(&mut self) -> Result<IrqFlags> {
        let address = self.chip.registers.irq_mask;
        self.interface.read(address)
    }

    /// Writes IRQ_MASK, enabling exactly `flags`.
    pub fn set_irq_mask(&mut self, flags: IrqFlags) -> Result<()> {
        let address = self.chip.registers.irq_mask;
        self.interface.write(address, flags)
    }

    /// Requests a state transition through TRX_STATE.
    ///
    /// Completion is observed through [`status`](Device::status), this does not
    /// wait for it.
    pub fn set_state(&mut self, command: TrxCommand) -> Result<()> {
        let address = self.chip.registers.trx_state;
        self.interface.write(address, command)
    }

    /// Reads the frame held in the frame buffer.
    ///
    /// The view is only valid until the next access.
    pub fn read_frame(&mut self) -> Result<&[u8]> {
        self.interface.read_frame()
    }

    /// Configures the frame filter to accept every frame and never acknowledge.
    ///
    /// # Register Changes
    /// - XAH_CTRL_1: AACK_PROM_MODE
    /// - CSMA_SEED_1: AACK_DIS_ACK
    /// - TRX_CTRL_0: TOM_EN set, other bits kept
    pub fn enable_promiscuous(&mut self) -> Result<()> {
        let registers = &self.chip.registers;
        let (xah_ctrl_1, csma_seed_1, trx_ctrl_0) = (
            registers.xah_ctrl_1,
            registers.csma_seed_1,
            registers.trx_ctrl_0,
        );

        self.interface.write(xah_ctrl_1, XahCtrl1::AACK_PROM_MODE)?;
        self.interface.write(csma_seed_1, CsmaSeed1::AACK_DIS_ACK)?;

        let ctrl: TrxCtrl0 = self.interface.read(trx_ctrl_0)?;
        self.interface.write(trx_ctrl_0, ctrl | TrxCtrl0::TOM_EN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AT86RF231, AT86RF233};
    use embedded_hal_mock::eh1::delay::{CheckedDelay, NoopDelay, Transaction as DelayTransaction};
    use embedded_hal_mock::eh1::digital::{
        Mock as DigitalMock, State, Transaction as GpioTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiDevice, Transaction as SpiTransaction};

    fn read(address: u8, value: u8) -> Vec<SpiTransaction<u8>> {
        vec![
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0x80 | address),
            SpiTransaction::read(value),
            SpiTransaction::transaction_end(),
        ]
    }

    fn write(address: u8, value: u8) -> Vec<SpiTransaction<u8>> {
        vec![
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0xC0 | address, value]),
            SpiTransaction::transaction_end(),
        ]
    }

    fn identity() -> Vec<SpiTransaction<u8>> {
        [read(0x1C, 0x0B), read(0x1D, 0x02)].concat()
    }

    fn setup_device(expectations: &[SpiTransaction<u8>]) -> Device<SpiDevice<u8>> {
        let spi = SpiDevice::new(&[identity(), expectations.to_vec()].concat());
        Device::new(spi, &mut NoopDelay::new(), &AT86RF233).unwrap()
    }

    #[test]
    fn test_bringup_with_control_lines() {
        let spi = SpiDevice::new(&identity());
        let mut sleep = DigitalMock::new(&[GpioTransaction::set(State::Low)]);
        let mut reset = DigitalMock::new(&[
            GpioTransaction::set(State::Low),
            GpioTransaction::set(State::High),
        ]);
        let mut delay = CheckedDelay::new(&[
            DelayTransaction::delay_ms(10),
            DelayTransaction::delay_ms(10),
        ]);

        let device = Device::with_control_lines(
            spi,
            Some(&mut sleep),
            Some(&mut reset),
            &mut delay,
            &AT86RF233,
        )
        .unwrap();

        sleep.done();
        reset.done();
        delay.done();
        device.release().done();
    }

    #[test]
    fn test_bringup_settles_without_control_lines() {
        let spi = SpiDevice::new(&identity());
        let mut delay = CheckedDelay::new(&[DelayTransaction::delay_ms(10)]);

        let device = Device::new(spi, &mut delay, &AT86RF233).unwrap();

        delay.done();
        device.release().done();
    }

    #[test]
    fn test_wrong_part_number_skips_version() {
        let mut spi = SpiDevice::new(&read(0x1C, 0x0A));

        let result = Device::new(spi.clone(), &mut NoopDelay::new(), &AT86RF233);
        assert_eq!(
            result.err(),
            Some(Error::DeviceIdentity {
                part_number: 0x0A,
                version: None,
            })
        );

        spi.done();
    }

    #[test]
    fn test_wrong_version() {
        let mut spi = SpiDevice::new(&[read(0x1C, 0x0B), read(0x1D, 0x01)].concat());

        let result = Device::new(spi.clone(), &mut NoopDelay::new(), &AT86RF233);
        assert_eq!(
            result.err(),
            Some(Error::DeviceIdentity {
                part_number: 0x0B,
                version: Some(0x01),
            })
        );

        spi.done();
    }

    #[test]
    fn test_identity_follows_chip() {
        let mut spi = SpiDevice::new(&identity());

        let result = Device::new(spi.clone(), &mut NoopDelay::new(), &AT86RF231);
        assert_eq!(
            result.err(),
            Some(Error::DeviceIdentity {
                part_number: 0x0B,
                version: None,
            })
        );

        spi.done();
    }

    #[test]
    fn test_short_addr_is_big_endian() {
        let mut device = setup_device(
            &[
                write(0x20, 0x12),
                write(0x21, 0x34),
                read(0x20, 0x12),
                read(0x21, 0x34),
            ]
            .concat(),
        );

        device.set_short_addr(0x1234).unwrap();
        assert_eq!(device.short_addr().unwrap(), 0x1234);

        device.release().done();
    }

    #[test]
    fn test_pan_id() {
        let mut device = setup_device(
            &[
                write(0x22, 0xAB),
                write(0x23, 0xCD),
                read(0x22, 0xAB),
                read(0x23, 0xCD),
            ]
            .concat(),
        );

        device.set_pan_id(0xABCD).unwrap();
        assert_eq!(device.pan_id().unwrap(), 0xABCD);

        device.release().done();
    }

    #[test]
    fn test_ieee_addr_reads_full_width() {
        let expectations: Vec<_> = (0..8u8).flat_map(|i| read(0x24 + i, i + 1)).collect();
        let mut device = setup_device(&expectations);

        assert_eq!(device.ieee_addr().unwrap(), &[1, 2, 3, 4, 5, 6, 7, 8]);

        device.release().done();
    }

    #[test]
    fn test_ieee_addr_wrong_length() {
        let mut device = setup_device(&[]);

        assert_eq!(
            device.set_ieee_addr(&[0; 6]),
            Err(Error::InvalidIdentifierLength {
                expected: 8,
                actual: 6,
            })
        );

        device.release().done();
    }

    #[test]
    fn test_set_channel_keeps_cca_mode() {
        let mut device = setup_device(&[read(0x08, 0xAB), write(0x08, 0x39)].concat());

        device.set_channel(25).unwrap();

        device.release().done();
    }

    #[test]
    fn test_channel_out_of_range() {
        let mut device = setup_device(&[]);

        assert_eq!(device.set_channel(10), Err(Error::InvalidChannel(10)));
        assert_eq!(device.set_channel(27), Err(Error::InvalidChannel(27)));

        device.release().done();
    }

    #[test]
    fn test_channel_masks_low_bits() {
        let mut device = setup_device(&read(0x08, 0x2B));

        assert_eq!(device.channel().unwrap(), 11);

        device.release().done();
    }

    #[test]
    fn test_status_and_irq() {
        let mut device = setup_device(&[read(0x01, 0xE8), read(0x01, 0x05), read(0x0F, 0x09)].concat());

        assert_eq!(device.status().unwrap(), TransceiverState::TrxOff);
        assert_eq!(device.status().unwrap(), TransceiverState::Unknown(0x05));
        assert_eq!(
            device.irq().unwrap(),
            IrqFlags::PLL_LOCK | IrqFlags::TRX_END
        );

        device.release().done();
    }

    #[test]
    fn test_state_and_mask_writes() {
        let mut device = setup_device(&[write(0x0E, 0x2C), write(0x02, 0x16), read(0x0E, 0x2C)].concat());

        device.set_irq_mask(IrqFlags::RECEIVE).unwrap();
        device.set_state(TrxCommand::RxAackOn).unwrap();
        assert_eq!(device.irq_mask().unwrap(), IrqFlags::RECEIVE);

        device.release().done();
    }

    #[test]
    fn test_enable_promiscuous() {
        let mut device = setup_device(
            &[
                write(0x17, 0x02),
                write(0x2E, 0x10),
                read(0x03, 0x09),
                write(0x03, 0x89),
            ]
            .concat(),
        );

        device.enable_promiscuous().unwrap();

        device.release().done();
    }
}
