//! Chip descriptions and driver configuration
//!
//! A [`Chip`] bundles everything that differs between members of the AT86RF2xx
//! family: the identity the chip reports, the width of its IEEE address, the
//! channel page it supports and the addresses of the registers the driver
//! touches. The register access layer and the receive loop only ever look up
//! addresses through the [`RegisterMap`], so supporting another revision is a
//! matter of adding another `Chip` static.

use core::ops::RangeInclusive;

use crate::registers::{IrqFlags, RegisterAddress};

/// Addresses of the registers used by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterMap {
    /// TRX_STATUS, transceiver state in bits 4:0
    pub trx_status: RegisterAddress,
    /// TRX_STATE, state-control command register
    pub trx_state: RegisterAddress,
    /// TRX_CTRL_0
    pub trx_ctrl_0: RegisterAddress,
    /// PHY_CC_CCA, channel in bits 4:0
    pub phy_cc_cca: RegisterAddress,
    /// IRQ_MASK
    pub irq_mask: RegisterAddress,
    /// IRQ_STATUS
    pub irq_status: RegisterAddress,
    /// XAH_CTRL_1
    pub xah_ctrl_1: RegisterAddress,
    /// CSMA_SEED_1
    pub csma_seed_1: RegisterAddress,
    /// PART_NUM
    pub part_num: RegisterAddress,
    /// VERSION_NUM
    pub version_num: RegisterAddress,
    /// SHORT_ADDR_0, two bytes
    pub short_addr: RegisterAddress,
    /// PAN_ID_0, two bytes
    pub pan_id: RegisterAddress,
    /// IEEE_ADDR_0, [`Chip::ieee_addr_len`] bytes
    pub ieee_addr: RegisterAddress,
}

/// Register layout shared by the 2.4 GHz members of the family.
pub const AT86RF2XX_REGISTERS: RegisterMap = RegisterMap {
    trx_status: 0x01,
    trx_state: 0x02,
    trx_ctrl_0: 0x03,
    phy_cc_cca: 0x08,
    irq_mask: 0x0E,
    irq_status: 0x0F,
    xah_ctrl_1: 0x17,
    csma_seed_1: 0x2E,
    part_num: 0x1C,
    version_num: 0x1D,
    short_addr: 0x20,
    pan_id: 0x22,
    ieee_addr: 0x24,
};

/// Description of one chip revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip {
    /// Human readable part name
    pub name: &'static str,
    /// Expected content of PART_NUM
    pub part_number: u8,
    /// Expected content of VERSION_NUM
    pub version_number: u8,
    /// Width of the extended (IEEE) address in bytes
    pub ieee_addr_len: usize,
    /// Valid channel numbers
    pub channels: RangeInclusive<u8>,
    /// Register addresses
    pub registers: RegisterMap,
}

impl Chip {
    /// Returns true if `channel` is valid for this chip.
    pub fn supports_channel(&self, channel: u8) -> bool {
        self.channels.contains(&channel)
    }
}

/// AT86RF233, revision B.
pub static AT86RF233: Chip = Chip {
    name: "AT86RF233",
    part_number: 0x0B,
    version_number: 0x02,
    ieee_addr_len: 8,
    channels: 11..=26,
    registers: AT86RF2XX_REGISTERS,
};

/// AT86RF231, revision A.
pub static AT86RF231: Chip = Chip {
    name: "AT86RF231",
    part_number: 0x03,
    version_number: 0x02,
    ieee_addr_len: 8,
    channels: 11..=26,
    registers: AT86RF2XX_REGISTERS,
};

/// Longest IEEE address any supported chip stores.
pub const MAX_IEEE_ADDR_LEN: usize = 8;

/// Configuration for the receive loop.
#[derive(Debug, Clone)]
pub struct SnifferConfig {
    /// Channel to listen on.
    pub channel: u8,
    /// Short address programmed before listening.
    pub short_addr: u16,
    /// PAN identifier programmed before listening.
    pub pan_id: u16,
    /// IEEE address programmed before listening.
    pub ieee_addr: [u8; MAX_IEEE_ADDR_LEN],
    /// Accept every frame and never acknowledge.
    pub promiscuous: bool,
    /// IRQ flags that trigger a frame read.
    ///
    /// Defaults to RX_START (0x04), the bit the sniffer has always captured
    /// on. TRX_END waits for the whole frame to be in the buffer.
    pub capture_on: IrqFlags,
    /// Emit a state/IRQ snapshot every this many polls. Zero disables it.
    pub diagnostic_every: u32,
    /// Delay between polls in microseconds.
    pub poll_interval_us: u32,
}

impl Default for SnifferConfig {
    fn default() -> Self {
        Self {
            channel: 25,
            short_addr: 0,
            pan_id: 0,
            ieee_addr: [0; MAX_IEEE_ADDR_LEN],
            promiscuous: true,
            capture_on: IrqFlags::RX_START,
            diagnostic_every: 0,
            poll_interval_us: 0,
        }
    }
}
