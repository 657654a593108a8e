//! PHY and frame filter control registers
//!
//! Covers the channel register and the bits the driver sets to turn the
//! transceiver into a promiscuous receiver.

use bitflags::bitflags;
use core::convert::Infallible;

use regiface::{FromByteArray, ToByteArray};

/// PHY_CC_CCA register
///
/// # Bit Layout
/// - Bit 7: CCA_REQUEST, writing 1 starts a manual CCA measurement
/// - Bits 6:5: CCA_MODE
/// - Bits 4:0: CHANNEL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhyCcCca {
    /// Start a CCA measurement on write
    pub cca_request: bool,
    /// CCA mode (0-3)
    pub cca_mode: u8,
    /// Channel number, 11-26 on the 2.4 GHz parts
    pub channel: u8,
}

impl PhyCcCca {
    /// Mask of the channel field.
    pub const CHANNEL_MASK: u8 = 0x1F;
}

impl FromByteArray for PhyCcCca {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            cca_request: bytes[0] & 0x80 != 0,
            cca_mode: (bytes[0] >> 5) & 0x03,
            channel: bytes[0] & Self::CHANNEL_MASK,
        })
    }
}

impl ToByteArray for PhyCcCca {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.cca_request as u8) << 7)
            | ((self.cca_mode & 0x03) << 5)
            | (self.channel & Self::CHANNEL_MASK)])
    }
}

bitflags! {
    /// TRX_CTRL_0 register
    ///
    /// Only the bits the driver changes are named, the clock output settings
    /// in the low nibble are carried through untouched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TrxCtrl0: u8 {
        /// Receive frames even while the frame buffer is being read (TOM mode)
        const TOM_EN = 1 << 7;
        /// Apply CLKM changes only after the next SLEEP cycle
        const CLKM_SHA_SEL = 1 << 3;
    }
}

bitflags! {
    /// XAH_CTRL_1 register
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct XahCtrl1: u8 {
        /// Promiscuous mode in RX_AACK_ON
        const AACK_PROM_MODE = 1 << 1;
        /// Reduced acknowledgement timing
        const AACK_ACK_TIME = 1 << 2;
        /// Upload reserved frame types
        const AACK_UPLD_RES_FT = 1 << 4;
        /// Filter reserved frame types
        const AACK_FLTR_RES_FT = 1 << 5;
    }
}

bitflags! {
    /// CSMA_SEED_1 register
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CsmaSeed1: u8 {
        /// Device is PAN coordinator
        const AACK_I_AM_COORD = 1 << 3;
        /// Never send acknowledgement frames
        const AACK_DIS_ACK = 1 << 4;
        /// Set frame pending bit in acknowledgements
        const AACK_SET_PD = 1 << 5;
    }
}

macro_rules! byte_flags {
    ($($name:ty),*) => {
        $(
            impl FromByteArray for $name {
                type Error = Infallible;
                type Array = [u8; 1];

                fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
                    Ok(Self::from_bits_retain(bytes[0]))
                }
            }

            impl ToByteArray for $name {
                type Error = Infallible;
                type Array = [u8; 1];

                fn to_bytes(self) -> Result<Self::Array, Self::Error> {
                    Ok([self.bits()])
                }
            }
        )*
    };
}

byte_flags!(TrxCtrl0, XahCtrl1, CsmaSeed1);
