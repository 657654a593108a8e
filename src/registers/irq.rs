//! Interrupt flags (IRQ_MASK / IRQ_STATUS)
//!
//! Both registers share one bit layout. Reading IRQ_STATUS clears it on the
//! chip, so each read reports the events since the previous read.

use bitflags::bitflags;
use core::convert::Infallible;

use regiface::{FromByteArray, ToByteArray};

bitflags! {
    /// Interrupt sources of the transceiver.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct IrqFlags: u8 {
        /// IRQ_0: PLL locked
        const PLL_LOCK = 1 << 0;
        /// IRQ_1: PLL unlocked
        const PLL_UNLOCK = 1 << 1;
        /// IRQ_2: start of a PSDU reception, frame buffer readable
        const RX_START = 1 << 2;
        /// IRQ_3: end of frame reception or transmission
        const TRX_END = 1 << 3;
        /// IRQ_4: wake-up finished (shared with CCA_ED_DONE)
        const AWAKE_END = 1 << 4;
        /// IRQ_5: address match
        const AMI = 1 << 5;
        /// IRQ_6: frame buffer under-run
        const TRX_UR = 1 << 6;
        /// IRQ_7: battery low
        const BAT_LOW = 1 << 7;
    }
}

impl IrqFlags {
    /// Sources enabled while receiving.
    pub const RECEIVE: Self = Self::RX_START.union(Self::TRX_END).union(Self::AMI);
}

impl FromByteArray for IrqFlags {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self::from_bits_retain(bytes[0]))
    }
}

impl ToByteArray for IrqFlags {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.bits()])
    }
}
