//! Register value definitions for the AT86RF2xx transceivers
//!
//! Register addresses are not fixed here, they come from the chip's
//! [`RegisterMap`](crate::config::RegisterMap). This module only describes how
//! the values stored in those registers are encoded.

mod control;
mod irq;
mod state;

pub use control::*;
pub use irq::*;
pub use state::*;

/// Address of a register. Only the low 6 bits reach the chip.
pub type RegisterAddress = u8;

/// Mask applied to every register address before it goes on the wire.
pub const ADDRESS_MASK: u8 = 0x3F;

/// Number of addressable registers.
pub const REGISTER_SPACE: usize = 64;
