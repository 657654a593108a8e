#![cfg_attr(not(test), no_std)]
//! AT86RF2xx Radio Driver
//!
//! This crate provides a register level driver for the Microchip (formerly
//! Atmel) AT86RF233 and AT86RF231 IEEE 802.15.4 transceivers, and a polling
//! receive loop that turns the chip into a promiscuous frame sniffer.
//!
//! # Features
//! - 2.4 GHz O-QPSK, channels 11-26
//! - Register access over SPI, one transaction per register byte
//! - Typed access to short address, PAN id, IEEE address and channel
//! - Transceiver state and interrupt decoding
//! - Frame buffer reads
//! - Blocking and async (`embedded-hal-async`) register access
//!
//! # Architecture
//! The driver is organized in layers, each one only talking to the one below:
//!
//! - [`bus`]: one exclusive SPI transaction per access, command byte encoding
//! - [`interface`]: single and auto-incrementing register reads/writes, frame
//!   reads, the transfer buffer
//! - [`device`]: typed accessors, identity check and hardware bring-up
//! - [`sniffer`]: the receive loop walking the transceiver state machine
//!
//! Register addresses and chip identity come from a [`Chip`] description
//! ([`config`]), register value encodings live in [`registers`].
//!
//! # Logging
//! Enable the `defmt` or `log` feature to get driver logs through the
//! respective backend.
//!
//! # Example
//! ```no_run
//! use at86rf2xx::{Device, Sniffer, SnifferConfig, AT86RF233};
//! # fn demo<SPI, D>(spi: SPI, mut delay: D) -> Result<(), at86rf2xx::Error>
//! # where SPI: embedded_hal::spi::SpiDevice, D: embedded_hal::delay::DelayNs {
//!
//! let device = Device::new(spi, &mut delay, &AT86RF233)?;
//! let mut sniffer = Sniffer::new(device, SnifferConfig::default());
//! sniffer.configure()?;
//!
//! let mut sink = |frame: &[u8]| {
//!     // forward the frame to the host
//! };
//! sniffer.run(&mut sink, &mut delay, || false)?;
//! # Ok(()) }
//! ```

#[macro_use]
mod logging;

pub mod bus;
pub mod config;
pub mod device;
pub mod error;
pub mod interface;
pub mod registers;
pub mod sniffer;

pub use config::{Chip, RegisterMap, SnifferConfig, AT86RF231, AT86RF233};
pub use device::{Device, NoPin};
pub use error::{Error, Result};
pub use interface::Interface;
pub use registers::{IrqFlags, TransceiverState, TrxCommand};
pub use sniffer::{FrameSink, PollReport, Sniffer};
