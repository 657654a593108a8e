//! Promiscuous receive loop
//!
//! The [`Sniffer`] polls TRX_STATUS and IRQ_STATUS and walks the transceiver
//! from power-on into RX_AACK_ON, then hands every captured frame to a
//! [`FrameSink`].
//!
//! # Poll Actions
//! Every poll evaluates all four rows, so more than one can fire at once:
//!
//! | Observed            | Action                                                |
//! |---------------------|-------------------------------------------------------|
//! | state P_ON          | IRQ_MASK = AWAKE_END, request TRX_OFF                 |
//! | state TRX_OFF       | IRQ_MASK = PLL_LOCK, request TX_ON                    |
//! | IRQ PLL_LOCK        | IRQ_MASK = RX_START, TRX_END, AMI, request RX_AACK_ON |
//! | IRQ capture trigger | read the frame buffer, deliver it to the sink         |
//!
//! The loop never retries: a bus error ends it, and the owner restarts it. The
//! next successful poll re-reads the real chip state and issues the right
//! transition again.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::SnifferConfig;
use crate::device::{Device, NoPin};
use crate::error::{Error, Result};
use crate::registers::{IrqFlags, TransceiverState, TrxCommand};

/// Destination for captured frames.
///
/// Delivery is best effort, a sink cannot fail the loop.
pub trait FrameSink {
    /// Receives one frame. The slice is only valid for the duration of the call.
    fn deliver(&mut self, frame: &[u8]);
}

impl<F> FrameSink for F
where
    F: FnMut(&[u8]),
{
    fn deliver(&mut self, frame: &[u8]) {
        self(frame)
    }
}

/// What a single poll observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    /// Transceiver state read at the start of the poll
    pub state: TransceiverState,
    /// Interrupt flags read at the start of the poll
    pub irq: IrqFlags,
    /// Length of the frame delivered during this poll
    pub frame_len: Option<usize>,
}

/// Receive loop driving a [`Device`].
pub struct Sniffer<SPI, LED = NoPin> {
    device: Device<SPI>,
    led: LED,
    config: SnifferConfig,
    polls: u32,
}

impl<SPI> Sniffer<SPI, NoPin> {
    /// Creates a sniffer without an activity indicator.
    pub fn new(device: Device<SPI>, config: SnifferConfig) -> Self {
        Self::with_indicator(device, NoPin, config)
    }
}

impl<SPI, LED> Sniffer<SPI, LED> {
    /// Creates a sniffer that raises `led` while a frame is being read.
    pub fn with_indicator(device: Device<SPI>, led: LED, config: SnifferConfig) -> Self {
        Self {
            device,
            led,
            config,
            polls: 0,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &SnifferConfig {
        &self.config
    }

    /// Number of polls run so far.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Gives access to the device between polls.
    pub fn device_mut(&mut self) -> &mut Device<SPI> {
        &mut self.device
    }

    /// Releases the device and the activity indicator.
    pub fn release(self) -> (Device<SPI>, LED) {
        (self.device, self.led)
    }
}

impl<SPI, LED> Sniffer<SPI, LED>
where
    SPI: embedded_hal::spi::SpiDevice,
    LED: OutputPin,
{
    /// Programs channel, addresses and frame filter from the configuration.
    ///
    /// # Errors
    /// * `Error::InvalidChannel` - configured channel is not supported
    /// * `Error::InvalidIdentifierLength` - configured IEEE address width
    ///   differs from the chip's; checked before anything is written
    /// * `Error::Bus` - SPI communication failed
    pub fn configure(&mut self) -> Result<()> {
        let expected = self.device.chip().ieee_addr_len;
        let actual = self.config.ieee_addr.len();
        if actual != expected {
            return Err(Error::InvalidIdentifierLength { expected, actual });
        }

        self.device.set_channel(self.config.channel)?;
        self.device.set_short_addr(self.config.short_addr)?;
        self.device.set_pan_id(self.config.pan_id)?;
        self.device.set_ieee_addr(&self.config.ieee_addr)?;
        if self.config.promiscuous {
            self.device.enable_promiscuous()?;
        }

        info!(
            "listening on channel {}, promiscuous: {}",
            self.config.channel, self.config.promiscuous
        );
        Ok(())
    }

    /// Runs one iteration of the receive state machine.
    pub fn poll<S>(&mut self, sink: &mut S) -> Result<PollReport>
    where
        S: FrameSink + ?Sized,
    {
        let state = self.device.status()?;
        let irq = self.device.irq()?;

        self.polls = self.polls.wrapping_add(1);
        let every = self.config.diagnostic_every;
        if every != 0 && self.polls % every == 0 {
            info!(
                "poll {}: state {:?}, irq {:#x}",
                self.polls,
                state,
                irq.bits()
            );
        }

        if state == TransceiverState::PowerOn {
            debug!("P_ON, requesting TRX_OFF");
            self.device.set_irq_mask(IrqFlags::AWAKE_END)?;
            self.device.set_state(TrxCommand::TrxOff)?;
        }
        if state == TransceiverState::TrxOff {
            debug!("TRX_OFF, requesting TX_ON");
            self.device.set_irq_mask(IrqFlags::PLL_LOCK)?;
            self.device.set_state(TrxCommand::TxOn)?;
        }
        if irq.contains(IrqFlags::PLL_LOCK) {
            debug!("PLL locked, requesting RX_AACK_ON");
            self.device.set_irq_mask(IrqFlags::RECEIVE)?;
            self.device.set_state(TrxCommand::RxAackOn)?;
        }

        let mut frame_len = None;
        if irq.intersects(self.config.capture_on) {
            frame_len = Some(self.capture(sink)?);
        }

        Ok(PollReport {
            state,
            irq,
            frame_len,
        })
    }

    fn capture<S>(&mut self, sink: &mut S) -> Result<usize>
    where
        S: FrameSink + ?Sized,
    {
        self.led.set_high().map_err(Error::pin)?;
        let captured = self.device.read_frame().map(|frame| {
            sink.deliver(frame);
            frame.len()
        });
        self.led.set_low().map_err(Error::pin)?;

        let len = captured?;
        trace!("captured frame, {} bytes", len);
        Ok(len)
    }

    /// Polls until `should_stop` returns true.
    ///
    /// `should_stop` is checked between polls only, a poll in progress always
    /// completes. No timeout is applied to bus transactions: a wedged bus
    /// stalls the loop.
    ///
    /// # Errors
    /// The first error of any poll ends the loop and is returned unchanged.
    pub fn run<S, D, F>(&mut self, sink: &mut S, delay: &mut D, mut should_stop: F) -> Result<()>
    where
        S: FrameSink + ?Sized,
        D: DelayNs,
        F: FnMut() -> bool,
    {
        while !should_stop() {
            if let Err(err) = self.poll(sink) {
                error!("poll {} failed: {:?}", self.polls, err);
                return Err(err);
            }
            if self.config.poll_interval_us != 0 {
                delay.delay_us(self.config.poll_interval_us);
            }
        }
        Ok(())
    }
}
