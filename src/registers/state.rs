//! Transceiver state machine
//!
//! TRX_STATUS reports the current state in bits 4:0, TRX_STATE accepts state
//! change commands in the same bit positions. Both use the same ordinal space,
//! but not every ordinal is a valid state and not every state can be requested.

use core::convert::Infallible;

use regiface::{FromByteArray, ToByteArray};

/// Mask of the state field in TRX_STATUS and TRX_STATE.
pub const TRX_STATE_MASK: u8 = 0x1F;

/// State reported by TRX_STATUS.
///
/// Ordinals without a table entry decode to [`TransceiverState::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransceiverState {
    /// P_ON: power-on after VDD, clock running
    PowerOn,
    /// BUSY_RX
    BusyRx,
    /// BUSY_TX
    BusyTx,
    /// FORCE_TRX_OFF in progress
    ForceTrxOff,
    /// FORCE_TX_ON in progress
    ForceTxOn,
    /// RX_ON
    RxOn,
    /// SUCCESS
    Success,
    /// TRX_OFF: clock state, transceiver disabled
    TrxOff,
    /// TX_ON (PLL_ON): PLL locked, ready to transmit
    TxOn,
    /// SLEEP
    Sleep,
    /// PREP_DEEP_SLEEP
    PrepDeepSleep,
    /// BUSY_RX_AACK
    BusyRxAack,
    /// BUSY_TX_ARET
    BusyTxAret,
    /// RX_AACK_ON: receive with automatic acknowledgement
    RxAackOn,
    /// TX_ARET_ON
    TxAretOn,
    /// RX_ON_NOCLK
    RxOnNoClk,
    /// RX_AACK_ON_NOCLK
    RxAackOnNoClk,
    /// BUSY_RX_AACK_NOCLK
    BusyRxAackNoClk,
    /// STATE_TRANSITION_IN_PROGRESS
    Transition,
    /// Reserved ordinal
    Unknown(u8),
}

impl TransceiverState {
    /// Looks up a state from the low 5 bits of `value`.
    pub fn from_ordinal(value: u8) -> Self {
        match value & TRX_STATE_MASK {
            0x00 => Self::PowerOn,
            0x01 => Self::BusyRx,
            0x02 => Self::BusyTx,
            0x03 => Self::ForceTrxOff,
            0x04 => Self::ForceTxOn,
            0x06 => Self::RxOn,
            0x07 => Self::Success,
            0x08 => Self::TrxOff,
            0x09 => Self::TxOn,
            0x0F => Self::Sleep,
            0x10 => Self::PrepDeepSleep,
            0x11 => Self::BusyRxAack,
            0x12 => Self::BusyTxAret,
            0x16 => Self::RxAackOn,
            0x19 => Self::TxAretOn,
            0x1C => Self::RxOnNoClk,
            0x1D => Self::RxAackOnNoClk,
            0x1E => Self::BusyRxAackNoClk,
            0x1F => Self::Transition,
            reserved => Self::Unknown(reserved),
        }
    }

    /// Ordinal of the state in TRX_STATUS.
    pub fn ordinal(self) -> u8 {
        match self {
            Self::PowerOn => 0x00,
            Self::BusyRx => 0x01,
            Self::BusyTx => 0x02,
            Self::ForceTrxOff => 0x03,
            Self::ForceTxOn => 0x04,
            Self::RxOn => 0x06,
            Self::Success => 0x07,
            Self::TrxOff => 0x08,
            Self::TxOn => 0x09,
            Self::Sleep => 0x0F,
            Self::PrepDeepSleep => 0x10,
            Self::BusyRxAack => 0x11,
            Self::BusyTxAret => 0x12,
            Self::RxAackOn => 0x16,
            Self::TxAretOn => 0x19,
            Self::RxOnNoClk => 0x1C,
            Self::RxAackOnNoClk => 0x1D,
            Self::BusyRxAackNoClk => 0x1E,
            Self::Transition => 0x1F,
            Self::Unknown(value) => value & TRX_STATE_MASK,
        }
    }

    /// Returns true for reserved ordinals.
    pub fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl FromByteArray for TransceiverState {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self::from_ordinal(bytes[0]))
    }
}

/// State change command written to TRX_STATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrxCommand {
    /// No operation
    Nop = 0x00,
    /// Start transmission
    TxStart = 0x02,
    /// Abort any operation and go to TRX_OFF
    ForceTrxOff = 0x03,
    /// Abort any operation and go to PLL_ON
    ForcePllOn = 0x04,
    /// Basic receive mode
    RxOn = 0x06,
    /// Clock state, transceiver off
    TrxOff = 0x08,
    /// PLL_ON, also reported as TX_ON
    TxOn = 0x09,
    /// Prepare for deep sleep
    PrepDeepSleep = 0x10,
    /// Receive with automatic acknowledgement
    RxAackOn = 0x16,
    /// Transmit with automatic retry
    TxAretOn = 0x19,
}

impl TrxCommand {
    /// State the chip settles in once the command completes.
    pub fn target(self) -> TransceiverState {
        match self {
            Self::ForceTrxOff => TransceiverState::TrxOff,
            Self::ForcePllOn => TransceiverState::TxOn,
            other => TransceiverState::from_ordinal(other as u8),
        }
    }
}

impl ToByteArray for TrxCommand {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self as u8])
    }
}
