//! LoRa radio
//!
//! Two layers:
//!
//! - [`Modem`]: raw frames in and out of a packet radio
//! - [`ReliableDatagram`]: addressing, acknowledgements, retries and
//!   duplicate suppression on top of any [`Modem`], wire compatible with
//!   RadioHead's `RHReliableDatagram`
//!
//! [`Sx1276`] is the modem found on RFM95 modules.

pub mod reliable;
pub mod sx1276;

pub use reliable::ReliableDatagram;
pub use sx1276::{ModemConfig, Sx1276};

use fieldbase_hal::{LinkStats, RadioError};

/// Largest frame the modem FIFO holds
pub const MAX_FRAME_LEN: usize = 255;

/// Packet radio moving whole frames
pub trait Modem {
    /// Load `frame` and start transmitting it
    fn transmit(&mut self, frame: &[u8]) -> Result<(), RadioError>;

    /// True once the last transmission has left the antenna
    fn tx_done(&mut self) -> Result<bool, RadioError>;

    /// Enter continuous receive
    fn start_receive(&mut self) -> Result<(), RadioError>;

    /// Take a received frame, if one is complete
    ///
    /// Frames that failed CRC are dropped and counted.
    fn poll_receive(&mut self, buf: &mut [u8; MAX_FRAME_LEN]) -> Result<Option<usize>, RadioError>;

    /// Signal quality of the last frame and packet counters
    fn link_stats(&self) -> LinkStats;
}
