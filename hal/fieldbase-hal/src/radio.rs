//! Radio transport abstraction
//!
//! The base station sees the radio as a reliable datagram service: every
//! received datagram has already been acknowledged to its sender, and
//! outbound sends retry internally until acknowledged or out of budget.
//! Modulation, headers and retransmission timing belong to the implementor.

use core::future::Future;

/// Largest payload a single datagram can carry (255-byte FIFO minus the
/// 4-byte addressing header)
pub const MAX_MESSAGE_LEN: usize = 251;

/// Destination address that every node accepts
pub const BROADCAST_ADDRESS: u8 = 0xFF;

/// Transport metadata for one received datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Received {
    /// Number of payload bytes written into the caller's buffer
    pub len: usize,
    /// Sender address
    pub from: u8,
    /// Recipient address (ours or broadcast)
    pub to: u8,
    /// Sender's sequence id
    pub id: u8,
    /// Header flags byte
    pub flags: u8,
}

/// Acknowledgement budget for one outbound send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AckPolicy {
    /// How long to wait for an acknowledgement after each attempt
    pub timeout_ms: u32,
    /// Retransmissions after the first attempt
    pub retries: u8,
}

impl Default for AckPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 400,
            retries: 3,
        }
    }
}

/// Result of a reliable send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeliveryReport {
    /// True if the recipient acknowledged the datagram
    pub acked: bool,
    /// Wall time spent in the exchange, including retries
    pub elapsed_ms: u32,
}

/// Receiver quality figures for the most recent packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Received signal strength (dBm)
    pub rssi_dbm: i16,
    /// Signal-to-noise ratio (dB)
    pub snr_db: i8,
    /// Packets received with a valid CRC
    pub rx_good: u16,
    /// Packets dropped for CRC or header errors
    pub rx_bad: u16,
}

/// Errors from radio operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// Modem did not respond with the expected version
    NotFound,
    /// SPI transfer failed
    Bus,
    /// Payload does not fit in one datagram
    PayloadTooLarge,
    /// Transmission did not complete in time
    TxTimeout,
}

/// Reliable datagram radio
pub trait RadioTransport {
    /// Check whether a datagram is waiting to be received
    ///
    /// Never blocks; returns false when nothing has arrived.
    fn available(&mut self) -> bool;

    /// Receive one datagram into `buf`
    ///
    /// Acknowledges the sender as part of the call. Returns `None` if no
    /// datagram was ready, or if the datagram was a duplicate or not
    /// addressed to this node.
    fn receive(&mut self, buf: &mut [u8]) -> impl Future<Output = Option<Received>>;

    /// Send `payload` to `to` and wait for its acknowledgement
    ///
    /// Blocks the caller for at most `(retries + 1) * timeout_ms` plus
    /// transmit time.
    fn send_and_wait_ack(
        &mut self,
        payload: &[u8],
        to: u8,
        policy: AckPolicy,
    ) -> impl Future<Output = DeliveryReport>;

    /// Retransmissions performed since the last reset
    fn retransmissions(&self) -> u32;

    /// Reset the retransmission counter
    fn reset_retransmissions(&mut self);

    /// Signal quality of the last received packet and packet counters
    fn link_stats(&self) -> LinkStats;
}
