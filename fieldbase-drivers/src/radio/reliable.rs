//! Reliable datagrams
//!
//! Every frame starts with a four byte header:
//!
//! ```text
//! ┌────┬──────┬────┬───────┬─────────────┐
//! │ TO │ FROM │ ID │ FLAGS │ PAYLOAD     │
//! │ 1B │ 1B   │ 1B │ 1B    │ 0–251B      │
//! └────┴──────┴────┴───────┴─────────────┘
//! ```
//!
//! Frames addressed to this node are acknowledged with a one byte `!`
//! frame carrying the same ID and the ACK flag. Retransmissions carry the
//! RETRY flag so the receiver can drop repeats it has already seen while
//! still acknowledging them. Broadcasts are neither acknowledged nor
//! retried.

use embedded_hal_async::delay::DelayNs;
use fieldbase_hal::{
    AckPolicy, DeliveryReport, LinkStats, RadioError, RadioTransport, Received,
    BROADCAST_ADDRESS, MAX_MESSAGE_LEN,
};

use super::{Modem, MAX_FRAME_LEN};

/// Bytes of addressing before the payload
pub const HEADER_LEN: usize = 4;

/// Frame is an acknowledgement
pub const FLAG_ACK: u8 = 0x80;

/// Frame is a retransmission
pub const FLAG_RETRY: u8 = 0x40;

const ACK_PAYLOAD: u8 = b'!';

/// Longest time a single transmission may take (ms)
const TX_TIMEOUT_MS: u32 = 5_000;

/// Polling interval while waiting on the modem (ms)
const POLL_MS: u32 = 1;

/// Reliable datagram manager over a [`Modem`]
pub struct ReliableDatagram<M, D> {
    modem: M,
    delay: D,
    address: u8,
    sequence: u8,
    /// Last ID seen from each sender
    seen_ids: [u8; 256],
    retransmissions: u32,
    frame: [u8; MAX_FRAME_LEN],
    /// Length of an accepted frame in `frame` not yet received
    pending: Option<usize>,
}

impl<M: Modem, D: DelayNs> ReliableDatagram<M, D> {
    /// Manage `modem` as node `address`
    pub fn new(modem: M, delay: D, address: u8) -> Self {
        Self {
            modem,
            delay,
            address,
            sequence: 0,
            seen_ids: [0; 256],
            retransmissions: 0,
            frame: [0; MAX_FRAME_LEN],
            pending: None,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn modem_mut(&mut self) -> &mut M {
        &mut self.modem
    }

    fn is_for_us(&self, frame: &[u8]) -> bool {
        frame.len() >= HEADER_LEN && (frame[0] == self.address || frame[0] == BROADCAST_ADDRESS)
    }

    /// Poll the modem once, keeping the frame if it is a datagram for us
    ///
    /// Returns the header instead if the frame is an acknowledgement.
    fn poll_frame(&mut self) -> Option<[u8; HEADER_LEN]> {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = match self.modem.poll_receive(&mut buf) {
            Ok(Some(len)) => len,
            _ => return None,
        };
        if !self.is_for_us(&buf[..len]) {
            return None;
        }
        if buf[3] & FLAG_ACK != 0 {
            return Some([buf[0], buf[1], buf[2], buf[3]]);
        }
        // Keep only the first waiting datagram
        if self.pending.is_none() {
            self.frame[..len].copy_from_slice(&buf[..len]);
            self.pending = Some(len);
        }
        None
    }

    /// Wait for the modem to finish sending, returning the time waited (ms)
    async fn wait_tx_done(&mut self) -> Result<u32, RadioError> {
        let mut waited = 0;
        while !self.modem.tx_done()? {
            if waited >= TX_TIMEOUT_MS {
                return Err(RadioError::TxTimeout);
            }
            self.delay.delay_ms(POLL_MS).await;
            waited += POLL_MS;
        }
        Ok(waited)
    }

    async fn send_ack(&mut self, to: u8, id: u8) {
        let ack = [to, self.address, id, FLAG_ACK, ACK_PAYLOAD];
        if self.modem.transmit(&ack).is_ok() {
            let _ = self.wait_tx_done().await;
        }
        let _ = self.modem.start_receive();
    }
}

impl<M: Modem, D: DelayNs> RadioTransport for ReliableDatagram<M, D> {
    fn available(&mut self) -> bool {
        if self.pending.is_none() {
            let _ = self.poll_frame();
        }
        self.pending.is_some()
    }

    async fn receive(&mut self, buf: &mut [u8]) -> Option<Received> {
        if !self.available() {
            return None;
        }
        let len = self.pending.take()?;
        let [to, from, id, flags] = [self.frame[0], self.frame[1], self.frame[2], self.frame[3]];

        let n = (len - HEADER_LEN).min(buf.len()).min(MAX_MESSAGE_LEN);
        buf[..n].copy_from_slice(&self.frame[HEADER_LEN..HEADER_LEN + n]);

        if to != BROADCAST_ADDRESS {
            self.send_ack(from, id).await;
        }

        // A repeat of what we already have: acknowledged again, not delivered
        let slot = &mut self.seen_ids[usize::from(from)];
        if *slot == id && flags & FLAG_RETRY != 0 {
            return None;
        }
        *slot = id;

        Some(Received {
            len: n,
            from,
            to,
            id,
            flags,
        })
    }

    async fn send_and_wait_ack(
        &mut self,
        payload: &[u8],
        to: u8,
        policy: AckPolicy,
    ) -> DeliveryReport {
        let mut elapsed_ms = 0;
        if payload.len() > MAX_MESSAGE_LEN {
            return DeliveryReport {
                acked: false,
                elapsed_ms,
            };
        }

        self.sequence = self.sequence.wrapping_add(1);
        let id = self.sequence;

        let mut frame = [0u8; MAX_FRAME_LEN];
        let len = HEADER_LEN + payload.len();
        frame[..HEADER_LEN].copy_from_slice(&[to, self.address, id, 0]);
        frame[HEADER_LEN..len].copy_from_slice(payload);

        for attempt in 0..=policy.retries {
            if attempt > 0 {
                frame[3] |= FLAG_RETRY;
                self.retransmissions += 1;
            }

            if self.modem.transmit(&frame[..len]).is_err() {
                continue;
            }
            match self.wait_tx_done().await {
                Ok(ms) => elapsed_ms += ms,
                Err(_) => {
                    elapsed_ms += TX_TIMEOUT_MS;
                    continue;
                }
            }
            let _ = self.modem.start_receive();

            if to == BROADCAST_ADDRESS {
                return DeliveryReport {
                    acked: true,
                    elapsed_ms,
                };
            }

            let mut waited = 0;
            while waited < policy.timeout_ms {
                if let Some([_, from, ack_id, _]) = self.poll_frame() {
                    if from == to && ack_id == id {
                        return DeliveryReport {
                            acked: true,
                            elapsed_ms: elapsed_ms + waited,
                        };
                    }
                }
                self.delay.delay_ms(POLL_MS).await;
                waited += POLL_MS;
            }
            elapsed_ms += waited;
        }

        DeliveryReport {
            acked: false,
            elapsed_ms,
        }
    }

    fn retransmissions(&self) -> u32 {
        self.retransmissions
    }

    fn reset_retransmissions(&mut self) {
        self.retransmissions = 0;
    }

    fn link_stats(&self) -> LinkStats {
        self.modem.link_stats()
    }
}
