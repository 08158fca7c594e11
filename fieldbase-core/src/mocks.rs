//! Host-side stand-ins for the station's peripherals

use fieldbase_display::{Color, DisplayError, DisplaySurface};
use fieldbase_hal::{
    AckPolicy, Clock, ClockError, DateTime, DeliveryReport, LinkStats, LogStorage, OutputPin,
    RadioTransport, Received, StorageError, MAX_MESSAGE_LEN,
};
use heapless::{Deque, String, Vec};

pub struct MockPin {
    pub high: bool,
    pub writes: u32,
}

impl MockPin {
    pub fn new() -> Self {
        Self {
            high: false,
            writes: 0,
        }
    }
}

impl OutputPin for MockPin {
    fn set_high(&mut self) {
        self.high = true;
        self.writes += 1;
    }

    fn set_low(&mut self) {
        self.high = false;
        self.writes += 1;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Init,
    Open,
    Write,
    Close,
}

pub struct MockStorage {
    pub ops: Vec<StorageOp, 64>,
    pub lines: Vec<String<160>, 16>,
    pub open_name: String<12>,
    pub fail_init: bool,
    pub fail_open: bool,
    pub fail_write: bool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            lines: Vec::new(),
            open_name: String::new(),
            fail_init: false,
            fail_open: false,
            fail_write: false,
        }
    }
}

impl LogStorage for MockStorage {
    fn init(&mut self) -> Result<(), StorageError> {
        let _ = self.ops.push(StorageOp::Init);
        if self.fail_init {
            return Err(StorageError::Init);
        }
        Ok(())
    }

    fn open_append(&mut self, name: &str) -> Result<(), StorageError> {
        let _ = self.ops.push(StorageOp::Open);
        if self.fail_open {
            return Err(StorageError::Open);
        }
        self.open_name.clear();
        let _ = self.open_name.push_str(name);
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), StorageError> {
        let _ = self.ops.push(StorageOp::Write);
        if self.fail_write {
            return Err(StorageError::Write);
        }
        let mut s = String::new();
        let _ = s.push_str(line);
        let _ = self.lines.push(s);
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        let _ = self.ops.push(StorageOp::Close);
        Ok(())
    }
}

pub struct MockClock {
    pub now: Result<DateTime, ClockError>,
    pub lost_power: bool,
    pub adjusted: Option<DateTime>,
}

impl MockClock {
    pub fn at(time: DateTime) -> Self {
        Self {
            now: Ok(time),
            lost_power: false,
            adjusted: None,
        }
    }
}

impl Clock for MockClock {
    fn now(&mut self) -> Result<DateTime, ClockError> {
        self.now
    }

    fn lost_power(&mut self) -> Result<bool, ClockError> {
        Ok(self.lost_power)
    }

    fn adjust(&mut self, time: DateTime) -> Result<(), ClockError> {
        self.adjusted = Some(time);
        self.now = Ok(time);
        self.lost_power = false;
        Ok(())
    }
}

pub struct Inbound {
    pub bytes: Vec<u8, MAX_MESSAGE_LEN>,
    pub from: u8,
    pub to: u8,
    pub id: u8,
    pub flags: u8,
}

pub struct Sent {
    pub bytes: Vec<u8, MAX_MESSAGE_LEN>,
    pub to: u8,
    pub policy: AckPolicy,
}

pub struct MockRadio {
    pub inbound: Deque<Inbound, 4>,
    pub sent: Vec<Sent, 4>,
    pub ack: bool,
    pub retries_per_send: u32,
    pub retransmissions: u32,
    pub drop_next: bool,
    pub stats: LinkStats,
}

impl MockRadio {
    pub fn new() -> Self {
        Self {
            inbound: Deque::new(),
            sent: Vec::new(),
            ack: true,
            retries_per_send: 0,
            retransmissions: 0,
            drop_next: false,
            stats: LinkStats {
                rssi_dbm: -71,
                snr_db: 9,
                rx_good: 5,
                rx_bad: 1,
            },
        }
    }

    pub fn push(&mut self, bytes: &[u8], from: u8) {
        let mut v = Vec::new();
        let _ = v.extend_from_slice(bytes);
        let _ = self.inbound.push_back(Inbound {
            bytes: v,
            from,
            to: 0,
            id: 7,
            flags: 0,
        });
    }
}

impl RadioTransport for MockRadio {
    fn available(&mut self) -> bool {
        !self.inbound.is_empty()
    }

    async fn receive(&mut self, buf: &mut [u8]) -> Option<Received> {
        let msg = self.inbound.pop_front()?;
        if self.drop_next {
            self.drop_next = false;
            return None;
        }
        buf[..msg.bytes.len()].copy_from_slice(&msg.bytes);
        Some(Received {
            len: msg.bytes.len(),
            from: msg.from,
            to: msg.to,
            id: msg.id,
            flags: msg.flags,
        })
    }

    async fn send_and_wait_ack(
        &mut self,
        payload: &[u8],
        to: u8,
        policy: AckPolicy,
    ) -> DeliveryReport {
        let mut bytes = Vec::new();
        let _ = bytes.extend_from_slice(payload);
        let _ = self.sent.push(Sent { bytes, to, policy });

        let retries = if self.ack {
            self.retries_per_send
        } else {
            u32::from(policy.retries)
        };
        self.retransmissions += retries;
        DeliveryReport {
            acked: self.ack,
            elapsed_ms: (retries + 1) * 100,
        }
    }

    fn retransmissions(&self) -> u32 {
        self.retransmissions
    }

    fn reset_retransmissions(&mut self) {
        self.retransmissions = 0;
    }

    fn link_stats(&self) -> LinkStats {
        self.stats
    }
}

/// Keeps the text printed since the last clear
pub struct MockPanel {
    pub printed: Vec<String<48>, 16>,
    pub clears: u32,
}

impl MockPanel {
    pub fn new() -> Self {
        Self {
            printed: Vec::new(),
            clears: 0,
        }
    }
}

impl DisplaySurface for MockPanel {
    fn clear_screen(&mut self, _color: Color) -> Result<(), DisplayError> {
        self.printed.clear();
        self.clears += 1;
        Ok(())
    }

    fn set_cursor(&mut self, _x: u16, _y: u16) {}

    fn set_text_color(&mut self, _color: Color) {}

    fn set_text_size(&mut self, _size: u8) {}

    fn draw_hline(&mut self, _x: u16, _y: u16, _w: u16, _c: Color) -> Result<(), DisplayError> {
        Ok(())
    }

    fn println(&mut self, text: &str) -> Result<(), DisplayError> {
        let mut s = String::new();
        let _ = s.push_str(text);
        let _ = self.printed.push(s);
        Ok(())
    }

    fn width(&self) -> u16 {
        160
    }
}
