//! Record type tags
//!
//! Tagged records carry their type in the first byte. The legacy data
//! packet has no tag and is identified by length elsewhere.

/// Byte offset of the type tag in every tagged record
pub const TAG_OFFSET: usize = 0;

// Record type tags: leaf node → base station
pub const MSG_DATA: u8 = 0x01;
pub const MSG_TEXT: u8 = 0x02;
pub const MSG_JOIN_REQUEST: u8 = 0x03;
pub const MSG_TIME_REQUEST: u8 = 0x04;

// Record type tags: base station → leaf node
pub const MSG_TIME_RESPONSE: u8 = 0x05;

/// Type of a tagged record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageType {
    /// Sensor reading with explicit tag
    Data,
    /// Free-form operator text
    Text,
    /// Device asking to be registered
    JoinRequest,
    /// Leaf node asking for the current time
    TimeRequest,
    /// Base station's answer to a time request
    TimeResponse,
}

impl MessageType {
    /// Map a tag byte to a record type
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            MSG_DATA => Some(MessageType::Data),
            MSG_TEXT => Some(MessageType::Text),
            MSG_JOIN_REQUEST => Some(MessageType::JoinRequest),
            MSG_TIME_REQUEST => Some(MessageType::TimeRequest),
            MSG_TIME_RESPONSE => Some(MessageType::TimeResponse),
            _ => None,
        }
    }

    /// Get the tag byte for this record type
    pub fn tag(self) -> u8 {
        match self {
            MessageType::Data => MSG_DATA,
            MessageType::Text => MSG_TEXT,
            MessageType::JoinRequest => MSG_JOIN_REQUEST,
            MessageType::TimeRequest => MSG_TIME_REQUEST,
            MessageType::TimeResponse => MSG_TIME_RESPONSE,
        }
    }

    /// Read the tag at [`TAG_OFFSET`] of `buf`
    pub fn peek(buf: &[u8]) -> Option<Self> {
        buf.get(TAG_OFFSET).copied().and_then(Self::from_tag)
    }
}
