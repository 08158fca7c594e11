//! Message classification
//!
//! Decides the kind of a received datagram from its length and its tag
//! byte. Field contents are never inspected here; parsing belongs to the
//! record codec.

use fieldbase_protocol::{MessageType, DATA_PACKET_SIZE};

/// Kind of an inbound datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageKind {
    /// Legacy untagged reading, recognized by length alone
    DataPacket,
    /// Tagged reading
    DataMessage,
    /// Operator text
    Text,
    /// Device registration request
    JoinRequest,
    /// Leaf node asking for the time
    TimeRequest,
    /// Anything else
    Unknown,
}

impl MessageKind {
    /// Human readable name used in reports
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::DataPacket => "data packet",
            MessageKind::DataMessage => "data message",
            MessageKind::Text => "text",
            MessageKind::JoinRequest => "join request",
            MessageKind::TimeRequest => "time request",
            MessageKind::Unknown => "unknown",
        }
    }
}

/// Classify a received datagram
///
/// `buf` holds exactly the received bytes. A datagram of exactly
/// [`DATA_PACKET_SIZE`] bytes is always a [`MessageKind::DataPacket`],
/// whatever its first byte says: legacy leaf nodes send that record without
/// a tag. Every other length is classified by the tag byte. Time responses
/// only travel away from the base station, so receiving one is `Unknown`.
pub fn classify(buf: &[u8]) -> MessageKind {
    if buf.len() == DATA_PACKET_SIZE {
        return MessageKind::DataPacket;
    }

    match MessageType::peek(buf) {
        Some(MessageType::Data) => MessageKind::DataMessage,
        Some(MessageType::Text) => MessageKind::Text,
        Some(MessageType::JoinRequest) => MessageKind::JoinRequest,
        Some(MessageType::TimeRequest) => MessageKind::TimeRequest,
        Some(MessageType::TimeResponse) | None => MessageKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldbase_protocol::{
        DataMessage, Reading, TimeRequest, TimeResponse, MSG_DATA, MSG_JOIN_REQUEST, MSG_TEXT,
        MSG_TIME_REQUEST,
    };

    #[test]
    fn test_legacy_size_wins_over_tag() {
        let mut buf = [0u8; DATA_PACKET_SIZE];
        for tag in [0x00, MSG_DATA, MSG_TEXT, MSG_TIME_REQUEST, 0xFF] {
            buf[0] = tag;
            assert_eq!(classify(&buf), MessageKind::DataPacket);
        }
    }

    #[test]
    fn test_tagged_records() {
        let data = DataMessage::new(Reading::default()).to_bytes();
        assert_eq!(classify(&data), MessageKind::DataMessage);

        let mut req = [0u8; 2];
        TimeRequest::new(3).encode(&mut req).unwrap();
        assert_eq!(classify(&req), MessageKind::TimeRequest);

        assert_eq!(classify(&[MSG_TEXT; 66]), MessageKind::Text);
        assert_eq!(classify(&[MSG_JOIN_REQUEST; 9]), MessageKind::JoinRequest);
    }

    #[test]
    fn test_tag_only_ignores_length() {
        // Short tagged buffers still classify by tag; parsing catches them
        assert_eq!(classify(&[MSG_DATA]), MessageKind::DataMessage);
        assert_eq!(classify(&[MSG_TIME_REQUEST, 0, 0, 0]), MessageKind::TimeRequest);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(classify(&[]), MessageKind::Unknown);
        assert_eq!(classify(&[0x00, 1, 2]), MessageKind::Unknown);
        assert_eq!(classify(&[0x7f; 30]), MessageKind::Unknown);
        assert_eq!(
            classify(&TimeResponse::new(0, 1).to_bytes()),
            MessageKind::Unknown
        );
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(MessageKind::DataPacket.as_str(), "data packet");
        assert_eq!(MessageKind::DataMessage.as_str(), "data message");
        assert_eq!(MessageKind::TimeRequest.as_str(), "time request");
        assert_eq!(MessageKind::Unknown.as_str(), "unknown");
    }
}
