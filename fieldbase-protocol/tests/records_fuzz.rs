use fieldbase_protocol::{
    DataMessage, DataPacket, JoinRequest, Reading, TextMessage, TimeRequest, TimeResponse,
    DATA_PACKET_SIZE, TEXT_LEN,
};
use proptest::prelude::*;

fn reading() -> impl Strategy<Value = Reading> {
    (
        any::<u8>(),
        any::<u32>(),
        any::<u32>(),
        any::<u16>(),
        any::<u16>(),
        any::<i16>(),
        any::<u16>(),
        any::<u8>(),
    )
        .prop_map(
            |(node, message, time, battery, last_tx_duration, temp, humidity, status)| Reading {
                node,
                message,
                time,
                battery,
                last_tx_duration,
                temp,
                humidity,
                status,
            },
        )
}

proptest! {
    #[test]
    fn parse_arbitrary_bytes_never_panics(buf in proptest::collection::vec(any::<u8>(), 0..80)) {
        let _ = DataPacket::parse(&buf);
        let _ = DataMessage::parse(&buf);
        let _ = TextMessage::parse(&buf);
        let _ = JoinRequest::parse(&buf);
        let _ = TimeRequest::parse(&buf);
        let _ = TimeResponse::parse(&buf);
    }

    #[test]
    fn data_packet_is_message_without_tag(r in reading()) {
        let packet = DataPacket::new(r).to_bytes();
        let message = DataMessage::new(r).to_bytes();
        prop_assert_eq!(packet.len(), DATA_PACKET_SIZE);
        prop_assert_eq!(&message[1..], &packet[..]);
        prop_assert_eq!(DataPacket::parse(&packet).unwrap().reading, r);
    }

    #[test]
    fn data_text_fits(r in reading()) {
        // Both forms must fit without truncation
        let plain = r.to_text(false);
        let pretty = r.to_text(true);
        let plain_tail = format!("0x{:02x}", r.status);
        let pretty_tail = format!("status: 0x{:02x}", r.status);
        prop_assert!(plain.ends_with(&plain_tail), "{} !~ {}", plain, plain_tail);
        prop_assert!(pretty.ends_with(&pretty_tail), "{} !~ {}", pretty, pretty_tail);
    }

    #[test]
    fn text_message_keeps_ascii(text in "[ -~]{0,64}") {
        let msg = TextMessage::new(2, &text);
        let mut buf = [0u8; 66];
        msg.encode(&mut buf).unwrap();
        let parsed = TextMessage::parse(&buf).unwrap();
        prop_assert_eq!(parsed.text.as_str(), text.as_str());
        prop_assert!(parsed.text.len() <= TEXT_LEN);
    }
}
