//! Operator-facing report text
//!
//! Console summaries and the non-reading status panel lines.

use core::fmt::Write;

use fieldbase_display::DisplayLine;
use fieldbase_hal::{DeliveryReport, LinkStats, Received};
use fieldbase_protocol::TextMessage;
use heapless::String;

use crate::classify::MessageKind;

/// Capacity of a console report line
pub const REPORT_LEN: usize = 112;

/// One console report line
pub type ReportText = String<REPORT_LEN>;

/// Summary of a received datagram and its transport header
pub fn received_summary(meta: &Received, kind: MessageKind) -> ReportText {
    let mut s = ReportText::new();
    let _ = write!(
        s,
        "Received length: {}, from: 0x{:02x}, to: 0x{:02x}, id: 0x{:02x}, header: 0x{:02x}, type: {}",
        meta.len,
        meta.from,
        meta.to,
        meta.id,
        meta.flags,
        kind.as_str()
    );
    s
}

/// Signal quality and packet counters
pub fn link_summary(stats: &LinkStats) -> ReportText {
    let mut s = ReportText::new();
    let _ = write!(
        s,
        "RSSI {} dBm, SNR {} dB, good/bad packets: {}/{}",
        stats.rssi_dbm, stats.snr_db, stats.rx_good, stats.rx_bad
    );
    s
}

/// Result of a reliable reply
pub fn reply_summary(report: &DeliveryReport, retransmissions: u32) -> ReportText {
    let mut s = ReportText::new();
    let verdict = if report.acked {
        "sent a reply"
    } else {
        "reply failed"
    };
    let _ = write!(
        s,
        "...{}, {} retransmissions, {} ms",
        verdict, retransmissions, report.elapsed_ms
    );
    s
}

/// Panel line for an operator text message
pub fn text_line(msg: &TextMessage) -> DisplayLine {
    let mut s: String<{ fieldbase_display::LINE_LEN }> = String::new();
    let _ = write!(s, "{}: ", msg.node);
    for ch in msg.text.chars() {
        if s.push(ch).is_err() {
            break;
        }
    }
    DisplayLine::new(s.as_str())
}

/// Panel line announcing a time request from `node`
pub fn time_request_line(node: u8) -> DisplayLine {
    let mut s: String<24> = String::new();
    let _ = write!(s, "{} time request", node);
    DisplayLine::new(s.as_str())
}

/// Panel line with the outcome of the time reply to `node`
pub fn time_reply_line(node: u8, acked: bool) -> DisplayLine {
    let mut s: String<24> = String::new();
    let _ = if acked {
        write!(s, "{} response ack.", node)
    } else {
        write!(s, "{} no ack.", node)
    };
    DisplayLine::new(s.as_str())
}

/// Panel line when the clock could not be read for a reply
pub fn time_unavailable_line(node: u8) -> DisplayLine {
    let mut s: String<24> = String::new();
    let _ = write!(s, "{} no clock.", node);
    DisplayLine::new(s.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_received_summary() {
        let meta = Received {
            len: 19,
            from: 0x0a,
            to: 0x00,
            id: 0x2f,
            flags: 0x40,
        };
        assert_eq!(
            received_summary(&meta, MessageKind::DataMessage).as_str(),
            "Received length: 19, from: 0x0a, to: 0x00, id: 0x2f, header: 0x40, type: data message"
        );
    }

    #[test]
    fn test_worst_case_summary_fits() {
        let meta = Received {
            len: 251,
            from: 0xff,
            to: 0xff,
            id: 0xff,
            flags: 0xff,
        };
        let s = received_summary(&meta, MessageKind::DataMessage);
        assert!(s.ends_with("type: data message"));
    }

    #[test]
    fn test_link_summary() {
        let stats = LinkStats {
            rssi_dbm: -101,
            snr_db: -7,
            rx_good: 42,
            rx_bad: 3,
        };
        assert_eq!(
            link_summary(&stats).as_str(),
            "RSSI -101 dBm, SNR -7 dB, good/bad packets: 42/3"
        );
    }

    #[test]
    fn test_reply_summary() {
        let ok = DeliveryReport {
            acked: true,
            elapsed_ms: 87,
        };
        assert_eq!(
            reply_summary(&ok, 0).as_str(),
            "...sent a reply, 0 retransmissions, 87 ms"
        );

        let failed = DeliveryReport {
            acked: false,
            elapsed_ms: 1650,
        };
        assert_eq!(
            reply_summary(&failed, 3).as_str(),
            "...reply failed, 3 retransmissions, 1650 ms"
        );
    }

    #[test]
    fn test_panel_lines() {
        assert_eq!(time_request_line(4).as_str(), "4 time request");
        assert_eq!(time_reply_line(4, true).as_str(), "4 response ack.");
        assert_eq!(time_reply_line(4, false).as_str(), "4 no ack.");

        let msg = TextMessage::new(9, "battery swapped");
        assert_eq!(text_line(&msg).as_str(), "9: battery swapped");
    }
}
