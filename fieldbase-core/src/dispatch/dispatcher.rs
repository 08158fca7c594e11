//! The dispatcher
//!
//! Owns every collaborator of the receive path and runs one dispatch step
//! at a time. The caller loops on [`Dispatcher::step`] and reports each
//! [`StepOutcome`] on its console.
//!
//! Routing per kind:
//!
//! | Kind | Log | Panel | Reply |
//! |---|---|---|---|
//! | data packet / message | CSV reading | reading row | epoch, if `reply_to_data` |
//! | text | `node, text` | `node: text` | - |
//! | join request | - | - | - |
//! | time request | `node, time request` | request, then ack / no ack | time response |
//! | unknown or malformed | - | hex dump | - |

use fieldbase_display::{DisplayError, DisplayLine, DisplayRing, DisplaySurface, RING_CAPACITY};
use fieldbase_hal::{
    Clock, ClockError, DateTime, DeliveryReport, LinkStats, LogStorage, OutputPin,
    RadioTransport, Received, StorageError, MAX_MESSAGE_LEN,
};
use fieldbase_protocol::{
    CodecError, DataMessage, DataPacket, JoinRequest, Reading, RecordText, TextMessage,
    TimeRequest, TimeResponse,
};
use heapless::Vec;

use super::machine::{DispatchEvent, DispatchState};
use crate::bus::{BusArbiter, Peripheral};
use crate::classify::{classify, MessageKind};
use crate::config::StationConfig;
use crate::datalog::{DataLog, LogWrite};
use crate::report::{
    received_summary, reply_summary, text_line, time_reply_line, time_request_line,
    time_unavailable_line, ReportText,
};
use crate::time::{iso8601, IsoTime};

/// Result of the start-up sequence
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StartupReport {
    /// Storage bring-up and header write
    pub storage: Result<(), StorageError>,
    /// True if the clock was set to the build time
    pub clock_adjusted: Result<bool, ClockError>,
    /// Clock reading after start-up
    pub start_time: Result<IsoTime, ClockError>,
}

/// Result of one reliable reply
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReplyOutcome {
    /// Recipient address
    pub to: u8,
    pub delivery: DeliveryReport,
    /// Retransmissions the transport needed for this reply
    pub retransmissions: u32,
    /// Console line describing the reply
    pub summary: ReportText,
}

/// Everything one dispatch step did
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepOutcome {
    /// Transport header of the datagram
    pub received: Received,
    pub kind: MessageKind,
    /// Console line summarizing the datagram
    pub summary: ReportText,
    /// Clock reading when the datagram was handled
    pub time: Result<IsoTime, ClockError>,
    /// Labelled record text
    pub record: Option<RecordText>,
    /// Signal quality at receipt
    pub link: Option<LinkStats>,
    /// Data log write, if the kind is logged
    pub storage: Option<Result<LogWrite, StorageError>>,
    /// First panel error, if the kind is drawn
    pub display: Option<Result<(), DisplayError>>,
    pub reply: Option<ReplyOutcome>,
    /// Device EUI of a join request
    pub join_eui: Option<u64>,
    /// Set when a recognized kind failed to parse
    pub malformed: Option<CodecError>,
    /// Received bytes, kept for unknown and malformed datagrams only
    pub raw: Vec<u8, MAX_MESSAGE_LEN>,
}

impl StepOutcome {
    fn new(received: Received, kind: MessageKind, time: Result<IsoTime, ClockError>) -> Self {
        Self {
            received,
            kind,
            summary: received_summary(&received, kind),
            time,
            record: None,
            link: None,
            storage: None,
            display: None,
            reply: None,
            join_eui: None,
            malformed: None,
            raw: Vec::new(),
        }
    }

    /// Record a panel result, keeping the first error
    fn drew(&mut self, result: Result<(), DisplayError>) {
        if !matches!(self.display, Some(Err(_))) {
            self.display = Some(result);
        }
    }
}

/// Parsed form of a classified datagram
enum Parsed {
    Reading(Reading),
    Text(TextMessage),
    Join(JoinRequest),
    TimeRequest(TimeRequest),
    Raw(Option<CodecError>),
}

fn parse(kind: MessageKind, buf: &[u8]) -> Parsed {
    let parsed = match kind {
        MessageKind::DataPacket => DataPacket::parse(buf).map(|p| Parsed::Reading(p.reading)),
        MessageKind::DataMessage => DataMessage::parse(buf).map(|m| Parsed::Reading(m.reading)),
        MessageKind::Text => TextMessage::parse(buf).map(Parsed::Text),
        MessageKind::JoinRequest => JoinRequest::parse(buf).map(Parsed::Join),
        MessageKind::TimeRequest => TimeRequest::parse(buf).map(Parsed::TimeRequest),
        MessageKind::Unknown => Ok(Parsed::Raw(None)),
    };
    parsed.unwrap_or_else(|e| Parsed::Raw(Some(e)))
}

/// Base station receive-and-relay loop
pub struct Dispatcher<R, S, C, D, P, L, const N: usize = RING_CAPACITY> {
    radio: R,
    log: DataLog<S>,
    clock: C,
    ring: DisplayRing<D, N>,
    bus: BusArbiter<P>,
    status_led: L,
    config: StationConfig,
    state: DispatchState,
    rx: [u8; MAX_MESSAGE_LEN],
}

impl<R, S, C, D, P, L, const N: usize> Dispatcher<R, S, C, D, P, L, N>
where
    R: RadioTransport,
    S: LogStorage,
    C: Clock,
    D: DisplaySurface,
    P: OutputPin,
    L: OutputPin,
{
    pub fn new(
        radio: R,
        log: DataLog<S>,
        clock: C,
        ring: DisplayRing<D, N>,
        bus: BusArbiter<P>,
        mut status_led: L,
        config: StationConfig,
    ) -> Self {
        status_led.set_low();
        Self {
            radio,
            log,
            clock,
            ring,
            bus,
            status_led,
            config,
            state: DispatchState::Idle,
            rx: [0; MAX_MESSAGE_LEN],
        }
    }

    /// Bring up storage and set the clock
    ///
    /// The clock is set to `build_time` if it lost power, or on every boot
    /// when the configuration asks for it. Failures are reported, never
    /// fatal.
    pub fn start(&mut self, build_time: DateTime) -> StartupReport {
        let storage = self.log.init(&mut self.bus);
        self.bus.acquire_for(Peripheral::Radio);
        let clock_adjusted = self.sync_clock(build_time);
        let start_time = self.clock.now().map(|t| iso8601(&t));

        StartupReport {
            storage,
            clock_adjusted,
            start_time,
        }
    }

    fn sync_clock(&mut self, build_time: DateTime) -> Result<bool, ClockError> {
        let lost_power = self.clock.lost_power()?;
        if lost_power || self.config.clock.adjust_on_boot {
            self.clock.adjust(build_time)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Run one dispatch step
    ///
    /// Returns `None` straight away if no datagram is waiting. Otherwise
    /// handles exactly one datagram, including any reply, before
    /// returning. The status LED is lit while the datagram is handled.
    pub async fn step(&mut self) -> Option<StepOutcome> {
        self.bus.acquire_for(Peripheral::Radio);
        if !self.radio.available() {
            return None;
        }
        self.advance(DispatchEvent::DatagramAvailable);
        self.status_led.set_high();

        let received = self.radio.receive(&mut self.rx).await;
        let outcome = match received {
            Some(received) => Some(self.handle(received).await),
            None => {
                self.advance(DispatchEvent::ReceiveFailed);
                None
            }
        };

        self.status_led.set_low();
        outcome
    }

    async fn handle(&mut self, received: Received) -> StepOutcome {
        let len = received.len.min(MAX_MESSAGE_LEN);
        let kind = classify(&self.rx[..len]);
        self.advance(DispatchEvent::Classified(kind));

        let time = self.clock.now().map(|t| iso8601(&t));
        let mut outcome = StepOutcome::new(received, kind, time);

        self.advance(DispatchEvent::Routing);
        let parsed = parse(kind, &self.rx[..len]);
        match parsed {
            Parsed::Reading(reading) => self.route_reading(reading, &mut outcome).await,
            Parsed::Text(msg) => self.route_text(&msg, &mut outcome),
            Parsed::Join(req) => {
                outcome.record = Some(req.to_text(true));
                outcome.link = Some(self.radio.link_stats());
                outcome.join_eui = Some(req.dev_eui);
            }
            Parsed::TimeRequest(req) => self.route_time_request(req, &mut outcome).await,
            Parsed::Raw(error) => self.route_raw(len, error, &mut outcome),
        }

        self.bus.acquire_for(Peripheral::Radio);
        self.advance(DispatchEvent::RouteComplete);
        outcome
    }

    async fn route_reading(&mut self, reading: Reading, outcome: &mut StepOutcome) {
        outcome.record = Some(reading.to_text(true));
        outcome.link = Some(self.radio.link_stats());
        outcome.storage = Some(self.log.append(&mut self.bus, &reading.to_text(false)));
        self.bus.acquire_for(Peripheral::Radio);

        // Stamped with the time of drawing, not of receipt
        let now = self.clock.now();
        let stamp = now.unwrap_or_default();
        let line = DisplayLine::reading(&reading, stamp.minute(), stamp.second());
        outcome.drew(self.ring.append(line));

        if self.config.reply_to_data {
            if let Ok(now) = now {
                let payload = now.unixtime().to_le_bytes();
                outcome.reply = Some(self.reply(outcome.received.from, &payload).await);
            }
        }
    }

    fn route_text(&mut self, msg: &TextMessage, outcome: &mut StepOutcome) {
        outcome.record = Some(msg.to_text(true));
        outcome.link = Some(self.radio.link_stats());
        outcome.storage = Some(self.log.append(&mut self.bus, &msg.to_text(false)));
        self.bus.acquire_for(Peripheral::Radio);
        outcome.drew(self.ring.append(text_line(msg)));
    }

    async fn route_time_request(&mut self, req: TimeRequest, outcome: &mut StepOutcome) {
        outcome.record = Some(req.to_text(true));
        outcome.link = Some(self.radio.link_stats());
        outcome.storage = Some(self.log.append(&mut self.bus, &req.to_text(false)));
        self.bus.acquire_for(Peripheral::Radio);
        outcome.drew(self.ring.append(time_request_line(req.node)));

        let now = match self.clock.now() {
            Ok(now) => now,
            Err(_) => {
                outcome.drew(self.ring.append(time_unavailable_line(req.node)));
                return;
            }
        };

        let response = TimeResponse::new(self.config.address, now.unixtime());
        let reply = self.reply(outcome.received.from, &response.to_bytes()).await;
        outcome.drew(
            self.ring
                .append(time_reply_line(req.node, reply.delivery.acked)),
        );
        outcome.reply = Some(reply);
    }

    fn route_raw(&mut self, len: usize, error: Option<CodecError>, outcome: &mut StepOutcome) {
        let bytes = &self.rx[..len];
        outcome.malformed = error;
        let _ = outcome.raw.extend_from_slice(bytes);
        outcome.drew(self.ring.append(DisplayLine::hex_dump(bytes)));
    }

    /// Send `payload` reliably and reset the retransmission counter
    async fn reply(&mut self, to: u8, payload: &[u8]) -> ReplyOutcome {
        self.bus.acquire_for(Peripheral::Radio);
        let policy = self.config.radio.ack_policy();
        let delivery = self.radio.send_and_wait_ack(payload, to, policy).await;
        let retransmissions = self.radio.retransmissions();
        self.radio.reset_retransmissions();

        ReplyOutcome {
            to,
            delivery,
            retransmissions,
            summary: reply_summary(&delivery, retransmissions),
        }
    }

    fn advance(&mut self, event: DispatchEvent) {
        self.state = self.state.transition(event);
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn ring(&self) -> &DisplayRing<D, N> {
        &self.ring
    }

    pub fn log(&self) -> &DataLog<S> {
        &self.log
    }

    pub fn bus(&self) -> &BusArbiter<P> {
        &self.bus
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn status_led(&self) -> &L {
        &self.status_led
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockClock, MockPanel, MockPin, MockRadio, MockStorage, StorageOp};
    use embassy_futures::block_on;
    use fieldbase_protocol::{DATA_PACKET_SIZE, MSG_DATA, MSG_TIME_REQUEST, TEXT_MESSAGE_SIZE};

    type TestDispatcher = Dispatcher<MockRadio, MockStorage, MockClock, MockPanel, MockPin, MockPin, 4>;

    fn now() -> DateTime {
        DateTime::new(2023, 6, 25, 12, 10, 17).unwrap()
    }

    fn build_time() -> DateTime {
        DateTime::new(2024, 1, 2, 3, 4, 5).unwrap()
    }

    fn dispatcher_with(storage: MockStorage, config: StationConfig) -> TestDispatcher {
        let mut d = Dispatcher::new(
            MockRadio::new(),
            DataLog::new(storage, config.log_file.clone()),
            MockClock::at(now()),
            DisplayRing::new(MockPanel::new()),
            BusArbiter::new(MockPin::new(), MockPin::new()),
            MockPin::new(),
            config,
        );
        let report = d.start(build_time());
        assert_eq!(report.storage.is_ok(), d.log().is_healthy());
        d
    }

    fn dispatcher() -> TestDispatcher {
        dispatcher_with(MockStorage::new(), StationConfig::default())
    }

    fn ones() -> Reading {
        Reading {
            node: 1,
            message: 1,
            time: 1,
            battery: 1,
            last_tx_duration: 1,
            temp: 1,
            humidity: 1,
            status: 1,
        }
    }

    fn newest(d: &TestDispatcher) -> &str {
        d.ring().newest().map(|l| l.as_str()).unwrap_or("")
    }

    #[test]
    fn test_idle_step() {
        let mut d = dispatcher();
        assert_eq!(block_on(d.step()), None);
        assert_eq!(d.state(), DispatchState::Idle);
        assert!(d.status_led().is_set_low());
        assert_eq!(d.bus().current(), Some(Peripheral::Radio));
    }

    #[test]
    fn test_data_message_end_to_end() {
        let mut d = dispatcher();
        d.radio_mut().push(&DataMessage::new(ones()).to_bytes(), 1);

        let outcome = block_on(d.step()).unwrap();
        assert_eq!(outcome.kind, MessageKind::DataMessage);
        assert_eq!(outcome.time.as_ref().map(|t| t.as_str()), Ok("2023-06-25T12:10:17"));
        assert!(outcome
            .summary
            .ends_with("from: 0x01, to: 0x00, id: 0x07, header: 0x00, type: data message"));
        assert_eq!(outcome.storage, Some(Ok(LogWrite::Written)));
        assert_eq!(outcome.display, Some(Ok(())));
        assert_eq!(outcome.link, Some(d.radio().stats));
        assert!(outcome.reply.is_none());
        assert!(outcome.raw.is_empty());

        assert_eq!(d.ring().len(), 1);
        assert_eq!(newest(&d), "1 10:17 0.0 0 0.01 0x01");
        assert_eq!(
            d.log().storage().lines.last().map(|l| l.as_str()),
            Some("1, 1, 1, 0.01, 1, 0.01, 0.01, 0x01")
        );

        // Back on the radio, state machine idle, LED off again
        assert_eq!(d.bus().current(), Some(Peripheral::Radio));
        assert_eq!(d.state(), DispatchState::Idle);
        assert!(d.status_led().is_set_low());
        assert!(d.status_led().writes >= 3);
        assert!(d.radio().sent.is_empty());
    }

    #[test]
    fn test_legacy_length_beats_tag() {
        let mut d = dispatcher();
        let mut bytes = DataPacket::new(ones()).to_bytes();
        bytes[0] = MSG_TIME_REQUEST;
        d.radio_mut().push(&bytes, 5);

        let outcome = block_on(d.step()).unwrap();
        assert_eq!(outcome.received.len, DATA_PACKET_SIZE);
        assert_eq!(outcome.kind, MessageKind::DataPacket);
        assert!(d.radio().sent.is_empty());
        assert!(newest(&d).starts_with("4 10:17 "));
    }

    #[test]
    fn test_time_request_acked() {
        let mut d = dispatcher();
        d.radio_mut().retries_per_send = 1;
        let mut req = [0u8; 2];
        TimeRequest::new(4).encode(&mut req).unwrap();
        d.radio_mut().push(&req, 4);

        let outcome = block_on(d.step()).unwrap();
        assert_eq!(outcome.kind, MessageKind::TimeRequest);
        assert_eq!(outcome.storage, Some(Ok(LogWrite::Written)));

        let sent = &d.radio().sent[0];
        assert_eq!(sent.to, 4);
        assert_eq!(sent.policy, StationConfig::default().radio.ack_policy());
        assert_eq!(
            sent.bytes.as_slice(),
            &TimeResponse::new(0, now().unixtime()).to_bytes()
        );

        let reply = outcome.reply.unwrap();
        assert!(reply.delivery.acked);
        assert_eq!(reply.retransmissions, 1);
        assert_eq!(
            reply.summary.as_str(),
            "...sent a reply, 1 retransmissions, 200 ms"
        );
        assert_eq!(d.radio().retransmissions, 0);

        let lines: Vec<&str, 4> = d.ring().lines().map(|l| l.as_str()).collect();
        assert_eq!(lines.as_slice(), &["4 time request", "4 response ack."]);
    }

    #[test]
    fn test_time_request_not_acked() {
        let mut d = dispatcher();
        d.radio_mut().ack = false;
        let mut req = [0u8; 2];
        TimeRequest::new(6).encode(&mut req).unwrap();
        d.radio_mut().push(&req, 6);

        let outcome = block_on(d.step()).unwrap();
        let reply = outcome.reply.unwrap();
        assert!(!reply.delivery.acked);
        assert_eq!(reply.retransmissions, 3);
        assert!(reply.summary.starts_with("...reply failed, 3 retransmissions"));
        assert_eq!(newest(&d), "6 no ack.");
        assert_eq!(d.radio().retransmissions, 0);
        assert_eq!(d.state(), DispatchState::Idle);
    }

    #[test]
    fn test_time_request_without_clock() {
        let mut d = dispatcher();
        d.clock_mut().now = Err(ClockError::Bus);
        d.radio_mut().push(&[MSG_TIME_REQUEST, 2], 2);

        let outcome = block_on(d.step()).unwrap();
        assert_eq!(outcome.time, Err(ClockError::Bus));
        assert!(outcome.reply.is_none());
        assert!(d.radio().sent.is_empty());
        assert_eq!(newest(&d), "2 no clock.");
    }

    #[test]
    fn test_unhealthy_storage_still_displays() {
        let mut storage = MockStorage::new();
        storage.fail_init = true;
        let mut d = dispatcher_with(storage, StationConfig::default());
        assert!(!d.log().is_healthy());

        d.radio_mut().push(&DataMessage::new(ones()).to_bytes(), 1);
        let outcome = block_on(d.step()).unwrap();

        assert_eq!(outcome.storage, Some(Ok(LogWrite::Skipped)));
        assert_eq!(d.log().storage().ops.as_slice(), &[StorageOp::Init]);
        assert_eq!(d.ring().len(), 1);
        assert_eq!(newest(&d), "1 10:17 0.0 0 0.01 0x01");
    }

    #[test]
    fn test_text_message() {
        let mut d = dispatcher();
        let mut buf = [0u8; TEXT_MESSAGE_SIZE];
        TextMessage::new(9, "hello").encode(&mut buf).unwrap();
        d.radio_mut().push(&buf, 9);

        let outcome = block_on(d.step()).unwrap();
        assert_eq!(outcome.kind, MessageKind::Text);
        assert_eq!(
            outcome.record.as_ref().map(|r| r.as_str()),
            Some("node: 9, text: hello")
        );
        assert_eq!(
            d.log().storage().lines.last().map(|l| l.as_str()),
            Some("9, hello")
        );
        assert_eq!(newest(&d), "9: hello");
    }

    #[test]
    fn test_join_request_has_no_side_effects() {
        let mut d = dispatcher();
        let mut buf = [0u8; 9];
        JoinRequest::new(0x0011_2233_4455_6677).encode(&mut buf).unwrap();
        d.radio_mut().push(&buf, 3);
        let lines_before = d.log().storage().lines.len();

        let outcome = block_on(d.step()).unwrap();
        assert_eq!(outcome.kind, MessageKind::JoinRequest);
        assert_eq!(outcome.join_eui, Some(0x0011_2233_4455_6677));
        assert_eq!(outcome.storage, None);
        assert_eq!(outcome.display, None);
        assert!(d.ring().is_empty());
        assert!(d.radio().sent.is_empty());
        assert_eq!(d.log().storage().lines.len(), lines_before);
    }

    #[test]
    fn test_unknown_is_hex_dumped() {
        let mut d = dispatcher();
        d.radio_mut().push(&[0x7f, 0x01, 0xab], 8);

        let outcome = block_on(d.step()).unwrap();
        assert_eq!(outcome.kind, MessageKind::Unknown);
        assert_eq!(outcome.malformed, None);
        assert_eq!(outcome.raw.as_slice(), &[0x7f, 0x01, 0xab]);
        assert_eq!(outcome.storage, None);
        assert_eq!(newest(&d), "raw 7f 01 ab");
    }

    #[test]
    fn test_malformed_tagged_datagram() {
        let mut d = dispatcher();
        d.radio_mut().push(&[MSG_DATA, 0x01, 0x02], 8);

        let outcome = block_on(d.step()).unwrap();
        assert_eq!(outcome.kind, MessageKind::DataMessage);
        assert!(matches!(
            outcome.malformed,
            Some(CodecError::TooShort { actual: 3, .. })
        ));
        assert_eq!(outcome.storage, None);
        assert_eq!(newest(&d), "raw 01 01 02");
    }

    #[test]
    fn test_reply_to_data() {
        let mut config = StationConfig::default();
        config.reply_to_data = true;
        let mut d = dispatcher_with(MockStorage::new(), config);
        d.radio_mut().push(&DataPacket::new(ones()).to_bytes(), 12);

        let outcome = block_on(d.step()).unwrap();
        let reply = outcome.reply.unwrap();
        assert_eq!(reply.to, 12);
        assert_eq!(
            d.radio().sent[0].bytes.as_slice(),
            &now().unixtime().to_le_bytes()
        );
        // The reading row is the only panel change
        assert_eq!(d.ring().len(), 1);
    }

    #[test]
    fn test_receive_failure() {
        let mut d = dispatcher();
        d.radio_mut().push(&[MSG_DATA], 1);
        d.radio_mut().drop_next = true;

        assert_eq!(block_on(d.step()), None);
        assert_eq!(d.state(), DispatchState::Idle);
        assert!(d.status_led().is_set_low());
        assert!(d.ring().is_empty());
    }

    #[test]
    fn test_ring_scrolls() {
        let mut d = dispatcher();
        for node in 1..=5u8 {
            let reading = Reading { node, ..ones() };
            d.radio_mut().push(&DataMessage::new(reading).to_bytes(), node);
            block_on(d.step()).unwrap();
        }
        assert_eq!(d.ring().len(), 4);
        assert!(d.ring().lines().next().unwrap().as_str().starts_with("2 "));
        assert!(newest(&d).starts_with("5 "));
    }

    #[test]
    fn test_start_sets_lost_clock() {
        let mut d = dispatcher();
        assert!(d.clock_mut().adjusted.is_none());

        d.clock_mut().lost_power = true;
        let report = d.start(build_time());
        assert_eq!(report.clock_adjusted, Ok(true));
        assert_eq!(d.clock_mut().adjusted, Some(build_time()));
        assert_eq!(
            report.start_time.as_ref().map(|t| t.as_str()),
            Ok("2024-01-02T03:04:05")
        );
    }

    #[test]
    fn test_start_adjust_on_boot() {
        let mut config = StationConfig::default();
        config.clock.adjust_on_boot = true;
        let mut d = dispatcher_with(MockStorage::new(), config);
        assert_eq!(d.clock_mut().adjusted, Some(build_time()));
        assert_eq!(d.bus().current(), Some(Peripheral::Radio));
    }
}
