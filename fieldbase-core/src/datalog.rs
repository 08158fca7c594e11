//! Append-only data log
//!
//! Wraps a [`LogStorage`] with the station's log discipline:
//!
//! - a start marker and the column header are written once at start-up
//! - each line is its own open/append/close cycle
//! - storage that failed at start-up is never touched again
//!
//! The health flag is cleared only when start-up fails. A failed write
//! after a good start-up is reported to the caller and the flag is left
//! alone, so one bad write does not silence the log for the rest of the run.

use fieldbase_hal::{LogStorage, OutputPin, StorageError};
use fieldbase_protocol::LOG_HEADER;
use heapless::String;

use crate::bus::{BusArbiter, Peripheral};

/// First line written at every start-up
pub const LOG_START: &str = "# Start Log";

/// Longest log file name (8.3 format)
pub const MAX_FILE_NAME_LEN: usize = 12;

/// What [`DataLog::append`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogWrite {
    /// Line reached storage
    Written,
    /// Storage is unavailable; nothing was attempted
    Skipped,
}

/// Station data log
pub struct DataLog<S> {
    storage: S,
    file_name: String<MAX_FILE_NAME_LEN>,
    healthy: bool,
}

impl<S: LogStorage> DataLog<S> {
    /// Create a log writing to `file_name`
    ///
    /// Storage counts as unavailable until [`init`](Self::init) succeeds.
    /// The name is taken as validated, normally from
    /// [`StationConfig::log_file`](crate::config::StationConfig::log_file).
    pub fn new(storage: S, file_name: String<MAX_FILE_NAME_LEN>) -> Self {
        Self {
            storage,
            file_name,
            healthy: false,
        }
    }

    /// Bring up storage and write the log header
    ///
    /// Any failure marks storage unavailable until the next start-up.
    pub fn init<P: OutputPin>(&mut self, bus: &mut BusArbiter<P>) -> Result<(), StorageError> {
        bus.acquire_for(Peripheral::Storage);
        let result = self
            .storage
            .init()
            .and_then(|()| self.write_lines(&[LOG_START, LOG_HEADER]));
        self.healthy = result.is_ok();
        result
    }

    /// Append one line
    ///
    /// Returns `Ok(LogWrite::Skipped)` without touching the bus or storage
    /// when storage is unavailable.
    pub fn append<P: OutputPin>(
        &mut self,
        bus: &mut BusArbiter<P>,
        line: &str,
    ) -> Result<LogWrite, StorageError> {
        if !self.healthy {
            return Ok(LogWrite::Skipped);
        }
        bus.acquire_for(Peripheral::Storage);
        self.write_lines(&[line])?;
        Ok(LogWrite::Written)
    }

    /// Open, write and close with interrupts masked
    ///
    /// The file is closed even if a write fails.
    fn write_lines(&mut self, lines: &[&str]) -> Result<(), StorageError> {
        let storage = &mut self.storage;
        let name = self.file_name.as_str();
        critical_section::with(|_| {
            storage.open_append(name)?;
            let written = lines.iter().try_for_each(|line| storage.write_line(line));
            let closed = storage.close();
            written.and(closed)
        })
    }

    /// True if start-up succeeded
    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    pub fn file_name(&self) -> &str {
        self.file_name.as_str()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_config, ParseError, StationConfig};
    use crate::mocks::{MockPin, MockStorage, StorageOp};

    fn bus() -> BusArbiter<MockPin> {
        BusArbiter::new(MockPin::new(), MockPin::new())
    }

    fn name(s: &str) -> String<MAX_FILE_NAME_LEN> {
        let mut name = String::new();
        name.push_str(s).unwrap();
        name
    }

    #[test]
    fn test_init_writes_header() {
        let mut bus = bus();
        let mut log = DataLog::new(MockStorage::new(), name("SENSORS.CSV"));
        assert!(!log.is_healthy());

        log.init(&mut bus).unwrap();
        assert!(log.is_healthy());
        assert_eq!(bus.current(), Some(Peripheral::Storage));

        let storage = log.storage();
        assert_eq!(storage.open_name.as_str(), "SENSORS.CSV");
        assert_eq!(storage.lines[0].as_str(), LOG_START);
        assert_eq!(storage.lines[1].as_str(), LOG_HEADER);
        assert_eq!(
            storage.ops.as_slice(),
            &[
                StorageOp::Init,
                StorageOp::Open,
                StorageOp::Write,
                StorageOp::Write,
                StorageOp::Close
            ]
        );
    }

    #[test]
    fn test_init_failure_clears_health() {
        let mut bus = bus();
        let mut storage = MockStorage::new();
        storage.fail_open = true;
        let mut log = DataLog::new(storage, name("SENSORS.CSV"));

        assert_eq!(log.init(&mut bus), Err(StorageError::Open));
        assert!(!log.is_healthy());
    }

    #[test]
    fn test_unhealthy_append_is_silent_noop() {
        let mut bus = bus();
        let mut storage = MockStorage::new();
        storage.fail_init = true;
        let mut log = DataLog::new(storage, name("SENSORS.CSV"));
        let _ = log.init(&mut bus);
        bus.acquire_for(Peripheral::Radio);
        let ops_before = log.storage().ops.len();

        assert_eq!(log.append(&mut bus, "1, 2, 3"), Ok(LogWrite::Skipped));
        assert_eq!(log.storage().ops.len(), ops_before);
        assert_eq!(bus.current(), Some(Peripheral::Radio));
    }

    #[test]
    fn test_append_acquires_storage() {
        let mut bus = bus();
        let mut log = DataLog::new(MockStorage::new(), name("SENSORS.CSV"));
        log.init(&mut bus).unwrap();
        bus.acquire_for(Peripheral::Radio);

        assert_eq!(log.append(&mut bus, "1, 2, 3"), Ok(LogWrite::Written));
        assert_eq!(bus.current(), Some(Peripheral::Storage));
        assert_eq!(log.storage().lines.last().map(|l| l.as_str()), Some("1, 2, 3"));
    }

    #[test]
    fn test_write_failure_closes_and_keeps_health() {
        let mut bus = bus();
        let mut log = DataLog::new(MockStorage::new(), name("SENSORS.CSV"));
        log.init(&mut bus).unwrap();
        log.storage_mut().fail_write = true;
        log.storage_mut().ops.clear();

        assert_eq!(log.append(&mut bus, "x"), Err(StorageError::Write));
        assert_eq!(
            log.storage().ops.as_slice(),
            &[StorageOp::Open, StorageOp::Write, StorageOp::Close]
        );
        assert!(log.is_healthy());
    }

    #[test]
    fn test_full_length_name_keeps_extension() {
        let mut bus = bus();
        let mut log = DataLog::new(MockStorage::new(), name("SENSOR01.CSV"));
        log.init(&mut bus).unwrap();

        assert_eq!(log.file_name(), "SENSOR01.CSV");
        assert_eq!(log.storage().open_name.as_str(), "SENSOR01.CSV");
    }

    #[test]
    fn test_long_name_rejected_before_log() {
        let parsed = parse_config("[station]\nlog_file = \"VERYLONGNAME.CSV\"");
        assert_eq!(parsed, Err(ParseError::InvalidValue));

        let config = StationConfig::default();
        let log = DataLog::new(MockStorage::new(), config.log_file.clone());
        assert_eq!(log.file_name(), "SENSORS.CSV");
    }
}
