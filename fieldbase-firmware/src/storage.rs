//! SD card log storage
//!
//! Implements [`LogStorage`] over embedded-sdmmc's handle API. The volume
//! and root directory stay open for the life of the station; the log file
//! is opened and closed around every write.

use embedded_sdmmc::{
    BlockDevice, Mode, RawDirectory, RawFile, TimeSource, Timestamp, VolumeIdx, VolumeManager,
};
use fieldbase_hal::{DateTime, LogStorage, StorageError};

/// Line terminator written after every log line
const NEWLINE: &[u8] = b"\r\n";

/// Handle IDs start here, clear of embedded-sdmmc's default range
const HANDLE_ID_OFFSET: u32 = 0x4642_0000;

/// File timestamps: the station has one clock and the dispatcher owns it,
/// so files are stamped with the firmware build time
pub struct FixedTime(Timestamp);

impl FixedTime {
    pub fn new(at: DateTime) -> Self {
        let stamp = Timestamp::from_calendar(
            at.year(),
            at.month(),
            at.day(),
            at.hour(),
            at.minute(),
            at.second(),
        )
        .unwrap_or(Timestamp {
            year_since_1970: 30,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        });
        Self(stamp)
    }
}

impl TimeSource for FixedTime {
    fn get_timestamp(&self) -> Timestamp {
        self.0
    }
}

/// Append-only log on the first FAT volume of an SD card
pub struct SdLog<D: BlockDevice, T: TimeSource> {
    volumes: VolumeManager<D, T, 1, 1, 1>,
    root: Option<RawDirectory>,
    file: Option<RawFile>,
}

impl<D: BlockDevice, T: TimeSource> SdLog<D, T> {
    pub fn new(device: D, time: T) -> Self {
        Self {
            volumes: VolumeManager::new_with_limits(device, time, HANDLE_ID_OFFSET),
            root: None,
            file: None,
        }
    }
}

impl<D: BlockDevice, T: TimeSource> LogStorage for SdLog<D, T> {
    fn init(&mut self) -> Result<(), StorageError> {
        if self.root.is_some() {
            return Ok(());
        }
        let volume = self
            .volumes
            .open_raw_volume(VolumeIdx(0))
            .map_err(|_| StorageError::Init)?;
        let root = self
            .volumes
            .open_root_dir(volume)
            .map_err(|_| StorageError::Init)?;
        self.root = Some(root);
        Ok(())
    }

    fn open_append(&mut self, name: &str) -> Result<(), StorageError> {
        let root = self.root.ok_or(StorageError::Init)?;
        if self.file.is_some() {
            return Err(StorageError::Busy);
        }
        let file = self
            .volumes
            .open_file_in_dir(root, name, Mode::ReadWriteCreateOrAppend)
            .map_err(|_| StorageError::Open)?;
        self.file = Some(file);
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), StorageError> {
        let file = self.file.ok_or(StorageError::Open)?;
        self.volumes
            .write(file, line.as_bytes())
            .and_then(|()| self.volumes.write(file, NEWLINE))
            .map_err(|_| StorageError::Write)
    }

    fn close(&mut self) -> Result<(), StorageError> {
        let file = self.file.take().ok_or(StorageError::Close)?;
        self.volumes
            .close_file(file)
            .map_err(|_| StorageError::Close)
    }
}
