//! Log storage abstraction
//!
//! The base station keeps one append-only text log. Every write is an
//! independent open/append/close cycle so a power cut never leaves a file
//! handle dangling.

/// Errors from storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Card or volume could not be initialized
    Init,
    /// File could not be opened or created
    Open,
    /// Write failed part way
    Write,
    /// Close (flush of directory entry) failed
    Close,
    /// A file is already open
    Busy,
}

/// Append-only line storage
///
/// Implementations keep at most one file open. `open_append` must create
/// the file if it does not exist and position at its end.
pub trait LogStorage {
    /// Bring up the block device and mount the volume
    fn init(&mut self) -> Result<(), StorageError>;

    /// Open `name` for appending, creating it if absent
    fn open_append(&mut self, name: &str) -> Result<(), StorageError>;

    /// Write `line` followed by a line terminator to the open file
    fn write_line(&mut self, line: &str) -> Result<(), StorageError>;

    /// Close the open file
    fn close(&mut self) -> Result<(), StorageError>;
}
