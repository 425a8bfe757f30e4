//! Record log writer
//!
//! The log is append-only. Each mutation, including every row touched by
//! its delete policy, is appended with a single write and then synced
//! when `sync_on_write` is enabled.
//!
//! A failed append is rolled back by truncating the file to the last
//! acknowledged offset. If the rollback fails too, the writer is poisoned
//! and every later append fails with REG_DATA_CORRUPTION.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::LogRecord;

/// File name of the record log inside `<data_dir>/data/`
pub const LOG_FILE_NAME: &str = "records.dat";

/// Path of the record log for a data directory
pub fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join("data").join(LOG_FILE_NAME)
}

/// Append-only writer for the record log.
pub struct StorageWriter {
    path: PathBuf,
    file: File,
    current_offset: u64,
    sync_on_write: bool,
    poisoned: bool,
}

impl StorageWriter {
    /// Opens or creates `<data_dir>/data/records.dat`.
    ///
    /// # Errors
    ///
    /// Returns `REG_STORAGE_WRITE_FAILED` if the file cannot be created or opened.
    pub fn open(data_dir: &Path, sync_on_write: bool) -> StorageResult<Self> {
        let path = log_path(data_dir);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to create data directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                StorageError::write_failed(format!("Failed to open record log: {}", path.display()), e)
            })?;

        let current_offset = file
            .metadata()
            .map_err(|e| StorageError::io_error("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            path,
            file,
            current_offset,
            sync_on_write,
            poisoned: false,
        })
    }

    /// Returns the path to the record log.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current end-of-log offset.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Appends one record. Returns the offset it was written at.
    pub fn append(&mut self, record: &LogRecord) -> StorageResult<u64> {
        self.append_batch(std::slice::from_ref(record))
    }

    /// Appends several records with one write.
    ///
    /// Returns the offset of the first record. On failure nothing is
    /// left past the previous end of the log.
    ///
    /// # Errors
    ///
    /// - REG_STORAGE_WRITE_FAILED if the write or fsync failed and was rolled back
    /// - REG_DATA_CORRUPTION if the log holds bytes this writer did not
    ///   acknowledge, or a rollback failed
    pub fn append_batch(&mut self, records: &[LogRecord]) -> StorageResult<u64> {
        let offset = self.current_offset;
        if self.poisoned {
            return Err(StorageError::corruption_at_offset(
                offset,
                "record log is poisoned by an earlier failed rollback",
            ));
        }
        if records.is_empty() {
            return Ok(offset);
        }
        self.check_tail()?;

        let mut buf = Vec::new();
        for record in records {
            buf.extend_from_slice(&record.serialize());
        }

        if let Err(e) = self.file.write_all(&buf) {
            let err = StorageError::write_failed(format!("Failed to append {} record(s)", records.len()), e);
            return Err(self.roll_back(err));
        }

        if self.sync_on_write {
            if let Err(e) = self.file.sync_all() {
                return Err(self.roll_back(StorageError::write_failed("fsync failed after append", e)));
            }
        }

        self.current_offset += buf.len() as u64;
        Ok(offset)
    }

    /// The file must end exactly where the last acknowledged append did.
    fn check_tail(&mut self) -> StorageResult<()> {
        let len = self
            .file
            .metadata()
            .map_err(|e| StorageError::io_error("Failed to read file metadata", e))?
            .len();
        if len != self.current_offset {
            self.poisoned = true;
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!("record log is {} bytes, expected {}", len, self.current_offset),
            ));
        }
        Ok(())
    }

    /// Truncates the log back to the last acknowledged offset.
    ///
    /// Returns `err` when the truncate succeeds, otherwise poisons the
    /// writer and returns a fatal error.
    fn roll_back(&mut self, err: StorageError) -> StorageError {
        let result = self.file.set_len(self.current_offset).and_then(|()| self.file.sync_all());
        match result {
            Ok(()) => err,
            Err(e) => {
                self.poisoned = true;
                StorageError::corruption_at_offset(
                    self.current_offset,
                    format!("{}; rollback failed: {}", err.message(), e),
                )
            }
        }
    }

    /// Flushes and syncs regardless of `sync_on_write`.
    pub fn sync(&mut self) -> StorageResult<()> {
        self.file
            .flush()
            .map_err(|e| StorageError::write_failed("flush failed", e))?;
        self.file
            .sync_all()
            .map_err(|e| StorageError::write_failed("fsync failed", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::RecordId;
    use crate::storage::StorageReader;
    use tempfile::TempDir;

    #[test]
    fn test_writer_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let data_path = temp_dir.path().join("data");
        assert!(!data_path.exists());

        let writer = StorageWriter::open(temp_dir.path(), true).unwrap();
        assert!(data_path.join(LOG_FILE_NAME).exists());
        assert_eq!(writer.current_offset(), 0);
    }

    #[test]
    fn test_batch_append_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut writer = StorageWriter::open(temp_dir.path(), false).unwrap();
            writer
                .append(&LogRecord::live("student", RecordId::new(1), b"{}".to_vec()))
                .unwrap();
            let offset = writer
                .append_batch(&[
                    LogRecord::tombstone("enrollment", RecordId::new(4)),
                    LogRecord::tombstone("student", RecordId::new(1)),
                ])
                .unwrap();
            assert!(offset > 0);
        }

        let mut reader = StorageReader::open(&log_path(temp_dir.path())).unwrap();
        let records = reader.read_all().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].table, "enrollment");
        assert!(records[2].is_tombstone);
    }

    fn stray_bytes(temp_dir: &TempDir, bytes: &[u8]) {
        let mut file = OpenOptions::new()
            .append(true)
            .open(log_path(temp_dir.path()))
            .unwrap();
        file.write_all(bytes).unwrap();
    }

    #[test]
    fn test_roll_back_truncates_partial_append() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp_dir.path(), true).unwrap();
        writer
            .append(&LogRecord::live("student", RecordId::new(1), b"{}".to_vec()))
            .unwrap();
        let end = writer.current_offset();

        // What a short write leaves behind
        stray_bytes(&temp_dir, &[0x2a; 6]);

        let err = writer.roll_back(StorageError::write_failed_no_source("short write"));
        assert_eq!(err.code(), crate::storage::StorageErrorCode::WriteFailed);
        assert!(!err.is_fatal());
        assert_eq!(fs::metadata(log_path(temp_dir.path())).unwrap().len(), end);

        writer
            .append(&LogRecord::live("student", RecordId::new(2), b"{}".to_vec()))
            .unwrap();
        let mut reader = StorageReader::open(&log_path(temp_dir.path())).unwrap();
        assert_eq!(reader.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_unacknowledged_tail_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp_dir.path(), true).unwrap();
        writer
            .append(&LogRecord::live("student", RecordId::new(1), b"{}".to_vec()))
            .unwrap();
        let end = writer.current_offset();
        stray_bytes(&temp_dir, b"torn!!");

        let err = writer
            .append(&LogRecord::live("student", RecordId::new(2), b"{}".to_vec()))
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(writer.current_offset(), end);

        // Poisoned: no later append is acknowledged
        let err = writer
            .append(&LogRecord::live("student", RecordId::new(3), b"{}".to_vec()))
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_poisoned_writer_refuses_appends() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp_dir.path(), false).unwrap();
        writer.poisoned = true;
        let err = writer
            .append(&LogRecord::tombstone("course", RecordId::new(1)))
            .unwrap_err();
        assert_eq!(err.code(), crate::storage::StorageErrorCode::DataCorruption);
        assert_eq!(fs::metadata(log_path(temp_dir.path())).unwrap().len(), 0);
    }

    #[test]
    fn test_reopen_appends_after_existing_records() {
        let temp_dir = TempDir::new().unwrap();
        let first_end = {
            let mut writer = StorageWriter::open(temp_dir.path(), true).unwrap();
            writer
                .append(&LogRecord::live("course", RecordId::new(1), b"{}".to_vec()))
                .unwrap();
            writer.current_offset()
        };

        let mut writer = StorageWriter::open(temp_dir.path(), true).unwrap();
        assert_eq!(writer.current_offset(), first_end);
        let offset = writer
            .append(&LogRecord::live("course", RecordId::new(2), b"{}".to_vec()))
            .unwrap();
        assert_eq!(offset, first_end);
    }
}
