//! Record log reader with strict corruption detection
//!
//! Every read validates framing and checksum. Any failure is
//! REG_DATA_CORRUPTION and the log must not be used.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::{LogRecord, MIN_RECORD_SIZE};
use super::writer::log_path;

/// Sequential reader over the record log.
pub struct StorageReader {
    path: PathBuf,
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
}

impl StorageReader {
    /// Opens the record log for reading.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = File::open(path).map_err(|e| {
            StorageError::read_failed(format!("Failed to open record log: {}", path.display()), e)
        })?;

        let file_size = file
            .metadata()
            .map_err(|e| StorageError::read_failed("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
        })
    }

    /// Returns the record log path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current read offset.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Returns whether there are more records to read.
    pub fn has_more(&self) -> bool {
        self.current_offset < self.file_size
    }

    /// Reads the next record.
    ///
    /// - `Ok(Some(record))` if a record was read
    /// - `Ok(None)` at end of log
    /// - `Err(REG_DATA_CORRUPTION)` on a truncated or corrupt record
    pub fn read_next(&mut self) -> StorageResult<Option<LogRecord>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;
        if remaining < MIN_RECORD_SIZE as u64 {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Truncated log: {} bytes remaining, minimum record size is {}",
                    remaining, MIN_RECORD_SIZE
                ),
            ));
        }

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(|e| {
            StorageError::corruption_at_offset(self.current_offset, format!("Failed to read record length: {}", e))
        })?;
        let record_length = u32::from_le_bytes(len_buf) as u64;

        if record_length < MIN_RECORD_SIZE as u64 {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if record_length > remaining {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!("Record length {} exceeds remaining log size {}", record_length, remaining),
            ));
        }

        let mut record_buf = vec![0u8; record_length as usize];
        record_buf[0..4].copy_from_slice(&len_buf);
        self.reader.read_exact(&mut record_buf[4..]).map_err(|e| {
            StorageError::corruption_at_offset(self.current_offset, format!("Failed to read record body: {}", e))
        })?;

        let (record, consumed) = LogRecord::deserialize(&record_buf)
            .map_err(|e| StorageError::corruption_at_offset(self.current_offset, e.to_string()))?;

        self.current_offset += consumed as u64;
        Ok(Some(record))
    }

    /// Reads all remaining records. Any corruption causes immediate failure.
    pub fn read_all(&mut self) -> StorageResult<Vec<LogRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_next()? {
            records.push(record);
        }
        Ok(records)
    }
}

/// Reads every record of a data directory's log, in append order.
///
/// A missing log is an empty database.
pub fn replay(data_dir: &Path) -> StorageResult<Vec<LogRecord>> {
    let path = log_path(data_dir);
    if !path.exists() {
        return Ok(Vec::new());
    }
    StorageReader::open(&path)?.read_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::RecordId;
    use crate::storage::{StorageErrorCode, StorageWriter};
    use std::fs::OpenOptions;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_two(dir: &Path) {
        let mut writer = StorageWriter::open(dir, true).unwrap();
        writer
            .append(&LogRecord::live("student", RecordId::new(1), br#"{"name":"Alice"}"#.to_vec()))
            .unwrap();
        writer
            .append(&LogRecord::live("student", RecordId::new(2), br#"{"name":"Bob"}"#.to_vec()))
            .unwrap();
    }

    #[test]
    fn test_replay_missing_log_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(replay(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_replay_in_append_order() {
        let tmp = TempDir::new().unwrap();
        write_two(tmp.path());
        let records = replay(tmp.path()).unwrap();
        let ids: Vec<u64> = records.iter().map(|r| r.record_id.get()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_flipped_byte_is_corruption() {
        let tmp = TempDir::new().unwrap();
        write_two(tmp.path());

        let path = log_path(tmp.path());
        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 6;
        bytes[last] ^= 0x40;
        std::fs::write(&path, bytes).unwrap();

        let err = replay(tmp.path()).unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::DataCorruption);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_torn_tail_is_corruption() {
        let tmp = TempDir::new().unwrap();
        write_two(tmp.path());

        let mut file = OpenOptions::new().append(true).open(log_path(tmp.path())).unwrap();
        file.write_all(&[0x20, 0x00, 0x00]).unwrap();

        let mut reader = StorageReader::open(&log_path(tmp.path())).unwrap();
        assert!(reader.read_next().unwrap().is_some());
        assert!(reader.read_next().unwrap().is_some());
        assert!(reader.has_more());
        let err = reader.read_next().unwrap_err();
        assert!(err.details().unwrap().starts_with("byte_offset"));
    }
}
