//! Log record format
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE)
//! +------------------+
//! | Table            | (u32-prefixed string)
//! +------------------+
//! | Record ID        | (u64 LE)
//! +------------------+
//! | Tombstone Flag   | (u8: 0 = live, 1 = deleted)
//! +------------------+
//! | Row Body         | (u32-prefixed JSON bytes)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! Checksum covers all bytes except the checksum itself.

use std::io::{self, Read};

use super::checksum::{compute_checksum, verify_checksum};
use crate::records::RecordId;

/// Smallest possible record: length + empty table + id + flag + empty body + checksum
pub const MIN_RECORD_SIZE: usize = 4 + 4 + 8 + 1 + 4 + 4;

/// One entry of the record log.
///
/// The latest entry for a (table, id) pair wins; a tombstone removes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub table: String,
    pub record_id: RecordId,
    pub is_tombstone: bool,
    /// Full row as JSON (empty for tombstones)
    pub body: Vec<u8>,
}

impl LogRecord {
    /// A live row version
    pub fn live(table: impl Into<String>, record_id: RecordId, body: Vec<u8>) -> Self {
        Self {
            table: table.into(),
            record_id,
            is_tombstone: false,
            body,
        }
    }

    /// A deletion marker
    pub fn tombstone(table: impl Into<String>, record_id: RecordId) -> Self {
        Self {
            table: table.into(),
            record_id,
            is_tombstone: true,
            body: Vec::new(),
        }
    }

    fn serialize_body(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4 + self.table.len() + 8 + 1 + 4 + self.body.len());

        buf.extend_from_slice(&(self.table.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.table.as_bytes());

        buf.extend_from_slice(&self.record_id.get().to_le_bytes());

        buf.push(u8::from(self.is_tombstone));

        buf.extend_from_slice(&(self.body.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.body);

        buf
    }

    /// Serialize the complete record to bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let body = self.serialize_body();
        let record_length = (4 + body.len() + 4) as u32;

        let mut record = Vec::with_capacity(record_length as usize);
        record.extend_from_slice(&record_length.to_le_bytes());
        record.extend_from_slice(&body);

        let checksum = compute_checksum(&record);
        record.extend_from_slice(&checksum.to_le_bytes());

        record
    }

    /// Deserialize a record from bytes, verifying checksum.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_RECORD_SIZE {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "Record too short"));
        }

        let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

        if record_length < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if data.len() < record_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("Record truncated: expected {} bytes, got {}", record_length, data.len()),
            ));
        }

        let checksum_offset = record_length - 4;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);

        if !verify_checksum(&data[0..checksum_offset], stored_checksum) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    compute_checksum(&data[0..checksum_offset]),
                    stored_checksum
                ),
            ));
        }

        let mut cursor = io::Cursor::new(&data[4..checksum_offset]);

        let table = String::from_utf8(read_prefixed(&mut cursor)?)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("Invalid UTF-8: {}", e)))?;

        let mut id_buf = [0u8; 8];
        cursor.read_exact(&mut id_buf)?;
        let record_id = RecordId::new(u64::from_le_bytes(id_buf));

        let mut flag = [0u8; 1];
        cursor.read_exact(&mut flag)?;
        let is_tombstone = match flag[0] {
            0 => false,
            1 => true,
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Invalid tombstone flag: {}", other),
                ))
            }
        };

        let body = read_prefixed(&mut cursor)?;

        Ok((
            Self {
                table,
                record_id,
                is_tombstone,
                body,
            },
            record_length,
        ))
    }
}

fn read_prefixed<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
