//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries. One entry carries
//! one atomic write batch.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{OrdoError, Result};

/// Frame header: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// Upper bound on the data length a header may announce
pub const MAX_ENTRY_SIZE: u32 = 1 << 30;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The batch applied atomically by this entry
    pub operations: Vec<Operation>,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged (and batched)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },

    /// Delete a key
    Delete { key: Vec<u8> },
}

impl Operation {
    pub fn key(&self) -> &[u8] {
        match self {
            Operation::Put { key, .. } | Operation::Delete { key } => key,
        }
    }
}

/// Parsed frame header
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameHeader {
    pub lsn: u64,
    pub crc: u32,
    pub len: u32,
}

impl FrameHeader {
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Self {
        let mut lsn = [0u8; 8];
        let mut crc = [0u8; 4];
        let mut len = [0u8; 4];
        lsn.copy_from_slice(&bytes[0..8]);
        crc.copy_from_slice(&bytes[8..12]);
        len.copy_from_slice(&bytes[12..16]);

        Self {
            lsn: u64::from_le_bytes(lsn),
            crc: u32::from_le_bytes(crc),
            len: u32::from_le_bytes(len),
        }
    }
}

impl WalEntry {
    /// Create an entry stamped with the current time
    pub fn new(lsn: u64, operations: Vec<Operation>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            operations,
            timestamp,
        }
    }

    /// Serialize into a full frame: header followed by bincode data
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let data = bincode::serialize(self)?;
        if data.len() as u64 > MAX_ENTRY_SIZE as u64 {
            return Err(OrdoError::Serialization(format!(
                "WAL entry of {} bytes exceeds the {} byte limit",
                data.len(),
                MAX_ENTRY_SIZE
            )));
        }

        let mut frame = Vec::with_capacity(HEADER_SIZE + data.len());
        frame.extend_from_slice(&self.lsn.to_le_bytes());
        frame.extend_from_slice(&Self::compute_crc(&data).to_le_bytes());
        frame.extend_from_slice(&(data.len() as u32).to_le_bytes());
        frame.extend_from_slice(&data);

        Ok(frame)
    }

    /// Parse a full frame, verifying length, CRC and LSN
    pub fn deserialize(frame: &[u8]) -> Result<Self> {
        if frame.len() < HEADER_SIZE {
            return Err(OrdoError::WalCorruption(format!(
                "frame of {} bytes is shorter than its header",
                frame.len()
            )));
        }

        let mut header = [0u8; HEADER_SIZE];
        header.copy_from_slice(&frame[..HEADER_SIZE]);
        let header = FrameHeader::parse(&header);

        let data = &frame[HEADER_SIZE..];
        if data.len() != header.len as usize {
            return Err(OrdoError::WalCorruption(format!(
                "header announces {} data bytes, frame holds {}",
                header.len,
                data.len()
            )));
        }

        Self::decode_data(&header, data)
    }

    /// Decode the data part of a frame whose header was already read
    pub(crate) fn decode_data(header: &FrameHeader, data: &[u8]) -> Result<Self> {
        let crc = Self::compute_crc(data);
        if crc != header.crc {
            return Err(OrdoError::WalCorruption(format!(
                "CRC mismatch at LSN {}: expected {:#010x}, got {:#010x}",
                header.lsn, header.crc, crc
            )));
        }

        let entry: WalEntry = bincode::deserialize(data)
            .map_err(|e| OrdoError::WalCorruption(format!("undecodable entry: {}", e)))?;

        if entry.lsn != header.lsn {
            return Err(OrdoError::WalCorruption(format!(
                "header LSN {} disagrees with entry LSN {}",
                header.lsn, entry.lsn
            )));
        }

        Ok(entry)
    }

    /// CRC32 of the data part of a frame
    pub fn compute_crc(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> WalEntry {
        WalEntry::new(
            7,
            vec![
                Operation::Put {
                    key: b"k".to_vec(),
                    value: b"v".to_vec(),
                },
                Operation::Delete { key: b"gone".to_vec() },
            ],
        )
    }

    #[test]
    fn test_frame_header_matches_entry() {
        let entry = sample_entry();
        let frame = entry.serialize().unwrap();

        let mut header = [0u8; HEADER_SIZE];
        header.copy_from_slice(&frame[..HEADER_SIZE]);
        let header = FrameHeader::parse(&header);

        assert_eq!(header.lsn, 7);
        assert_eq!(header.len as usize, frame.len() - HEADER_SIZE);
        assert_eq!(WalEntry::deserialize(&frame).unwrap(), entry);
    }

    #[test]
    fn test_deserialize_detects_flipped_byte() {
        let mut frame = sample_entry().serialize().unwrap();
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;

        assert!(matches!(
            WalEntry::deserialize(&frame),
            Err(OrdoError::WalCorruption(_))
        ));
    }

    #[test]
    fn test_deserialize_rejects_short_frame() {
        let frame = sample_entry().serialize().unwrap();
        assert!(WalEntry::deserialize(&frame[..10]).is_err());
        assert!(WalEntry::deserialize(&frame[..frame.len() - 1]).is_err());
    }
}
