//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{OrdoError, Result};

use super::entry::{FrameHeader, HEADER_SIZE, MAX_ENTRY_SIZE};
use super::WalEntry;

/// What the reader found at the current position
#[derive(Debug)]
pub(crate) enum Frame {
    /// A complete, checksummed entry
    Entry(WalEntry),

    /// The file ends inside a frame (interrupted write)
    Partial,

    /// A complete frame that fails validation
    Corrupted(String),
}

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,
    /// Offset just past the last complete, valid entry
    position: u64,
    /// Set once iteration hit an error; the iterator yields nothing after
    failed: bool,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            failed: false,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at a clean end of file; partial or corrupted
    /// frames are reported as [`OrdoError::WalCorruption`].
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        match self.next_frame()? {
            None => Ok(None),
            Some(Frame::Entry(entry)) => Ok(Some(entry)),
            Some(Frame::Partial) => Err(OrdoError::WalCorruption(format!(
                "partial entry at offset {}",
                self.position
            ))),
            Some(Frame::Corrupted(reason)) => Err(OrdoError::WalCorruption(reason)),
        }
    }

    /// Offset just past the last valid entry read so far
    pub fn position(&self) -> u64 {
        self.position
    }

    pub(crate) fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut header = [0u8; HEADER_SIZE];
        let read = self.read_full(&mut header)?;
        if read == 0 {
            return Ok(None);
        }
        if read < HEADER_SIZE {
            return Ok(Some(Frame::Partial));
        }

        let header = FrameHeader::parse(&header);
        if header.len > MAX_ENTRY_SIZE {
            return Ok(Some(Frame::Corrupted(format!(
                "entry length {} at offset {} is implausible",
                header.len, self.position
            ))));
        }

        let mut data = vec![0u8; header.len as usize];
        if self.read_full(&mut data)? < data.len() {
            return Ok(Some(Frame::Partial));
        }

        match WalEntry::decode_data(&header, &data) {
            Ok(entry) => {
                self.position += (HEADER_SIZE + data.len()) as u64;
                Ok(Some(Frame::Entry(entry)))
            }
            Err(OrdoError::WalCorruption(reason)) => Ok(Some(Frame::Corrupted(reason))),
            Err(e) => Err(e),
        }
    }

    /// Fill `buf` as far as the file allows; returns the bytes read
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

impl Iterator for WalReader {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_entry().transpose();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}
