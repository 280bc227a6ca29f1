//! Append-only commit log for the durable store.
//!
//! # File Layout
//!
//! ```text
//! ┌────────────────────────────────────┐
//! │ Header (8 bytes)                   │
//! ├────────────────────────────────────┤
//! │ Record 1                           │
//! ├────────────────────────────────────┤
//! │ Record 2                           │
//! ├────────────────────────────────────┤
//! │ ...                                │
//! └────────────────────────────────────┘
//! ```
//!
//! # Record Layout
//!
//! ```text
//! ┌─────────────────┬─────────────────────────┬──────────┐
//! │ Length (4 bytes)│ Payload (variable)      │ CRC32 (4)│
//! └─────────────────┴─────────────────────────┴──────────┘
//! ```
//!
//! The payload is a bincode-encoded [`LogRecord`]: one committed
//! transaction with all of its entries. Integers are little-endian; the CRC
//! covers the payload only.
//!
//! A record that is cut short, or whose checksum fails, at the very end of
//! the file is a torn write from a crash: replay stops there and the file
//! is truncated back to the last good record. The same damage anywhere
//! else is corruption and fails the open.

use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use auditkv_core::{KeyValue, SubstrateError, SubstrateResult, TxId};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// Magic bytes identifying a commit log: "AKVL"
pub const LOG_MAGIC: [u8; 4] = *b"AKVL";

/// Current log format version
pub const LOG_FORMAT_VERSION: u32 = 1;

/// Size of the file header in bytes
pub const LOG_HEADER_SIZE: usize = 8;

/// File name of the commit log inside the data directory
pub const LOG_FILE_NAME: &str = "commit.log";

/// Length prefix plus CRC trailer
const RECORD_OVERHEAD: usize = 8;

/// One committed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Transaction id assigned at commit
    pub tx_id: TxId,
    /// Entries written by the transaction
    pub entries: Vec<KeyValue>,
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Encode a record with its length prefix and checksum.
pub fn encode_record(record: &LogRecord) -> SubstrateResult<Vec<u8>> {
    let payload =
        bincode::serialize(record).map_err(|e| SubstrateError::Serialization(e.to_string()))?;
    let len = u32::try_from(payload.len()).map_err(|_| {
        SubstrateError::InvalidRequest(format!(
            "transaction of {} bytes exceeds the commit log record limit",
            payload.len()
        ))
    })?;

    let mut buf = Vec::with_capacity(payload.len() + RECORD_OVERHEAD);
    buf.write_u32::<LittleEndian>(len)?;
    buf.extend_from_slice(&payload);
    buf.write_u32::<LittleEndian>(crc32(&payload))?;
    Ok(buf)
}

/// Result of replaying a commit log
#[derive(Debug, Default)]
pub struct Replay {
    /// Records in commit order
    pub records: Vec<LogRecord>,
    /// Bytes of torn tail that were discarded
    pub truncated_bytes: u64,
}

/// Parse every record in `bytes` (the file contents after the header).
///
/// Returns the records and the length of the valid prefix.
fn parse_records(bytes: &[u8]) -> SubstrateResult<(Vec<LogRecord>, usize)> {
    let mut records = Vec::new();
    let mut cursor = Cursor::new(bytes);
    let mut valid = 0usize;
    let mut last_tx = TxId::ZERO;

    loop {
        let remaining = bytes.len() - valid;
        if remaining == 0 {
            break;
        }
        if remaining < 4 {
            break; // torn length prefix
        }
        cursor.set_position(valid as u64);
        let len = cursor.read_u32::<LittleEndian>()? as usize;
        if remaining < len + RECORD_OVERHEAD {
            break; // torn payload or checksum
        }

        let start = valid + 4;
        let payload = &bytes[start..start + len];
        cursor.set_position((start + len) as u64);
        let stored_crc = cursor.read_u32::<LittleEndian>()?;
        let end = start + len + 4;

        if stored_crc != crc32(payload) {
            if end == bytes.len() {
                break; // torn final record
            }
            return Err(SubstrateError::Corruption(format!(
                "checksum mismatch in commit log record at offset {}",
                valid + LOG_HEADER_SIZE
            )));
        }

        let record: LogRecord = bincode::deserialize(payload).map_err(|e| {
            SubstrateError::Corruption(format!("undecodable commit log record: {}", e))
        })?;
        if record.tx_id <= last_tx {
            return Err(SubstrateError::Corruption(format!(
                "commit log transaction {} follows {}",
                record.tx_id, last_tx
            )));
        }
        last_tx = record.tx_id;
        records.push(record);
        valid = end;
    }

    Ok((records, valid))
}

/// Writable handle on the commit log
#[derive(Debug)]
pub struct CommitLog {
    file: File,
    path: PathBuf,
    sync: bool,
    /// End of the last committed record
    len: u64,
    /// Set when a failed append could not be rolled back
    poisoned: bool,
    #[cfg(test)]
    fail_next_sync: bool,
}

fn header() -> [u8; LOG_HEADER_SIZE] {
    let mut header = [0u8; LOG_HEADER_SIZE];
    header[..4].copy_from_slice(&LOG_MAGIC);
    header[4..].copy_from_slice(&LOG_FORMAT_VERSION.to_le_bytes());
    header
}

impl CommitLog {
    /// Open (or create) the log in `dir` and replay it.
    ///
    /// With `sync` set, every append is followed by `fsync`.
    pub fn open(dir: &Path, sync: bool) -> SubstrateResult<(Self, Replay)> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(LOG_FILE_NAME);

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;

        // A crash while creating the log can leave part of the header.
        let fresh = contents.len() < LOG_HEADER_SIZE && header().starts_with(&contents);
        let (replay, len) = if fresh {
            if !contents.is_empty() {
                warn!(
                    target: "auditkv::storage",
                    path = %path.display(),
                    bytes = contents.len(),
                    "Rewriting incomplete commit log header"
                );
                file.set_len(0)?;
            }
            file.write_all(&header())?;
            file.sync_all()?;
            (Replay::default(), LOG_HEADER_SIZE as u64)
        } else {
            Self::check_header(&contents)?;
            let body = &contents[LOG_HEADER_SIZE..];
            let (records, valid) = parse_records(body)?;
            let torn = body.len() - valid;
            if torn > 0 {
                warn!(
                    target: "auditkv::storage",
                    path = %path.display(),
                    torn_bytes = torn,
                    "Discarding torn commit log tail"
                );
                file.set_len((LOG_HEADER_SIZE + valid) as u64)?;
                file.sync_all()?;
            }
            let replay = Replay {
                records,
                truncated_bytes: torn as u64,
            };
            (replay, (LOG_HEADER_SIZE + valid) as u64)
        };

        debug!(
            target: "auditkv::storage",
            path = %path.display(),
            records = replay.records.len(),
            "Replayed commit log"
        );

        let log = Self {
            file,
            path,
            sync,
            len,
            poisoned: false,
            #[cfg(test)]
            fail_next_sync: false,
        };
        Ok((log, replay))
    }

    fn check_header(contents: &[u8]) -> SubstrateResult<()> {
        if contents.len() < LOG_HEADER_SIZE || contents[0..4] != LOG_MAGIC {
            return Err(SubstrateError::Corruption(
                "commit log has an invalid header".to_string(),
            ));
        }
        let mut cursor = Cursor::new(&contents[4..LOG_HEADER_SIZE]);
        let version = cursor.read_u32::<LittleEndian>()?;
        if version != LOG_FORMAT_VERSION {
            return Err(SubstrateError::Corruption(format!(
                "unsupported commit log format version {}",
                version
            )));
        }
        Ok(())
    }

    /// Append one committed transaction.
    ///
    /// A failed append is rolled back, so the log ends at the last
    /// committed record again. If the rollback itself fails the log is
    /// poisoned and refuses every later append.
    pub fn append(&mut self, record: &LogRecord) -> SubstrateResult<()> {
        if self.poisoned {
            return Err(SubstrateError::Io(io::Error::new(
                io::ErrorKind::Other,
                "commit log is unusable after a failed rollback",
            )));
        }
        let bytes = encode_record(record)?;

        let actual = self.file.metadata()?.len();
        if actual != self.len {
            if actual < self.len {
                self.poisoned = true;
                return Err(SubstrateError::Corruption(format!(
                    "commit log shrank to {} bytes, expected {}",
                    actual, self.len
                )));
            }
            warn!(
                target: "auditkv::storage",
                path = %self.path.display(),
                stray_bytes = actual - self.len,
                "Discarding bytes past the last committed record"
            );
            self.rollback()?;
        }

        if let Err(e) = self.write_record(&bytes) {
            warn!(
                target: "auditkv::storage",
                path = %self.path.display(),
                tx_id = record.tx_id.as_u64(),
                error = %e,
                "Commit log append failed, rolling back"
            );
            let _ = self.rollback();
            return Err(e.into());
        }
        self.len += bytes.len() as u64;
        Ok(())
    }

    fn write_record(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)?;
        #[cfg(test)]
        if self.fail_next_sync {
            self.fail_next_sync = false;
            return Err(io::Error::new(io::ErrorKind::Other, "injected sync failure"));
        }
        if self.sync {
            self.file.sync_data()
        } else {
            self.file.flush()
        }
    }

    /// Cut the file back to the end of the last committed record
    fn rollback(&mut self) -> SubstrateResult<()> {
        if let Err(e) = self.file.set_len(self.len) {
            error!(
                target: "auditkv::storage",
                path = %self.path.display(),
                error = %e,
                "Commit log rollback failed, refusing further appends"
            );
            self.poisoned = true;
            return Err(e.into());
        }
        Ok(())
    }

    /// Whether a failed rollback has disabled the log
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Length of the committed part of the log in bytes
    pub fn committed_len(&self) -> u64 {
        self.len
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
