// Capture log: raw packet frames as seen on the wire, one record per frame.
//
// Layout is a sequence of [u32 LE length][bincode CaptureEntry]. Files are
// named after the session id so the dump tool can recover it.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::CodecConfig;

/// Records larger than this are treated as corruption.
const MAX_RECORD_LEN: usize = 10_000_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureEntry {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub direction: Direction,
    /// The frame as sent, header included.
    pub data: Vec<u8>,
    pub protocol_version: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Clientbound,
    Serverbound,
}

pub struct CaptureWriter {
    session_id: Uuid,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    protocol_version: i32,
}

impl CaptureWriter {
    /// Creates `<dir>/<session_id>.bin`, creating `dir` if needed. Records are
    /// stamped with the configured protocol version.
    pub fn create(session_id: Uuid, dir: impl AsRef<Path>, config: &CodecConfig) -> io::Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.bin", session_id));
        let writer = BufWriter::new(File::create(&path)?);
        debug!("Capturing session {} to {}", session_id, path.display());
        Ok(Self {
            session_id,
            path,
            writer: Some(writer),
            protocol_version: config.protocol_version,
        })
    }

    pub fn record(&mut self, direction: Direction, data: &[u8]) -> io::Result<()> {
        let entry = CaptureEntry {
            timestamp: Utc::now().timestamp_millis(),
            direction,
            data: data.to_vec(),
            protocol_version: self.protocol_version,
        };
        self.append(&entry)
    }

    pub fn append(&mut self, entry: &CaptureEntry) -> io::Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        let serialized = bincode::serialize(entry).map_err(io::Error::other)?;
        let len = u32::try_from(serialized.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "capture record too large"))?;
        writer.write_all(&len.to_le_bytes())?;
        writer.write_all(&serialized)?;
        writer.flush()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CaptureWriter {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                warn!("Error flushing capture {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Parses every complete record in `data`. A torn record at the end (the
/// writer was killed mid-append) is dropped with a warning.
pub fn parse_capture(data: &[u8]) -> io::Result<Vec<CaptureEntry>> {
    let mut entries = Vec::new();
    let mut at = 0;
    while at < data.len() {
        let Some(prefix) = data.get(at..at + 4) else {
            warn!("Capture ends with a partial length prefix at offset {}", at);
            break;
        };
        let len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        if len == 0 || len > MAX_RECORD_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("bad capture record length {} at offset {}", len, at),
            ));
        }
        let Some(record) = data.get(at + 4..at + 4 + len) else {
            warn!("Capture ends with a partial record at offset {}", at);
            break;
        };
        let entry: CaptureEntry = bincode::deserialize(record).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("record at offset {}: {}", at, e))
        })?;
        entries.push(entry);
        at += 4 + len;
    }
    Ok(entries)
}

pub fn read_capture(path: impl AsRef<Path>) -> io::Result<Vec<CaptureEntry>> {
    let data = std::fs::read(path.as_ref())?;
    parse_capture(&data)
}
