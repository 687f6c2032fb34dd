//! File-backed command log
//!
//! A single regular file holding a concatenation of frames. Every append is
//! flushed and fsynced before it returns, so an acknowledged record survives
//! a crash. Replay reads the file front to back through a separate handle;
//! a truncated frame at the tail is the signature of a crash mid-append and
//! is dropped, anything else that fails to decode aborts recovery.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{KvError, Result};
use crate::record::MutationRecord;

use super::frame::{decode_payload, encode_frame, oversized, LEN_PREFIX_SIZE, MAX_FRAME_PAYLOAD};

/// Name of the log file inside the data directory
pub const LOG_FILE_NAME: &str = "commands.log";

/// Append-only framed log file
#[derive(Debug)]
pub struct FileLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileLog {
    /// Open or create the log file under `dir`
    ///
    /// The write handle is opened in append mode; it never truncates
    /// existing frames.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(LOG_FILE_NAME);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(FileLog {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Append one record and force it to stable storage
    pub fn append(&mut self, record: &MutationRecord) -> Result<()> {
        let frame = encode_frame(record)?;
        self.writer.write_all(&frame)?;
        self.sync()
    }

    /// Flush buffered frames and fsync the file
    fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Replay every complete frame, in file order, through `visit`
    ///
    /// A truncated frame at the tail is discarded from the file so that
    /// subsequent appends continue at the end of the last complete frame.
    /// An oversized length prefix or an undecodable complete payload aborts
    /// with a corruption error.
    pub fn replay<F>(&mut self, mut visit: F) -> Result<u64>
    where
        F: FnMut(MutationRecord),
    {
        let file = File::open(&self.path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut recovered = 0u64;
        let mut valid_end = 0u64;

        loop {
            let mut len_buf = [0u8; LEN_PREFIX_SIZE];
            match read_full(&mut reader, &mut len_buf)? {
                ReadOutcome::Eof => break,
                // Crash mid-append left a bare partial prefix
                ReadOutcome::Partial => break,
                ReadOutcome::Full => {}
            }

            let len = u32::from_be_bytes(len_buf) as usize;
            if len > MAX_FRAME_PAYLOAD {
                return Err(oversized(len));
            }

            let mut payload = vec![0u8; len];
            match read_full(&mut reader, &mut payload)? {
                // Crash mid-append left a short payload
                ReadOutcome::Eof | ReadOutcome::Partial => break,
                ReadOutcome::Full => {}
            }

            visit(decode_payload(&payload)?);
            recovered += 1;
            valid_end += (LEN_PREFIX_SIZE + len) as u64;
        }

        if valid_end < file_len {
            tracing::warn!(
                dropped = file_len - valid_end,
                "discarding trailing partial frame"
            );
            self.truncate_to(valid_end)?;
        }

        Ok(recovered)
    }

    /// Cut the file back to the end of the last complete frame
    fn truncate_to(&mut self, len: u64) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().set_len(len)?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

enum ReadOutcome {
    /// Buffer completely filled
    Full,
    /// EOF before any byte was read
    Eof,
    /// EOF after some but not all bytes were read
    Partial,
}

fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<ReadOutcome> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Ok(if filled == 0 {
                    ReadOutcome::Eof
                } else {
                    ReadOutcome::Partial
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(KvError::Io(e)),
        }
    }
    Ok(ReadOutcome::Full)
}
