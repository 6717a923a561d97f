// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only operation log
//!
//! One JSON object per line, each carrying a sequence number and an
//! [`Operation`]. Every append is fsynced before it returns. A final line with
//! no trailing newline is a write torn by a crash: it is dropped and cut from
//! the file on open, whatever bytes it holds. Any other unreadable line is
//! corruption.
//!
//! A failed append is rolled back by truncating to the length before the
//! write. If the rollback fails too, the log refuses further appends.

use bell_core::Operation;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt WAL entry on line {line}: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("WAL sequence out of order on line {line}: expected {expected}, found {found}")]
    OutOfOrder {
        line: usize,
        expected: u64,
        found: u64,
    },
    #[error("failed to encode WAL entry: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("WAL is unusable after a failed rollback")]
    Poisoned,
}

#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    seq: u64,
    op: Operation,
}

/// Parsed contents of a log file
struct Contents {
    ops: Vec<Operation>,
    last_seq: u64,
    /// Byte length of the well-formed prefix
    valid_len: u64,
    torn_tail: bool,
    /// Last entry parsed but was not newline-terminated
    unterminated: bool,
}

/// Injected failures for exercising rollback
#[cfg(test)]
#[derive(Default)]
struct Faults {
    sync: bool,
    rollback: bool,
}

pub struct Wal {
    file: File,
    last_seq: u64,
    poisoned: bool,
    #[cfg(test)]
    faults: Faults,
}

impl Wal {
    /// Open or create the log at `path`, returning the operations it holds
    pub fn open(path: &Path) -> Result<(Self, Vec<Operation>), WalError> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let contents = parse(&bytes)?;

        if contents.torn_tail {
            tracing::warn!(
                path = %path.display(),
                valid_len = contents.valid_len,
                "dropping torn WAL tail"
            );
            file.set_len(contents.valid_len)?;
            file.sync_all()?;
        }
        if contents.unterminated {
            file.write_all(b"\n")?;
            file.sync_all()?;
        }

        let wal = Self {
            file,
            last_seq: contents.last_seq,
            poisoned: false,
            #[cfg(test)]
            faults: Faults::default(),
        };
        Ok((wal, contents.ops))
    }

    /// Append and fsync; returns the entry's sequence number
    ///
    /// On error the file is cut back to its previous length and the sequence
    /// number is not consumed.
    pub fn append(&mut self, op: &Operation) -> Result<u64, WalError> {
        if self.poisoned {
            return Err(WalError::Poisoned);
        }
        let seq = self.last_seq + 1;
        let mut line = serde_json::to_vec(&Entry {
            seq,
            op: op.clone(),
        })?;
        line.push(b'\n');

        let prev_len = self.file.metadata()?.len();
        if let Err(e) = self.write_line(&line) {
            self.rollback(prev_len);
            return Err(e.into());
        }
        self.last_seq = seq;
        Ok(seq)
    }

    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.file.write_all(line)?;
        #[cfg(test)]
        if std::mem::take(&mut self.faults.sync) {
            return Err(io::Error::other("injected sync failure"));
        }
        self.file.sync_all()
    }

    fn rollback(&mut self, len: u64) {
        let result = self.truncate(len);
        if let Err(e) = result {
            tracing::error!(error = %e, len, "WAL rollback failed, refusing further appends");
            self.poisoned = true;
        }
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        #[cfg(test)]
        if std::mem::take(&mut self.faults.rollback) {
            return Err(io::Error::other("injected rollback failure"));
        }
        self.file.set_len(len)?;
        self.file.sync_all()
    }

    /// Make the next fsync fail after the line has been written
    #[cfg(test)]
    pub(crate) fn fail_next_sync(&mut self) {
        self.faults.sync = true;
    }

    /// Make the next rollback fail
    #[cfg(test)]
    pub(crate) fn fail_next_rollback(&mut self) {
        self.faults.rollback = true;
    }

    /// Read the operations in a log without opening it for writing
    ///
    /// A missing file is an empty log.
    #[cfg(test)]
    pub(crate) fn replay(path: &Path) -> Result<Vec<Operation>, WalError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(parse(&bytes)?.ops)
    }
}

fn parse(bytes: &[u8]) -> Result<Contents, WalError> {
    let mut contents = Contents {
        ops: Vec::new(),
        last_seq: 0,
        valid_len: 0,
        torn_tail: false,
        unterminated: false,
    };

    for (index, raw) in bytes.split_inclusive(|b| *b == b'\n').enumerate() {
        let line = index + 1;
        let complete = raw.last() == Some(&b'\n');

        if raw.iter().all(u8::is_ascii_whitespace) {
            contents.valid_len += raw.len() as u64;
            continue;
        }

        let entry: Entry = match serde_json::from_slice(raw) {
            Ok(entry) => entry,
            Err(_) if !complete => {
                contents.torn_tail = true;
                break;
            }
            Err(source) => return Err(WalError::Corrupt { line, source }),
        };

        let expected = contents.last_seq + 1;
        if entry.seq != expected {
            return Err(WalError::OutOfOrder {
                line,
                expected,
                found: entry.seq,
            });
        }

        contents.last_seq = entry.seq;
        contents.valid_len += raw.len() as u64;
        contents.unterminated = !complete;
        contents.ops.push(entry.op);
    }

    Ok(contents)
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
