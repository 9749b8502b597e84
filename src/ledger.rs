// Collection Ledger
// Append-only CSV of recorded cards and separator markers.
//
// File layout:
//   Passcode,Name,Status,Attack,Defense,Attribute,Database   <- written once
//   12345,Test Dragon,,2500,2100,Monster,LOB                  <- card row
//   --- 100% Holos,,,,,,                                      <- separator row

use crate::card::{CardKind, CardRecord};
use crate::error::{LedgerError, LedgerResult};
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use log::{debug, info, warn};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Column header of a collection file
pub const LEDGER_HEADER: [&str; 7] = [
    "Passcode",
    "Name",
    "Status",
    "Attack",
    "Defense",
    "Attribute",
    "Database",
];

/// Prefix of the label column that marks a separator row
pub const SEPARATOR_MARKER: &str = "--- ";

/// Separator labels offered by the collector UI, in shortcut order
pub const PRESET_SEPARATORS: [&str; 4] = [
    "100% Holos",
    "Picture Holos",
    "Name Holos",
    "Common (None Holo)",
];

// ============================================================================
// ENTRIES
// ============================================================================

/// CardEntry - snapshot of a CardRecord at the time it was recorded
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardEntry {
    pub passcode: String,
    pub name: String,
    pub status: String,
    pub attack: String,
    pub defense: String,
    pub attribute: String,
    pub source_file: String,
}

impl CardEntry {
    pub fn kind(&self) -> CardKind {
        CardKind::from_category(&self.attribute)
    }
}

impl From<&CardRecord> for CardEntry {
    fn from(card: &CardRecord) -> Self {
        CardEntry {
            passcode: card.passcode.clone(),
            name: card.name.clone(),
            status: card.status.clone(),
            attack: card.attack.clone(),
            defense: card.defense.clone(),
            attribute: card.attribute.clone(),
            source_file: card.source_file.clone(),
        }
    }
}

/// One line of the collection file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEntry {
    Card(CardEntry),
    /// Label without the marker
    Separator(String),
}

impl LedgerEntry {
    /// Columns in file order; separators carry the marker in the label column
    fn to_row(&self) -> [String; 7] {
        match self {
            LedgerEntry::Card(c) => [
                c.passcode.clone(),
                c.name.clone(),
                c.status.clone(),
                c.attack.clone(),
                c.defense.clone(),
                c.attribute.clone(),
                c.source_file.clone(),
            ],
            LedgerEntry::Separator(label) => [
                format!("{}{}", SEPARATOR_MARKER, label),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ],
        }
    }

    /// Parse a row back. Short rows are padded with empty columns.
    fn from_row(record: &StringRecord) -> Self {
        let col = |i: usize| record.get(i).unwrap_or("").to_string();
        let first = record.get(0).unwrap_or("");
        let rest_blank = record.iter().skip(1).all(|c| c.is_empty());

        if let Some(label) = first.strip_prefix(SEPARATOR_MARKER) {
            if rest_blank {
                return LedgerEntry::Separator(label.to_string());
            }
        }

        LedgerEntry::Card(CardEntry {
            passcode: col(0),
            name: col(1),
            status: col(2),
            attack: col(3),
            defense: col(4),
            attribute: col(5),
            source_file: col(6),
        })
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, LedgerEntry::Separator(_))
    }
}

fn is_header_row(record: &StringRecord) -> bool {
    record
        .iter()
        .zip(LEDGER_HEADER)
        .all(|(col, name)| col.trim().eq_ignore_ascii_case(name))
        && record.len() >= LEDGER_HEADER.len()
}

// ============================================================================
// LEDGER
// ============================================================================

/// Lifecycle of the backing file, decided once when the ledger is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerState {
    /// File absent or empty: the next append writes the header first
    Created,
    /// File has content: appends write data rows only
    Open,
}

/// CollectionLedger - the user's collection file
#[derive(Debug)]
pub struct CollectionLedger {
    path: PathBuf,
    state: LedgerState,
}

impl CollectionLedger {
    /// Open a ledger without touching the file
    pub fn open(path: impl Into<PathBuf>) -> LedgerResult<Self> {
        let path = path.into();

        let state = match std::fs::metadata(&path) {
            Ok(meta) if meta.len() > 0 => LedgerState::Open,
            Ok(_) => LedgerState::Created,
            Err(err) if err.kind() == ErrorKind::NotFound => LedgerState::Created,
            Err(source) => return Err(LedgerError::Io { path, source }),
        };

        debug!("Opened collection {} ({:?})", path.display(), state);
        Ok(CollectionLedger { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> LedgerState {
        self.state
    }

    /// Append one entry.
    ///
    /// The whole row (plus the header on first write) is serialized in
    /// memory and written with a single call, so a failure leaves either
    /// nothing or one complete row behind. Existing content is never
    /// rewritten.
    pub fn append(&mut self, entry: &LedgerEntry) -> LedgerResult<()> {
        let io_err = |source| LedgerError::Io {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;

        let write_header = self.state == LedgerState::Created;
        let needs_newline = !write_header && !ends_with_newline(&mut file).map_err(io_err)?;

        let mut buf = Vec::new();
        if needs_newline {
            buf.push(b'\n');
        }
        buf.extend(self.serialize_rows(entry, write_header)?);

        file.write_all(&buf).map_err(io_err)?;
        file.flush().map_err(io_err)?;

        self.state = LedgerState::Open;
        match entry {
            LedgerEntry::Card(card) => info!(
                "Recorded {} ({}) in {}",
                card.passcode,
                card.name,
                self.path.display()
            ),
            LedgerEntry::Separator(label) => {
                info!("Added separator '{}' to {}", label, self.path.display())
            }
        }
        Ok(())
    }

    /// Append a snapshot of a reference record
    pub fn record_card(&mut self, card: &CardRecord) -> LedgerResult<()> {
        self.append(&LedgerEntry::Card(CardEntry::from(card)))
    }

    /// Append a separator row; the marker is added on write
    pub fn add_separator(&mut self, label: &str) -> LedgerResult<()> {
        self.append(&LedgerEntry::Separator(label.to_string()))
    }

    /// Read every entry in file order. A missing file is an empty ledger.
    pub fn load_all(&self) -> LedgerResult<Vec<LedgerEntry>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(LedgerError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut entries = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(source) if source.is_io_error() => {
                    return Err(LedgerError::Csv {
                        path: self.path.clone(),
                        source,
                    })
                }
                Err(err) => {
                    warn!("Skipping line {} of {}: {}", i + 1, self.path.display(), err);
                    continue;
                }
            };

            if i == 0 && is_header_row(&record) {
                continue;
            }
            entries.push(LedgerEntry::from_row(&record));
        }

        debug!("Loaded {} entries from {}", entries.len(), self.path.display());
        Ok(entries)
    }

    fn serialize_rows(&self, entry: &LedgerEntry, with_header: bool) -> LedgerResult<Vec<u8>> {
        let csv_err = |source| LedgerError::Csv {
            path: self.path.clone(),
            source,
        };

        let mut writer = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        if with_header {
            writer.write_record(LEDGER_HEADER).map_err(csv_err)?;
        }

        writer.write_record(entry.to_row()).map_err(csv_err)?;

        writer.into_inner().map_err(|err| LedgerError::Io {
            path: self.path.clone(),
            source: err.into_error(),
        })
    }
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
