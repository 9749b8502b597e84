// Collector session
// Glue between a front end and the core: one ReferenceIndex and one
// CollectionLedger, injected at construction, plus the entries on display.

use crate::card::CardRecord;
use crate::config::Config;
use crate::error::{IndexError, LedgerResult};
use crate::ledger::{CollectionLedger, LedgerEntry};
use crate::reference::ReferenceIndex;
use log::info;

/// Result of a passcode search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Found and appended to the collection
    Recorded(CardRecord),
    NotFound(String),
    /// Nothing was typed
    EmptyInput,
}

impl SearchOutcome {
    /// One-line message shown to the user
    pub fn message(&self) -> String {
        match self {
            SearchOutcome::Recorded(card) => format!("Recorded {} - {}", card.passcode, card.name),
            SearchOutcome::NotFound(passcode) => {
                format!("Card not found: no card with passcode {}", passcode)
            }
            SearchOutcome::EmptyInput => "Please enter a passcode".to_string(),
        }
    }
}

pub struct Session {
    index: ReferenceIndex,
    ledger: CollectionLedger,
    entries: Vec<LedgerEntry>,
}

impl Session {
    /// Takes ownership of both services and loads the current collection
    pub fn new(index: ReferenceIndex, ledger: CollectionLedger) -> LedgerResult<Self> {
        let entries = ledger.load_all()?;
        Ok(Session {
            index,
            ledger,
            entries,
        })
    }

    /// Look the passcode up and record it on a hit.
    ///
    /// Blank input is rejected without a lookup; otherwise the input is
    /// used as-is. A failed append is returned and nothing is shown.
    pub fn search(&mut self, input: &str) -> LedgerResult<SearchOutcome> {
        if input.trim().is_empty() {
            return Ok(SearchOutcome::EmptyInput);
        }

        let card = match self.index.lookup(input) {
            Some(card) => card.clone(),
            None => {
                info!("Card not found: {}", input);
                return Ok(SearchOutcome::NotFound(input.to_string()));
            }
        };

        self.ledger.record_card(&card)?;
        self.entries.push(LedgerEntry::Card((&card).into()));
        Ok(SearchOutcome::Recorded(card))
    }

    pub fn add_separator(&mut self, label: &str) -> LedgerResult<()> {
        self.ledger.add_separator(label)?;
        self.entries.push(LedgerEntry::Separator(label.to_string()));
        Ok(())
    }

    /// Re-read the collection file
    pub fn reload(&mut self) -> LedgerResult<()> {
        self.entries = self.ledger.load_all()?;
        Ok(())
    }

    /// Point the session at another collection file and show its contents.
    /// On failure the current ledger stays in place.
    pub fn switch_ledger(&mut self, ledger: CollectionLedger) -> LedgerResult<()> {
        let entries = ledger.load_all()?;
        info!("Switched collection to {}", ledger.path().display());
        self.ledger = ledger;
        self.entries = entries;
        Ok(())
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn index(&self) -> &ReferenceIndex {
        &self.index
    }

    pub fn ledger(&self) -> &CollectionLedger {
        &self.ledger
    }
}

/// Build the reference index a config points at: the compiled artifact
/// when present, the reference directory otherwise
pub fn load_index(config: &Config) -> Result<ReferenceIndex, IndexError> {
    match config.usable_artifact() {
        Some(artifact) => ReferenceIndex::from_artifact(artifact),
        None => ReferenceIndex::build_from_dir(&config.reference_dir),
    }
}
