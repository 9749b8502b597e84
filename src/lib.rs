// TCG Collector - Core Library
// Exposes the reference index, the collection ledger and the batch compiler
// for the collector UI, the compile binary, and tests

pub mod card;
pub mod compiler;
pub mod config;
pub mod error;
pub mod ledger;
pub mod reference;
pub mod session;

// Re-export commonly used types
pub use card::{normalize_category, CardKind, CardRecord};
pub use compiler::{compile, compile_to, read_artifact, write_artifact, CompiledArtifact};
pub use config::{Config, Overrides};
pub use error::{CompileError, IndexError, LedgerError};
pub use ledger::{
    CardEntry, CollectionLedger, LedgerEntry, LedgerState, LEDGER_HEADER, PRESET_SEPARATORS,
    SEPARATOR_MARKER,
};
pub use reference::{list_reference_files, read_reference_file, ReferenceIndex};
pub use session::{load_index, SearchOutcome, Session};
