// Reference Index
// Loads card records from reference CSV files (or a compiled artifact)
// and answers lookups by passcode.

use crate::card::CardRecord;
use crate::compiler;
use crate::error::IndexError;
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// COLUMN RESOLUTION
// ============================================================================

/// Logical fields of a reference row, by their UPPERCASE column name.
///
/// Reference files come in two header conventions ("PASSCODE" vs
/// "Passcode", "ATTACK" vs "attack", ...). Both resolve to the same field.
const FIELD_NAMES: [&str; 6] = ["PASSCODE", "NAME", "STATUS", "ATTRIBUTE", "ATTACK", "DEFENSE"];

#[derive(Debug, Default)]
struct ColumnMap {
    columns: [Option<usize>; 6],
}

impl ColumnMap {
    /// An all-uppercase header wins over any other spelling of the same field
    fn resolve(headers: &[String]) -> Self {
        let mut map = ColumnMap::default();

        for (slot, field) in map.columns.iter_mut().zip(FIELD_NAMES) {
            *slot = headers
                .iter()
                .position(|h| h.trim() == field)
                .or_else(|| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(field)));
        }

        map
    }

    fn get<'r>(&self, field: usize, record: &'r StringRecord) -> &'r str {
        self.columns[field]
            .and_then(|i| record.get(i))
            .unwrap_or("")
    }

    fn to_card(&self, record: &StringRecord, source_file: &str) -> CardRecord {
        CardRecord::derive(
            self.get(0, record),
            self.get(1, record),
            self.get(2, record),
            self.get(3, record),
            self.get(4, record),
            self.get(5, record),
            source_file,
        )
    }
}

/// Tag stored on every record: the file name without its extension
pub fn source_tag(path: &Path) -> String {
    path.file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

// ============================================================================
// FILE LOADING
// ============================================================================

/// Read every row of one reference file into CardRecords.
///
/// Missing columns and short rows give empty strings. Rows the reader
/// cannot decode are skipped; I/O failures abort.
pub fn read_reference_file(path: &Path) -> Result<Vec<CardRecord>, IndexError> {
    let source_err = |source| IndexError::Source {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(source_err)?;

    // Header names are decoded lossily: one mis-encoded column name must not
    // cost the other columns of the file
    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(source_err)?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();
    let columns = ColumnMap::resolve(&headers);
    let tag = source_tag(path);

    let mut cards = Vec::new();
    for (line_num, result) in reader.records().enumerate() {
        match result {
            Ok(record) => cards.push(columns.to_card(&record, &tag)),
            Err(err) if err.is_io_error() => return Err(source_err(err)),
            Err(err) => {
                warn!(
                    "Skipping line {} of {}: {}",
                    line_num + 2,
                    path.display(),
                    err
                );
            }
        }
    }

    debug!("Loaded {} cards from {}", cards.len(), path.display());
    Ok(cards)
}

/// All `*.csv` files of a directory, sorted by file name
pub fn list_reference_files(dir: &Path) -> Result<Vec<PathBuf>, IndexError> {
    let dir_err = |source| IndexError::Directory {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(dir_err)? {
        let path = entry.map_err(dir_err)?.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        if is_csv && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

// ============================================================================
// REFERENCE INDEX
// ============================================================================

/// ReferenceIndex - every known card, in build order
///
/// Duplicate passcodes are kept, but only the first one (in build order)
/// is reachable through `lookup`.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    records: Vec<CardRecord>,
    first_by_passcode: HashMap<String, usize>,
}

impl ReferenceIndex {
    pub fn from_records(records: Vec<CardRecord>) -> Self {
        let mut first_by_passcode = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            first_by_passcode.entry(record.passcode.clone()).or_insert(i);
        }

        ReferenceIndex {
            records,
            first_by_passcode,
        }
    }

    /// Build from reference files, in the order given
    pub fn build<P: AsRef<Path>>(sources: &[P]) -> Result<Self, IndexError> {
        let mut records = Vec::new();
        for source in sources {
            records.extend(read_reference_file(source.as_ref())?);
        }

        let index = Self::from_records(records);
        info!(
            "Reference index built: {} cards from {} files",
            index.len(),
            sources.len()
        );
        Ok(index)
    }

    /// Build from every CSV file of a directory
    pub fn build_from_dir(dir: &Path) -> Result<Self, IndexError> {
        let files = list_reference_files(dir)?;
        if files.is_empty() {
            warn!("No reference CSV files found in {}", dir.display());
        }
        Self::build(&files)
    }

    /// Load a compiled artifact written by the batch compiler
    pub fn from_artifact(path: &Path) -> Result<Self, IndexError> {
        let artifact = compiler::read_artifact(path).map_err(|source| IndexError::Artifact {
            path: path.to_path_buf(),
            source,
        })?;

        info!(
            "Loaded compiled artifact {} ({} cards, compiled {})",
            path.display(),
            artifact.cards.len(),
            artifact.compiled_at.to_rfc3339()
        );
        Ok(Self::from_records(artifact.cards))
    }

    /// First record with exactly this passcode (case-sensitive, untrimmed)
    pub fn lookup(&self, passcode: &str) -> Option<&CardRecord> {
        self.first_by_passcode
            .get(passcode)
            .map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[CardRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "LOB.csv",
            "Passcode,Name,Status,attribute,attack,defense\n\
             12345,Test Dragon,,Monster,2500,2100\n",
        );

        let index = ReferenceIndex::build(&[path]).unwrap();
        let card = index.lookup("12345").expect("card should be found");
        assert_eq!(card.name, "Test Dragon");
        assert_eq!(card.attribute, "Monster");
        assert_eq!(card.attack, "2500");
        assert_eq!(card.defense, "2100");
        assert_eq!(card.source_file, "LOB");

        assert!(index.lookup("99999").is_none());
    }

    #[test]
    fn test_lookup_is_exact() {
        let index = ReferenceIndex::from_records(vec![CardRecord::derive(
            "00012", "Card", "", "Dark", "1", "1", "set",
        )]);

        assert!(index.lookup("00012").is_some());
        assert!(index.lookup("12").is_none());
        assert!(index.lookup(" 00012").is_none());
        assert!(index.lookup("00012 ").is_none());
    }

    #[test]
    fn test_both_header_conventions() {
        let dir = TempDir::new().unwrap();
        let upper = write_file(
            &dir,
            "a.csv",
            "PASSCODE,NAME,STATUS,ATTRIBUTE,ATTACK,DEFENSE\n1,Alpha,Limited,DARK,100,200\n",
        );
        let lower = write_file(
            &dir,
            "b.csv",
            "Passcode,Name,Status,attribute,attack,defense\n2,Beta,Limited,dark,100,200\n",
        );

        let index = ReferenceIndex::build(&[upper, lower]).unwrap();
        let a = index.lookup("1").unwrap();
        let b = index.lookup("2").unwrap();

        assert_eq!(a.status, b.status);
        assert_eq!(a.attribute, b.attribute);
        assert_eq!(a.attack, b.attack);
        assert_eq!(a.defense, b.defense);
    }

    #[test]
    fn test_uppercase_column_wins() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "mixed.csv",
            "Passcode,attribute,ATTRIBUTE,Name\n7,water,FIRE,Mixed\n",
        );

        let index = ReferenceIndex::build(&[path]).unwrap();
        assert_eq!(index.lookup("7").unwrap().attribute, "Fire");
    }

    #[test]
    fn test_missing_fields_become_empty() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "short.csv", "Passcode,Name,attack\n55,Short\n");

        let index = ReferenceIndex::build(&[path]).unwrap();
        let card = index.lookup("55").unwrap();
        assert_eq!(card.name, "Short");
        assert_eq!(card.status, "");
        assert_eq!(card.attribute, "");
        assert_eq!(card.attack, "");
        assert_eq!(card.defense, "");
    }

    #[test]
    fn test_latin1_header_keeps_file() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.csv", "Passcode,Name\n1,Valid\n");
        let path = dir.path().join("b.csv");
        let mut content = b"Passcode,Na\xffme,ATTACK\n".to_vec();
        content.extend_from_slice(b"2,Ignored,1500\n");
        fs::write(&path, content).unwrap();

        let index = ReferenceIndex::build_from_dir(dir.path()).unwrap();
        assert_eq!(index.lookup("1").unwrap().name, "Valid");

        let card = index.lookup("2").expect("file with bad header still loads");
        assert_eq!(card.name, "");
        assert_eq!(card.attack, "1500");
    }

    #[test]
    fn test_spell_and_trap_stats_blanked() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "st.csv",
            "PASSCODE,NAME,ATTRIBUTE,ATTACK,DEFENSE\n\
             10,Raigeki,SPELL,?,?\n\
             11,Mirror Force,trap,0,0\n",
        );

        let index = ReferenceIndex::build(&[path]).unwrap();
        for card in index.records() {
            assert!(card.kind().is_non_combat());
            assert_eq!(card.attack, "");
            assert_eq!(card.defense, "");
        }
    }

    #[test]
    fn test_first_match_wins_across_files() {
        let dir = TempDir::new().unwrap();
        let first = write_file(&dir, "a_first.csv", "Passcode,Name\n42,From A\n");
        let second = write_file(&dir, "b_second.csv", "Passcode,Name\n42,From B\n");

        let index = ReferenceIndex::build_from_dir(dir.path()).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup("42").unwrap().name, "From A");

        // Explicit order is respected
        let reversed = ReferenceIndex::build(&[second, first]).unwrap();
        assert_eq!(reversed.lookup("42").unwrap().name, "From B");
    }

    #[test]
    fn test_build_from_dir_ignores_other_files() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "cards.csv", "Passcode,Name\n1,One\n");
        write_file(&dir, "notes.txt", "Passcode,Name\n2,Two\n");
        write_file(&dir, "MORE.CSV", "Passcode,Name\n3,Three\n");

        let files = list_reference_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);

        let index = ReferenceIndex::build_from_dir(dir.path()).unwrap();
        assert!(index.lookup("1").is_some());
        assert!(index.lookup("2").is_none());
        assert_eq!(index.lookup("3").unwrap().source_file, "MORE");
    }

    #[test]
    fn test_missing_directory_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let result = ReferenceIndex::build_from_dir(&missing);
        assert!(matches!(result, Err(IndexError::Directory { .. })));
    }
}
