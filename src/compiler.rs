// Batch Compiler
// Denormalizes a directory of reference CSVs into one JSON artifact so the
// collector can start without re-scanning every file.
//
// Artifact keys are UPPERCASE throughout:
// { "COMPILED_AT": "...", "SOURCE_FILES": ["LOB.csv", ...], "CARDS": [{ "PASSCODE": ... }] }

use crate::card::CardRecord;
use crate::error::CompileError;
use crate::reference::{list_reference_files, read_reference_file};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CompiledArtifact {
    pub compiled_at: DateTime<Utc>,
    /// File names that went into the artifact, in build order
    pub source_files: Vec<String>,
    pub cards: Vec<CardRecord>,
}

/// Compile every reference CSV of `source_dir`.
///
/// Any unreadable directory or file fails the whole run.
pub fn compile(source_dir: &Path) -> Result<CompiledArtifact, CompileError> {
    let files = list_reference_files(source_dir)?;

    let mut cards = Vec::new();
    let mut source_files = Vec::with_capacity(files.len());
    for file in &files {
        cards.extend(read_reference_file(file)?);
        source_files.push(
            file.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
    }

    info!(
        "Compiled {} cards from {} files in {}",
        cards.len(),
        files.len(),
        source_dir.display()
    );

    Ok(CompiledArtifact {
        compiled_at: Utc::now(),
        source_files,
        cards,
    })
}

/// Write the artifact, replacing any previous one.
///
/// Written to a sibling temp file first and renamed into place.
pub fn write_artifact(artifact: &CompiledArtifact, path: &Path) -> Result<(), CompileError> {
    let io_err = |source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    {
        let file = File::create(&tmp_path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, artifact).map_err(|source| {
            CompileError::Serialization {
                path: path.to_path_buf(),
                source,
            }
        })?;
        writer.write_all(b"\n").map_err(io_err)?;
        writer.flush().map_err(io_err)?;
    }
    fs::rename(&tmp_path, path).map_err(io_err)?;

    info!("Wrote {} cards to {}", artifact.cards.len(), path.display());
    Ok(())
}

pub fn read_artifact(path: &Path) -> Result<CompiledArtifact, CompileError> {
    let file = File::open(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|source| CompileError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

/// compile + write_artifact
pub fn compile_to(source_dir: &Path, output: &Path) -> Result<CompiledArtifact, CompileError> {
    let artifact = compile(source_dir)?;
    write_artifact(&artifact, output)?;
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceIndex;
    use tempfile::TempDir;

    fn reference_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("LOB.csv"),
            "Passcode,Name,Status,attribute,attack,defense\n\
             89631139,Blue-Eyes White Dragon,,light,3000,2500\n\
             12345,Test Dragon,,Monster,2500,2100\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("MRD.csv"),
            "PASSCODE,NAME,STATUS,ATTRIBUTE,ATTACK,DEFENSE\n\
             44095762,Mirror Force,Limited,TRAP,0,0\n\
             12345,Shadowed Dragon,,DARK,1,1\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_compile_collects_all_files() {
        let dir = reference_dir();
        let artifact = compile(dir.path()).unwrap();

        assert_eq!(artifact.source_files, vec!["LOB.csv", "MRD.csv"]);
        assert_eq!(artifact.cards.len(), 4);

        let trap = artifact.cards.iter().find(|c| c.passcode == "44095762").unwrap();
        assert_eq!(trap.attribute, "Trap");
        assert_eq!(trap.attack, "");
        assert_eq!(trap.source_file, "MRD");
    }

    #[test]
    fn test_artifact_keys_are_uppercase() {
        let dir = reference_dir();
        let out = dir.path().join("out").join("cards.json");
        compile_to(dir.path(), &out).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert!(json.get("COMPILED_AT").is_some());
        assert!(json.get("SOURCE_FILES").is_some());
        let first = &json["CARDS"][0];
        assert_eq!(first["PASSCODE"], "89631139");
        assert_eq!(first["SOURCE_FILE"], "LOB");
        assert!(first.get("passcode").is_none());
    }

    #[test]
    fn test_artifact_index_matches_directory_index() {
        let dir = reference_dir();
        let out = dir.path().join("cards.json");
        compile_to(dir.path(), &out).unwrap();

        let from_dir = ReferenceIndex::build_from_dir(dir.path()).unwrap();
        let from_artifact = ReferenceIndex::from_artifact(&out).unwrap();

        assert_eq!(from_dir.records(), from_artifact.records());
        // First match wins survives compilation
        assert_eq!(from_artifact.lookup("12345").unwrap().name, "Test Dragon");
    }

    #[test]
    fn test_recompile_regenerates() {
        let dir = reference_dir();
        let out = dir.path().join("cards.json");
        compile_to(dir.path(), &out).unwrap();

        fs::remove_file(dir.path().join("MRD.csv")).unwrap();
        compile_to(dir.path(), &out).unwrap();

        let artifact = read_artifact(&out).unwrap();
        assert_eq!(artifact.source_files, vec!["LOB.csv"]);
        assert_eq!(artifact.cards.len(), 2);
    }

    #[test]
    fn test_missing_source_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = compile(&dir.path().join("missing"));
        assert!(matches!(result, Err(CompileError::Index(_))));
    }
}
