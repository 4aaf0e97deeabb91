//! Persistence collaborators for the signature store and match lists.
//!
//! ## Format
//!
//! [`JsonFile`] writes a versioned JSON document:
//!
//! ```text
//! { "version": 1,
//!   "records": [ { "identifier": "...", "signature": { "values": [...], "closed": false,
//!                  "normalization": "chord_length" }, "source": "..." }, ... ] }
//!
//! { "version": 1,
//!   "matches": [ { "query": "...", "candidate": "...", "distance": 0.01,
//!                  "alignment": { "reversed": true, "inverted": true, "shift": 0 } }, ... ] }
//! ```
//!
//! Floats are written in shortest round-trip form and parsed exactly, so a
//! save/load cycle reproduces every value bit for bit.

use crate::error::{Result, TearMatchingError};
use crate::matching::MatchResult;
use crate::store::FragmentRecord;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Current document format version
const VERSION: u32 = 1;

/// Durable storage for store contents.
pub trait Persistence {
    fn save_records(&self, records: &[FragmentRecord]) -> Result<()>;
    fn load_records(&self) -> Result<Vec<FragmentRecord>>;
}

/// Destination for ranked match lists.
pub trait MatchExporter {
    fn export_matches(&self, matches: &[MatchResult]) -> Result<()>;
}

#[derive(Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    records: Vec<FragmentRecord>,
}

#[derive(Serialize, Deserialize)]
struct MatchDocument {
    version: u32,
    matches: Vec<MatchResult>,
}

/// A JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write<T: Serialize>(&self, document: &T) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, document)?;
        writer.flush()?;
        Ok(())
    }

    fn check_version(found: u32) -> Result<()> {
        if found != VERSION {
            return Err(TearMatchingError::UnsupportedFormatVersion {
                found,
                expected: VERSION,
            });
        }
        Ok(())
    }

    /// Read back a match list written by [`MatchExporter::export_matches`].
    pub fn load_matches(&self) -> Result<Vec<MatchResult>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let document: MatchDocument = serde_json::from_reader(reader)?;
        Self::check_version(document.version)?;
        Ok(document.matches)
    }
}

impl Persistence for JsonFile {
    fn save_records(&self, records: &[FragmentRecord]) -> Result<()> {
        self.write(&StoreDocument {
            version: VERSION,
            records: records.to_vec(),
        })?;
        info!("Saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    fn load_records(&self) -> Result<Vec<FragmentRecord>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let document: StoreDocument = serde_json::from_reader(reader)?;
        Self::check_version(document.version)?;
        info!("Loaded {} records from {}", document.records.len(), self.path.display());
        Ok(document.records)
    }
}

impl MatchExporter for JsonFile {
    fn export_matches(&self, matches: &[MatchResult]) -> Result<()> {
        self.write(&MatchDocument {
            version: VERSION,
            matches: matches.to_vec(),
        })?;
        info!("Exported {} matches to {}", matches.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::Alignment;
    use crate::signature::{AmplitudeNormalization, TearSignature};
    use crate::store::SignatureStore;

    fn awkward_values() -> Vec<f64> {
        vec![
            0.1 + 0.2,
            -1.0 / 3.0,
            f64::MIN_POSITIVE,
            1e-300,
            -0.0,
            123456789.123456789,
            std::f64::consts::PI,
        ]
    }

    #[test]
    fn store_round_trip_is_bit_exact() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonFile::new(dir.path().join("nested").join("store.json"));

        let mut store = SignatureStore::new();
        store
            .insert(
                "ünïcode id / with spaces",
                TearSignature::from_values(awkward_values(), false, AmplitudeNormalization::ChordLength),
                Some("scans/page 1.png".to_string()),
            )
            .unwrap();
        store
            .insert(
                "loop",
                TearSignature::from_values(vec![0.5, -0.25], true, AmplitudeNormalization::MaxAbsolute),
                None,
            )
            .unwrap();

        store.save(&file).unwrap();
        let reloaded = SignatureStore::load(&file).unwrap();

        assert_eq!(reloaded, store);
        let original = store.get("ünïcode id / with spaces").unwrap().signature.values();
        let restored = reloaded.get("ünïcode id / with spaces").unwrap().signature.values();
        for (a, b) in original.iter().zip(restored) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn matches_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonFile::new(dir.path().join("matches.json"));
        let matches = vec![MatchResult {
            query: "a".to_string(),
            candidate: "b".to_string(),
            distance: 1.0 / 7.0,
            alignment: Alignment {
                reversed: true,
                inverted: false,
                shift: 3,
            },
        }];

        file.export_matches(&matches).unwrap();
        assert_eq!(file.load_matches().unwrap(), matches);
    }

    #[test]
    fn rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.json");
        std::fs::write(&path, r#"{ "version": 99, "records": [] }"#).unwrap();

        let result = JsonFile::new(&path).load_records();
        assert!(matches!(
            result,
            Err(TearMatchingError::UnsupportedFormatVersion { found: 99, expected: 1 })
        ));
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JsonFile::new(&path).load_records(),
            Err(TearMatchingError::Serialization(_))
        ));
    }
}
