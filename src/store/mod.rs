//! In-memory collection of fragment signatures.
//!
//! The store is an owned value: callers mutate it through `&mut self` and
//! must provide their own mutual exclusion if several threads insert.

pub mod corpus;
pub mod persistence;

pub use corpus::{CorpusEntry, DirectoryCorpus};
pub use persistence::{JsonFile, MatchExporter, Persistence};

use crate::error::{Result, TearMatchingError};
use crate::pipeline::TearPipeline;
use crate::signature::TearSignature;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A fragment's tear signature and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentRecord {
    pub identifier: String,
    pub signature: TearSignature,
    /// Source path or other provenance, if known
    pub source: Option<String>,
}

/// One corpus item that could not be turned into a record.
#[derive(Debug)]
pub struct BuildFailure {
    pub identifier: String,
    pub source: Option<String>,
    pub error: TearMatchingError,
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{} ({}): {}", self.identifier, source, self.error),
            None => write!(f, "{}: {}", self.identifier, self.error),
        }
    }
}

/// Outcome of [`SignatureStore::bulk_build`].
#[derive(Debug, Default)]
pub struct BulkBuildReport {
    pub built: Vec<FragmentRecord>,
    pub failures: Vec<BuildFailure>,
}

impl BulkBuildReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureStore {
    records: BTreeMap<String, FragmentRecord>,
}

impl SignatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from records, rejecting repeated identifiers.
    pub fn from_records(records: impl IntoIterator<Item = FragmentRecord>) -> Result<Self> {
        let mut store = Self::new();
        for record in records {
            store.insert_record(record)?;
        }
        Ok(store)
    }

    /// Add a signature. Existing identifiers are never overwritten.
    pub fn insert(
        &mut self,
        identifier: impl Into<String>,
        signature: TearSignature,
        source: Option<String>,
    ) -> Result<&FragmentRecord> {
        self.insert_record(FragmentRecord {
            identifier: identifier.into(),
            signature,
            source,
        })
    }

    fn insert_record(&mut self, record: FragmentRecord) -> Result<&FragmentRecord> {
        use std::collections::btree_map::Entry;

        match self.records.entry(record.identifier.clone()) {
            Entry::Occupied(entry) => Err(TearMatchingError::DuplicateIdentifier(entry.key().clone())),
            Entry::Vacant(entry) => Ok(entry.insert(record)),
        }
    }

    /// Extract and insert a signature for every corpus entry.
    ///
    /// Entries that fail to load, extract, build or insert are collected in
    /// the report's failure list; the rest of the batch carries on.
    pub fn bulk_build<I>(&mut self, corpus: I, pipeline: &TearPipeline) -> BulkBuildReport
    where
        I: IntoIterator<Item = CorpusEntry>,
    {
        let mut report = BulkBuildReport::default();

        for entry in corpus {
            let CorpusEntry {
                identifier,
                source,
                mask,
            } = entry;

            let outcome = mask
                .and_then(|mask| pipeline.signature_from_mask(&mask))
                .and_then(|signature| {
                    self.insert(identifier.clone(), signature, source.clone())
                        .map(Clone::clone)
                });

            match outcome {
                Ok(record) => report.built.push(record),
                Err(error) => {
                    warn!("Skipping '{}': {}", identifier, error);
                    report.failures.push(BuildFailure {
                        identifier,
                        source,
                        error,
                    });
                }
            }
        }

        info!(
            "Bulk build finished: {} records built, {} failures, {} records in store",
            report.built.len(),
            report.failures.len(),
            self.len()
        );
        report
    }

    pub fn get(&self, identifier: &str) -> Option<&FragmentRecord> {
        self.records.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.records.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in identifier order
    pub fn iter(&self) -> impl Iterator<Item = &FragmentRecord> {
        self.records.values()
    }

    /// Read-only view of the whole mapping.
    pub fn all(&self) -> &BTreeMap<String, FragmentRecord> {
        &self.records
    }

    /// Hand every record to a persistence collaborator.
    pub fn save(&self, sink: &impl Persistence) -> Result<()> {
        let records: Vec<FragmentRecord> = self.records.values().cloned().collect();
        sink.save_records(&records)
    }

    /// Rebuild a store from a persistence collaborator.
    pub fn load(source: &impl Persistence) -> Result<Self> {
        Self::from_records(source.load_records()?)
    }
}
