//! # Ground-Truth Statistics
//!
//! For each query instance the exact enumerator records the true cardinality of
//! every sub-join it encountered. This module loads those records and serves them
//! to the cost evaluator.
//!
//! ## Source Format
//!
//! ```text
//! line 0   header (ignored)
//! line 1   whitespace-separated relation names; the i-th name owns bit i
//! line 2   separator (ignored)
//! line 3+  <relation-set bitmask> <cardinality>
//! ```
//!
//! Both tokens are unsigned: a relation set is a bitmask and a cardinality is a
//! row count, so it is never negative. Records whose tokens do not parse as
//! unsigned integers (`2 -3` included), and lines with fewer than two tokens,
//! are skipped without failing the load. Only a missing or
//! unreadable source, a missing name header, or more names than a `RelationSet`
//! can hold fail the load as a whole.
//!
//! ## Trait Design
//!
//! The evaluator reads statistics through `CardinalityCatalog` rather than the
//! concrete `GroundTruth` so that other statistic sources (estimators, remote
//! stores) can be replayed through the same cost fold.

use crate::relset::{RelationSet, MAX_RELATIONS};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

const NAMES_LINE: usize = 1;
const FIRST_RECORD_LINE: usize = 3;

/// Read access to the relation names and sub-join cardinalities of one query.
pub trait CardinalityCatalog: Send + Sync {
    /// Bit index of the named relation, if the name is known.
    fn relation_index(&self, name: &str) -> Option<u32>;
    /// True cardinality of the relation set, if it was recorded.
    fn cardinality(&self, set: RelationSet) -> Option<f64>;
}

/// Errors that make a ground-truth source unusable.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source file could not be opened or read.
    #[error("failed to read ground truth {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The source has no relation-name line.
    #[error("ground truth is missing the relation name header")]
    MissingHeader,
    /// The name header lists more relations than fit in a relation set.
    #[error("ground truth names {count} relations, at most {max} are supported", max = MAX_RELATIONS)]
    TooManyRelations { count: usize },
}

/// Relation names and recorded cardinalities for one query instance.
#[derive(Debug, Clone, Default)]
pub struct GroundTruth {
    /// Relation names in header order; the position is the bit index.
    relations: Vec<String>,
    /// Name to bit index.
    index: HashMap<String, u32>,
    /// Relation set to true cardinality.
    cardinalities: HashMap<RelationSet, f64>,
    /// Data lines that were dropped while parsing.
    skipped_records: usize,
}

impl GroundTruth {
    /// Create a store for the given relations, in bit order, with no cardinalities.
    pub fn new<I, S>(names: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let relations: Vec<String> = names.into_iter().map(Into::into).collect();
        if relations.len() > MAX_RELATIONS {
            return Err(LoadError::TooManyRelations {
                count: relations.len(),
            });
        }

        let mut index = HashMap::with_capacity(relations.len());
        for (i, name) in relations.iter().enumerate() {
            // First occurrence keeps its bit; the header is expected to be unique.
            index.entry(name.clone()).or_insert(i as u32);
        }

        Ok(Self {
            relations,
            index,
            cardinalities: HashMap::new(),
            skipped_records: 0,
        })
    }

    /// Record the true cardinality of a relation set. A later record for the same
    /// set replaces the earlier one.
    pub fn insert(&mut self, set: RelationSet, cardinality: f64) {
        self.cardinalities.insert(set, cardinality);
    }

    /// Builder form of `insert` keyed by raw mask bits.
    pub fn with_cardinality(mut self, bits: u64, cardinality: f64) -> Self {
        self.insert(RelationSet::from_bits(bits), cardinality);
        self
    }

    /// Load ground truth from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let truth = Self::parse(&text)?;
        debug!(
            path = %path.display(),
            relations = truth.relations.len(),
            records = truth.cardinalities.len(),
            skipped = truth.skipped_records,
            "Loaded ground truth"
        );
        Ok(truth)
    }

    /// Parse ground truth from its text form.
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        let lines: Vec<&str> = text.lines().collect();
        let header = lines.get(NAMES_LINE).ok_or(LoadError::MissingHeader)?;
        let mut truth = Self::new(header.split_whitespace())?;

        for (line_no, line) in lines.iter().enumerate().skip(FIRST_RECORD_LINE) {
            let mut tokens = line.split_whitespace();
            let (Some(set), Some(card)) = (tokens.next(), tokens.next()) else {
                if !line.trim().is_empty() {
                    trace!(line = line_no, "Skipping short ground-truth record");
                    truth.skipped_records += 1;
                }
                continue;
            };
            match (set.parse::<u64>(), card.parse::<u64>()) {
                (Ok(set), Ok(card)) => truth.insert(RelationSet::from_bits(set), card as f64),
                _ => {
                    trace!(line = line_no, "Skipping unparsable ground-truth record");
                    truth.skipped_records += 1;
                }
            }
        }

        Ok(truth)
    }

    /// Relation names in bit order.
    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    pub fn num_records(&self) -> usize {
        self.cardinalities.len()
    }

    /// True when no cardinality record was loaded; such an instance cannot be
    /// evaluated meaningfully.
    pub fn is_empty(&self) -> bool {
        self.cardinalities.is_empty()
    }

    /// Number of non-blank data lines dropped during parsing.
    pub fn skipped_records(&self) -> usize {
        self.skipped_records
    }
}

impl CardinalityCatalog for GroundTruth {
    fn relation_index(&self, name: &str) -> Option<u32> {
        self.index.get(name).copied()
    }

    fn cardinality(&self, set: RelationSet) -> Option<f64> {
        self.cardinalities.get(&set).copied()
    }
}
