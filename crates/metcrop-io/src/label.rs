//! Classification lookup for specimen identifiers.
//!
//! Training crops are labeled with the meteorite's classification (for
//! example `"L6"` or `"H5"`). Where the label comes from is hidden
//! behind [`ClassificationSource`] so batch code and tests can swap in a
//! fixed table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Errors raised while loading or querying a classification source.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The backing file could not be read.
    #[error("failed to read classifications from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing data is not a JSON object of strings.
    #[error("invalid classification table: {0}")]
    Parse(#[from] serde_json::Error),

    /// The source could not answer for this identifier.
    #[error("classification source unavailable for {identifier:?}: {reason}")]
    Unavailable { identifier: String, reason: String },
}

/// Somewhere raw classification strings can be looked up.
pub trait ClassificationSource {
    /// The raw classification recorded for `identifier`, as stored.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] if the source cannot be queried.
    fn raw_classification(&self, identifier: &str) -> Result<Option<String>, LookupError>;
}

/// A fixed identifier-to-classification table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticClassifications {
    entries: HashMap<String, String>,
}

impl StaticClassifications {
    /// Build a table from `(identifier, classification)` pairs.
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse a JSON object mapping identifiers to classifications.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Parse`] if `json` is not an object whose
    /// values are all strings.
    pub fn from_json_str(json: &str) -> Result<Self, LookupError> {
        Ok(Self {
            entries: serde_json::from_str(json)?,
        })
    }

    /// Load a JSON table from disk.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Io`] if the file cannot be read, or
    /// [`LookupError::Parse`] if it is not a valid table.
    pub fn from_path(path: &Path) -> Result<Self, LookupError> {
        let json = std::fs::read_to_string(path).map_err(|source| LookupError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Number of identifiers in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ClassificationSource for StaticClassifications {
    fn raw_classification(&self, identifier: &str) -> Result<Option<String>, LookupError> {
        Ok(self.entries.get(identifier).cloned())
    }
}

/// Clean a raw classification string.
///
/// Surrounding whitespace and section-sign footnote markers (`§`) are
/// removed. Returns `None` if nothing is left.
#[must_use]
pub fn normalize_label(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|&c| c != '§').collect();
    let trimmed = cleaned.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Look up and normalize the classification for `identifier`.
///
/// The identifier is trimmed before lookup. Unknown identifiers and
/// blank classifications both yield `Ok(None)`.
///
/// # Errors
///
/// Propagates any [`LookupError`] from the source.
pub fn lookup_classification<S>(source: &S, identifier: &str) -> Result<Option<String>, LookupError>
where
    S: ClassificationSource + ?Sized,
{
    let raw = source.raw_classification(identifier.trim())?;
    Ok(raw.as_deref().and_then(normalize_label))
}
