//! Query filters for path-based parameter discovery.
//!
//! Filters are built and validated locally, then serialized into the plain
//! `{Key, Option, Values}` records the remote query API expects. The cache
//! itself never interprets them — they ride along on
//! [`fetch_by_path`](crate::store::ParameterStore::fetch_by_path) calls.

use crate::error::{Error, Result};
use crate::value::ParameterKind;
use serde::Serialize;

/// Maximum number of values a single filter may carry.
pub const MAX_FILTER_VALUES: usize = 50;

/// What a filter matches against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FilterKey {
    Name,
    Type,
    KeyId,
    Path,
}

/// How a filter matches.
///
/// `Recursive` and `OneLevel` apply only to [`FilterKey::Path`]; every other
/// key takes `Equals` or `BeginsWith`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FilterOption {
    Equals,
    BeginsWith,
    Recursive,
    OneLevel,
}

/// A validated query filter.
///
/// Values are appended with the chainable [`value`](Self::value) /
/// [`values`](Self::values) methods; duplicates collapse and the count is
/// capped at [`MAX_FILTER_VALUES`].
///
/// # Example
///
/// ```
/// use param_cache::filters::ParameterFilter;
///
/// let filter = ParameterFilter::by_kind()
///     .value("SecureString")
///     .expect("valid kind");
/// let record = filter.to_record();
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterFilter {
    key: FilterKey,
    option: FilterOption,
    values: Vec<String>,
}

impl ParameterFilter {
    /// Create a filter, validating the key/option combination.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` when the option is not allowed for the
    /// key (path keys take `Recursive`/`OneLevel`, all others
    /// `Equals`/`BeginsWith`).
    pub fn new(key: FilterKey, option: FilterOption) -> Result<Self> {
        let allowed = match key {
            FilterKey::Path => matches!(option, FilterOption::Recursive | FilterOption::OneLevel),
            _ => matches!(option, FilterOption::Equals | FilterOption::BeginsWith),
        };
        if !allowed {
            return Err(Error::ConfigError(format!(
                "invalid option {:?} for filter key {:?}",
                option, key
            )));
        }
        Ok(ParameterFilter {
            key,
            option,
            values: Vec::new(),
        })
    }

    /// Equality filter on the parameter type.
    pub fn by_kind() -> Self {
        ParameterFilter {
            key: FilterKey::Type,
            option: FilterOption::Equals,
            values: Vec::new(),
        }
    }

    /// Equality filter on the encryption key id.
    pub fn by_key_id() -> Self {
        ParameterFilter {
            key: FilterKey::KeyId,
            option: FilterOption::Equals,
            values: Vec::new(),
        }
    }

    pub fn key(&self) -> FilterKey {
        self.key
    }

    pub fn option(&self) -> FilterOption {
        self.option
    }

    /// Append one value (chainable). Duplicates are collapsed.
    ///
    /// # Errors
    ///
    /// - `Error::ConfigError` past [`MAX_FILTER_VALUES`] distinct values
    /// - `Error::ConfigError` for a `Type`-keyed filter whose value is not a
    ///   known parameter kind
    pub fn value(mut self, value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if self.key == FilterKey::Type && !is_known_kind(&value) {
            return Err(Error::ConfigError(format!(
                "invalid value for Type filter: {}",
                value
            )));
        }
        if self.values.contains(&value) {
            return Ok(self);
        }
        if self.values.len() == MAX_FILTER_VALUES {
            return Err(Error::ConfigError(format!(
                "filters accept at most {} values",
                MAX_FILTER_VALUES
            )));
        }
        self.values.push(value);
        Ok(self)
    }

    /// Append several values (chainable).
    ///
    /// # Errors
    ///
    /// Same as [`value`](Self::value); fails on the first offending value.
    pub fn values<I, V>(mut self, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        for value in values {
            self = self.value(value)?;
        }
        Ok(self)
    }

    /// Serialize into the wire record passed to the backing store.
    pub fn to_record(&self) -> FilterRecord {
        FilterRecord {
            key: self.key,
            option: self.option,
            values: self.values.clone(),
        }
    }
}

/// Plain filter record as the remote query API expects it.
///
/// Serializes to `{"Key": ..., "Option": ..., "Values": [...]}` with
/// `Values` omitted entirely when empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilterRecord {
    pub key: FilterKey,
    pub option: FilterOption,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

fn is_known_kind(value: &str) -> bool {
    [
        ParameterKind::String,
        ParameterKind::StringList,
        ParameterKind::SecureString,
    ]
    .iter()
    .any(|kind| kind.as_str() == value)
}
