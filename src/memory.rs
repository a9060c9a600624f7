//! In-memory parameter store for tests and local development.
//!
//! `MemoryStore` behaves like a miniature remote store: every `put` appends
//! a new version to the name's history, bare names resolve to the latest
//! version, and `name:N` selectors resolve to historical ones. Path queries
//! understand recursive and one-level semantics. Clones share state, so a
//! test can keep one handle for seeding while a cache holds another.

use crate::error::Result;
use crate::filters::{FilterKey, FilterOption, FilterRecord};
use crate::store::{NamesResponse, ParameterStore, PathQuery, RawParameter};
use crate::value::ParameterKind;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

struct StoredParameter {
    kind: ParameterKind,
    /// Version `N` lives at index `N - 1`.
    history: Vec<String>,
}

/// Shared-state in-memory [`ParameterStore`].
///
/// # Example
///
/// ```
/// use param_cache::{memory::MemoryStore, Parameter};
///
/// let store = MemoryStore::new();
/// store.put("db_host", "db.internal");
///
/// let parameter = Parameter::new("db_host", store.clone()).expect("valid name");
/// assert_eq!(parameter.value().expect("resolves").as_str(), Some("db.internal"));
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<HashMap<String, StoredParameter>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Store a `String`-kind value, appending a new version.
    ///
    /// Returns the version just written (1 for a fresh name).
    pub fn put(&self, name: impl Into<String>, value: impl Into<String>) -> u64 {
        self.put_kind(name, value, ParameterKind::String)
    }

    /// Store a value with an explicit kind, appending a new version.
    pub fn put_kind(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
        kind: ParameterKind,
    ) -> u64 {
        let mut map = self.inner.borrow_mut();
        let stored = map.entry(name.into()).or_insert_with(|| StoredParameter {
            kind,
            history: Vec::new(),
        });
        stored.kind = kind;
        stored.history.push(value.into());
        stored.history.len() as u64
    }

    /// Delete a name and its whole history.
    pub fn remove(&self, name: &str) {
        self.inner.borrow_mut().remove(name);
    }

    /// Number of stored names (not versions).
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    fn resolve(&self, selector: &str) -> Option<RawParameter> {
        let map = self.inner.borrow();

        // A literally stored name wins over selector parsing.
        if let Some(stored) = map.get(selector) {
            return latest(stored);
        }

        let (name, suffix) = selector.rsplit_once(':')?;
        let stored = map.get(name)?;
        let version = suffix.parse::<usize>().ok()?;
        if version == 0 || version > stored.history.len() {
            return None;
        }
        Some(RawParameter {
            value: stored.history[version - 1].clone(),
            kind: stored.kind,
            version: version as u64,
        })
    }
}

fn latest(stored: &StoredParameter) -> Option<RawParameter> {
    let value = stored.history.last()?;
    Some(RawParameter {
        value: value.clone(),
        kind: stored.kind,
        version: stored.history.len() as u64,
    })
}

/// Whether `name` sits under `path`, honoring the recursion flag.
fn under_path(name: &str, path: &str, recursive: bool) -> bool {
    let Some(relative) = name.strip_prefix(path) else {
        return false;
    };
    // Segment boundary: "/Rooted/x" is not under "/Root".
    let relative = if path.ends_with('/') {
        relative
    } else {
        match relative.strip_prefix('/') {
            Some(rest) => rest,
            None => return false,
        }
    };
    !relative.is_empty() && (recursive || !relative.contains('/'))
}

/// Equality filters on `Type` are honored; everything else is accepted
/// opaquely, as a remote store would.
fn passes_filters(kind: ParameterKind, filters: &[FilterRecord]) -> bool {
    filters
        .iter()
        .filter(|record| record.key == FilterKey::Type && record.option == FilterOption::Equals)
        .all(|record| {
            record.values.is_empty() || record.values.iter().any(|v| v == kind.as_str())
        })
}

impl ParameterStore for MemoryStore {
    fn fetch_by_names(&self, names: &[String], _with_decryption: bool) -> Result<NamesResponse> {
        let mut response = NamesResponse::default();
        for name in names {
            match self.resolve(name) {
                Some(raw) => {
                    response.values.insert(name.clone(), raw);
                }
                None => response.invalid_names.push(name.clone()),
            }
        }
        Ok(response)
    }

    fn fetch_by_path(&self, query: &PathQuery<'_>) -> Result<HashMap<String, RawParameter>> {
        let map = self.inner.borrow();
        let mut values = HashMap::new();
        for (name, stored) in map.iter() {
            if !under_path(name, query.path, query.recursive) {
                continue;
            }
            if !passes_filters(stored.kind, query.filters) {
                continue;
            }
            if let Some(raw) = latest(stored) {
                values.insert(name.clone(), raw);
            }
        }
        Ok(values)
    }
}
