//! Ordered fallback across several parameter stores.

use crate::error::{Error, Result};
use crate::store::{NamesResponse, ParameterStore, PathQuery, RawParameter};
use std::collections::HashMap;

/// Consults stores in order until every name resolves.
///
/// By-name lookups hand each store only the names still unresolved by its
/// predecessors and stop early once none remain; whatever is left after the
/// last store is reported invalid. Path queries merge every supporting
/// store's results with earlier-store precedence, skipping stores that
/// answer `NotImplemented` (e.g. [`EnvStore`](crate::env::EnvStore)).
///
/// # Example
///
/// ```ignore
/// use param_cache::{chain::ChainStore, env::EnvStore};
///
/// // Environment overrides first, remote store as fallback.
/// let store = ChainStore::new(vec![Box::new(EnvStore::with_prefix("MYAPP_"))])
///     .push(RemoteStore::new(client));
/// ```
#[derive(Default)]
pub struct ChainStore {
    stores: Vec<Box<dyn ParameterStore>>,
}

impl ChainStore {
    pub fn new(stores: Vec<Box<dyn ParameterStore>>) -> Self {
        ChainStore { stores }
    }

    /// Append a store to the end of the chain (chainable).
    pub fn push(mut self, store: impl ParameterStore + 'static) -> Self {
        self.stores.push(Box::new(store));
        self
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl ParameterStore for ChainStore {
    fn fetch_by_names(&self, names: &[String], with_decryption: bool) -> Result<NamesResponse> {
        let mut values = HashMap::new();
        let mut remaining: Vec<String> = names.to_vec();

        for store in &self.stores {
            if remaining.is_empty() {
                break;
            }
            let response = store.fetch_by_names(&remaining, with_decryption)?;
            values.extend(response.values);
            remaining = response.invalid_names;
        }

        Ok(NamesResponse {
            values,
            invalid_names: remaining,
        })
    }

    fn fetch_by_path(&self, query: &PathQuery<'_>) -> Result<HashMap<String, RawParameter>> {
        let mut values: HashMap<String, RawParameter> = HashMap::new();
        let mut supported = false;

        for store in &self.stores {
            match store.fetch_by_path(query) {
                Ok(found) => {
                    supported = true;
                    for (name, raw) in found {
                        values.entry(name).or_insert(raw);
                    }
                }
                Err(Error::NotImplemented(_)) => continue,
                Err(error) => return Err(error),
            }
        }

        if !supported {
            return Err(Error::NotImplemented(
                "no store in the chain supports path queries".to_string(),
            ));
        }
        Ok(values)
    }
}
