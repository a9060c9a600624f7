//! Parameter store backed by process environment variables.

use crate::error::{Error, Result};
use crate::store::{NamesResponse, ParameterStore, PathQuery, RawParameter};
use crate::value::ParameterKind;
use std::collections::HashMap;

/// Resolves parameter names from environment variables.
///
/// A name `db_host` with prefix `MYAPP_` is looked up as `MYAPP_DB_HOST`
/// (prefix applied first, then uppercased). Environment values have no
/// remote metadata: everything resolves as kind `String` at version 1.
/// Missing variables are reported as invalid names, not errors, which makes
/// this store a natural first link in a [`ChainStore`](crate::chain::ChainStore).
#[derive(Clone, Debug, Default)]
pub struct EnvStore {
    prefix: String,
}

impl EnvStore {
    /// Store with no prefix: names map straight to uppercased variables.
    pub fn new() -> Self {
        EnvStore::default()
    }

    /// Store that prepends `prefix` before uppercasing.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        EnvStore {
            prefix: prefix.into(),
        }
    }

    fn variable_for(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name).to_uppercase()
    }
}

impl ParameterStore for EnvStore {
    fn fetch_by_names(&self, names: &[String], _with_decryption: bool) -> Result<NamesResponse> {
        let mut response = NamesResponse::default();
        for name in names {
            match std::env::var(self.variable_for(name)) {
                Ok(value) => {
                    response.values.insert(
                        name.clone(),
                        RawParameter {
                            value,
                            kind: ParameterKind::String,
                            version: 1,
                        },
                    );
                }
                Err(_) => response.invalid_names.push(name.clone()),
            }
        }
        Ok(response)
    }

    fn fetch_by_path(&self, _query: &PathQuery<'_>) -> Result<HashMap<String, RawParameter>> {
        // Uppercasing is lossy; there is no faithful way to enumerate names
        // back out of the environment.
        Err(Error::NotImplemented(
            "environment store cannot enumerate parameters by path".to_string(),
        ))
    }
}
