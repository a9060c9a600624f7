//! Adapter from a page-level remote API to [`ParameterStore`].
//!
//! A real transport (an AWS SDK wrapper, a stub, a recorded fixture) only
//! has to implement [`RemoteClient`]: one call per page, no chunking, no
//! pagination loops. [`RemoteStore`] owns those mechanics:
//!
//! - by-name fetches are chunked at [`NAMES_PER_CALL`] names per call and
//!   the per-chunk results (resolved and invalid alike) merged back together;
//! - path queries follow `next_token` until the backend stops returning one,
//!   so paginated and single-page backends look identical to the cache.

use crate::error::Result;
use crate::store::{NamesResponse, ParameterStore, PathQuery, RawParameter};
use crate::value::ParameterKind;
use std::collections::HashMap;

/// Remote APIs accept at most this many names per by-name call.
pub const NAMES_PER_CALL: usize = 10;

/// One named parameter as it appears on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteParameter {
    pub name: String,
    pub value: String,
    pub kind: ParameterKind,
    pub version: u64,
}

/// One page of a by-name call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamesPage {
    pub parameters: Vec<RemoteParameter>,
    pub invalid_names: Vec<String>,
}

/// One page of a path query.
///
/// `next_token: None` means this was the last (or only) page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathPage {
    pub parameters: Vec<RemoteParameter>,
    pub next_token: Option<String>,
}

/// Page-level contract a remote transport implements.
///
/// Calls map one-to-one onto remote API requests; [`RemoteStore`] never
/// hands more than [`NAMES_PER_CALL`] names to `get_parameters`.
pub trait RemoteClient {
    /// Resolve up to [`NAMES_PER_CALL`] names in one request.
    ///
    /// # Errors
    ///
    /// Returns `Err` on transport failure; unknown names belong in
    /// [`NamesPage::invalid_names`].
    fn get_parameters(&self, names: &[String], with_decryption: bool) -> Result<NamesPage>;

    /// Fetch one page of a path query, resuming from `next_token` if given.
    ///
    /// # Errors
    ///
    /// Returns `Err` on transport failure.
    fn get_parameters_by_path(
        &self,
        query: &PathQuery<'_>,
        next_token: Option<&str>,
    ) -> Result<PathPage>;
}

/// [`ParameterStore`] over any [`RemoteClient`].
#[derive(Clone, Debug, Default)]
pub struct RemoteStore<C: RemoteClient> {
    client: C,
}

impl<C: RemoteClient> RemoteStore<C> {
    pub fn new(client: C) -> Self {
        RemoteStore { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

impl<C: RemoteClient> ParameterStore for RemoteStore<C> {
    fn fetch_by_names(&self, names: &[String], with_decryption: bool) -> Result<NamesResponse> {
        let mut response = NamesResponse::default();

        for batch in names.chunks(NAMES_PER_CALL) {
            let page = self.client.get_parameters(batch, with_decryption)?;
            response.invalid_names.extend(page.invalid_names);
            for parameter in page.parameters {
                response.values.insert(
                    parameter.name,
                    RawParameter {
                        value: parameter.value,
                        kind: parameter.kind,
                        version: parameter.version,
                    },
                );
            }
        }

        debug!(
            "Remote fetch: {} name(s) requested, {} resolved, {} invalid",
            names.len(),
            response.values.len(),
            response.invalid_names.len()
        );
        Ok(response)
    }

    fn fetch_by_path(&self, query: &PathQuery<'_>) -> Result<HashMap<String, RawParameter>> {
        let mut values = HashMap::new();
        let mut next_token: Option<String> = None;

        loop {
            let page = self
                .client
                .get_parameters_by_path(query, next_token.as_deref())?;
            for parameter in page.parameters {
                values.insert(
                    parameter.name,
                    RawParameter {
                        value: parameter.value,
                        kind: parameter.kind,
                        version: parameter.version,
                    },
                );
            }
            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        debug!("Remote path query {}: {} result(s)", query.path, values.len());
        Ok(values)
    }
}
