//! Backing store contract.
//!
//! Everything the cache needs from a parameter source fits in two
//! operations: resolve a list of names, and enumerate names under a path
//! prefix. Implementations in this crate: [`RemoteStore`](crate::remote::RemoteStore)
//! (adapting a real transport), [`MemoryStore`](crate::memory::MemoryStore),
//! [`EnvStore`](crate::env::EnvStore), and [`ChainStore`](crate::chain::ChainStore).
//!
//! Stores are injected per [`Parameter`](crate::Parameter) /
//! [`ParameterGroup`](crate::ParameterGroup) — there is no process-global
//! client to swap out.

use crate::error::Result;
use crate::filters::FilterRecord;
use crate::value::ParameterKind;
use std::collections::HashMap;

/// A resolved parameter as reported by a store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawParameter {
    /// Raw payload, before any `StringList` splitting.
    pub value: String,
    pub kind: ParameterKind,
    /// Store-side version of this payload.
    pub version: u64,
}

/// Outcome of a by-name fetch.
///
/// A name the store does not know is *not* a transport error: it lands in
/// `invalid_names` and the call still succeeds. Callers decide how to react
/// (the cache treats any unresolved name as a failed refresh).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamesResponse {
    pub values: HashMap<String, RawParameter>,
    pub invalid_names: Vec<String>,
}

/// A path-prefix query.
#[derive(Clone, Copy, Debug)]
pub struct PathQuery<'a> {
    /// Absolute path prefix (starts with `/`).
    pub path: &'a str,
    /// Descend the whole hierarchy, or one level only.
    pub recursive: bool,
    pub with_decryption: bool,
    /// Serialized filters, forwarded opaquely.
    pub filters: &'a [FilterRecord],
}

/// Trait for parameter store implementations.
///
/// Object-safe and synchronous: every call blocks until the store answers.
/// The cache performs no retries and no timeouts of its own — transport
/// concerns live entirely behind this trait.
pub trait ParameterStore {
    /// Resolve the given names.
    ///
    /// Implementations over batched remote APIs must chunk oversized name
    /// lists into multiple calls and merge the results (see
    /// [`RemoteStore`](crate::remote::RemoteStore)); callers may pass any
    /// number of names. Each resolved name reports its version.
    ///
    /// # Errors
    ///
    /// Returns `Err` only for transport-level failures. Unknown names are
    /// reported through [`NamesResponse::invalid_names`].
    fn fetch_by_names(&self, names: &[String], with_decryption: bool) -> Result<NamesResponse>;

    /// Enumerate every parameter under a path prefix.
    ///
    /// Implementations must drain any backend pagination transparently and
    /// return the full result set.
    ///
    /// # Errors
    ///
    /// Returns `Err` on transport failure, or `Error::NotImplemented` when
    /// the store has no path hierarchy (e.g. environment variables).
    fn fetch_by_path(&self, query: &PathQuery<'_>) -> Result<HashMap<String, RawParameter>>;
}
