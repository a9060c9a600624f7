//! # param-cache
//!
//! Client-side caching for remote parameter and secret stores.
//!
//! Latency-sensitive callers (short-lived functions especially) cannot
//! afford a network round-trip on every configuration read, but must still
//! pick up rotated secrets and values. This crate caches named parameters in
//! process memory, re-fetching only when a configured max age expires, when
//! a caller forces it, or when an error-triggered retry demands fresh state.
//!
//! ## Features
//!
//! - **Lazy, cached reads:** first access fetches, later accesses serve the
//!   cache until the max-age window (if any) expires
//! - **Grouped refresh:** a [`ParameterGroup`] resolves every member in one
//!   batched store call and shares a single expiry clock
//! - **Version pinning:** `"name:3"` pins a parameter to version 3 for its
//!   lifetime, immune to upstream rotation
//! - **Path discovery:** bulk-register everything under a hierarchy prefix,
//!   with optional query filters
//! - **Store agnostic:** remote transports plug in behind the
//!   [`ParameterStore`] / [`RemoteClient`](remote::RemoteClient) traits;
//!   environment and chained fallback stores included
//! - **Error-triggered retry:** wrap an operation so a matching failure
//!   forces one refresh and one retry
//!
//! ## Quick Start
//!
//! ```ignore
//! use param_cache::{Parameter, ParameterGroup, remote::RemoteStore};
//! use std::time::Duration;
//!
//! // Any transport implementing RemoteClient (an AWS SDK wrapper, say).
//! let store = RemoteStore::new(my_transport);
//!
//! // A single cached parameter, re-fetched at most every 5 minutes.
//! let api_key = Parameter::new("/prod/api_key", store.clone())?
//!     .with_max_age(Duration::from_secs(300));
//! println!("key = {}", api_key.value()?);
//!
//! // A group: one batched call refreshes every member together.
//! let group = ParameterGroup::new(store)
//!     .with_max_age(Duration::from_secs(60))
//!     .with_base_path("/prod/db")?;
//! let host = group.parameter("/host")?;
//! let password = group.secret("db_password")?;
//! ```
//!
//! ## Model
//!
//! Synchronous, single-threaded, request-scoped: every refresh is a blocking
//! store call, there are no background timers, and the handles are not
//! `Send`. Callers needing cross-thread sharing must serialize access
//! themselves.

#[macro_use]
extern crate log;

pub mod chain;
pub mod clock;
pub mod entry;
pub mod env;
pub mod error;
pub mod filters;
pub mod group;
pub mod memory;
pub mod remote;
pub mod retry;
pub mod staleness;
pub mod store;
pub mod value;

// Re-exports for convenience
pub use entry::{Parameter, SECRETS_REFERENCE_PREFIX};
pub use error::{Error, Result};
pub use filters::{FilterKey, FilterOption, ParameterFilter};
pub use group::ParameterGroup;
pub use retry::{RefreshOnError, RetryError};
pub use staleness::{Refreshable, StalenessTracker};
pub use store::{NamesResponse, ParameterStore, PathQuery, RawParameter};
pub use value::{ParameterKind, ParameterValue};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
