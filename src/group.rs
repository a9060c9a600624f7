//! Groups of parameters sharing one refresh call and one expiry clock.

use crate::clock::{Clock, SystemClock};
use crate::entry::{secret_reference, Parameter};
use crate::error::{Error, Result};
use crate::filters::{FilterRecord, ParameterFilter};
use crate::staleness::{Refreshable, StalenessTracker};
use crate::store::{NamesResponse, ParameterStore, PathQuery};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

pub(crate) struct GroupCore {
    store: Rc<dyn ParameterStore>,
    with_decryption: Cell<bool>,
    base_path: RefCell<String>,
    clock: RefCell<Rc<dyn Clock>>,
    tracker: RefCell<StalenessTracker>,
    entries: RefCell<HashMap<String, Parameter>>,
}

/// A collection of [`Parameter`]s refreshed together.
///
/// Registering a parameter in a group hands its staleness and refresh
/// decisions to the group: one max-age window governs every member, and a
/// refresh resolves every registered name in a single (chunked) store call
/// instead of one call per parameter.
///
/// The shared expiry clock uses **oldest-timestamp coalescing** for bulk
/// discovery: when [`parameters_by_path`](Self::parameters_by_path) runs
/// several times, the clock keeps the *oldest* fetch time, so expiry tracks
/// the least recently verified subset rather than the most recently touched
/// one. An explicit [`refresh`](Self::refresh) re-verifies everything and
/// overwrites the clock.
///
/// # Example
///
/// ```
/// use param_cache::{memory::MemoryStore, ParameterGroup};
/// use std::time::Duration;
///
/// let store = MemoryStore::new();
/// store.put("/app/db/host", "db.internal");
/// store.put("/app/db/port", "5432");
///
/// let group = ParameterGroup::new(store)
///     .with_max_age(Duration::from_secs(60))
///     .with_base_path("/app")
///     .expect("valid base path");
/// let host = group.parameter("/db/host").expect("valid path");
/// let port = group.parameter("/db/port").expect("valid path");
///
/// // One store call resolves both names.
/// assert_eq!(host.value().expect("resolves").as_str(), Some("db.internal"));
/// assert_eq!(port.value().expect("cached").as_str(), Some("5432"));
/// ```
#[derive(Clone)]
pub struct ParameterGroup {
    core: Rc<GroupCore>,
}

impl ParameterGroup {
    /// Create an empty group over the given store.
    pub fn new(store: impl ParameterStore + 'static) -> Self {
        ParameterGroup {
            core: Rc::new(GroupCore {
                store: Rc::new(store),
                with_decryption: Cell::new(true),
                base_path: RefCell::new(String::new()),
                clock: RefCell::new(Rc::new(SystemClock)),
                tracker: RefCell::new(StalenessTracker::new(None)),
                entries: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Shared max-age window for every member.
    pub fn with_max_age(self, max_age: Duration) -> Self {
        self.core.tracker.borrow_mut().set_max_age(Some(max_age));
        self
    }

    /// Whether fetches ask the store to decrypt secure payloads (default
    /// `true`).
    pub fn with_decryption(self, with_decryption: bool) -> Self {
        self.core.with_decryption.set(with_decryption);
        self
    }

    /// Prefix applied to every path passed to [`parameter`](Self::parameter)
    /// and [`parameters_by_path`](Self::parameters_by_path).
    ///
    /// # Errors
    ///
    /// `Error::InvalidPath` when the base path does not start with `/`.
    pub fn with_base_path(self, base_path: impl Into<String>) -> Result<Self> {
        let base_path = base_path.into();
        validate_path(&base_path)?;
        *self.core.base_path.borrow_mut() = base_path;
        Ok(self)
    }

    /// Replace the time source (see [`clock`](crate::clock)).
    pub fn with_clock(self, clock: impl Clock + 'static) -> Self {
        *self.core.clock.borrow_mut() = Rc::new(clock);
        self
    }

    /// Register (or retrieve) a parameter by name.
    ///
    /// With a base path configured, `name` must start with `/` and is
    /// prefixed; without one it is taken as a plain root-level key.
    /// Registration is idempotent on the resolved name: asking twice returns
    /// the same handle and the group does not grow.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidPath` for a relative name while a base path is set
    /// - `Error::InvalidVersion` / `Error::ConfigError` as in
    ///   [`Parameter::new`]
    pub fn parameter(&self, name: &str) -> Result<Parameter> {
        let resolved = self.resolve_name(name)?;
        self.register(resolved)
    }

    /// Register (or retrieve) a secret reference.
    ///
    /// The name is rewritten under
    /// [`SECRETS_REFERENCE_PREFIX`](crate::entry::SECRETS_REFERENCE_PREFIX);
    /// the base path never applies.
    ///
    /// # Errors
    ///
    /// `Error::InvalidParameter` when the name starts with `/`.
    pub fn secret(&self, name: &str) -> Result<Parameter> {
        let resolved = secret_reference(name)?;
        self.register(resolved)
    }

    /// Discover every parameter under a path and register it, recursively
    /// and unfiltered.
    ///
    /// See [`parameters_by_path_filtered`](Self::parameters_by_path_filtered).
    pub fn parameters_by_path(&self, path: &str) -> Result<Vec<Parameter>> {
        self.parameters_by_path_filtered(path, true, &[])
    }

    /// Discover parameters under a path with explicit recursion and filters.
    ///
    /// Issues one store query for the (base-path-prefixed) path, then
    /// creates or reuses an entry per result — discovered names are already
    /// absolute, so the base path is not applied again — and seeds each
    /// entry's value and version directly, no per-entry fetch. The group
    /// clock coalesces toward the oldest discovery call, so repeated
    /// discoveries at different times expire with the stalest subset.
    ///
    /// Results are sorted by name.
    ///
    /// # Errors
    ///
    /// `Error::InvalidPath` for a path not starting with `/`, plus anything
    /// the store fails with.
    pub fn parameters_by_path_filtered(
        &self,
        path: &str,
        recursive: bool,
        filters: &[ParameterFilter],
    ) -> Result<Vec<Parameter>> {
        validate_path(path)?;
        let full_path = format!("{}{}", self.core.base_path.borrow(), path);
        let records: Vec<FilterRecord> = filters.iter().map(ParameterFilter::to_record).collect();
        let query = PathQuery {
            path: &full_path,
            recursive,
            with_decryption: self.core.with_decryption.get(),
            filters: &records,
        };
        let found = self.core.store.fetch_by_path(&query)?;

        let now = self.core.clock.borrow().now();
        self.core.tracker.borrow_mut().record_refresh_at(now, true);

        let mut names: Vec<String> = found.keys().cloned().collect();
        names.sort();

        let mut parameters = Vec::with_capacity(names.len());
        for name in names {
            let parameter = self.register(name.clone())?;
            parameter.set_fetched(&found[&name]);
            parameters.push(parameter);
        }
        info!(
            "✓ Discovered {} parameter(s) under {}",
            parameters.len(),
            full_path
        );
        Ok(parameters)
    }

    /// Re-fetch every registered parameter in one (chunked) store call.
    ///
    /// All-or-nothing: if any name comes back unresolved, the whole refresh
    /// fails with one `Error::InvalidParameter` joining every offender, and
    /// no cached value is touched. On success every member's value and
    /// version are updated and the shared clock is overwritten.
    ///
    /// # Errors
    ///
    /// `Error::InvalidParameter` as above, plus anything the store fails
    /// with.
    pub fn refresh(&self) -> Result<()> {
        self.core.refresh()
    }

    /// Whether the shared max-age window has expired.
    pub fn should_refresh(&self) -> bool {
        self.core.should_refresh()
    }

    /// Number of registered parameters.
    pub fn len(&self) -> usize {
        self.core.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.entries.borrow().is_empty()
    }

    fn resolve_name(&self, name: &str) -> Result<String> {
        let base_path = self.core.base_path.borrow();
        if base_path.is_empty() {
            // No hierarchy configured: names are plain keys.
            return Ok(name.to_string());
        }
        validate_path(name)?;
        Ok(format!("{}{}", base_path, name))
    }

    fn register(&self, resolved: String) -> Result<Parameter> {
        let clock = self.core.clock.borrow().clone();
        let parameter = Parameter::from_parts(
            resolved,
            Rc::clone(&self.core.store),
            self.core.with_decryption.get(),
            clock,
        )?;
        let key = parameter.full_name().to_string();
        if let Some(existing) = self.core.entries.borrow().get(&key) {
            return Ok(existing.clone());
        }
        parameter.attach_group(&self.core);
        self.core.entries.borrow_mut().insert(key, parameter.clone());
        Ok(parameter)
    }
}

impl GroupCore {
    pub(crate) fn should_refresh(&self) -> bool {
        let now = self.clock.borrow().now();
        self.tracker.borrow().should_refresh_at(now)
    }

    pub(crate) fn refresh(&self) -> Result<()> {
        let entries: Vec<Parameter> = self.entries.borrow().values().cloned().collect();
        if entries.is_empty() {
            let now = self.clock.borrow().now();
            self.tracker.borrow_mut().record_refresh_at(now, false);
            return Ok(());
        }

        let names: Vec<String> = entries
            .iter()
            .map(|parameter| parameter.full_name().to_string())
            .collect();
        debug!("Refreshing parameter group ({} name(s))", names.len());

        let NamesResponse {
            values,
            invalid_names: mut invalid,
        } = self
            .store
            .fetch_by_names(&names, self.with_decryption.get())?;

        for parameter in &entries {
            let full_name = parameter.full_name();
            if !values.contains_key(full_name) && !invalid.iter().any(|name| name == full_name) {
                invalid.push(full_name.to_string());
            }
        }
        if !invalid.is_empty() {
            invalid.sort();
            invalid.dedup();
            let joined = invalid.join(",");
            warn!("✗ Group refresh failed, unresolved name(s): {}", joined);
            return Err(Error::InvalidParameter(joined));
        }

        for parameter in &entries {
            if let Some(raw) = values.get(parameter.full_name()) {
                parameter.set_fetched(raw);
            }
        }
        let now = self.clock.borrow().now();
        self.tracker.borrow_mut().record_refresh_at(now, false);
        info!("✓ Refreshed {} parameter(s)", entries.len());
        Ok(())
    }
}

impl Refreshable for ParameterGroup {
    fn should_refresh(&self) -> bool {
        ParameterGroup::should_refresh(self)
    }

    fn refresh(&self) -> Result<()> {
        ParameterGroup::refresh(self)
    }
}

impl fmt::Debug for ParameterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterGroup")
            .field("base_path", &*self.core.base_path.borrow())
            .field("len", &self.len())
            .field("max_age", &self.core.tracker.borrow().max_age())
            .finish()
    }
}

fn validate_path(path: &str) -> Result<()> {
    if !path.is_empty() && !path.starts_with('/') {
        return Err(Error::InvalidPath(path.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::memory::MemoryStore;

    #[test]
    fn test_duplicate_registration_is_idempotent() {
        let group = ParameterGroup::new(MemoryStore::new());
        let first = group.parameter("my_param").expect("Failed to register");
        let second = group.parameter("my_param").expect("Failed to register");

        assert_eq!(first, second);
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_base_path_prefixes_names() {
        let store = MemoryStore::new();
        store.put("/Root/Level1/my_param", "value");
        let group = ParameterGroup::new(store)
            .with_base_path("/Root")
            .expect("valid base path");

        let parameter = group.parameter("/Level1/my_param").expect("Failed to register");
        assert_eq!(parameter.full_name(), "/Root/Level1/my_param");
        assert_eq!(parameter.value().expect("resolves").as_str(), Some("value"));
    }

    #[test]
    fn test_relative_name_with_base_path_rejected() {
        let group = ParameterGroup::new(MemoryStore::new())
            .with_base_path("/Root")
            .expect("valid base path");
        assert!(matches!(
            group.parameter("no-slash"),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn test_invalid_base_path_rejected() {
        let group = ParameterGroup::new(MemoryStore::new()).with_base_path("Root");
        assert!(matches!(group, Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_bare_names_allowed_without_base_path() {
        let group = ParameterGroup::new(MemoryStore::new());
        let parameter = group.parameter("plain_key").expect("Failed to register");
        assert_eq!(parameter.full_name(), "plain_key");
    }

    #[test]
    fn test_secret_registration() {
        let store = MemoryStore::new();
        store.put("/aws/reference/secretsmanager/db_password", "hunter2");
        let group = ParameterGroup::new(store);

        let secret = group.secret("db_password").expect("Failed to register");
        assert_eq!(secret.value().expect("resolves").as_str(), Some("hunter2"));
        assert_eq!(group.len(), 1);

        let twin = group.secret("db_password").expect("Failed to register");
        assert_eq!(secret, twin);
        assert_eq!(group.len(), 1);

        assert!(matches!(
            group.secret("/db_password"),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_group_refresh_batches_members() {
        let store = MemoryStore::new();
        store.put("a", "1");
        store.put("b", "2");
        let group = ParameterGroup::new(store.clone());
        let a = group.parameter("a").expect("Failed to register");
        let b = group.parameter("b").expect("Failed to register");

        // Reading one member resolves both through the group.
        assert_eq!(a.value().expect("resolves").as_str(), Some("1"));
        store.put("b", "updated_after_fetch");
        assert_eq!(b.value().expect("cached").as_str(), Some("2"));
    }

    #[test]
    fn test_refresh_all_or_nothing() {
        let store = MemoryStore::new();
        store.put("good", "cached_value");
        store.put("bad", "doomed");
        let group = ParameterGroup::new(store.clone());
        let good = group.parameter("good").expect("Failed to register");
        let _bad = group.parameter("bad").expect("Failed to register");

        group.refresh().expect("Failed to refresh");
        store.put("good", "never_seen");
        store.remove("bad");

        let err = group.refresh();
        assert_eq!(err, Err(Error::InvalidParameter("bad".to_string())));
        // The failed refresh did not touch the surviving member's cache.
        assert_eq!(good.value().expect("cached").as_str(), Some("cached_value"));
    }

    #[test]
    fn test_refresh_joins_all_invalid_names() {
        let group = ParameterGroup::new(MemoryStore::new());
        group.parameter("ghost_b").expect("Failed to register");
        group.parameter("ghost_a").expect("Failed to register");

        let err = group.refresh();
        assert_eq!(
            err,
            Err(Error::InvalidParameter("ghost_a,ghost_b".to_string()))
        );
    }

    #[test]
    fn test_empty_group_refresh_is_noop() {
        let group = ParameterGroup::new(MemoryStore::new());
        group.refresh().expect("Failed to refresh");
        assert!(group.is_empty());
    }

    #[test]
    fn test_discovery_registers_and_seeds_values() {
        let store = MemoryStore::new();
        store.put("/app/db/host", "h");
        store.put("/app/db/port", "p");
        let group = ParameterGroup::new(store);

        let parameters = group.parameters_by_path("/app/db").expect("Failed to discover");
        assert_eq!(parameters.len(), 2);
        assert_eq!(group.len(), 2);
        // Values were seeded by the discovery call itself.
        assert_eq!(
            parameters[0].value().expect("seeded").as_str(),
            Some("h")
        );
    }

    #[test]
    fn test_discovery_reuses_registered_entries() {
        let store = MemoryStore::new();
        store.put("/app/known", "v1");
        let group = ParameterGroup::new(store.clone());
        let known = group.parameter("/app/known").expect("Failed to register");

        store.put("/app/known", "v2");
        let discovered = group.parameters_by_path("/app").expect("Failed to discover");

        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0], known);
        assert_eq!(group.len(), 1);
        assert_eq!(known.value().expect("seeded").as_str(), Some("v2"));
    }

    #[test]
    fn test_discovery_coalesces_group_clock() {
        let store = MemoryStore::new();
        store.put("/a/x", "1");
        store.put("/b/y", "2");
        let clock = ManualClock::new();
        let group = ParameterGroup::new(store)
            .with_max_age(Duration::from_secs(10))
            .with_clock(clock.clone());

        group.parameters_by_path("/a").expect("Failed to discover");
        clock.advance(Duration::from_secs(6));
        group.parameters_by_path("/b").expect("Failed to discover");

        // The clock still reads the first discovery: stale 10s after t1,
        // not 10s after t2.
        clock.advance(Duration::from_secs(5));
        assert!(group.should_refresh());
    }

    #[test]
    fn test_explicit_refresh_overwrites_clock() {
        let store = MemoryStore::new();
        store.put("/a/x", "1");
        let clock = ManualClock::new();
        let group = ParameterGroup::new(store)
            .with_max_age(Duration::from_secs(10))
            .with_clock(clock.clone());

        group.parameters_by_path("/a").expect("Failed to discover");
        clock.advance(Duration::from_secs(6));
        group.refresh().expect("Failed to refresh");

        clock.advance(Duration::from_secs(5));
        assert!(!group.should_refresh());
    }

    #[test]
    fn test_grouped_member_delegates_staleness() {
        let store = MemoryStore::new();
        store.put("member", "old");
        let clock = ManualClock::new();
        let group = ParameterGroup::new(store.clone())
            .with_max_age(Duration::from_secs(10))
            .with_clock(clock.clone());
        let member = group.parameter("member").expect("Failed to register");

        assert_eq!(member.value().expect("resolves").as_str(), Some("old"));
        store.put("member", "new");

        clock.advance(Duration::from_secs(9));
        assert_eq!(member.value().expect("cached").as_str(), Some("old"));

        clock.advance(Duration::from_secs(2));
        assert_eq!(member.value().expect("refreshed").as_str(), Some("new"));
    }

    #[test]
    fn test_versioned_member_in_group() {
        let store = MemoryStore::new();
        store.put("cfg", "v1");
        store.put("cfg", "v2");
        let group = ParameterGroup::new(store);

        let pinned = group.parameter("cfg:1").expect("Failed to register");
        let floating = group.parameter("cfg").expect("Failed to register");
        assert_eq!(group.len(), 2);

        group.refresh().expect("Failed to refresh");
        assert_eq!(pinned.value().expect("resolves").as_str(), Some("v1"));
        assert_eq!(floating.value().expect("resolves").as_str(), Some("v2"));
    }
}
