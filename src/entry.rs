//! A single cached parameter.
//!
//! [`Parameter`] is a cheap-to-clone handle: clones share the cached value,
//! the staleness tracker, and the injected store. Reads are lazy — the first
//! [`value`](Parameter::value) call fetches, later calls serve the cache
//! until the max-age window (its own, or the owning group's) expires.

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::group::GroupCore;
use crate::staleness::{Refreshable, StalenessTracker};
use crate::store::{ParameterStore, RawParameter};
use crate::value::ParameterValue;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Names passed to [`Parameter::secret`] are rewritten under this prefix,
/// the parameter store's read-through reference path into the secrets
/// service.
pub const SECRETS_REFERENCE_PREFIX: &str = "/aws/reference/secretsmanager/";

#[derive(Default)]
struct EntryState {
    value: Option<ParameterValue>,
    version: Option<u64>,
}

pub(crate) struct ParameterInner {
    name: String,
    full_name: String,
    pinned_version: Option<u64>,
    with_decryption: Cell<bool>,
    store: Rc<dyn ParameterStore>,
    clock: RefCell<Rc<dyn Clock>>,
    tracker: RefCell<StalenessTracker>,
    state: RefCell<EntryState>,
    group: RefCell<Option<Weak<GroupCore>>>,
}

/// A named, lazily fetched, cached parameter.
///
/// Constructed directly for standalone use, or through
/// [`ParameterGroup::parameter`](crate::ParameterGroup::parameter) /
/// [`secret`](crate::ParameterGroup::secret) to share one refresh call and
/// one expiry clock with its siblings.
///
/// A trailing `:N` in the name pins the parameter to version `N` for its
/// whole lifetime: the pinned selector is what goes on the wire for every
/// fetch, so reads stay version-stable even while the value rotates
/// upstream.
///
/// # Example
///
/// ```
/// use param_cache::{memory::MemoryStore, Parameter};
/// use std::time::Duration;
///
/// let store = MemoryStore::new();
/// store.put("api_key", "abc123");
///
/// let parameter = Parameter::new("api_key", store.clone())
///     .expect("valid name")
///     .with_max_age(Duration::from_secs(300));
/// assert_eq!(parameter.value().expect("resolves").as_str(), Some("abc123"));
/// ```
#[derive(Clone)]
pub struct Parameter {
    inner: Rc<ParameterInner>,
}

impl Parameter {
    /// Create a standalone parameter over the given store.
    ///
    /// # Errors
    ///
    /// - `Error::ConfigError` for an empty name
    /// - `Error::InvalidVersion` for a `:suffix` that is not a positive
    ///   integer
    pub fn new(name: impl Into<String>, store: impl ParameterStore + 'static) -> Result<Self> {
        Self::from_parts(name.into(), Rc::new(store), true, Rc::new(SystemClock))
    }

    /// Create a standalone secret reference.
    ///
    /// The name is rewritten under [`SECRETS_REFERENCE_PREFIX`] before any
    /// fetch.
    ///
    /// # Errors
    ///
    /// `Error::InvalidParameter` when the name starts with `/` — an absolute
    /// path would collide with the parameter store's own namespace.
    pub fn secret(name: impl Into<String>, store: impl ParameterStore + 'static) -> Result<Self> {
        let full = secret_reference(&name.into())?;
        Self::from_parts(full, Rc::new(store), true, Rc::new(SystemClock))
    }

    pub(crate) fn from_parts(
        raw_name: String,
        store: Rc<dyn ParameterStore>,
        with_decryption: bool,
        clock: Rc<dyn Clock>,
    ) -> Result<Self> {
        let (name, pinned_version) = parse_name(&raw_name)?;
        let full_name = match pinned_version {
            Some(version) => format!("{}:{}", name, version),
            None => name.clone(),
        };
        Ok(Parameter {
            inner: Rc::new(ParameterInner {
                name,
                full_name,
                pinned_version,
                with_decryption: Cell::new(with_decryption),
                store,
                clock: RefCell::new(clock),
                tracker: RefCell::new(StalenessTracker::new(None)),
                state: RefCell::new(EntryState::default()),
                group: RefCell::new(None),
            }),
        })
    }

    /// Cached values older than `max_age` are re-fetched on access.
    pub fn with_max_age(self, max_age: Duration) -> Self {
        self.inner.tracker.borrow_mut().set_max_age(Some(max_age));
        self
    }

    /// Whether fetches ask the store to decrypt secure payloads (default
    /// `true`).
    pub fn with_decryption(self, with_decryption: bool) -> Self {
        self.inner.with_decryption.set(with_decryption);
        self
    }

    /// Replace the time source (see [`clock`](crate::clock)).
    pub fn with_clock(self, clock: impl Clock + 'static) -> Self {
        *self.inner.clock.borrow_mut() = Rc::new(clock);
        self
    }

    /// Bare name, without any version suffix.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The literal key sent to the store: the name, plus `:N` when pinned.
    pub fn full_name(&self) -> &str {
        &self.inner.full_name
    }

    pub fn pinned_version(&self) -> Option<u64> {
        self.inner.pinned_version
    }

    pub fn is_pinned(&self) -> bool {
        self.inner.pinned_version.is_some()
    }

    /// The cached value, fetching first if absent or stale.
    ///
    /// Staleness is decided by the owning group when this parameter belongs
    /// to one, by its own max-age tracker otherwise. `StringList` payloads
    /// come back as [`ParameterValue::List`].
    ///
    /// # Errors
    ///
    /// `Error::InvalidParameter` when the store does not know the name, plus
    /// anything the store itself fails with.
    pub fn value(&self) -> Result<ParameterValue> {
        let missing = self.inner.state.borrow().value.is_none();
        if missing || self.should_refresh() {
            self.refresh()?;
        }
        let state = self.inner.state.borrow();
        state
            .value
            .clone()
            .ok_or_else(|| Error::InvalidParameter(self.inner.full_name.clone()))
    }

    /// The resolved version number, fetching under the same lazy gate as
    /// [`value`](Self::value).
    ///
    /// A pinned parameter short-circuits once resolved: its version is
    /// immutable, so no refresh is ever triggered for it again.
    ///
    /// # Errors
    ///
    /// Same as [`value`](Self::value).
    pub fn version(&self) -> Result<u64> {
        if let Some(pinned) = self.inner.pinned_version {
            if self.inner.state.borrow().value.is_some() {
                return Ok(pinned);
            }
        }
        let missing = self.inner.state.borrow().version.is_none();
        if missing || self.should_refresh() {
            self.refresh()?;
        }
        let state = self.inner.state.borrow();
        state
            .version
            .ok_or_else(|| Error::InvalidParameter(self.inner.full_name.clone()))
    }

    /// Whether the next read would re-fetch.
    pub fn should_refresh(&self) -> bool {
        match self.group() {
            Some(core) => core.should_refresh(),
            None => {
                let now = self.inner.clock.borrow().now();
                self.inner.tracker.borrow().should_refresh_at(now)
            }
        }
    }

    /// Unconditionally re-fetch.
    ///
    /// Grouped parameters delegate to the group, which batches every sibling
    /// into one store call; standalone parameters issue a single-name fetch.
    /// On failure the previously cached value is left untouched.
    ///
    /// # Errors
    ///
    /// `Error::InvalidParameter` naming every unresolved key, plus anything
    /// the store fails with.
    pub fn refresh(&self) -> Result<()> {
        match self.group() {
            Some(core) => core.refresh()?,
            None => self.refresh_standalone()?,
        }
        let now = self.inner.clock.borrow().now();
        self.inner.tracker.borrow_mut().record_refresh_at(now, false);
        Ok(())
    }

    fn refresh_standalone(&self) -> Result<()> {
        debug!("Refreshing parameter {}", self.inner.full_name);
        let names = [self.inner.full_name.clone()];
        let response = self
            .inner
            .store
            .fetch_by_names(&names, self.inner.with_decryption.get())?;
        if !response.invalid_names.is_empty() {
            warn!("✗ Unresolved parameter: {}", self.inner.full_name);
            return Err(Error::InvalidParameter(self.inner.full_name.clone()));
        }
        let raw = response
            .values
            .get(&self.inner.full_name)
            .ok_or_else(|| Error::InvalidParameter(self.inner.full_name.clone()))?;
        self.set_fetched(raw);
        Ok(())
    }

    pub(crate) fn set_fetched(&self, raw: &RawParameter) {
        let mut state = self.inner.state.borrow_mut();
        state.value = Some(ParameterValue::from_raw(raw.kind, &raw.value));
        state.version = Some(raw.version);
    }

    pub(crate) fn attach_group(&self, core: &Rc<GroupCore>) {
        *self.inner.group.borrow_mut() = Some(Rc::downgrade(core));
    }

    fn group(&self) -> Option<Rc<GroupCore>> {
        self.inner.group.borrow().as_ref().and_then(Weak::upgrade)
    }
}

impl Refreshable for Parameter {
    fn should_refresh(&self) -> bool {
        Parameter::should_refresh(self)
    }

    fn refresh(&self) -> Result<()> {
        Parameter::refresh(self)
    }
}

/// Handle identity: two `Parameter`s are equal when they share the same
/// cached entry.
impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Parameter {}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Parameter")
            .field("full_name", &self.inner.full_name)
            .field("pinned_version", &self.inner.pinned_version)
            .field("cached", &state.value.is_some())
            .field("version", &state.version)
            .finish()
    }
}

pub(crate) fn secret_reference(name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(Error::ConfigError(
            "secret name must not be empty".to_string(),
        ));
    }
    if name.starts_with('/') {
        return Err(Error::InvalidParameter(format!(
            "secret name {} must not be an absolute path",
            name
        )));
    }
    Ok(format!("{}{}", SECRETS_REFERENCE_PREFIX, name))
}

fn parse_name(raw: &str) -> Result<(String, Option<u64>)> {
    if raw.is_empty() {
        return Err(Error::ConfigError(
            "parameter name must not be empty".to_string(),
        ));
    }
    match raw.rsplit_once(':') {
        Some((name, suffix)) => {
            if name.is_empty() {
                return Err(Error::ConfigError(
                    "parameter name must not be empty".to_string(),
                ));
            }
            let version = suffix
                .parse::<u64>()
                .ok()
                .filter(|version| *version >= 1)
                .ok_or_else(|| {
                    Error::InvalidVersion(format!(
                        "{:?} is not a positive integer (in {:?})",
                        suffix, raw
                    ))
                })?;
            Ok((name.to_string(), Some(version)))
        }
        None => Ok((raw.to_string(), None)),
    }
}
