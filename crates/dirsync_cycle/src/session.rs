//! Per-session state.
//!
//! A [`SyncSession`] lives as long as one client's synchronization session
//! and carries arbitrary typed state in its [`SessionParameters`]. Callers
//! hand the session to the detector by exclusive borrow, which is what
//! keeps rounds of the same session from interleaving.

use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use tracing::warn;
use uuid::Uuid;

/// Identifier of a sync session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Typed name of a session parameter.
pub struct SessionKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SessionKey<T> {
    /// Creates a key. Names should be namespaced, e.g. `"dirsync.cycle.history"`.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// Returns the key name.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> fmt::Debug for SessionKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionKey").field(&self.name).finish()
    }
}

/// Typed key/value state attached to a session.
#[derive(Default)]
pub struct SessionParameters {
    values: HashMap<&'static str, Box<dyn Any + Send>>,
}

impl SessionParameters {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`, if it has the key's type.
    pub fn get<T: Any + Send>(&self, key: &SessionKey<T>) -> Option<&T> {
        self.values.get(key.name)?.downcast_ref::<T>()
    }

    /// Returns the value stored under `key` mutably, if it has the key's type.
    pub fn get_mut<T: Any + Send>(&mut self, key: &SessionKey<T>) -> Option<&mut T> {
        self.values.get_mut(key.name)?.downcast_mut::<T>()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set<T: Any + Send>(&mut self, key: &SessionKey<T>, value: T) {
        self.values.insert(key.name, Box::new(value));
    }

    /// Removes and returns the value stored under `key`.
    pub fn remove<T: Any + Send>(&mut self, key: &SessionKey<T>) -> Option<T> {
        let value = self.values.remove(key.name)?;
        value.downcast::<T>().ok().map(|boxed| *boxed)
    }

    /// Returns true if any value is stored under `key`.
    pub fn contains<T>(&self, key: &SessionKey<T>) -> bool {
        self.values.contains_key(key.name)
    }

    /// Returns the value stored under `key`, creating it with `init` first if needed.
    ///
    /// A value of a different type stored under the same name is replaced.
    pub fn get_or_init<T, F>(&mut self, key: &SessionKey<T>, init: F) -> &mut T
    where
        T: Any + Send,
        F: FnOnce() -> T,
    {
        let slot = match self.values.entry(key.name) {
            Entry::Occupied(entry) => {
                let slot = entry.into_mut();
                if !slot.is::<T>() {
                    warn!(key = key.name, "session parameter has unexpected type, replacing it");
                    *slot = Box::new(init());
                }
                slot
            }
            Entry::Vacant(entry) => entry.insert(Box::new(init())),
        };
        slot.downcast_mut::<T>()
            .expect("session parameter was just checked or created with type T")
    }

    /// Returns the number of stored parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no parameters are stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for SessionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// State of one synchronization session.
#[derive(Debug)]
pub struct SyncSession {
    id: SessionId,
    trace: bool,
    parameters: SessionParameters,
}

impl SyncSession {
    /// Creates a session without tracing.
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            trace: false,
            parameters: SessionParameters::new(),
        }
    }

    /// Enables or disables verbose tracing for the session.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Returns the session ID.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns true if verbose tracing is enabled.
    pub fn is_trace_enabled(&self) -> bool {
        self.trace
    }

    /// Enables or disables verbose tracing.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Returns the session parameters.
    pub fn parameters(&self) -> &SessionParameters {
        &self.parameters
    }

    /// Returns the session parameters mutably.
    pub fn parameters_mut(&mut self) -> &mut SessionParameters {
        &mut self.parameters
    }
}
