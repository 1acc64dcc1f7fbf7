//! Per-request session data with an explicit lifecycle.
//!
//! Persistence is the host's concern. A [`Session`] only tracks which
//! state it is in and the values loaded into it, so two requests never
//! share session storage by accident.

use hestia_core::{HttpError, HttpResult, ParameterBag, Value};
use indexmap::IndexMap;

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session has been started for this request.
    #[default]
    NotStarted,
    /// The session is open for reads and writes.
    Active,
    /// The session was destroyed and cannot be reopened.
    Destroyed,
}

/// Session values for one request.
///
/// ```text
/// NotStarted --start()--> Active --destroy()--> Destroyed
///                           |  ^
///                           +--+ start() is a no-op
/// ```
///
/// # Example
///
/// ```
/// use hestia_core::Value;
/// use hestia_extract::session::{Session, SessionState};
///
/// let mut session = Session::new([("user_id", Value::from(7))]);
/// session.set("theme", "dark").unwrap();
/// assert_eq!(session.get("user_id"), Some(&Value::from(7)));
///
/// session.destroy();
/// assert_eq!(session.state(), SessionState::Destroyed);
/// assert!(session.start().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    state: SessionState,
    data: ParameterBag<Value>,
}

impl Session {
    /// Creates an active session holding `data`.
    pub fn new<K: Into<String>>(data: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self {
            state: SessionState::Active,
            data: data.into_iter().collect(),
        }
    }

    /// Creates a session that has not been started.
    #[must_use]
    pub fn not_started() -> Self {
        Self::default()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns `true` while the session accepts writes.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Opens the session.
    ///
    /// A no-op when already active. A destroyed session cannot be reopened.
    pub fn start(&mut self) -> HttpResult<()> {
        match self.state {
            SessionState::Active => Ok(()),
            SessionState::NotStarted => {
                self.state = SessionState::Active;
                tracing::debug!("session started");
                Ok(())
            }
            SessionState::Destroyed => Err(HttpError::unclassified("Cannot start a destroyed session.")),
        }
    }

    /// Returns the value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns the value under `key`, or `default` when absent.
    #[must_use]
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.data.get_or(key, default)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.data.has(key)
    }

    /// Stores a value. Fails unless the session is active.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> HttpResult<&mut Self> {
        if !self.is_active() {
            return Err(HttpError::unclassified("Session is not active."));
        }
        self.data.set(key, value);
        Ok(self)
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Returns every value.
    #[must_use]
    pub fn all(&self) -> &IndexMap<String, Value> {
        self.data.all()
    }

    /// Returns the number of values.
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.count()
    }

    /// Removes every value without changing state.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Clears the data and moves to [`SessionState::Destroyed`].
    pub fn destroy(&mut self) {
        self.data.clear();
        self.state = SessionState::Destroyed;
        tracing::debug!("session destroyed");
    }
}
