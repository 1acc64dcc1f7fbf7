//! Validated query and body parameters.
//!
//! Query strings and request bodies are attacker-controlled. [`InputBag`]
//! stores whatever the host hands over but only ever gives back an
//! [`InputValue`]: a scalar, a flat sequence of scalars, or renderable text.
//! Anything else (maps, nested lists) fails with `InvalidInput` at the
//! point of access, and so does an invalid default.

use hestia_core::{HttpError, HttpResult, InputValue, ParameterBag, Scalar, Value};
use indexmap::IndexMap;
use std::fmt;

/// Which part of the request an [`InputBag`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputSource {
    /// Query string parameters.
    #[default]
    Query,
    /// Request body parameters.
    Body,
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Body => write!(f, "body"),
        }
    }
}

/// Query or body parameters with validated access.
///
/// # Example
///
/// ```
/// use hestia_core::{InputValue, Scalar, Value};
/// use hestia_extract::InputBag;
///
/// let mut query = InputBag::query([("page", Value::from("3"))]);
/// query.set("tags", vec!["rust", "http"]).unwrap();
///
/// assert_eq!(query.get_int("page", 1).unwrap(), 3);
/// assert_eq!(
///     query.get("tags").unwrap(),
///     Some(InputValue::Sequence(vec![Scalar::from("rust"), Scalar::from("http")]))
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputBag {
    source: InputSource,
    parameters: ParameterBag<Value>,
}

impl InputBag {
    /// Creates a bag for `source` holding `parameters` as given.
    #[must_use]
    pub fn new(source: InputSource, parameters: ParameterBag<Value>) -> Self {
        Self { source, parameters }
    }

    /// Creates a query bag.
    pub fn query<K: Into<String>>(parameters: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::new(InputSource::Query, parameters.into_iter().collect())
    }

    /// Creates a body bag.
    pub fn body<K: Into<String>>(parameters: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::new(InputSource::Body, parameters.into_iter().collect())
    }

    /// Returns which part of the request this bag holds.
    #[must_use]
    pub fn source(&self) -> InputSource {
        self.source
    }

    /// Stores `value` under `key` after validating its shape.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> HttpResult<&mut Self> {
        let key = key.into();
        let value = value.into();
        self.check(&value, None, "set")?;
        self.parameters.set(key, value);
        Ok(self)
    }

    /// Returns the validated value under `key`.
    ///
    /// Absent keys and stored nulls yield `Ok(None)`.
    pub fn get(&self, key: &str) -> HttpResult<Option<InputValue>> {
        match self.parameters.get(key) {
            Some(value) => self.check(value, Some(key), "get"),
            None => Ok(None),
        }
    }

    /// Returns the validated value under `key`, or the validated `default`.
    ///
    /// The default is checked even when the key is present.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> HttpResult<InputValue> {
        let default = default.into();
        let default = self.check(&default, None, "get")?.ok_or_else(|| {
            HttpError::invalid_key(key, format!("The default for the key \"{key}\" must not be null."))
        })?;
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Returns the value under `key` rendered as text.
    pub fn get_string(&self, key: &str, default: &str) -> HttpResult<String> {
        match self.get(key)? {
            Some(value) => value.render().ok_or_else(|| {
                HttpError::invalid_key(key, format!("The value for the key \"{key}\" is a sequence, not text."))
            }),
            None => Ok(default.to_string()),
        }
    }

    /// Returns the value under `key` as an integer.
    ///
    /// Numeric strings are parsed; anything else fails.
    pub fn get_int(&self, key: &str, default: i64) -> HttpResult<i64> {
        let not_int = || HttpError::invalid_key(key, format!("The value for the key \"{key}\" is not an integer."));
        match self.get(key)? {
            None => Ok(default),
            Some(InputValue::Scalar(Scalar::Int(i))) => Ok(i),
            Some(InputValue::Scalar(Scalar::Str(s))) => s.trim().parse().map_err(|_| not_int()),
            Some(_) => Err(not_int()),
        }
    }

    /// Returns the value under `key` as a boolean.
    ///
    /// Accepts booleans, `0`/`1`, and the strings `true`, `false`, `on`,
    /// `off`, `yes`, `no`, `1`, `0` and the empty string.
    pub fn get_bool(&self, key: &str, default: bool) -> HttpResult<bool> {
        let not_bool = || HttpError::invalid_key(key, format!("The value for the key \"{key}\" is not a boolean."));
        match self.get(key)? {
            None => Ok(default),
            Some(InputValue::Scalar(Scalar::Bool(b))) => Ok(b),
            Some(InputValue::Scalar(Scalar::Int(0))) => Ok(false),
            Some(InputValue::Scalar(Scalar::Int(1))) => Ok(true),
            Some(InputValue::Scalar(Scalar::Str(s))) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Ok(true),
                "0" | "false" | "off" | "no" | "" => Ok(false),
                _ => Err(not_bool()),
            },
            Some(_) => Err(not_bool()),
        }
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.parameters.has(key)
    }

    /// Removes `key`. Absent keys are a no-op.
    pub fn remove(&mut self, key: &str) {
        self.parameters.remove(key);
    }

    /// Returns every stored parameter, unvalidated.
    #[must_use]
    pub fn all(&self) -> &IndexMap<String, Value> {
        self.parameters.all()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn count(&self) -> usize {
        self.parameters.count()
    }

    /// Returns `true` if no parameters are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    fn check(&self, value: &Value, key: Option<&str>, operation: &str) -> HttpResult<Option<InputValue>> {
        if value.is_null() {
            return Ok(None);
        }
        InputValue::try_from(value).map(Some).map_err(|_| match key {
            Some(key) => HttpError::invalid_key(
                key,
                format!("The value for the key \"{key}\" is not scalar, a sequence of scalars, or renderable."),
            ),
            None => HttpError::invalid_input(format!(
                "The value passed to \"{}.{operation}\" must be scalar, a sequence of scalars, or renderable. Received type: \"{}\".",
                self.source,
                value.type_name()
            )),
        })
    }
}
