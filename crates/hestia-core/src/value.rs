//! Value model for request parameters.
//!
//! [`Value`] is the permissive representation stored by a
//! [`ParameterBag`](crate::ParameterBag): anything a host environment can
//! hand over, including nested lists and maps.
//!
//! [`InputValue`] is the closed union the validated views hand out. Only
//! three shapes exist:
//!
//! - a [`Scalar`] (`bool`, `i64`, `f64` or string)
//! - a sequence of scalars
//! - a [`Renderable`], any value that renders to text
//!
//! Converting a [`Value`] into an [`InputValue`] fails with
//! [`HttpError::InvalidInput`](crate::HttpError::InvalidInput) for maps,
//! nested lists and `null`.

use crate::error::HttpError;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// A single scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    Str(String),
}

impl Scalar {
    /// Returns the string slice if this is a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the type name used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// A value that renders to text on demand.
///
/// Equality compares the rendered text.
#[derive(Clone)]
pub struct Renderable(Arc<dyn fmt::Display + Send + Sync>);

impl Renderable {
    /// Wraps a displayable value.
    pub fn new(value: impl fmt::Display + Send + Sync + 'static) -> Self {
        Self(Arc::new(value))
    }

    /// Renders the value.
    #[must_use]
    pub fn render(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for Renderable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for Renderable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Renderable").field(&self.render()).finish()
    }
}

impl PartialEq for Renderable {
    fn eq(&self, other: &Self) -> bool {
        self.render() == other.render()
    }
}

/// A permissive parameter value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Null,
    /// A scalar.
    Scalar(Scalar),
    /// An ordered list of values, possibly nested.
    List(Vec<Value>),
    /// A string-keyed map of values.
    Map(IndexMap<String, Value>),
    /// A value that renders to text.
    Text(Renderable),
}

impl Value {
    /// Returns `true` if this is [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the scalar if this is a scalar value.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the string slice if this is a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    /// Returns the type name used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Scalar(s) => s.type_name(),
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Text(_) => "text",
        }
    }
}

macro_rules! impl_value_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

impl_value_from_scalar!(bool, i64, i32, u32, f64, &str, String);

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self::Map(map)
    }
}

impl From<Renderable> for Value {
    fn from(value: Renderable) -> Self {
        Self::Text(value)
    }
}

impl From<InputValue> for Value {
    fn from(value: InputValue) -> Self {
        match value {
            InputValue::Scalar(s) => Self::Scalar(s),
            InputValue::Sequence(items) => Self::List(items.into_iter().map(Self::Scalar).collect()),
            InputValue::Text(t) => Self::Text(t),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Scalar(Scalar::Bool(b)),
            serde_json::Value::Number(n) => Self::Scalar(n.as_i64().map_or_else(
                || Scalar::Float(n.as_f64().unwrap_or(f64::NAN)),
                Scalar::Int,
            )),
            serde_json::Value::String(s) => Self::Scalar(Scalar::Str(s)),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

/// A validated input value: a scalar, a sequence of scalars, or renderable text.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// A single scalar.
    Scalar(Scalar),
    /// A flat sequence of scalars.
    Sequence(Vec<Scalar>),
    /// A value that renders to text.
    Text(Renderable),
}

impl InputValue {
    /// Returns the scalar if this is a scalar value.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the string slice if this is a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    /// Returns the items if this is a sequence.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Scalar]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Renders scalars and text. Sequences have no single text form.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Scalar(s) => Some(s.to_string()),
            Self::Text(t) => Some(t.render()),
            Self::Sequence(_) => None,
        }
    }
}

impl TryFrom<&Value> for InputValue {
    type Error = HttpError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Scalar(s) => Ok(Self::Scalar(s.clone())),
            Value::Text(t) => Ok(Self::Text(t.clone())),
            Value::List(items) => items
                .iter()
                .map(|item| match item {
                    Value::Scalar(s) => Ok(s.clone()),
                    other => Err(HttpError::invalid_input(format!(
                        "Sequences may only contain scalars. Received element of type \"{}\".",
                        other.type_name()
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Sequence),
            Value::Null | Value::Map(_) => Err(HttpError::invalid_input(format!(
                "Value must be scalar, a sequence of scalars, or renderable. Received type: \"{}\".",
                value.type_name()
            ))),
        }
    }
}

impl TryFrom<Value> for InputValue {
    type Error = HttpError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::try_from(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::from(true).to_string(), "true");
        assert_eq!(Scalar::from(42).to_string(), "42");
        assert_eq!(Scalar::from(1.5).to_string(), "1.5");
        assert_eq!(Scalar::from("abc").to_string(), "abc");
    }

    #[test]
    fn test_value_from_json() {
        let value = Value::from(serde_json::json!({
            "name": "alice",
            "age": 30,
            "ratio": 0.5,
            "tags": ["a", "b"],
            "missing": null
        }));

        let Value::Map(map) = value else {
            panic!("expected a map");
        };
        assert_eq!(map["name"], Value::from("alice"));
        assert_eq!(map["age"], Value::from(30));
        assert_eq!(map["ratio"], Value::from(0.5));
        assert_eq!(map["tags"], Value::from(vec!["a", "b"]));
        assert!(map["missing"].is_null());
    }

    #[test]
    fn test_input_value_accepts_scalars_sequences_and_text() {
        assert_eq!(
            InputValue::try_from(Value::from(7)).unwrap(),
            InputValue::Scalar(Scalar::Int(7))
        );
        assert_eq!(
            InputValue::try_from(Value::from(vec![1, 2])).unwrap(),
            InputValue::Sequence(vec![Scalar::Int(1), Scalar::Int(2)])
        );
        let text = InputValue::try_from(Value::from(Renderable::new("hello"))).unwrap();
        assert_eq!(text.render().as_deref(), Some("hello"));
    }

    #[test]
    fn test_input_value_rejects_maps_and_nesting() {
        let mut map = IndexMap::new();
        map.insert("k".to_string(), Value::from(1));
        assert!(InputValue::try_from(Value::Map(map)).is_err());

        let nested = Value::List(vec![Value::from(vec![1, 2])]);
        let err = InputValue::try_from(nested).unwrap_err();
        assert!(err.message().contains("list"));

        assert!(InputValue::try_from(Value::Null).is_err());
    }

    #[test]
    fn test_renderable_equality_uses_text() {
        let a = Renderable::new(12);
        let b = Renderable::new("12");
        assert_eq!(a, b);
        assert_eq!(format!("{a:?}"), "Renderable(\"12\")");
    }

    #[test]
    fn test_input_value_round_trips_into_value() {
        let input = InputValue::Sequence(vec![Scalar::from("x"), Scalar::from(false)]);
        let value = Value::from(input.clone());
        assert_eq!(InputValue::try_from(&value).unwrap(), input);
    }
}
