//! Port Values
//!
//! Values flowing through the graph are type-erased behind a single enum so
//! that ports can hold and compare results from any node without generics
//! leaking into the wiring layer. Every variant supports equality, which the
//! input ports rely on to suppress redundant change notifications.
//!
//! The absent value is represented as `Option<Value>::None` at the port
//! level, not as a variant here. Absence compares equal to absence.

use serde::{Deserialize, Serialize};

/// A type-erased value carried between ports.
///
/// Variants cover the payloads the built-in computations understand. Hosts
/// with richer payloads can tunnel them through `Text` or `List`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    /// A boolean flag.
    Bool(bool),
    /// A numeric value. All numbers are carried as `f64`.
    Number(f64),
    /// A string value.
    Text(String),
    /// An RGBA color with components in the `0.0..=1.0` range.
    Color { r: f64, g: f64, b: f64, a: f64 },
    /// An ordered list of values.
    List(Vec<Value>),
}

impl Value {
    /// Create an opaque color value with full alpha.
    pub fn color(r: f64, g: f64, b: f64) -> Self {
        Self::Color { r, g, b, a: 1.0 }
    }

    /// True if this value is a `Number`.
    ///
    /// Used as the validation predicate of number-typed inputs.
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    /// True if this value is a `Color`.
    ///
    /// Used as the validation predicate of color-typed inputs.
    pub fn is_color(&self) -> bool {
        matches!(self, Self::Color { .. })
    }

    /// The numeric payload, if this value is a `Number`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string payload, if this value is `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_predicate_and_accessor() {
        let n = Value::from(42.0);
        assert!(n.is_number());
        assert_eq!(n.as_number(), Some(42.0));
        assert_eq!(Value::from("42").as_number(), None);
    }

    #[test]
    fn color_has_full_alpha_by_default() {
        let c = Value::color(0.25, 0.5, 0.75);
        assert!(c.is_color());
        assert_eq!(
            c,
            Value::Color {
                r: 0.25,
                g: 0.5,
                b: 0.75,
                a: 1.0
            }
        );
    }

    #[test]
    fn equality_distinguishes_variants() {
        assert_ne!(Value::from(1.0), Value::from(true));
        assert_eq!(Value::from("a"), Value::Text("a".to_string()));
    }
}
