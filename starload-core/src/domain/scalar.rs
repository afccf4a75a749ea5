// starload-core/src/domain/scalar.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single warehouse value, as returned in the first column of a check query
/// or as declared in the pipeline definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            _ => None,
        }
    }
}

// Integers and floats compare numerically: a COUNT(*) returned as BIGINT
// must equal an expectation written as `0` or `0.0`.
impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "NULL"),
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Text(v) => write!(f, "'{}'", v),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_cross_type_equality() {
        assert_eq!(Scalar::Int(0), Scalar::Float(0.0));
        assert_ne!(Scalar::Int(1), Scalar::Int(0));
        assert_ne!(Scalar::Int(0), Scalar::Text("0".into()));
        assert_ne!(Scalar::Null, Scalar::Int(0));
        assert_eq!(Scalar::Null, Scalar::Null);
    }

    #[test]
    fn test_yaml_expectations() -> anyhow::Result<()> {
        let values: Vec<Scalar> = serde_yaml::from_str("[0, 1.5, true, ok, null]")?;
        assert!(matches!(values[0], Scalar::Int(0)));
        assert!(matches!(values[1], Scalar::Float(_)));
        assert!(matches!(values[2], Scalar::Bool(true)));
        assert_eq!(values[3], Scalar::Text("ok".into()));
        assert!(matches!(values[4], Scalar::Null));
        Ok(())
    }
}
