// starload-core/src/domain/quality.rs

use serde::{Deserialize, Serialize};

use crate::domain::scalar::Scalar;

/// One post-load assertion: the first column of the first row returned by
/// `query` must equal `expected`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct QualityCheck {
    pub query: String,
    pub expected: Scalar,
}

impl QualityCheck {
    pub fn new(query: impl Into<String>, expected: impl Into<Scalar>) -> Self {
        Self {
            query: query.into(),
            expected: expected.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_scalar_conversion() {
        let check = QualityCheck::new("SELECT COUNT(*) FROM user_info WHERE userid IS NULL", 0i64);
        assert_eq!(check.expected, Scalar::Int(0));
        // Integer and float expectations compare numerically
        assert_eq!(QualityCheck::new("SELECT 1", 0.0).expected, Scalar::Int(0));
    }
}
