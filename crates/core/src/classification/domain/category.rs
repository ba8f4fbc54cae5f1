use serde::{Deserialize, Serialize};

/// A named output bucket covering the identity tokens strictly between
/// `lower` and `upper`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRange {
    pub label: String,
    pub lower: i64,
    pub upper: i64,
}

impl CategoryRange {
    pub fn new(label: impl Into<String>, lower: i64, upper: i64) -> Self {
        Self {
            label: label.into(),
            lower,
            upper,
        }
    }

    /// Both endpoints are excluded.
    pub fn contains(&self, token: i64) -> bool {
        self.lower < token && token < self.upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(120, false)]
    #[case(121, true)]
    #[case(130, true)]
    #[case(144, true)]
    #[case(145, false)]
    #[case(-3, false)]
    fn test_contains_excludes_endpoints(#[case] token: i64, #[case] expected: bool) {
        assert_eq!(CategoryRange::new("104", 120, 145).contains(token), expected);
    }

    #[test]
    fn test_empty_interval_contains_nothing() {
        let r = CategoryRange::new("x", 5, 6);
        assert!(!r.contains(5));
        assert!(!r.contains(6));
    }
}
