//! Operator definitions for predicates.

use std::cmp::Ordering;
use std::fmt;

/// Comparison between two operands of the same type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl ComparisonOperator {
    /// Whether an ordering between left and right operands satisfies this operator
    pub fn matches(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonOperator::Eq => ordering == Ordering::Equal,
            ComparisonOperator::Ne => ordering != Ordering::Equal,
            ComparisonOperator::Gt => ordering == Ordering::Greater,
            ComparisonOperator::Ge => ordering != Ordering::Less,
            ComparisonOperator::Lt => ordering == Ordering::Less,
            ComparisonOperator::Le => ordering != Ordering::Greater,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "=",
            ComparisonOperator::Ne => "!=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Le => "<=",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connective joining child predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicOperator {
    And,
    Or,
}

impl LogicOperator {
    /// Result of combining zero predicates
    pub fn identity(&self) -> bool {
        matches!(self, LogicOperator::And)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicOperator::And => "AND",
            LogicOperator::Or => "OR",
        }
    }
}

impl fmt::Display for LogicOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_matches() {
        use Ordering::*;

        assert!(ComparisonOperator::Eq.matches(Equal));
        assert!(!ComparisonOperator::Eq.matches(Less));
        assert!(ComparisonOperator::Ne.matches(Greater));
        assert!(!ComparisonOperator::Ne.matches(Equal));
        assert!(ComparisonOperator::Gt.matches(Greater));
        assert!(!ComparisonOperator::Gt.matches(Equal));
        assert!(ComparisonOperator::Ge.matches(Equal));
        assert!(!ComparisonOperator::Ge.matches(Less));
        assert!(ComparisonOperator::Lt.matches(Less));
        assert!(!ComparisonOperator::Lt.matches(Equal));
        assert!(ComparisonOperator::Le.matches(Equal));
        assert!(!ComparisonOperator::Le.matches(Greater));
    }

    #[test]
    fn test_display() {
        assert_eq!(ComparisonOperator::Ge.to_string(), ">=");
        assert_eq!(LogicOperator::Or.to_string(), "OR");
    }
}
