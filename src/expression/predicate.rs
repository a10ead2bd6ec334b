//! Predicate trees evaluated against rows.

use crate::access::Value;
use crate::expression::{ComparisonOperator, ExpressionError, ExpressionResult, LogicOperator};
use std::fmt;

/// One side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    Column(usize),
}

impl Operand {
    fn resolve<'a>(&'a self, row: &'a [Value]) -> ExpressionResult<&'a Value> {
        match self {
            Operand::Literal(value) => Ok(value),
            Operand::Column(index) => row.get(*index).ok_or(ExpressionError::ColumnOutOfBounds {
                index: *index,
                width: row.len(),
            }),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(Value::Text(s)) => write!(f, "'{}'", s),
            Operand::Literal(value) => write!(f, "{}", value),
            Operand::Column(index) => write!(f, "#{}", index),
        }
    }
}

/// `left <op> right` over operands of the same type
#[derive(Debug, Clone, PartialEq)]
pub struct SimplePredicate {
    pub left: Operand,
    pub op: ComparisonOperator,
    pub right: Operand,
}

impl SimplePredicate {
    pub fn new(left: Operand, op: ComparisonOperator, right: Operand) -> Self {
        Self { left, op, right }
    }

    /// Compare the operands. Operands of different types are an error.
    pub fn evaluate(&self, row: &[Value]) -> ExpressionResult<bool> {
        let left = self.left.resolve(row)?;
        let right = self.right.resolve(row)?;
        Ok(self.op.matches(left.compare(right)?))
    }
}

/// Children joined by AND or OR, evaluated left to right with short-circuit
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexPredicate {
    pub op: LogicOperator,
    pub children: Vec<Predicate>,
}

impl ComplexPredicate {
    pub fn new(op: LogicOperator, children: Vec<Predicate>) -> Self {
        Self { op, children }
    }

    pub fn evaluate(&self, row: &[Value]) -> ExpressionResult<bool> {
        // AND stops at the first false, OR at the first true
        let stop_on = !self.op.identity();
        for child in &self.children {
            if child.evaluate(row)? == stop_on {
                return Ok(stop_on);
            }
        }
        Ok(self.op.identity())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Simple(SimplePredicate),
    Complex(ComplexPredicate),
}

impl Predicate {
    pub fn evaluate(&self, row: &[Value]) -> ExpressionResult<bool> {
        match self {
            Predicate::Simple(p) => p.evaluate(row),
            Predicate::Complex(p) => p.evaluate(row),
        }
    }

    pub fn compare(left: Operand, op: ComparisonOperator, right: Operand) -> Self {
        Predicate::Simple(SimplePredicate::new(left, op, right))
    }

    fn column_literal(column: usize, op: ComparisonOperator, value: impl Into<Value>) -> Self {
        Self::compare(Operand::Column(column), op, Operand::Literal(value.into()))
    }

    pub fn column_eq(column: usize, value: impl Into<Value>) -> Self {
        Self::column_literal(column, ComparisonOperator::Eq, value)
    }

    pub fn column_ne(column: usize, value: impl Into<Value>) -> Self {
        Self::column_literal(column, ComparisonOperator::Ne, value)
    }

    pub fn column_gt(column: usize, value: impl Into<Value>) -> Self {
        Self::column_literal(column, ComparisonOperator::Gt, value)
    }

    pub fn column_ge(column: usize, value: impl Into<Value>) -> Self {
        Self::column_literal(column, ComparisonOperator::Ge, value)
    }

    pub fn column_lt(column: usize, value: impl Into<Value>) -> Self {
        Self::column_literal(column, ComparisonOperator::Lt, value)
    }

    pub fn column_le(column: usize, value: impl Into<Value>) -> Self {
        Self::column_literal(column, ComparisonOperator::Le, value)
    }

    /// Compare two columns of the same row
    pub fn columns(left: usize, op: ComparisonOperator, right: usize) -> Self {
        Self::compare(Operand::Column(left), op, Operand::Column(right))
    }

    pub fn and(children: Vec<Predicate>) -> Self {
        Predicate::Complex(ComplexPredicate::new(LogicOperator::And, children))
    }

    pub fn or(children: Vec<Predicate>) -> Self {
        Predicate::Complex(ComplexPredicate::new(LogicOperator::Or, children))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Simple(p) => write!(f, "{} {} {}", p.left, p.op, p.right),
            Predicate::Complex(p) if p.children.is_empty() => {
                write!(f, "{}", if p.op.identity() { "TRUE" } else { "FALSE" })
            }
            Predicate::Complex(p) => {
                write!(f, "(")?;
                for (i, child) in p.children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", p.op)?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{DataType, ValueError};

    fn row() -> Vec<Value> {
        vec![Value::Int32(10), Value::Float32(2.5), Value::from("abc")]
    }

    #[test]
    fn test_simple_predicate() -> ExpressionResult<()> {
        let row = row();

        assert!(Predicate::column_eq(0, 10).evaluate(&row)?);
        assert!(!Predicate::column_ne(0, 10).evaluate(&row)?);
        assert!(Predicate::column_gt(0, 9).evaluate(&row)?);
        assert!(!Predicate::column_gt(0, 10).evaluate(&row)?);
        assert!(Predicate::column_ge(0, 10).evaluate(&row)?);
        assert!(Predicate::column_lt(1, 3.0f32).evaluate(&row)?);
        assert!(Predicate::column_le(2, "abc").evaluate(&row)?);
        assert!(!Predicate::column_lt(2, "abb").evaluate(&row)?);
        Ok(())
    }

    #[test]
    fn test_literal_on_left() -> ExpressionResult<()> {
        let predicate = Predicate::compare(
            Operand::Literal(Value::Int32(5)),
            ComparisonOperator::Lt,
            Operand::Column(0),
        );
        assert!(predicate.evaluate(&row())?);
        Ok(())
    }

    #[test]
    fn test_type_mismatch_is_error() {
        let result = Predicate::column_eq(0, "10").evaluate(&row());
        assert_eq!(
            result,
            Err(ExpressionError::Value(ValueError::TypeMismatch {
                left: DataType::Int32,
                right: DataType::Text,
            }))
        );

        assert!(Predicate::columns(0, ComparisonOperator::Eq, 1)
            .evaluate(&row())
            .is_err());
    }

    #[test]
    fn test_column_out_of_bounds() {
        assert_eq!(
            Predicate::column_eq(7, 1).evaluate(&row()),
            Err(ExpressionError::ColumnOutOfBounds { index: 7, width: 3 })
        );
    }

    #[test]
    fn test_and_or() -> ExpressionResult<()> {
        let row = row();
        let gt5 = Predicate::column_gt(0, 5);
        let lt8 = Predicate::column_lt(0, 8);

        assert!(!Predicate::and(vec![gt5.clone(), lt8.clone()]).evaluate(&row)?);
        assert!(Predicate::or(vec![gt5.clone(), lt8.clone()]).evaluate(&row)?);
        assert!(Predicate::or(vec![lt8.clone(), gt5.clone()]).evaluate(&row)?);

        // Nested
        let nested = Predicate::and(vec![
            Predicate::or(vec![lt8, Predicate::column_eq(2, "abc")]),
            gt5,
        ]);
        assert!(nested.evaluate(&row)?);
        Ok(())
    }

    #[test]
    fn test_empty_connectives() -> ExpressionResult<()> {
        assert!(Predicate::and(vec![]).evaluate(&row())?);
        assert!(!Predicate::or(vec![]).evaluate(&row())?);
        Ok(())
    }

    #[test]
    fn test_short_circuit_skips_errors() -> ExpressionResult<()> {
        let row = row();
        let mismatch = Predicate::column_eq(0, "x");

        // The failing child is never reached
        assert!(!Predicate::and(vec![Predicate::column_lt(0, 0), mismatch.clone()]).evaluate(&row)?);
        assert!(Predicate::or(vec![Predicate::column_gt(0, 0), mismatch.clone()]).evaluate(&row)?);

        // But it is reached when the first child does not decide the result
        assert!(Predicate::and(vec![Predicate::column_gt(0, 0), mismatch]).evaluate(&row).is_err());
        Ok(())
    }

    #[test]
    fn test_display() {
        let predicate = Predicate::and(vec![
            Predicate::column_gt(1, 100),
            Predicate::column_lt(1, 200),
            Predicate::column_ne(2, "x"),
        ]);
        assert_eq!(predicate.to_string(), "(#1 > 100 AND #1 < 200 AND #2 != 'x')");
        assert_eq!(Predicate::or(vec![]).to_string(), "FALSE");
    }
}
