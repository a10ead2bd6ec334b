//! Predicates for filtering rows during query execution.
//!
//! This module provides:
//! - Comparison and logic operators
//! - Predicate trees over column references and literals
//! - Typed evaluation against a row of values

pub mod error;
pub mod operator;
pub mod predicate;

pub use error::{ExpressionError, ExpressionResult};
pub use operator::{ComparisonOperator, LogicOperator};
pub use predicate::{ComplexPredicate, Operand, Predicate, SimplePredicate};
