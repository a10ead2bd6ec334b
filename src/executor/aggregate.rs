//! Hash-based aggregation executor for grouping and aggregate functions.
//!
//! This module implements a hash aggregation executor that supports:
//! - Multiple grouping columns
//! - Multiple aggregate functions (COUNT, SUM, MIN, MAX)
//! - Exact-type accumulation: mixing value types within a group is an error
//!
//! The executor is blocking. `open()` drains the child completely and
//! materializes one row per group, in the order groups were first seen;
//! `next()` then steps through those rows.

use crate::access::{Value, ValueError};
use crate::executor::{Executor, Row};
use anyhow::{anyhow, bail, Result};
use log::debug;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Supported aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    /// COUNT(*) or COUNT(col) - number of rows in the group
    Count,
    /// SUM(col) - wrapping sum for integers
    Sum,
    /// MIN(col)
    Min,
    /// MAX(col)
    Max,
}

impl AggregateFunction {
    /// Returns the name of the aggregate function
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }
}

/// Specification for an aggregate computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSpec {
    /// The aggregate function to apply
    pub function: AggregateFunction,
    /// Column index to aggregate (None for COUNT(*))
    pub column_idx: Option<usize>,
}

impl AggregateSpec {
    pub fn new(function: AggregateFunction, column_idx: Option<usize>) -> Self {
        Self {
            function,
            column_idx,
        }
    }

    pub fn count_star() -> Self {
        Self::new(AggregateFunction::Count, None)
    }

    pub fn sum(column_idx: usize) -> Self {
        Self::new(AggregateFunction::Sum, Some(column_idx))
    }

    pub fn min(column_idx: usize) -> Self {
        Self::new(AggregateFunction::Min, Some(column_idx))
    }

    pub fn max(column_idx: usize) -> Self {
        Self::new(AggregateFunction::Max, Some(column_idx))
    }
}

impl fmt::Display for AggregateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column_idx {
            Some(idx) => write!(f, "{}(#{})", self.function.name(), idx),
            None => write!(f, "{}(*)", self.function.name()),
        }
    }
}

/// Running value of one aggregate within one group
#[derive(Debug, Clone)]
enum AggregateState {
    Count(i32),
    /// SUM/MIN/MAX before the first value
    Empty,
    Value(Value),
}

impl AggregateState {
    fn new(function: AggregateFunction) -> Self {
        match function {
            AggregateFunction::Count => AggregateState::Count(0),
            _ => AggregateState::Empty,
        }
    }

    /// Update the state with a new value
    fn update(&mut self, value: Option<&Value>, function: AggregateFunction) -> Result<()> {
        if let AggregateState::Count(count) = self {
            *count = count.wrapping_add(1);
            return Ok(());
        }

        let value = value.ok_or_else(|| anyhow!("{} requires a column", function.name()))?;
        if function == AggregateFunction::Sum {
            if let Value::Text(_) = value {
                return Err(ValueError::Unsupported {
                    operation: "SUM",
                    data_type: value.data_type(),
                }
                .into());
            }
        }

        match self {
            AggregateState::Empty => *self = AggregateState::Value(value.clone()),
            AggregateState::Value(current) => {
                let replacement = match function {
                    AggregateFunction::Sum => Some(current.add(value)?),
                    AggregateFunction::Min => {
                        (value.compare(current)? == Ordering::Less).then(|| value.clone())
                    }
                    AggregateFunction::Max => {
                        (value.compare(current)? == Ordering::Greater).then(|| value.clone())
                    }
                    AggregateFunction::Count => None,
                };
                if let Some(replacement) = replacement {
                    *current = replacement;
                }
            }
            AggregateState::Count(_) => {}
        }
        Ok(())
    }

    /// Get the final aggregate value
    fn finalize(self) -> Result<Value> {
        match self {
            AggregateState::Count(count) => Ok(Value::Int32(count)),
            AggregateState::Value(value) => Ok(value),
            AggregateState::Empty => bail!("Aggregate finalized without input"),
        }
    }
}

/// Hash-based aggregation executor
pub struct HashAggregateExecutor {
    /// Child executor providing input rows
    child: Box<dyn Executor>,
    /// Column indices to group by
    group_by: Vec<usize>,
    /// Aggregate functions to compute
    aggregates: Vec<AggregateSpec>,
    /// Materialized output: group key columns followed by aggregate columns
    results: Vec<Row>,
    /// Index of the current output row
    cursor: Option<usize>,
    initialized: bool,
}

impl HashAggregateExecutor {
    pub fn new(
        child: Box<dyn Executor>,
        group_by: Vec<usize>,
        aggregates: Vec<AggregateSpec>,
    ) -> Result<Self> {
        if group_by.is_empty() && aggregates.is_empty() {
            bail!("At least one grouping column or aggregate function must be specified");
        }
        for agg in &aggregates {
            if agg.column_idx.is_none() && agg.function != AggregateFunction::Count {
                bail!("{} requires a column", agg.function.name());
            }
        }

        Ok(Self {
            child,
            group_by,
            aggregates,
            results: Vec::new(),
            cursor: None,
            initialized: false,
        })
    }

    fn column<'a>(values: &'a [Value], idx: usize) -> Result<&'a Value> {
        values.get(idx).ok_or_else(|| {
            anyhow!(
                "Column index {} is out of bounds for row with {} columns",
                idx,
                values.len()
            )
        })
    }

    /// Extract group key from a row
    fn extract_group_key(&self, values: &[Value]) -> Result<Vec<Value>> {
        self.group_by
            .iter()
            .map(|&idx| Self::column(values, idx).cloned())
            .collect()
    }

    /// Drain the child and build one output row per group
    fn consume_input(&mut self) -> Result<()> {
        let mut slots: HashMap<Vec<Value>, usize> = HashMap::new();
        let mut groups: Vec<(Vec<Value>, Vec<AggregateState>)> = Vec::new();
        let mut input_rows = 0usize;

        while self.child.next()? {
            let values = self.child.output();
            input_rows += 1;

            let group_key = self.extract_group_key(values)?;
            let slot = match slots.get(&group_key) {
                Some(&slot) => slot,
                None => {
                    let states = self
                        .aggregates
                        .iter()
                        .map(|agg| AggregateState::new(agg.function))
                        .collect();
                    groups.push((group_key.clone(), states));
                    slots.insert(group_key, groups.len() - 1);
                    groups.len() - 1
                }
            };

            let states = &mut groups[slot].1;
            for (state, agg) in states.iter_mut().zip(&self.aggregates) {
                let value = match agg.column_idx {
                    Some(idx) => Some(Self::column(values, idx)?),
                    None => None,
                };
                state.update(value, agg.function)?;
            }
        }

        self.results = groups
            .into_iter()
            .map(|(mut row, states)| {
                for state in states {
                    row.push(state.finalize()?);
                }
                Ok(row)
            })
            .collect::<Result<_>>()?;

        debug!(
            "Aggregated {} rows into {} groups",
            input_rows,
            self.results.len()
        );
        Ok(())
    }
}

impl Executor for HashAggregateExecutor {
    fn open(&mut self) -> Result<()> {
        self.results.clear();
        self.cursor = None;

        self.child.open()?;
        self.consume_input()?;
        self.child.close()?;

        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        if !self.initialized {
            bail!("Executor not initialized. Call open() first.");
        }

        let next = self.cursor.map_or(0, |cursor| cursor + 1);
        self.cursor = Some(next.min(self.results.len()));
        Ok(next < self.results.len())
    }

    fn close(&mut self) -> Result<()> {
        self.results.clear();
        self.cursor = None;
        self.initialized = false;
        Ok(())
    }

    fn output(&self) -> &[Value] {
        match self.cursor {
            Some(cursor) if cursor < self.results.len() => &self.results[cursor],
            _ => &[],
        }
    }
}
