//! Query planning for pre-parsed query descriptions.
//!
//! A `QueryPlan` is turned into a fixed operator pipeline:
//! `Scan -> Select (if filtered) -> HashAggregate (if grouped or aggregated)`.
//! There is no reordering or cost-based choice.

use crate::access::Value;
use crate::executor::{
    AggregateSpec, ExecutionContext, Executor, HashAggregateExecutor, ScanExecutor, SelectExecutor,
};
use crate::expression::Predicate;
use anyhow::Result;
use std::fmt;

/// Keeps rows whose `column` lies strictly between `lower` and `upper`
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter {
    pub column: usize,
    pub lower: Value,
    pub upper: Value,
}

impl RangeFilter {
    pub fn new(column: usize, lower: impl Into<Value>, upper: impl Into<Value>) -> Self {
        Self {
            column,
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    pub fn to_predicate(&self) -> Predicate {
        Predicate::and(vec![
            Predicate::column_gt(self.column, self.lower.clone()),
            Predicate::column_lt(self.column, self.upper.clone()),
        ])
    }
}

/// Query description produced by an external parser
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPlan {
    pub filter: Option<RangeFilter>,
    pub group_by: Vec<usize>,
    pub aggregates: Vec<AggregateSpec>,
}

impl QueryPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: RangeFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_group_by(mut self, columns: Vec<usize>) -> Self {
        self.group_by = columns;
        self
    }

    pub fn with_aggregate(mut self, aggregate: AggregateSpec) -> Self {
        self.aggregates.push(aggregate);
        self
    }

    fn is_aggregating(&self) -> bool {
        !self.group_by.is_empty() || !self.aggregates.is_empty()
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scan")?;
        if let Some(filter) = &self.filter {
            write!(f, " -> Select{}", filter.to_predicate())?;
        }
        if self.is_aggregating() {
            let aggregates: Vec<String> = self.aggregates.iter().map(|a| a.to_string()).collect();
            write!(
                f,
                " -> HashAggregate(group by {:?}: {})",
                self.group_by,
                aggregates.join(", ")
            )?;
        }
        Ok(())
    }
}

/// Compose the operator tree for `plan`. The returned executor is not opened.
pub fn build_operator_tree(
    plan: &QueryPlan,
    context: ExecutionContext,
) -> Result<Box<dyn Executor>> {
    let mut root: Box<dyn Executor> = Box::new(ScanExecutor::new(context));

    if let Some(filter) = &plan.filter {
        root = Box::new(SelectExecutor::new(root, filter.to_predicate()));
    }

    if plan.is_aggregating() {
        root = Box::new(HashAggregateExecutor::new(
            root,
            plan.group_by.clone(),
            plan.aggregates.clone(),
        )?);
    }

    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Record;
    use crate::executor::collect_rows;
    use crate::executor::tests::{create_test_context, int_rows};
    use crate::storage::PageId;

    fn load(context: &ExecutionContext, rows: &[&[i32]]) -> Result<()> {
        let mut cache = context.cache.lock();
        let page = cache.get(PageId(0))?;
        for row in rows {
            page.add_record(&Record::new(row.iter().map(|v| Value::Int32(*v)).collect()))?;
        }
        Ok(())
    }

    #[test]
    fn test_range_filter_is_exclusive() -> Result<()> {
        let filter = RangeFilter::new(0, 1, 3);
        let predicate = filter.to_predicate();

        assert!(!predicate.evaluate(&[Value::Int32(1)])?);
        assert!(predicate.evaluate(&[Value::Int32(2)])?);
        assert!(!predicate.evaluate(&[Value::Int32(3)])?);
        Ok(())
    }

    #[test]
    fn test_plain_scan() -> Result<()> {
        let (_dir, context) = create_test_context(4)?;
        load(&context, &[&[1, 1], &[2, 2]])?;

        let mut root = build_operator_tree(&QueryPlan::new(), context)?;
        assert_eq!(collect_rows(root.as_mut())?, int_rows(&[&[1, 1], &[2, 2]]));
        Ok(())
    }

    #[test]
    fn test_filter_then_aggregate() -> Result<()> {
        let (_dir, context) = create_test_context(4)?;
        load(
            &context,
            &[&[1, 10], &[2, 150], &[1, 120], &[2, 300], &[3, 199], &[1, 130]],
        )?;

        let plan = QueryPlan::new()
            .with_filter(RangeFilter::new(1, 100, 200))
            .with_group_by(vec![0])
            .with_aggregate(AggregateSpec::sum(1))
            .with_aggregate(AggregateSpec::count_star());

        let mut root = build_operator_tree(&plan, context)?;
        assert_eq!(
            collect_rows(root.as_mut())?,
            int_rows(&[&[2, 150, 1], &[1, 250, 2], &[3, 199, 1]])
        );
        Ok(())
    }

    #[test]
    fn test_display() {
        let plan = QueryPlan::new()
            .with_filter(RangeFilter::new(1, 100, 200))
            .with_group_by(vec![0])
            .with_aggregate(AggregateSpec::sum(1));

        assert_eq!(
            plan.to_string(),
            "Scan -> Select(#1 > 100 AND #1 < 200) -> HashAggregate(group by [0]: SUM(#1))"
        );
        assert_eq!(QueryPlan::new().to_string(), "Scan");
    }
}
