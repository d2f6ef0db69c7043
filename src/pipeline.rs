//! Query pipeline builder.
//!
//! A [`Pipeline`] records stages in call order. Nothing is checked until
//! [`Pipeline::finalize`], which validates the stage sequence and returns an
//! immutable [`Query`]:
//!
//! - exactly one collector (`limit`, `topk` or `count`)
//! - at most one ordering (`sort` or `topk`)
//! - only `rerank` may follow the collector, and never a `count`
//! - `limit` and `topk` bounds are positive
//! - every expression fits the wire format: `all`/`any` within the operand
//!   limit, finite floats and match weights
//!
//! Adjacent `select` calls merge into one projection and adjacent `filter`
//! calls are ANDed into one predicate. A `select` or `filter` separated from
//! the previous one by another stage starts a new stage, since it may refer
//! to fields projected in between.

use std::mem;

use tracing::debug;

use crate::ast::{
    BinaryOp, Expr, Literal, MAX_NARY_OPERANDS, Query, RerankOptions, Stage, StageKind, field,
};
use crate::coerce;
use crate::error::{ExprError, PipelineError};

/// Fluent stage accumulator.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds projections. Names already projected by the preceding `select`
    /// are overwritten in place.
    pub fn select<K, E>(mut self, exprs: impl IntoIterator<Item = (K, E)>) -> Self
    where
        K: Into<String>,
        E: Into<Expr>,
    {
        let exprs = exprs.into_iter().map(|(k, v)| (k.into(), v.into()));
        match self.stages.last_mut() {
            Some(Stage::Select { exprs: current }) => {
                for (name, expr) in exprs {
                    match current.iter_mut().find(|(n, _)| *n == name) {
                        Some(slot) => slot.1 = expr,
                        None => current.push((name, expr)),
                    }
                }
            }
            _ => self.stages.push(Stage::Select {
                exprs: exprs.collect(),
            }),
        }
        self
    }

    /// Projects each field under its own name.
    pub fn select_fields<S: Into<String>>(self, names: impl IntoIterator<Item = S>) -> Self {
        self.select(names.into_iter().map(|name| {
            let name = name.into();
            let expr = field(name.clone());
            (name, expr)
        }))
    }

    /// Adds a predicate, ANDed with the preceding `filter` if there is one.
    pub fn filter(mut self, expr: impl Into<Expr>) -> Self {
        let expr = expr.into();
        match self.stages.last_mut() {
            Some(Stage::Filter { expr: current }) => {
                let prev = mem::replace(current, Expr::Literal(Literal::Null));
                *current = prev.binary(BinaryOp::And, expr);
            }
            _ => self.stages.push(Stage::Filter { expr }),
        }
        self
    }

    pub fn sort(mut self, expr: impl Into<Expr>, asc: bool) -> Self {
        self.stages.push(Stage::Sort {
            expr: expr.into(),
            asc,
        });
        self
    }

    pub fn limit(mut self, k: u64) -> Self {
        self.stages.push(Stage::Limit { k });
        self
    }

    pub fn topk(mut self, expr: impl Into<Expr>, k: u64, asc: bool) -> Self {
        self.stages.push(Stage::TopK {
            expr: expr.into(),
            k,
            asc,
        });
        self
    }

    pub fn count(mut self) -> Self {
        self.stages.push(Stage::Count);
        self
    }

    pub fn rerank(mut self, options: RerankOptions) -> Self {
        self.stages.push(Stage::Rerank(options));
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Validates the stage sequence and freezes it into a [`Query`].
    pub fn finalize(self) -> Result<Query, PipelineError> {
        if let Err(e) = validate(&self.stages) {
            debug!(stages = self.stages.len(), error = %e, "pipeline validation failed");
            return Err(e);
        }
        let query = Query::new(self.stages);
        debug!(
            stages = query.stages().len(),
            collector = %query.collector(),
            "finalized query"
        );
        Ok(query)
    }
}

/// Checks the shape rules listed in the module docs.
pub(crate) fn validate(stages: &[Stage]) -> Result<(), PipelineError> {
    let mut collector: Option<StageKind> = None;
    let mut ordering: Option<StageKind> = None;
    let mut reranked = false;

    for (position, stage) in stages.iter().enumerate() {
        let kind = stage.kind();

        match stage {
            Stage::Select { exprs } if exprs.is_empty() => {
                return Err(PipelineError::EmptyProjection { position });
            }
            Stage::Limit { k: 0 } | Stage::TopK { k: 0, .. } => {
                return Err(PipelineError::ZeroBound {
                    position,
                    stage: kind,
                });
            }
            _ => {}
        }
        check_exprs(stage, position)?;

        if kind == StageKind::Rerank {
            match collector {
                None => return Err(PipelineError::MisplacedRerank { position }),
                Some(StageKind::Count) => return Err(PipelineError::RerankAfterCount { position }),
                Some(_) if reranked => return Err(PipelineError::MultipleReranks { position }),
                Some(_) => reranked = true,
            }
            continue;
        }

        if kind.is_ordering() {
            if let Some(first) = ordering {
                return Err(PipelineError::MultipleOrderings {
                    position,
                    first,
                    second: kind,
                });
            }
            ordering = Some(kind);
        }

        if kind.is_collector() {
            if let Some(first) = collector {
                return Err(PipelineError::MultipleCollectors {
                    position,
                    first,
                    second: kind,
                });
            }
            collector = Some(kind);
        } else if collector.is_some() {
            return Err(PipelineError::StageAfterCollector {
                position,
                stage: kind,
            });
        }
    }

    match collector {
        Some(_) => Ok(()),
        None => Err(PipelineError::MissingCollector),
    }
}

/// Rejects trees the wire format cannot carry: `all`/`any` nodes over the
/// operand limit, non-finite floats and non-finite match weights.
fn check_exprs(stage: &Stage, position: usize) -> Result<(), PipelineError> {
    let mut error = None;
    for expr in stage.exprs() {
        expr.walk(&mut |e| {
            if error.is_none() {
                error = check_node(e, position).err();
            }
        });
    }
    error.map_or(Ok(()), Err)
}

fn check_node(expr: &Expr, position: usize) -> Result<(), PipelineError> {
    let invalid = |source: ExprError| PipelineError::InvalidExpr { position, source };
    match expr {
        Expr::Match(m) if !m.weight.is_finite() => Err(PipelineError::InvalidWeight {
            position,
            token: m.token.clone(),
            weight: m.weight,
        }),
        Expr::Nary { op, exprs } if exprs.len() > MAX_NARY_OPERANDS => {
            Err(invalid(ExprError::TooManyOperands {
                op: *op,
                count: exprs.len(),
                max: MAX_NARY_OPERANDS,
            }))
        }
        Expr::Literal(lit) => coerce::finite_literal(lit).map_err(|e| invalid(e.into())),
        Expr::Function(f) => coerce::finite_function(f).map_err(|e| invalid(e.into())),
        _ => Ok(()),
    }
}

// Entry points

pub fn select<K, E>(exprs: impl IntoIterator<Item = (K, E)>) -> Pipeline
where
    K: Into<String>,
    E: Into<Expr>,
{
    Pipeline::new().select(exprs)
}

pub fn filter(expr: impl Into<Expr>) -> Pipeline {
    Pipeline::new().filter(expr)
}

pub fn sort(expr: impl Into<Expr>, asc: bool) -> Pipeline {
    Pipeline::new().sort(expr, asc)
}

pub fn limit(k: u64) -> Pipeline {
    Pipeline::new().limit(k)
}

pub fn topk(expr: impl Into<Expr>, k: u64, asc: bool) -> Pipeline {
    Pipeline::new().topk(expr, k, asc)
}

pub fn count() -> Pipeline {
    Pipeline::new().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_then_ordering_reports_ordering() {
        let stages = vec![
            Stage::TopK {
                expr: field("a"),
                k: 1,
                asc: true,
            },
            Stage::Sort {
                expr: field("a"),
                asc: true,
            },
        ];
        assert!(matches!(
            validate(&stages),
            Err(PipelineError::MultipleOrderings {
                position: 1,
                first: StageKind::TopK,
                second: StageKind::Sort
            })
        ));
    }

    #[test]
    fn test_filter_merge_builds_and() {
        let p = filter(field("a")).filter(field("b"));
        assert_eq!(p.stages().len(), 1);
        assert_eq!(
            p.stages()[0],
            Stage::Filter {
                expr: field("a").binary(BinaryOp::And, field("b"))
            }
        );
    }
}
