use crate::ast::{Stage, StageKind};

/// Finalized query.
///
/// Only produced by [`Pipeline::finalize`](crate::Pipeline::finalize) or by
/// decoding a wire payload, so every `Query` has passed pipeline validation
/// and holds exactly one collector.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    stages: Vec<Stage>,
}

impl Query {
    pub(crate) fn new(stages: Vec<Stage>) -> Self {
        Query { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// The collector stage.
    pub fn collector(&self) -> StageKind {
        self.stages
            .iter()
            .map(Stage::kind)
            .find(|kind| kind.is_collector())
            .unwrap_or(StageKind::Count)
    }

    /// Whether the query returns a count rather than documents.
    pub fn is_count(&self) -> bool {
        self.collector() == StageKind::Count
    }
}
