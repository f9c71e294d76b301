use std::borrow::Cow;

use crate::error::TxEngineError;
use crate::operation::Operation;
use crate::query::Query;

/// One step of a frozen plan.
pub(crate) enum PlanStep {
    /// Query built once at plan construction and replayed on every attempt.
    Eager(Query),
    /// Operation whose query is rebuilt inside each attempt's transaction.
    Deferred(Box<dyn Operation>),
}

impl PlanStep {
    /// Yield the query for this step. Eager steps return the stored query;
    /// deferred steps invoke `build` now, so the result reflects the current
    /// attempt's in-transaction reads.
    pub(crate) fn resolve(&self) -> Result<Cow<'_, Query>, TxEngineError> {
        match self {
            Self::Eager(query) => Ok(Cow::Borrowed(query)),
            Self::Deferred(op) => op.build().map(Cow::Owned),
        }
    }
}

/// An ordered, replayable batch of statements with an aggregate idempotency
/// flag.
///
/// Constructed exactly once per `run`, before the first transaction begins,
/// and never mutated afterwards; retries replay the same plan in the same
/// order.
pub struct ExecutionPlan {
    steps: Vec<PlanStep>,
    idempotent: bool,
}

impl ExecutionPlan {
    /// Freeze a batch of operations into a plan.
    ///
    /// Each operation is consulted once, in input order: `is_idempotent`
    /// feeds the aggregate flag, and `build` is invoked now unless the
    /// operation defers building. A build failure propagates immediately and
    /// later operations are not touched.
    ///
    /// # Errors
    /// `TxEngineError::InvalidArgument` for an empty batch; any error an
    /// eager `build` raises.
    pub fn build(operations: Vec<Box<dyn Operation>>) -> Result<Self, TxEngineError> {
        if operations.is_empty() {
            return Err(TxEngineError::InvalidArgument(
                "at least one operation is required".to_string(),
            ));
        }

        let mut steps = Vec::with_capacity(operations.len());
        let mut idempotent = true;
        for op in operations {
            idempotent &= op.is_idempotent();
            if op.defer_build() {
                steps.push(PlanStep::Deferred(op));
            } else {
                steps.push(PlanStep::Eager(op.build()?));
            }
        }

        Ok(Self { steps, idempotent })
    }

    /// Freeze a single operation.
    ///
    /// # Errors
    /// Any error the operation's eager `build` raises.
    pub fn single(operation: Box<dyn Operation>) -> Result<Self, TxEngineError> {
        Self::build(vec![operation])
    }

    /// True when every operation in the batch declared itself idempotent.
    #[must_use]
    pub fn is_idempotent(&self) -> bool {
        self.idempotent
    }

    /// Number of steps in the plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub(crate) fn steps(&self) -> impl Iterator<Item = &PlanStep> {
        self.steps.iter()
    }
}

impl std::fmt::Debug for ExecutionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let deferred = self
            .steps
            .iter()
            .filter(|s| matches!(s, PlanStep::Deferred(_)))
            .count();
        f.debug_struct("ExecutionPlan")
            .field("steps", &self.steps.len())
            .field("deferred", &deferred)
            .field("idempotent", &self.idempotent)
            .finish()
    }
}
