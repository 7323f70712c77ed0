//! Priority-ordered composition of strategies.

use super::{Found, Locate, LocateOutcome, LocateRequest, StrategyKind};
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::{LocateError, LocateResult};
use std::sync::Arc;

/// What one strategy did during a composite call.
#[derive(Clone, Debug, PartialEq)]
pub enum AttemptOutcome {
    Found(Found),
    NotFound,
    /// The request had no target for this strategy, or none is installed.
    Skipped(&'static str),
    /// A recoverable error, counted as not found.
    Failed(LocateError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct StrategyAttempt {
    pub strategy: StrategyKind,
    pub outcome: AttemptOutcome,
}

/// Result of a composite call with the per-strategy trail.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeReport {
    pub outcome: LocateOutcome,
    /// Strategies in the order tried. Ends with the winner when found.
    pub attempts: Vec<StrategyAttempt>,
}

impl CompositeReport {
    pub fn found(&self) -> Option<&Found> {
        self.outcome.found()
    }
}

/// Tries strategies in order and returns the first success.
///
/// Holds no state between calls. Recoverable strategy errors are recorded
/// and treated as not found; any other error stops the search and is
/// returned as is.
#[derive(Clone, Default)]
pub struct CompositeLocator {
    strategies: Vec<Arc<dyn Locate>>,
}

impl CompositeLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a strategy. A later strategy of the same kind shadows an
    /// earlier one.
    pub fn with_strategy(mut self, strategy: Arc<dyn Locate>) -> Self {
        self.strategies.retain(|s| s.kind() != strategy.kind());
        self.strategies.push(strategy);
        self
    }

    pub fn strategy(&self, kind: StrategyKind) -> Option<&Arc<dyn Locate>> {
        self.strategies.iter().find(|s| s.kind() == kind)
    }

    /// Installed kinds, in installation order.
    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Locates with [`StrategyKind::DEFAULT_ORDER`].
    pub fn locate_default(&self, request: &LocateRequest) -> LocateResult<CompositeReport> {
        self.locate(request, &StrategyKind::DEFAULT_ORDER)
    }

    /// Tries the strategies named in `order`.
    pub fn locate(
        &self,
        request: &LocateRequest,
        order: &[StrategyKind],
    ) -> LocateResult<CompositeReport> {
        let _span = trace_span!("composite_locate", strategies = order.len()).entered();
        request.validate()?;

        let mut attempts = Vec::with_capacity(order.len());
        for &kind in order {
            let outcome = match self.strategy(kind) {
                None => AttemptOutcome::Skipped("strategy not installed"),
                Some(strategy) if !strategy.supports(request) => {
                    AttemptOutcome::Skipped("no target for strategy")
                }
                Some(strategy) => match strategy.locate(request) {
                    Ok(LocateOutcome::Found(found)) => AttemptOutcome::Found(found),
                    Ok(LocateOutcome::NotFound) => AttemptOutcome::NotFound,
                    Err(err) if err.is_recoverable() => AttemptOutcome::Failed(err),
                    Err(err) => {
                        trace_debug!(
                            "strategy failed",
                            strategy = kind.as_str(),
                            error = err.to_string().as_str()
                        );
                        return Err(err);
                    }
                },
            };
            trace_debug!(
                "strategy outcome",
                strategy = kind.as_str(),
                outcome = outcome_label(&outcome)
            );

            let found = match &outcome {
                AttemptOutcome::Found(found) => Some(*found),
                _ => None,
            };
            attempts.push(StrategyAttempt {
                strategy: kind,
                outcome,
            });
            if let Some(found) = found {
                trace_event!("element found", strategy = kind.as_str(), tried = attempts.len());
                return Ok(CompositeReport {
                    outcome: LocateOutcome::Found(found),
                    attempts,
                });
            }
        }

        trace_event!("element not found", tried = attempts.len());
        Ok(CompositeReport {
            outcome: LocateOutcome::NotFound,
            attempts,
        })
    }
}

fn outcome_label(outcome: &AttemptOutcome) -> &'static str {
    match outcome {
        AttemptOutcome::Found(_) => "found",
        AttemptOutcome::NotFound => "not_found",
        AttemptOutcome::Skipped(_) => "skipped",
        AttemptOutcome::Failed(_) => "failed",
    }
}
