//! Fan-out/fan-in of one benefit request across the four backends.
//!
//! One [`Task`] is spawned per workflow the moment a request arrives. The
//! tasks are then folded pairwise, in a fixed order, into a single combined
//! task: guide first, good_rx second, gaps_in_care last. Each fold itself
//! returns a task, so folding never blocks the request handler; only the
//! final await does.

use std::sync::Arc;

use crate::combine;
use crate::config::Config;
use crate::error::WorkflowError;
use crate::log::{scoped, stage, EventSink};
use crate::task::Task;
use crate::workflow::{self, WorkflowSet};

/// Event scope for the orchestration layer itself.
pub const MANAGER: &str = "manage_pbm_requests";

type FoldResult = Result<String, WorkflowError>;

pub struct Orchestrator {
    workflows: WorkflowSet,
    sink: Arc<dyn EventSink>,
    separator: String,
}

impl Orchestrator {
    pub fn new(
        workflows: WorkflowSet,
        sink: Arc<dyn EventSink>,
        separator: impl Into<String>,
    ) -> Self {
        Self {
            workflows,
            sink,
            separator: separator.into(),
        }
    }

    /// Build the standard PBM fan-out from configuration.
    pub fn from_config(config: &Config, sink: Arc<dyn EventSink>) -> Self {
        let workflows = WorkflowSet::pbm(config, Arc::clone(&sink));
        Self::new(workflows, sink, config.separator.clone())
    }

    /// Fan `request` out to all four workflows and fold their answers into
    /// one response.
    ///
    /// The guide and good_rx paths are awaited to completion; gaps_in_care
    /// contributes only if it has settled by the time the rest of the chain
    /// has, and is abandoned otherwise. A preferred-path failure fails the
    /// whole request; supplemental failures are absorbed.
    pub async fn handle(&self, request: &str) -> FoldResult {
        self.sink
            .emit(&scoped(MANAGER, stage::REQUEST_RECEIVED), request);

        let preferred = Task::spawn(self.workflows.preferred.call(request));
        let guide = Task::spawn(self.workflows.guide.call(request));
        let good_rx = Task::spawn(self.workflows.good_rx.call(request));
        let gaps_in_care = Task::spawn(self.workflows.gaps_in_care.call(request));
        self.sink.emit(&scoped(MANAGER, stage::REQUEST_SENT), request);

        let combined = combine::compose(self.guide_policy(), &preferred, &guide);
        let combined = combine::compose(self.either_policy(), &combined, &good_rx);
        let combined = {
            let sink = Arc::clone(&self.sink);
            let abandoned = scoped(workflow::GAPS_IN_CARE, stage::REQUEST_ABANDONED);
            combine::fold_if_complete(self.guide_policy(), &combined, &gaps_in_care, move || {
                sink.emit(&abandoned, "")
            })
        };

        let folded = combined.join().await;
        // The preferred path's verdict outranks anything a supplemental fold
        // salvaged. Already settled; this join returns immediately.
        let response = match preferred.join().await {
            Err(failure) => Err(failure),
            Ok(_) => folded,
        };

        match response {
            Ok(response) => {
                self.sink
                    .emit(&scoped(MANAGER, stage::RESPONSE_RECEIVED), &response);
                Ok(response)
            }
            Err(failure) => {
                self.sink
                    .emit(&scoped(MANAGER, stage::REQUEST_FAILED), &failure.to_string());
                Err(failure)
            }
        }
    }

    fn join_values(&self) -> impl FnOnce(String, String) -> String + Send + 'static {
        let separator = self.separator.clone();
        move |a, b| format!("{a}{separator}{b}")
    }

    /// Both-or-preferred merge closed over this orchestrator's separator.
    fn guide_policy(&self) -> impl FnOnce(FoldResult, FoldResult) -> FoldResult + Send + 'static {
        let join = self.join_values();
        move |preferred, supplemental| combine::both_or_preferred(preferred, supplemental, join)
    }

    /// Both-or-either merge closed over this orchestrator's separator.
    fn either_policy(&self) -> impl FnOnce(FoldResult, FoldResult) -> FoldResult + Send + 'static {
        let join = self.join_values();
        move |preferred, supplemental| combine::both_or_either(preferred, supplemental, join)
    }
}
