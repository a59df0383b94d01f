//! Backend workflows for the PBM fan-out.
//!
//! Each workflow is an async `String -> Result<String, WorkflowError>`
//! function behind the [`WorkflowFn`] contract. Messages are
//! `"::"`-separated; the first segment names the message kind and is
//! rewritten at each stage. Transport legs are simulated with a configured
//! delay.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::config::Config;
use crate::error::WorkflowError;
use crate::log::{scoped, stage, EventSink};

/// The collaborator contract: one request in, one settled result out.
///
/// Cloning is cheap; clones share the underlying function. Implementations
/// may perform I/O or sleep, and must be callable from any execution unit.
#[derive(Clone)]
pub struct WorkflowFn {
    inner: Arc<dyn Fn(String) -> BoxFuture<'static, Result<String, WorkflowError>> + Send + Sync>,
}

impl WorkflowFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(String) -> BoxFuture<'static, Result<String, WorkflowError>> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Invoke the workflow against one request.
    pub fn call(&self, request: impl Into<String>) -> BoxFuture<'static, Result<String, WorkflowError>> {
        (self.inner.as_ref())(request.into())
    }
}

/// Workflow names as they appear in emitted events.
pub const PREFERRED: &str = "pbm_workflow";
pub const GUIDE: &str = "guide_workflow";
pub const GOOD_RX: &str = "good_rx_workflow";
pub const GAPS_IN_CARE: &str = "gaps_in_care_workflow";

/// Split a message into its kind segment and the remainder.
fn behead(message: &str) -> (&str, &str) {
    message.split_once("::").unwrap_or((message, ""))
}

fn check_request(request: &str) -> Result<(), WorkflowError> {
    if request.is_empty() {
        return Err(WorkflowError::MalformedRequest("empty request".to_string()));
    }
    Ok(())
}

/// The preferred path: rename the request through the PBM message shapes,
/// with a simulated transport delay between send and receive.
pub fn pbm(sink: Arc<dyn EventSink>, transport_delay: Duration) -> WorkflowFn {
    WorkflowFn::new(move |request: String| {
        let sink = Arc::clone(&sink);
        async move {
            check_request(&request)?;
            sink.emit(&scoped(PREFERRED, stage::REQUEST_RECEIVED), &request);

            let (_, tail) = behead(&request);
            let prepared = format!("pbm_request::{tail}");
            sink.emit(&scoped(PREFERRED, stage::REQUEST_PREPARED), &prepared);

            sink.emit(&scoped(PREFERRED, stage::REQUEST_SENT), &prepared);
            tokio::time::sleep(transport_delay).await;
            let (_, tail) = behead(&prepared);
            let received = format!("pbm_response::{tail}");
            sink.emit(&scoped(PREFERRED, stage::RESPONSE_RECEIVED), &received);

            let (_, tail) = behead(&received);
            let response = format!("rtpbi_response::{tail}");
            sink.emit(&scoped(PREFERRED, stage::RESPONSE_PREPARED), &response);
            Ok(response)
        }
        .boxed()
    })
}

/// The guide path: tag the request, send it through `inner` (normally the
/// preferred workflow), then rewrite the tag on the way out.
pub fn guide(inner: WorkflowFn, sink: Arc<dyn EventSink>) -> WorkflowFn {
    WorkflowFn::new(move |request: String| {
        let inner = inner.clone();
        let sink = Arc::clone(&sink);
        async move {
            check_request(&request)?;
            sink.emit(&scoped(GUIDE, stage::REQUEST_RECEIVED), &request);

            let (head, tail) = behead(&request);
            let prepared = format!("{head}::guide_request::{tail}");
            sink.emit(&scoped(GUIDE, stage::REQUEST_PREPARED), &prepared);

            sink.emit(&scoped(GUIDE, stage::REQUEST_SENT), &prepared);
            let received = inner.call(prepared).await?;
            sink.emit(&scoped(GUIDE, stage::RESPONSE_RECEIVED), &received);

            let (head, rest) = behead(&received);
            let (_, tail) = behead(rest);
            let response = format!("{head}::guide_response::{tail}");
            sink.emit(&scoped(GUIDE, stage::RESPONSE_PREPARED), &response);
            Ok(response)
        }
        .boxed()
    })
}

/// Discount-card pricing: a fixed response after its transport delay.
pub fn good_rx(sink: Arc<dyn EventSink>, transport_delay: Duration) -> WorkflowFn {
    WorkflowFn::new(move |request: String| {
        let sink = Arc::clone(&sink);
        async move {
            check_request(&request)?;
            sink.emit(&scoped(GOOD_RX, stage::REQUEST_RECEIVED), &request);
            tokio::time::sleep(transport_delay).await;
            let response = "good_rx::response".to_string();
            sink.emit(&scoped(GOOD_RX, stage::RESPONSE_RECEIVED), &response);
            Ok(response)
        }
        .boxed()
    })
}

/// Care-gap screening: a fixed response after its transport delay. The
/// slowest backend, and the one the orchestrator is allowed to abandon.
pub fn gaps_in_care(sink: Arc<dyn EventSink>, transport_delay: Duration) -> WorkflowFn {
    WorkflowFn::new(move |request: String| {
        let sink = Arc::clone(&sink);
        async move {
            check_request(&request)?;
            sink.emit(&scoped(GAPS_IN_CARE, stage::REQUEST_RECEIVED), &request);
            tokio::time::sleep(transport_delay).await;
            let response = "gaps_in_care::response".to_string();
            sink.emit(&scoped(GAPS_IN_CARE, stage::RESPONSE_RECEIVED), &response);
            Ok(response)
        }
        .boxed()
    })
}

/// The four workflows the orchestrator fans a request out to.
pub struct WorkflowSet {
    pub preferred: WorkflowFn,
    pub guide: WorkflowFn,
    pub good_rx: WorkflowFn,
    pub gaps_in_care: WorkflowFn,
}

impl WorkflowSet {
    /// The standard PBM fan-out. The guide workflow re-enters the preferred
    /// workflow for its transport leg.
    pub fn pbm(config: &Config, sink: Arc<dyn EventSink>) -> Self {
        let preferred = pbm(Arc::clone(&sink), config.latency.preferred());
        let chained = guide(preferred.clone(), Arc::clone(&sink));
        let good_rx = good_rx(Arc::clone(&sink), config.latency.good_rx());
        let gaps_in_care = gaps_in_care(Arc::clone(&sink), config.latency.gaps_in_care());
        Self {
            preferred,
            guide: chained,
            good_rx,
            gaps_in_care,
        }
    }
}
