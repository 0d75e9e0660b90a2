use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Outcome of one middleware stage
pub enum Flow {
    /// Hand the (possibly augmented) request to the next stage
    Continue,
    /// Stop here and send this response
    Respond(Response),
}

/// A guard or limiter placed in front of a handler.
///
/// Stages may add request extensions but never touch the body.
pub trait Stage: Send + Sync {
    /// Stage name for logging
    fn name(&self) -> &'static str;

    fn apply(&self, request: &mut Request) -> Flow;
}

/// Ordered list of stages. Stages run in the order they were added; the first one to
/// respond ends the request.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    stages: Vec<Arc<dyn Stage>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn shared_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run stages until one responds. `None` means every stage let the request through.
    pub fn evaluate(&self, request: &mut Request) -> Option<Response> {
        for stage in &self.stages {
            if let Flow::Respond(response) = stage.apply(request) {
                tracing::debug!(
                    stage = stage.name(),
                    status = %response.status(),
                    "Request stopped by middleware"
                );
                return Some(response);
            }
        }
        None
    }
}

/// Axum adapter: `axum::middleware::from_fn_with_state(chain, run_chain)`
pub async fn run_chain(
    State(chain): State<MiddlewareChain>,
    mut request: Request,
    next: Next,
) -> Response {
    match chain.evaluate(&mut request) {
        Some(response) => response,
        None => next.run(request).await,
    }
}
