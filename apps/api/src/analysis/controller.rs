//! Analysis Controller orchestrates prompt → provider → normalizer and owns
//! the request lifecycle of one analysis session.
//!
//! ```text
//! Idle ──submit──▶ Submitting ──▶ Success | Failed
//!   ▲                  │               │
//!   └─────abandon──────┘    submit ────┘ (re-enters Submitting)
//! ```
//!
//! At most one request is in flight. Each one carries a `RequestToken`; a
//! response whose token is no longer current is discarded.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::analysis::error::AnalysisError;
use crate::analysis::model::AnalysisResult;
use crate::analysis::normalizer::normalize;
use crate::analysis::prompts::build_prompt;
use crate::analysis::AnalysisRequest;
use crate::llm_client::{Credential, ProviderClient};

pub type RequestToken = u64;

#[derive(Debug, Clone)]
pub enum AnalysisState {
    Idle,
    Submitting { token: RequestToken },
    Success(Arc<AnalysisResult>),
    Failed(AnalysisError),
}

impl AnalysisState {
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisState::Idle => "idle",
            AnalysisState::Submitting { .. } => "submitting",
            AnalysisState::Success(_) => "success",
            AnalysisState::Failed(_) => "failed",
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, AnalysisState::Submitting { .. })
    }

    pub fn result(&self) -> Option<&Arc<AnalysisResult>> {
        match self {
            AnalysisState::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        match self {
            AnalysisState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

struct Inner {
    state: AnalysisState,
    last_token: RequestToken,
}

pub struct AnalysisController {
    client: Arc<dyn ProviderClient>,
    timeout: Duration,
    inner: Mutex<Inner>,
}

impl AnalysisController {
    pub fn new(client: Arc<dyn ProviderClient>, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            inner: Mutex::new(Inner {
                state: AnalysisState::Idle,
                last_token: 0,
            }),
        }
    }

    /// Current state. Results are shared, not copied.
    pub fn snapshot(&self) -> AnalysisState {
        self.lock().state.clone()
    }

    /// Runs one analysis cycle.
    ///
    /// Rejected with `AlreadyInProgress` while another request is in flight;
    /// that request is left untouched. Every other failure is also recorded
    /// as the Failed state. If this future is dropped before completion the
    /// controller returns to Idle.
    pub async fn submit(
        &self,
        request: &AnalysisRequest,
        credential: &Credential,
    ) -> Result<Arc<AnalysisResult>, AnalysisError> {
        let (token, prompt) = self.begin(request)?;
        let in_flight = InFlight {
            controller: self,
            token,
            settled: false,
        };
        let outcome = self.run(&prompt, credential).await;
        in_flight.settle(outcome)
    }

    /// Drops any stored result or error and invalidates the in-flight request, if any.
    pub fn abandon(&self) {
        let mut inner = self.lock();
        if let AnalysisState::Submitting { token } = inner.state {
            info!(token, "abandoning in-flight analysis");
        }
        inner.state = AnalysisState::Idle;
    }

    fn begin(&self, request: &AnalysisRequest) -> Result<(RequestToken, String), AnalysisError> {
        let mut inner = self.lock();
        if inner.state.is_submitting() {
            warn!("rejecting analysis submit: a request is already in flight");
            return Err(AnalysisError::AlreadyInProgress);
        }

        match build_prompt(&request.resume_text, &request.job_description, request.schema) {
            Ok(prompt) => {
                inner.last_token += 1;
                let token = inner.last_token;
                inner.state = AnalysisState::Submitting { token };
                info!(token, schema = ?request.schema, "analysis submitted");
                Ok((token, prompt))
            }
            Err(e) => {
                inner.state = AnalysisState::Failed(e.clone());
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        prompt: &str,
        credential: &Credential,
    ) -> Result<Arc<AnalysisResult>, AnalysisError> {
        let raw = match tokio::time::timeout(self.timeout, self.client.send(prompt, credential)).await
        {
            Ok(response) => response?,
            Err(_) => return Err(AnalysisError::Timeout(self.timeout)),
        };
        let result = normalize(&raw)?;
        Ok(Arc::new(result))
    }

    fn complete(
        &self,
        token: RequestToken,
        outcome: Result<Arc<AnalysisResult>, AnalysisError>,
    ) -> Result<Arc<AnalysisResult>, AnalysisError> {
        let mut inner = self.lock();
        let current = match inner.state {
            AnalysisState::Submitting { token } => Some(token),
            _ => None,
        };
        if current != Some(token) {
            debug!(token, "discarding response for a request that is no longer current");
            return Err(AnalysisError::Abandoned);
        }

        match &outcome {
            Ok(result) => {
                info!(
                    token,
                    match_percentage = result.match_percentage(),
                    verdict = result.verdict(),
                    "analysis succeeded"
                );
                inner.state = AnalysisState::Success(Arc::clone(result));
            }
            Err(e) => {
                warn!(token, error = %e, "analysis failed");
                inner.state = AnalysisState::Failed(e.clone());
            }
        }
        outcome
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the controller to Idle if a submit is dropped before it settles.
struct InFlight<'a> {
    controller: &'a AnalysisController,
    token: RequestToken,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(
        mut self,
        outcome: Result<Arc<AnalysisResult>, AnalysisError>,
    ) -> Result<Arc<AnalysisResult>, AnalysisError> {
        self.settled = true;
        self.controller.complete(self.token, outcome)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut inner = self.controller.lock();
        if matches!(inner.state, AnalysisState::Submitting { token } if token == self.token) {
            debug!(token = self.token, "analysis future dropped before completion");
            inner.state = AnalysisState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::analysis::normalizer::ParseError;
    use crate::analysis::prompts::PromptSchema;
    use crate::llm_client::test_support::StubProviderClient;
    use crate::llm_client::{ProviderError, ProviderId};

    const SCREENING_RESPONSE: &str = r#"{"matchPercentage":82,"status":"Recommended","matchedSkills":"React, Node","missingSkills":"GraphQL","improvementSuggestions":"Learn GraphQL","learningResources":"https://example.com/course"}"#;

    /// Blocks inside `send` until released, so tests can observe Submitting.
    struct GatedClient {
        entered: Notify,
        release: Notify,
        calls: AtomicUsize,
    }

    impl GatedClient {
        fn new() -> Self {
            Self {
                entered: Notify::new(),
                release: Notify::new(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ProviderClient for GatedClient {
        async fn send(&self, _prompt: &str, _credential: &Credential) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            Ok(SCREENING_RESPONSE.to_string())
        }
    }

    /// Never answers within any reasonable timeout.
    struct HangingClient;

    #[async_trait]
    impl ProviderClient for HangingClient {
        async fn send(&self, _prompt: &str, _credential: &Credential) -> Result<String, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(SCREENING_RESPONSE.to_string())
        }
    }

    fn credential() -> Credential {
        Credential::new(ProviderId::Gemini, "AIzaSyTestKey")
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::new("React and Node developer", "Full-stack role needing GraphQL")
    }

    fn controller(client: Arc<dyn ProviderClient>) -> AnalysisController {
        AnalysisController::new(client, Duration::from_secs(30))
    }

    #[test]
    fn test_initial_state_is_idle() {
        let controller = controller(Arc::new(StubProviderClient::replying(SCREENING_RESPONSE)));
        let state = controller.snapshot();
        assert_eq!(state.label(), "idle");
        assert!(state.result().is_none());
        assert!(state.error().is_none());
    }

    #[tokio::test]
    async fn test_submit_success_stores_result() {
        let stub = Arc::new(StubProviderClient::replying(SCREENING_RESPONSE));
        let controller = controller(stub.clone());

        let result = controller.submit(&request(), &credential()).await.unwrap();
        assert_eq!(result.match_percentage(), 82);
        assert_eq!(result.strengths(), ["React", "Node"]);

        let state = controller.snapshot();
        assert_eq!(state.label(), "success");
        assert_eq!(state.result().unwrap().match_percentage(), 82);
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_inputs_fail_without_calling_provider() {
        let stub = Arc::new(StubProviderClient::replying(SCREENING_RESPONSE));
        let controller = controller(stub.clone());

        for request in [AnalysisRequest::new("", "x"), AnalysisRequest::new("x", "")] {
            let err = controller.submit(&request, &credential()).await.unwrap_err();
            assert!(matches!(err, AnalysisError::InvalidInput(_)));
            assert_eq!(controller.snapshot().label(), "failed");
        }
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_moves_to_failed() {
        let stub = Arc::new(StubProviderClient::failing(ProviderError::Api {
            status: 500,
            message: "boom".to_string(),
        }));
        let controller = controller(stub);

        let err = controller.submit(&request(), &credential()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::RequestFailed(_)));

        let state = controller.snapshot();
        assert!(matches!(state.error(), Some(AnalysisError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn test_invalid_model_output_moves_to_failed() {
        let stub = Arc::new(StubProviderClient::replying(
            r#"{"matchPercentage": 150, "status": "Recommended", "matchedSkills": "", "missingSkills": ""}"#,
        ));
        let controller = controller(stub);

        let err = controller.submit(&request(), &credential()).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Parse(ParseError::OutOfRange { ref field, value })
                if field == "matchPercentage" && value == 150.0
        ));
        assert_eq!(controller.snapshot().label(), "failed");
    }

    #[tokio::test]
    async fn test_resubmit_after_failure_overwrites_state() {
        let stub = Arc::new(StubProviderClient::with_outcomes(vec![
            Ok("not json at all".to_string()),
            Ok(SCREENING_RESPONSE.to_string()),
        ]));
        let controller = controller(stub.clone());

        assert!(controller.submit(&request(), &credential()).await.is_err());
        assert_eq!(controller.snapshot().label(), "failed");

        controller.submit(&request(), &credential()).await.unwrap();
        let state = controller.snapshot();
        assert_eq!(state.label(), "success");
        assert!(state.error().is_none());
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_coaching_schema_request() {
        let stub = Arc::new(StubProviderClient::replying(
            r#"```json
            {"matchPercentage": 55, "matchLabel": "Partial Match", "summary": "Some overlap.",
             "strengths": ["React"], "gaps": ["GraphQL"]}
            ```"#,
        ));
        let controller = controller(stub);
        let request = request().with_schema(PromptSchema::Coaching);

        let result = controller.submit(&request, &credential()).await.unwrap();
        assert_eq!(result.verdict(), "Partial Match");
    }

    #[tokio::test]
    async fn test_concurrent_submit_is_rejected() {
        let client = Arc::new(GatedClient::new());
        let controller = Arc::new(controller(client.clone()));

        let first = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.submit(&request(), &credential()).await })
        };
        client.entered.notified().await;
        assert!(controller.snapshot().is_submitting());

        let second = controller.submit(&request(), &credential()).await;
        assert!(matches!(second, Err(AnalysisError::AlreadyInProgress)));
        assert!(controller.snapshot().is_submitting());

        client.release.notify_one();
        let first = first.await.unwrap().unwrap();
        assert_eq!(first.match_percentage(), 82);
        assert_eq!(controller.snapshot().label(), "success");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_late_response_after_abandon_is_discarded() {
        let client = Arc::new(GatedClient::new());
        let controller = Arc::new(controller(client.clone()));

        let in_flight = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.submit(&request(), &credential()).await })
        };
        client.entered.notified().await;

        controller.abandon();
        assert_eq!(controller.snapshot().label(), "idle");

        client.release.notify_one();
        let outcome = in_flight.await.unwrap();
        assert!(matches!(outcome, Err(AnalysisError::Abandoned)));
        assert_eq!(controller.snapshot().label(), "idle");
    }

    #[tokio::test]
    async fn test_abandon_clears_previous_result() {
        let controller = controller(Arc::new(StubProviderClient::replying(SCREENING_RESPONSE)));
        controller.submit(&request(), &credential()).await.unwrap();

        controller.abandon();
        assert_eq!(controller.snapshot().label(), "idle");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_moves_to_failed() {
        let controller = controller(Arc::new(HangingClient));

        let err = controller.submit(&request(), &credential()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Timeout(d) if d == Duration::from_secs(30)));
        assert!(matches!(
            controller.snapshot().error(),
            Some(AnalysisError::Timeout(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_submit_returns_to_idle() {
        let controller = controller(Arc::new(HangingClient));

        let outcome = tokio::time::timeout(
            Duration::from_secs(1),
            controller.submit(&request(), &credential()),
        )
        .await;
        assert!(outcome.is_err());
        assert_eq!(controller.snapshot().label(), "idle");
    }
}
