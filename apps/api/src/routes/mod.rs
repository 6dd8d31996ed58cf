pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::candidates::handlers as candidates;
use crate::settings::handlers as settings;
use crate::state::AppState;

/// Résumé uploads are capped at 10 MiB.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Settings API
        .route(
            "/api/v1/settings",
            get(settings::handle_get_settings).post(settings::handle_save_settings),
        )
        .route(
            "/api/v1/settings/detect",
            post(settings::handle_detect_provider),
        )
        // Analysis sessions
        .route("/api/v1/sessions", post(analysis::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(analysis::handle_get_session).delete(analysis::handle_close_session),
        )
        .route(
            "/api/v1/sessions/:id/analyze",
            post(analysis::handle_analyze),
        )
        // One-shot upload + candidates dashboard
        .route(
            "/api/v1/analyze",
            post(analysis::handle_analyze_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/v1/candidates", get(candidates::handle_list_candidates))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::sessions::SessionRegistry;
    use crate::candidates::MemoryCandidateRepository;
    use crate::config::Config;
    use crate::llm_client::test_support::StubProviderClient;
    use crate::settings::store::MemorySettingsStore;

    const SCREENING_REPLY: &str = r#"```json
{"matchPercentage": 82, "status": "Recommended", "matchedSkills": ["React", "Node"], "missingSkills": "GraphQL"}
```"#;

    fn test_state(provider: StubProviderClient) -> AppState {
        AppState {
            provider: Arc::new(provider),
            settings: Arc::new(MemorySettingsStore::default()),
            candidates: Arc::new(MemoryCandidateRepository::default()),
            sessions: SessionRegistry::default(),
            config: Config {
                gemini_api_key: Some("AIzaEnvironmentKey0000".to_string()),
                ..Config::default()
            },
        }
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let state = test_state(StubProviderClient::replying("{}"));
        let (status, body) = send(&state, empty_request(Method::GET, "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "resumatch-api");
    }

    #[tokio::test]
    async fn test_save_settings_rejects_unrecognized_key() {
        let state = test_state(StubProviderClient::replying("{}"));
        let (status, body) = send(
            &state,
            json_request(Method::POST, "/api/v1/settings", json!({ "api_key": "short" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_saved_settings_are_reported_masked() {
        let state = test_state(StubProviderClient::replying("{}"));
        let (status, body) = send(
            &state,
            json_request(
                Method::POST,
                "/api/v1/settings",
                json!({ "api_key": "AIzaSyABCDEFGH1234" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["provider"], "gemini");
        assert_eq!(body["message"], "Successfully activated Google Gemini engine!");

        let (status, body) = send(&state, empty_request(Method::GET, "/api/v1/settings")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "saved");
        assert_eq!(body["key_preview"], "AIza…1234");
    }

    #[tokio::test]
    async fn test_detect_provider() {
        let state = test_state(StubProviderClient::replying("{}"));
        let (status, body) = send(
            &state,
            json_request(
                Method::POST,
                "/api/v1/settings/detect",
                json!({ "api_key": "hf_abcdefghijklmnop" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["provider"], "huggingface");
        assert_eq!(body["recognized"], true);
    }

    #[tokio::test]
    async fn test_session_analysis_succeeds() {
        let state = test_state(StubProviderClient::replying(SCREENING_REPLY));

        let (status, created) = send(&state, empty_request(Method::POST, "/api/v1/sessions")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["state"], "idle");
        let id = created["session_id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &state,
            json_request(
                Method::POST,
                &format!("/api/v1/sessions/{id}/analyze"),
                json!({
                    "resume_text": "Senior engineer, React and Node",
                    "job_description": "React + GraphQL role"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "success");
        assert_eq!(body["result"]["matchPercentage"], 82);
        assert_eq!(body["result"]["missingSkills"], json!(["GraphQL"]));

        let (status, body) = send(
            &state,
            empty_request(Method::GET, &format!("/api/v1/sessions/{id}")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "success");
    }

    #[tokio::test]
    async fn test_session_analysis_with_empty_resume_is_rejected() {
        let state = test_state(StubProviderClient::replying(SCREENING_REPLY));
        let (_, created) = send(&state, empty_request(Method::POST, "/api/v1/sessions")).await;
        let id = created["session_id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &state,
            json_request(
                Method::POST,
                &format!("/api/v1/sessions/{id}/analyze"),
                json!({ "resume_text": "   ", "job_description": "React role" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let state = test_state(StubProviderClient::replying(SCREENING_REPLY));
        let uri = format!("/api/v1/sessions/{}", uuid::Uuid::new_v4());
        let (status, _) = send(&state, empty_request(Method::GET, &uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&state, empty_request(Method::DELETE, &uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_closed_session_is_gone() {
        let state = test_state(StubProviderClient::replying(SCREENING_REPLY));
        let (_, created) = send(&state, empty_request(Method::POST, "/api/v1/sessions")).await;
        let uri = format!("/api/v1/sessions/{}", created["session_id"].as_str().unwrap());

        let (status, _) = send(&state, empty_request(Method::DELETE, &uri)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&state, empty_request(Method::GET, &uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_stores_candidate() {
        let state = test_state(StubProviderClient::replying(SCREENING_REPLY));
        let boundary = "resumatch-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"jane.txt\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             Jane Doe, React and Node developer\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"jobDescription\"\r\n\r\n\
             React + GraphQL role\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, record) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["name"], "jane.txt");
        assert_eq!(record["matchPercentage"], 82);
        assert_eq!(record["matchedSkills"], "React, Node");
        assert_eq!(record["resumeText"], "Jane Doe, React and Node developer");

        let (status, list) = send(&state, empty_request(Method::GET, "/api/v1/candidates")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_of_unsupported_file_is_rejected() {
        let state = test_state(StubProviderClient::replying(SCREENING_REPLY));
        let boundary = "resumatch-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"jane.docx\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             binary\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"jobDescription\"\r\n\r\n\
             React role\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "EXTRACTION_FAILED");
    }
}
