//! HTTP route handlers for the card actions API.

use axum::Router;
use axum::extract::{State, rejection::JsonRejection};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post};
use card_policy::core::types::{Action, Classification, LifecycleState};
use card_policy::service::AllowedActions;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::problem::Problem;
use crate::state::AppState;

/// Header carrying the per-request id, generated when the caller sends none.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/card-actions/actionsallowed", post(allowed_actions))
}

/// Full application: `/api` routes with request id, tracing and CORS layers.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Later layers wrap earlier ones: the request id exists before tracing starts.
    Router::new()
        .nest("/api", api_router())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Body of `POST /api/card-actions/actionsallowed`.
///
/// Both fields are optional at the JSON level so that a missing field is
/// reported as a validation problem rather than a deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedActionsRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub card_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedActionsResponse {
    pub user_id: String,
    pub card_number: String,
    pub card_type: Classification,
    pub card_status: LifecycleState,
    pub allowed_actions: Vec<Action>,
}

impl From<AllowedActions> for AllowedActionsResponse {
    fn from(allowed: AllowedActions) -> Self {
        Self {
            user_id: allowed.owner_id,
            card_number: allowed.record.instrument_id,
            card_type: allowed.record.classification,
            card_status: allowed.record.state,
            allowed_actions: allowed.actions.into_iter().collect(),
        }
    }
}

/// POST /api/card-actions/actionsallowed - permitted actions for one card.
async fn allowed_actions(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AllowedActionsRequest>, JsonRejection>,
) -> Result<Json<AllowedActionsResponse>, Problem> {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection, "rejected request body");
        body_problem(&rejection)
    })?;

    let user_id = request.user_id.unwrap_or_default();
    let card_number = request.card_number.unwrap_or_default();

    let allowed = state
        .service
        .allowed_actions(&user_id, &card_number)
        .await
        .map_err(|err| Problem::from(err).for_request(request_id))?;
    info!(
        user_id = %allowed.owner_id,
        card_number = %allowed.record.instrument_id,
        permitted = allowed.actions.len(),
        "allowed actions served"
    );

    Ok(Json(allowed.into()))
}

/// 415 when the body is not declared as JSON, 400 for anything unreadable.
fn body_problem(rejection: &JsonRejection) -> Problem {
    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        Problem::unsupported_media_type(rejection.body_text())
    } else {
        Problem::validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use card_policy::core::types::InstrumentRecord;
    use card_policy::io::resolver::{InMemoryResolver, InstrumentResolver, ResolveError};
    use card_policy::service::CardActionsService;
    use card_policy::test_support::{expected_actions, reference_evaluator, sample_card};
    use serde_json::{Value, json};
    use tower::ServiceExt as _;

    use super::*;
    use crate::problem::APPLICATION_PROBLEM_JSON;

    struct UnavailableResolver;

    #[async_trait]
    impl InstrumentResolver for UnavailableResolver {
        async fn resolve(
            &self,
            _owner_id: &str,
            _instrument_id: &str,
        ) -> Result<InstrumentRecord, ResolveError> {
            Err(ResolveError::Unavailable("card store offline".to_string()))
        }
    }

    fn sample_app() -> Router {
        app(AppState::new(CardActionsService::new(
            Arc::new(InMemoryResolver::with_sample_portfolio()),
            reference_evaluator(),
        )))
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/card-actions/actionsallowed")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn expect_problem(response: Response, status: StatusCode) -> Problem {
        assert_eq!(response.status(), status);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.contains("problem+json"), "{}", content_type);
        let problem: Problem = read_json(response).await;
        assert_eq!(problem.status, status.as_u16());
        problem
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let response = sample_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn returns_actions_for_every_sample_card() {
        let app = sample_app();
        for user in 1..=3 {
            for idx in 1..=21 {
                let user_id = format!("User{}", user);
                let card_number = format!("Card{}{}", user, idx);
                let (classification, state, pin) = sample_card(idx);

                let response = app
                    .clone()
                    .oneshot(post_json(
                        json!({ "userId": user_id, "cardNumber": card_number }),
                    ))
                    .await
                    .unwrap();
                assert_eq!(response.status(), StatusCode::OK, "{}", card_number);

                let body: AllowedActionsResponse = read_json(response).await;
                assert_eq!(body.user_id, user_id);
                assert_eq!(body.card_number, card_number);
                assert_eq!(body.card_type, classification);
                assert_eq!(body.card_status, state);
                let names: Vec<String> = body
                    .allowed_actions
                    .iter()
                    .map(|action| action.as_str().to_string())
                    .collect();
                assert_eq!(
                    names,
                    expected_actions(classification, state, pin),
                    "{}",
                    card_number
                );
            }
        }
    }

    #[tokio::test]
    async fn response_uses_wire_names() {
        let response = sample_app()
            .oneshot(post_json(json!({ "userId": "User1", "cardNumber": "Card14" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = read_json(response).await;
        assert_eq!(body["cardType"], "Prepaid");
        assert_eq!(body["cardStatus"], "Restricted");
        assert_eq!(body["allowedActions"], json!(["ACTION3", "ACTION4", "ACTION9"]));
    }

    #[tokio::test]
    async fn identifiers_are_trimmed() {
        let response = sample_app()
            .oneshot(post_json(
                json!({ "userId": "  User2 ", "cardNumber": " Card21\t" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: AllowedActionsResponse = read_json(response).await;
        assert_eq!(body.user_id, "User2");
        assert_eq!(body.card_number, "Card21");
    }

    #[tokio::test]
    async fn missing_user_id_is_a_validation_problem() {
        let response = sample_app()
            .oneshot(post_json(json!({ "userId": "", "cardNumber": "Card11" })))
            .await
            .unwrap();
        let problem = expect_problem(response, StatusCode::BAD_REQUEST).await;
        assert_eq!(problem.title, "Validation error");
        assert_eq!(problem.detail, "Both userId and cardNumber are required.");
    }

    #[tokio::test]
    async fn missing_card_number_is_a_validation_problem() {
        for body in [
            json!({ "userId": "User1", "cardNumber": "" }),
            json!({ "userId": "User1", "cardNumber": "   " }),
            json!({ "userId": "User1" }),
            json!({ "userId": "User1", "cardNumber": null }),
        ] {
            let response = sample_app().oneshot(post_json(body)).await.unwrap();
            let problem = expect_problem(response, StatusCode::BAD_REQUEST).await;
            assert_eq!(problem.title, "Validation error");
            assert_eq!(problem.detail, "Both userId and cardNumber are required.");
        }
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let response = sample_app()
            .oneshot(post_json(
                json!({ "userId": "NoSuchUser", "cardNumber": "Card11" }),
            ))
            .await
            .unwrap();
        let problem = expect_problem(response, StatusCode::NOT_FOUND).await;
        assert_eq!(problem.title, "User not found");
        assert_eq!(problem.detail, "User 'NoSuchUser' does not exist.");
    }

    #[tokio::test]
    async fn unknown_card_for_known_user_is_not_found() {
        let response = sample_app()
            .oneshot(post_json(json!({ "userId": "User1", "cardNumber": "Nope" })))
            .await
            .unwrap();
        let problem = expect_problem(response, StatusCode::NOT_FOUND).await;
        assert_eq!(problem.title, "Card not found");
        assert_eq!(problem.detail, "User 'User1' does not own card 'Nope'.");
    }

    #[tokio::test]
    async fn malformed_body_is_a_problem() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/card-actions/actionsallowed")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = sample_app().oneshot(request).await.unwrap();
        let problem = expect_problem(response, StatusCode::BAD_REQUEST).await;
        assert_eq!(problem.title, "Validation error");
    }

    #[tokio::test]
    async fn resolver_failure_is_an_opaque_500() {
        let app = app(AppState::new(CardActionsService::new(
            Arc::new(UnavailableResolver),
            reference_evaluator(),
        )));
        let response = app
            .oneshot(post_json(json!({ "userId": "User1", "cardNumber": "Card11" })))
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            APPLICATION_PROBLEM_JSON
        );
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .expect("generated request id");
        let problem = expect_problem(response, StatusCode::INTERNAL_SERVER_ERROR).await;
        assert_eq!(problem.title, "Unexpected error");
        assert!(!problem.detail.contains("offline"));
        assert!(!request_id.is_empty());
        assert_eq!(problem.trace_id.as_deref(), Some(request_id.as_str()));
    }

    #[tokio::test]
    async fn caller_request_id_is_reported_on_server_errors() {
        let app = app(AppState::new(CardActionsService::new(
            Arc::new(UnavailableResolver),
            reference_evaluator(),
        )));
        let mut request = post_json(json!({ "userId": "User1", "cardNumber": "Card11" }));
        request
            .headers_mut()
            .insert(REQUEST_ID_HEADER, "client-req-7".parse().unwrap());
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "client-req-7"
        );
        let problem = expect_problem(response, StatusCode::INTERNAL_SERVER_ERROR).await;
        assert_eq!(problem.trace_id.as_deref(), Some("client-req-7"));
    }

    #[tokio::test]
    async fn client_errors_carry_no_trace_id() {
        let response = sample_app()
            .oneshot(post_json(json!({ "userId": "NoSuchUser", "cardNumber": "Card11" })))
            .await
            .unwrap();
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        let problem = expect_problem(response, StatusCode::NOT_FOUND).await;
        assert_eq!(problem.trace_id, None);
    }

    #[tokio::test]
    async fn body_without_json_content_type_is_unsupported() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/card-actions/actionsallowed")
            .body(Body::from(r#"{"userId":"User1","cardNumber":"Card11"}"#))
            .unwrap();
        let response = sample_app().oneshot(request).await.unwrap();
        let problem = expect_problem(response, StatusCode::UNSUPPORTED_MEDIA_TYPE).await;
        assert_eq!(problem.title, "Unsupported media type");
        assert_eq!(problem.type_url, "https://httpstatuses.com/415");
    }
}
